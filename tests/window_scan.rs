use featscan::{
    detect_multiscale, ImageView, NmsConfig, ScanConfig, ScanState, WindowScanner,
};

fn accept_all(_: ImageView<'_, f32>) -> f32 {
    1.0
}

fn patch_mean(patch: ImageView<'_, f32>) -> f32 {
    let mut sum = 0.0f32;
    for y in 0..patch.height() {
        sum += patch.row(y).unwrap().iter().sum::<f32>();
    }
    sum / (patch.width() * patch.height()) as f32
}

#[test]
fn level_count_matches_rounded_pyramid() {
    let scanner = WindowScanner::new(ScanConfig::default()).unwrap();
    assert_eq!(scanner.level_count(256, 256), 15);
    assert_eq!(scanner.level_count(64, 128), 1);
    assert_eq!(scanner.level_count(63, 500), 0);
}

#[test]
fn level_iterator_walks_states_and_maps_boxes() {
    let data = vec![0u8; 256 * 256];
    let view = ImageView::from_slice(&data, 256, 256).unwrap();
    let scanner = WindowScanner::new(ScanConfig::default()).unwrap();
    let scorer = accept_all;

    let mut levels = scanner.levels(view, &scorer);
    assert_eq!(levels.state(), ScanState::Idle);

    let mut k = 0usize;
    while let Some(found) = levels.next() {
        let found = found.unwrap();
        assert_eq!(levels.state(), ScanState::ScanningLevel(k));

        let side = (256.0 / 1.05f64.powi(k as i32)).round() as usize;
        // Boxes map back through the rounded level size, not the nominal scale.
        let scale = 256.0 / side as f64;
        let padded = side + 16;
        let cols = (padded - 64) / 8 + 1;
        let rows = (padded - 128) / 8 + 1;
        assert_eq!(found.len(), rows * cols);

        let first = found[0];
        assert_eq!(first.level, k);
        assert!((first.x as f64 + 8.0 * scale).abs() < 1e-3);
        assert!((first.y as f64 + 8.0 * scale).abs() < 1e-3);
        assert!((first.width as f64 - 64.0 * scale).abs() < 1e-3);
        assert!((first.height as f64 - 128.0 * scale).abs() < 1e-3);

        // The second window starts where the unpadded level begins.
        assert!(found[1].x.abs() < 1e-3);
        k += 1;
    }
    assert_eq!(k, 15);
    assert_eq!(levels.state(), ScanState::Done);
    assert!(levels.next().is_none());
}

#[test]
fn image_smaller_than_window_scans_nothing() {
    let data = vec![0u8; 32 * 32];
    let view = ImageView::from_slice(&data, 32, 32).unwrap();
    let scanner = WindowScanner::new(ScanConfig::default()).unwrap();
    let scorer = accept_all;
    let mut levels = scanner.levels(view, &scorer);
    assert!(levels.next().is_none());
    assert_eq!(levels.state(), ScanState::Done);
    assert!(scanner.scan(view, &scorer).unwrap().is_empty());
}

#[test]
fn bright_target_is_detected_at_its_position() {
    let (width, height) = (200, 200);
    let mut data = vec![0.0f32; width * height];
    for y in 40..104 {
        for x in 80..112 {
            data[y * width + x] = 200.0;
        }
    }
    let view = ImageView::from_slice(&data, width, height).unwrap();
    let cfg = ScanConfig {
        window: (32, 64),
        stride: (4, 4),
        padding: (0, 0),
        acceptance_threshold: 190.0,
        ..ScanConfig::default()
    };
    let scorer = patch_mean;
    let detections = detect_multiscale(view, &scorer, &cfg, &NmsConfig::default()).unwrap();
    assert_eq!(detections.len(), 1);
    let det = detections[0];
    assert_eq!(det.level, 0);
    assert_eq!((det.x, det.y, det.width, det.height), (80.0, 40.0, 32.0, 64.0));
    assert!((det.confidence - 200.0).abs() < 1e-3);
}

#[test]
fn threshold_filters_low_scores() {
    let data = vec![10u8; 80 * 140];
    let view = ImageView::from_slice(&data, 80, 140).unwrap();
    let scanner = WindowScanner::new(ScanConfig {
        acceptance_threshold: 10.5,
        ..ScanConfig::default()
    })
    .unwrap();
    let scorer = patch_mean;
    assert!(scanner.scan(view, &scorer).unwrap().is_empty());

    let scanner = WindowScanner::new(ScanConfig {
        acceptance_threshold: 10.0,
        ..ScanConfig::default()
    })
    .unwrap();
    let found = scanner.scan(view, &scorer).unwrap();
    assert!(!found.is_empty());
    assert!(found.iter().all(|d| (d.confidence - 10.0).abs() < 1e-4));
}

#[test]
fn invalid_scan_parameters_are_rejected() {
    for cfg in [
        ScanConfig {
            window: (0, 128),
            ..ScanConfig::default()
        },
        ScanConfig {
            scale_factor: 1.0,
            ..ScanConfig::default()
        },
        ScanConfig {
            stride: (0, 8),
            ..ScanConfig::default()
        },
        ScanConfig {
            max_levels: 0,
            ..ScanConfig::default()
        },
    ] {
        assert!(WindowScanner::new(cfg).is_err());
    }
}

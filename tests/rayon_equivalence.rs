#![cfg(feature = "rayon")]

use featscan::{
    extract_features, BorderPolicy, BriefConfig, BriefExtractor, BruteForceMatcher, CornerConfig,
    CornerDetector, DescriptorMatcher, ExtractConfig, ImageView, KeypointDetector, MatchConfig,
    ScanConfig, WindowScanner,
};

fn make_image(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.push(value as f32);
        }
    }
    data
}

fn patch_mean(patch: ImageView<'_, f32>) -> f32 {
    let mut sum = 0.0f32;
    for y in 0..patch.height() {
        sum += patch.row(y).unwrap().iter().sum::<f32>();
    }
    sum / (patch.width() * patch.height()) as f32
}

#[test]
fn parallel_extraction_and_matching_match_sequential() {
    let (width, height) = (160, 140);
    let a = make_image(width, height);
    let b: Vec<f32> = a.iter().map(|v| 255.0 - v).collect();
    let view_a = ImageView::from_slice(&a, width, height).unwrap();
    let view_b = ImageView::from_slice(&b, width, height).unwrap();

    let detector = CornerDetector::new(CornerConfig::default()).unwrap();
    let brief = BriefExtractor::new(BriefConfig::default()).unwrap();
    let kps_a = detector.detect(view_a).unwrap();
    let kps_b = detector.detect(view_b).unwrap();

    let sequential = ExtractConfig {
        border: BorderPolicy::Skip,
        parallel: false,
    };
    let parallel = ExtractConfig {
        parallel: true,
        ..sequential
    };
    let seq_a = extract_features(view_a, &kps_a, &brief, sequential).unwrap();
    let par_a = extract_features(view_a, &kps_a, &brief, parallel).unwrap();
    let seq_b = extract_features(view_b, &kps_b, &brief, sequential).unwrap();
    let par_b = extract_features(view_b, &kps_b, &brief, parallel).unwrap();
    assert_eq!(seq_a, par_a);
    assert_eq!(seq_b, par_b);

    for cross_check in [false, true] {
        let seq = BruteForceMatcher::new(MatchConfig {
            cross_check,
            parallel: false,
            ..MatchConfig::default()
        });
        let par = BruteForceMatcher::new(MatchConfig {
            cross_check,
            parallel: true,
            ..MatchConfig::default()
        });
        assert_eq!(
            seq.match_descriptors(&seq_a.descriptors, &seq_b.descriptors)
                .unwrap(),
            par.match_descriptors(&par_a.descriptors, &par_b.descriptors)
                .unwrap()
        );
    }
}

#[test]
fn parallel_scan_matches_sequential() {
    let (width, height) = (180, 220);
    let data = make_image(width, height);
    let view = ImageView::from_slice(&data, width, height).unwrap();
    let cfg = ScanConfig {
        acceptance_threshold: 120.0,
        ..ScanConfig::default()
    };
    let scorer = patch_mean;

    let sequential = WindowScanner::new(cfg.clone()).unwrap();
    let parallel = WindowScanner::new(ScanConfig {
        parallel: true,
        ..cfg
    })
    .unwrap();
    let expected = sequential.scan(view, &scorer).unwrap();
    assert!(!expected.is_empty());
    assert_eq!(parallel.scan(view, &scorer).unwrap(), expected);
}

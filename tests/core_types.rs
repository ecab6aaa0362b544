use featscan::{FeatScanError, ImageBuffer, ImagePyramid, ImageView, Keypoint, OwnedImage};

#[test]
fn image_view_rejects_invalid_dimensions() {
    let data = [0u8; 4];

    let err = ImageView::from_slice(&data, 0, 1).err().unwrap();
    assert_eq!(
        err,
        FeatScanError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );

    let err = ImageView::from_slice(&data, 1, 0).err().unwrap();
    assert_eq!(
        err,
        FeatScanError::InvalidDimensions {
            width: 1,
            height: 0,
        }
    );
}

#[test]
fn image_view_rejects_invalid_stride() {
    let data = [0u8; 8];

    let err = ImageView::new(&data, 4, 1, 3).err().unwrap();
    assert_eq!(
        err,
        FeatScanError::InvalidStride {
            width: 4,
            stride: 3,
        }
    );
}

#[test]
fn image_view_rejects_small_buffer() {
    let data = [0u8; 3];

    let err = ImageView::new(&data, 2, 2, 2).err().unwrap();
    assert_eq!(err, FeatScanError::BufferTooSmall { needed: 4, got: 3 });
}

#[test]
fn image_view_roi_matches_expected_values() {
    let data: Vec<u8> = (0u8..16).collect();
    let view = ImageView::from_slice(&data, 4, 4).unwrap();
    assert_eq!(view.stride(), 4);

    let roi = view.roi(1, 1, 2, 2).unwrap();
    assert_eq!(roi.width(), 2);
    assert_eq!(roi.height(), 2);
    assert_eq!(roi.stride(), 4);
    assert_eq!(roi.row(0).unwrap(), &[5, 6]);
    assert_eq!(roi.row(1).unwrap(), &[9, 10]);
    assert_eq!(roi.get(1, 1), Some(&10));
    assert_eq!(roi.get(2, 0), None);

    let err = view.roi(3, 3, 2, 2).err().unwrap();
    assert!(matches!(err, FeatScanError::RoiOutOfBounds { .. }));
}

#[test]
fn strided_view_skips_row_padding() {
    let data: Vec<u8> = vec![1, 2, 99, 3, 4, 99];
    let view = ImageView::new(&data, 2, 2, 3).unwrap();
    let owned = OwnedImage::from_view(view).unwrap();
    assert_eq!(owned.data(), &[1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn bilinear_sampling_interpolates_and_replicates_edges() {
    let data = [0.0f32, 10.0, 20.0, 30.0];
    let view = ImageView::from_slice(&data, 2, 2).unwrap();
    assert!((view.sample_bilinear(0.5, 0.5) - 15.0).abs() < 1e-5);
    assert_eq!(view.sample_clamped(-3, -3), 0.0);
    assert_eq!(view.sample_clamped(5, 5), 30.0);
}

#[test]
fn image_buffer_validates_channels_and_converts_to_gray() {
    let err = ImageBuffer::new(vec![0u8; 5], 2, 1, 3).err().unwrap();
    assert!(matches!(err, FeatScanError::ChannelMismatch { .. }));
    assert!(ImageBuffer::new(vec![0u8; 10], 2, 1, 5).is_err());

    let rgb = ImageBuffer::new(vec![255u8, 255, 255, 0, 0, 0], 2, 1, 3).unwrap();
    assert!(rgb.gray_view().is_none());
    let gray = rgb.to_gray().unwrap();
    assert!((gray.data()[0] - 255.0).abs() < 1e-3);
    assert_eq!(gray.data()[1], 0.0);

    let single = ImageBuffer::new(vec![7u8, 8], 2, 1, 1).unwrap();
    let view = single.gray_view().unwrap();
    assert_eq!(view.get(1, 0), Some(&8));
}

#[test]
fn pyramid_levels_follow_rounded_scale() {
    let data = vec![0u8; 256 * 256];
    let view = ImageView::from_slice(&data, 256, 256).unwrap();
    let pyramid = ImagePyramid::build(view, 1.05, (64, 128), 64).unwrap();
    assert_eq!(pyramid.len(), 15);

    for (k, level) in pyramid.levels().iter().enumerate() {
        let expected = (256.0 / 1.05f64.powi(k as i32)).round() as usize;
        assert_eq!(level.image().width(), expected);
        assert_eq!(level.image().height(), expected);
        assert!((level.scale() - 1.05f64.powi(k as i32)).abs() < 1e-9);
        let (rx, ry) = level.ratio();
        assert!((rx - 256.0 / expected as f64).abs() < 1e-12);
        assert_eq!(rx, ry);
    }
    // Level 14 rounds to 129 pixels: 256 / 129 rather than 1.05^14.
    let (rx, _) = pyramid.levels()[14].ratio();
    assert_eq!(pyramid.levels()[14].image().width(), 129);
    assert!((rx - 256.0 / 129.0).abs() < 1e-12);
    assert!((rx - 1.05f64.powi(14)).abs() > 1e-3);
    let last = pyramid.level(14).unwrap();
    assert!(last.height() >= 128);
    assert!((256.0 / 1.05f64.powi(15)).round() < 128.0);
}

#[test]
fn pyramid_respects_max_levels_and_rejects_bad_scale() {
    let data = vec![0u8; 64 * 64];
    let view = ImageView::from_slice(&data, 64, 64).unwrap();
    let pyramid = ImagePyramid::build(view, 2.0, (4, 4), 3).unwrap();
    assert_eq!(pyramid.len(), 3);
    assert_eq!(pyramid.level(2).unwrap().width(), 16);

    let err = ImagePyramid::build(view, 1.0, (4, 4), 3).err().unwrap();
    assert!(matches!(err, FeatScanError::InvalidParameter { .. }));
}

#[test]
fn keypoint_builders_set_fields() {
    let kp = Keypoint::new(3.0, 4.0, 1.5).with_scale(2.0).with_orientation(0.5);
    assert_eq!(kp.scale, 2.0);
    assert_eq!(kp.orientation, Some(0.5));
    assert!((kp.distance_to(&Keypoint::new(0.0, 0.0, 0.0)) - 5.0).abs() < 1e-6);
}

use featscan::{
    BorderPolicy, BriefConfig, BriefExtractor, BruteForceMatcher, CornerConfig, CornerDetector,
    ExtractConfig, FeaturePipeline, HistogramConfig, HistogramExtractor, ImageView, Keypoint,
    MatchConfig, Metric,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SHIFT: (usize, usize) = (7, 5);

fn textured_scene(width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..width * height).map(|_| rng.random::<u8>()).collect()
}

fn skip_border() -> ExtractConfig {
    ExtractConfig {
        border: BorderPolicy::Skip,
        ..ExtractConfig::default()
    }
}

/// Reference pixel `(x, y)` shows query pixel `(x + 7, y + 5)`.
fn consistent_fraction(pairs: &[(Keypoint, Keypoint)]) -> f32 {
    let consistent = pairs
        .iter()
        .filter(|(q, r)| {
            (q.x - r.x - SHIFT.0 as f32).abs() <= 1.0 && (q.y - r.y - SHIFT.1 as f32).abs() <= 1.0
        })
        .count();
    consistent as f32 / pairs.len() as f32
}

#[test]
fn shifted_crops_match_with_brief() {
    let scene = textured_scene(160, 160, 99);
    let full = ImageView::from_slice(&scene, 160, 160).unwrap();
    let query = full.roi(0, 0, 120, 120).unwrap();
    let reference = full.roi(SHIFT.0, SHIFT.1, 120, 120).unwrap();

    let pipeline = FeaturePipeline::new(
        CornerDetector::new(CornerConfig::default()).unwrap(),
        BriefExtractor::new(BriefConfig::default()).unwrap(),
        skip_border(),
    );
    let matcher = BruteForceMatcher::new(MatchConfig::default());
    let result = pipeline.match_images(query, reference, &matcher).unwrap();

    assert!(!result.query.is_empty());
    assert_eq!(result.query.keypoints.len(), result.query.descriptors.len());
    assert!(result.matches.len() >= 10, "only {} matches", result.matches.len());

    let pairs: Vec<(Keypoint, Keypoint)> = result
        .matches
        .iter()
        .map(|m| {
            (
                result.query.keypoints[m.query_idx],
                result.reference.keypoints[m.reference_idx],
            )
        })
        .collect();
    assert!(consistent_fraction(&pairs) >= 0.8);

    let close = result.matches.iter().filter(|m| m.distance <= 8.0).count();
    assert!(close >= 10);
}

#[test]
fn shifted_crops_match_with_histograms() {
    let scene = textured_scene(160, 160, 5);
    let full = ImageView::from_slice(&scene, 160, 160).unwrap();
    let query = full.roi(0, 0, 120, 120).unwrap();
    let reference = full.roi(SHIFT.0, SHIFT.1, 120, 120).unwrap();

    let pipeline = FeaturePipeline::new(
        CornerDetector::new(CornerConfig::default()).unwrap(),
        HistogramExtractor::new(HistogramConfig::default()).unwrap(),
        skip_border(),
    );
    let matcher = BruteForceMatcher::new(MatchConfig {
        metric: Metric::L2,
        ..MatchConfig::default()
    });
    let result = pipeline.match_images(query, reference, &matcher).unwrap();
    assert!(result.matches.len() >= 10, "only {} matches", result.matches.len());

    let pairs: Vec<(Keypoint, Keypoint)> = result
        .matches
        .iter()
        .map(|m| {
            (
                result.query.keypoints[m.query_idx],
                result.reference.keypoints[m.reference_idx],
            )
        })
        .collect();
    assert!(consistent_fraction(&pairs) >= 0.8);
}

#[test]
fn flat_image_produces_no_features() {
    let data = vec![90u8; 100 * 100];
    let view = ImageView::from_slice(&data, 100, 100).unwrap();
    let pipeline = FeaturePipeline::new(
        CornerDetector::new(CornerConfig::default()).unwrap(),
        BriefExtractor::new(BriefConfig::default()).unwrap(),
        ExtractConfig::default(),
    );
    let features = pipeline.detect_and_compute(view).unwrap();
    assert!(features.is_empty());

    let matcher = BruteForceMatcher::new(MatchConfig::default());
    let result = pipeline.match_images(view, view, &matcher).unwrap();
    assert!(result.matches.is_empty());
}

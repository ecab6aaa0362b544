use featscan::{
    detect_multiscale, extract_features, BorderPolicy, BriefConfig, BriefExtractor,
    BruteForceMatcher, CornerConfig, CornerDetector, DescriptorMatcher, ExtractConfig, HogConfig,
    HogDescriptor, ImageView, KeypointDetector, LinearClassifier, MatchConfig, NmsConfig,
    ScanConfig,
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

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

fn bench_features(c: &mut Criterion) {
    let (width, height) = (512, 512);
    let image = make_image(width, height);
    let view = ImageView::from_slice(&image, width, height).unwrap();
    let shifted = view.roi(9, 4, 480, 480).unwrap();
    let base = view.roi(0, 0, 480, 480).unwrap();

    let detector = CornerDetector::new(CornerConfig::default()).unwrap();
    let brief = BriefExtractor::new(BriefConfig::default()).unwrap();
    let extract = ExtractConfig {
        border: BorderPolicy::Skip,
        ..ExtractConfig::default()
    };

    c.bench_function("corner_detect_512", |b| {
        b.iter(|| black_box(detector.detect(view).unwrap()));
    });

    let keypoints = detector.detect(view).unwrap();
    c.bench_function("brief_extract_512", |b| {
        b.iter(|| black_box(extract_features(view, &keypoints, &brief, extract).unwrap()));
    });

    let query_kps = detector.detect(base).unwrap();
    let reference_kps = detector.detect(shifted).unwrap();
    let query = extract_features(base, &query_kps, &brief, extract).unwrap();
    let reference = extract_features(shifted, &reference_kps, &brief, extract).unwrap();
    let matcher = BruteForceMatcher::new(MatchConfig::default());
    c.bench_function("brute_force_cross_check", |b| {
        b.iter(|| {
            black_box(
                matcher
                    .match_descriptors(&query.descriptors, &reference.descriptors)
                    .unwrap(),
            )
        });
    });
}

fn bench_detection(c: &mut Criterion) {
    let (width, height) = (320, 240);
    let image = make_image(width, height);
    let view = ImageView::from_slice(&image, width, height).unwrap();

    let hog = HogDescriptor::new(HogConfig::default(), (64, 128)).unwrap();
    let weights: Vec<f32> = (0..hog.feature_len())
        .map(|i| if i % 2 == 0 { 0.01 } else { -0.01 })
        .collect();
    let classifier = LinearClassifier::new(hog, weights, 0.0).unwrap();
    let scan = ScanConfig::default();
    let nms = NmsConfig::default();

    c.bench_function("hog_detect_multiscale_320x240", |b| {
        b.iter(|| black_box(detect_multiscale(view, &classifier, &scan, &nms).unwrap()));
    });
}

criterion_group!(benches, bench_features, bench_detection);
criterion_main!(benches);

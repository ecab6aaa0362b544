//! FeatScan is a CPU-first library for local image features and multi-scale
//! window detection.
//!
//! The feature side runs a structure-tensor corner detector, extracts binary
//! (Hamming) or gradient-histogram (L2) descriptors and matches them with a
//! brute-force matcher that can enforce mutual best matches. The detection
//! side slides a fixed window over a scale pyramid, scores each window and
//! suppresses overlapping boxes. Optional features add rayon parallelism,
//! SIMD distance kernels, `image` crate adapters, `tracing` spans and serde
//! configuration.

mod candidate;
pub mod corner;
pub mod descriptor;
pub mod detect;
pub mod image;
pub mod keypoint;
pub mod lowlevel;
pub mod matching;
pub mod pipeline;
mod trace;
pub mod util;

pub use corner::{
    CornerConfig, CornerDetector, KeypointDetector, OrientationMethod, PyramidConfig,
    PyramidDetector, ResponseKind, SelectorConfig,
};
pub use descriptor::{
    extract_features, BorderPolicy, BriefConfig, BriefExtractor, Descriptor, DescriptorExtractor,
    DescriptorSet, ExtractConfig, Features, HistogramConfig, HistogramExtractor, Metric,
    OwnedDescriptor,
};
pub use detect::{
    detect_multiscale, nms_boxes, DetectionWindow, HogConfig, HogDescriptor, LinearClassifier,
    NmsConfig, ScanConfig, ScanState, WindowScanner, WindowScorer,
};
pub use image::pyramid::ImagePyramid;
pub use image::{ImageBuffer, ImageView, OwnedImage, Pixel};
pub use keypoint::Keypoint;
pub use matching::{BruteForceMatcher, DescriptorMatcher, Match, MatchConfig};
pub use pipeline::{FeaturePipeline, ImageMatches};
pub use util::{FeatScanError, FeatScanResult};

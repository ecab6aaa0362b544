//! Detector, extractor and matcher wired into one call.

use crate::corner::KeypointDetector;
use crate::descriptor::{extract_features, DescriptorExtractor, ExtractConfig, Features};
use crate::image::{ImageView, OwnedImage, Pixel};
use crate::matching::{DescriptorMatcher, Match};
use crate::trace::{trace_event, trace_span};
use crate::util::FeatScanResult;

/// Feature pipeline: detect keypoints, then describe them.
#[derive(Clone, Debug)]
pub struct FeaturePipeline<D, E> {
    detector: D,
    extractor: E,
    extract: ExtractConfig,
}

/// Features of two images and the matches between them.
#[derive(Clone, Debug)]
pub struct ImageMatches {
    /// Features of the query image.
    pub query: Features,
    /// Features of the reference image.
    pub reference: Features,
    /// Matches indexing into `query` and `reference`, best first.
    pub matches: Vec<Match>,
}

impl<D, E> FeaturePipeline<D, E>
where
    D: KeypointDetector,
    E: DescriptorExtractor + Sync,
{
    /// Creates a pipeline from its stages.
    pub fn new(detector: D, extractor: E, extract: ExtractConfig) -> Self {
        Self {
            detector,
            extractor,
            extract,
        }
    }

    /// Returns the keypoint detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Returns the descriptor extractor.
    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Detects keypoints on `image` and extracts their descriptors.
    pub fn detect_and_compute<T: Pixel>(&self, image: ImageView<'_, T>) -> FeatScanResult<Features> {
        let _span = trace_span!(
            "detect_and_compute",
            width = image.width(),
            height = image.height()
        )
        .entered();
        let gray = OwnedImage::from_view(image)?;
        let keypoints = self.detector.detect(gray.view())?;
        let features = extract_features(gray.view(), &keypoints, &self.extractor, self.extract)?;
        trace_event!(
            "features_ready",
            keypoints = keypoints.len(),
            features = features.len()
        );
        Ok(features)
    }

    /// Runs the pipeline on both images and matches query against reference.
    pub fn match_images<T, M>(
        &self,
        query: ImageView<'_, T>,
        reference: ImageView<'_, T>,
        matcher: &M,
    ) -> FeatScanResult<ImageMatches>
    where
        T: Pixel,
        M: DescriptorMatcher + ?Sized,
    {
        let query = self.detect_and_compute(query)?;
        let reference = self.detect_and_compute(reference)?;
        let matches = matcher.match_descriptors(&query.descriptors, &reference.descriptors)?;
        Ok(ImageMatches {
            query,
            reference,
            matches,
        })
    }
}

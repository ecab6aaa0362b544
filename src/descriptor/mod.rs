//! Descriptor extraction.
//!
//! A [`DescriptorExtractor`] turns a keypoint and its surrounding patch into
//! a fixed-length signature. Binary extractors pack intensity comparisons
//! into bytes and are compared under Hamming distance; histogram extractors
//! produce `f32` vectors compared under L2. Patches that leave the image are
//! handled by an explicit [`BorderPolicy`].

mod brief;
mod histogram;

pub use brief::{BriefConfig, BriefExtractor};
pub use histogram::{HistogramConfig, HistogramExtractor};

use crate::image::{ImageView, OwnedImage};
use crate::keypoint::Keypoint;
use crate::trace::{trace_event, trace_span};
use crate::util::{FeatScanError, FeatScanResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Distance a descriptor must be compared under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Metric {
    /// Number of differing bits between byte strings.
    Hamming,
    /// Euclidean distance between float vectors.
    L2,
}

/// What to do when a sampling patch reads outside the image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BorderPolicy {
    /// Return `PatchOutOfBounds`.
    #[default]
    Fail,
    /// Drop the keypoint from the output.
    Skip,
    /// Sample with replicated edge pixels.
    Clamp,
}

/// Borrowed descriptor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Descriptor<'a> {
    /// Packed bits, Hamming metric.
    Binary(&'a [u8]),
    /// Float vector, L2 metric.
    Float(&'a [f32]),
}

impl Descriptor<'_> {
    /// Returns the metric this descriptor is compared under.
    pub fn metric(&self) -> Metric {
        match self {
            Descriptor::Binary(_) => Metric::Hamming,
            Descriptor::Float(_) => Metric::L2,
        }
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        match self {
            Descriptor::Binary(d) => d.len(),
            Descriptor::Float(d) => d.len(),
        }
    }

    /// Returns true for a zero-length descriptor.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owned descriptor produced by a single extraction.
#[derive(Clone, Debug, PartialEq)]
pub enum OwnedDescriptor {
    /// Packed bits, Hamming metric.
    Binary(Vec<u8>),
    /// Float vector, L2 metric.
    Float(Vec<f32>),
}

impl OwnedDescriptor {
    /// Borrows the descriptor.
    pub fn as_descriptor(&self) -> Descriptor<'_> {
        match self {
            OwnedDescriptor::Binary(d) => Descriptor::Binary(d),
            OwnedDescriptor::Float(d) => Descriptor::Float(d),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Storage {
    Binary(Vec<u8>),
    Float(Vec<f32>),
}

/// Descriptors of equal length and metric in one flat buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct DescriptorSet {
    storage: Storage,
    descriptor_len: usize,
}

impl DescriptorSet {
    /// Wraps packed binary descriptors of `descriptor_len` bytes each.
    pub fn binary(descriptor_len: usize, data: Vec<u8>) -> FeatScanResult<Self> {
        check_layout(descriptor_len, data.len())?;
        Ok(Self {
            storage: Storage::Binary(data),
            descriptor_len,
        })
    }

    /// Wraps float descriptors of `descriptor_len` values each.
    pub fn float(descriptor_len: usize, data: Vec<f32>) -> FeatScanResult<Self> {
        check_layout(descriptor_len, data.len())?;
        Ok(Self {
            storage: Storage::Float(data),
            descriptor_len,
        })
    }

    /// Creates an empty set for `metric`.
    pub fn empty(metric: Metric, descriptor_len: usize) -> Self {
        let storage = match metric {
            Metric::Hamming => Storage::Binary(Vec::new()),
            Metric::L2 => Storage::Float(Vec::new()),
        };
        Self {
            storage,
            descriptor_len,
        }
    }

    /// Returns the shared metric.
    pub fn metric(&self) -> Metric {
        match self.storage {
            Storage::Binary(_) => Metric::Hamming,
            Storage::Float(_) => Metric::L2,
        }
    }

    /// Returns the element count of each descriptor.
    pub fn descriptor_len(&self) -> usize {
        self.descriptor_len
    }

    /// Returns the number of descriptors.
    pub fn len(&self) -> usize {
        if self.descriptor_len == 0 {
            return 0;
        }
        match &self.storage {
            Storage::Binary(d) => d.len() / self.descriptor_len,
            Storage::Float(d) => d.len() / self.descriptor_len,
        }
    }

    /// Returns true when the set holds no descriptors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns descriptor `index`.
    pub fn get(&self, index: usize) -> Option<Descriptor<'_>> {
        if index >= self.len() {
            return None;
        }
        let start = index * self.descriptor_len;
        let end = start + self.descriptor_len;
        Some(match &self.storage {
            Storage::Binary(d) => Descriptor::Binary(&d[start..end]),
            Storage::Float(d) => Descriptor::Float(&d[start..end]),
        })
    }

    /// Iterates over descriptors in index order.
    pub fn iter(&self) -> impl Iterator<Item = Descriptor<'_>> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Appends one descriptor, checking metric and length.
    pub fn push(&mut self, descriptor: Descriptor<'_>) -> FeatScanResult<()> {
        if descriptor.len() != self.descriptor_len {
            return Err(FeatScanError::IncompatibleDescriptors {
                reason: "descriptor length differs from the set",
            });
        }
        match (&mut self.storage, descriptor) {
            (Storage::Binary(data), Descriptor::Binary(d)) => data.extend_from_slice(d),
            (Storage::Float(data), Descriptor::Float(d)) => data.extend_from_slice(d),
            _ => {
                return Err(FeatScanError::IncompatibleDescriptors {
                    reason: "descriptor metric differs from the set",
                })
            }
        }
        Ok(())
    }

    /// Fails unless both sets share metric and descriptor length.
    pub fn check_compatible(&self, other: &DescriptorSet) -> FeatScanResult<()> {
        if self.metric() != other.metric() {
            return Err(FeatScanError::IncompatibleDescriptors {
                reason: "descriptor metrics differ",
            });
        }
        if self.descriptor_len != other.descriptor_len {
            return Err(FeatScanError::IncompatibleDescriptors {
                reason: "descriptor lengths differ",
            });
        }
        Ok(())
    }
}

fn check_layout(descriptor_len: usize, data_len: usize) -> FeatScanResult<()> {
    if descriptor_len == 0 {
        return Err(FeatScanError::InvalidParameter {
            name: "descriptor_len",
            reason: "must be at least 1",
        });
    }
    if data_len % descriptor_len != 0 {
        return Err(FeatScanError::InvalidInput(
            "descriptor data is not a multiple of the descriptor length",
        ));
    }
    Ok(())
}

/// Extraction capability shared by binary and histogram descriptors.
pub trait DescriptorExtractor {
    /// Metric every descriptor from this extractor uses.
    fn metric(&self) -> Metric;

    /// Element count of every descriptor from this extractor.
    fn descriptor_len(&self) -> usize;

    /// Radius around the keypoint that sampling may touch.
    fn patch_radius(&self, kp: &Keypoint) -> f32;

    /// Image the extractor samples from, e.g. a smoothed copy.
    fn prepare(&self, image: ImageView<'_, f32>) -> FeatScanResult<OwnedImage<f32>> {
        OwnedImage::from_view(image)
    }

    /// Computes a descriptor from a prepared image, replicating edge pixels
    /// wherever the patch leaves it.
    fn compute(&self, prepared: ImageView<'_, f32>, kp: &Keypoint) -> OwnedDescriptor;

    /// Computes a descriptor honouring `border`; `Ok(None)` means skipped.
    fn extract(
        &self,
        prepared: ImageView<'_, f32>,
        kp: &Keypoint,
        border: BorderPolicy,
    ) -> FeatScanResult<Option<OwnedDescriptor>> {
        let radius = self.patch_radius(kp);
        if border != BorderPolicy::Clamp && !patch_fits(prepared, kp, radius) {
            return match border {
                BorderPolicy::Skip => Ok(None),
                _ => Err(FeatScanError::PatchOutOfBounds {
                    x: kp.x,
                    y: kp.y,
                    radius,
                    img_width: prepared.width(),
                    img_height: prepared.height(),
                }),
            };
        }
        Ok(Some(self.compute(prepared, kp)))
    }
}

/// True when a disc of `radius` around the keypoint lies inside the image.
pub fn patch_fits<T>(image: ImageView<'_, T>, kp: &Keypoint, radius: f32) -> bool {
    kp.x.is_finite()
        && kp.y.is_finite()
        && kp.x - radius >= 0.0
        && kp.y - radius >= 0.0
        && kp.x + radius <= (image.width() - 1) as f32
        && kp.y + radius <= (image.height() - 1) as f32
}

/// Per-call extraction options.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExtractConfig {
    /// Handling of patches that leave the image.
    pub border: BorderPolicy,
    /// Extract keypoints on the rayon pool when the feature is enabled.
    pub parallel: bool,
}

/// Keypoints and their descriptors, index aligned.
#[derive(Clone, Debug, PartialEq)]
pub struct Features {
    /// Keypoints that produced a descriptor, in input order.
    pub keypoints: Vec<Keypoint>,
    /// One descriptor per keypoint.
    pub descriptors: DescriptorSet,
}

impl Features {
    /// Returns the number of features.
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    /// Returns true when no feature survived.
    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Extracts descriptors for every keypoint.
///
/// Results keep the input keypoint order. With [`BorderPolicy::Skip`] the
/// keypoints whose patch leaves the image are dropped together with their
/// descriptor; with [`BorderPolicy::Fail`] the first such keypoint in input
/// order aborts the call.
pub fn extract_features<E>(
    image: ImageView<'_, f32>,
    keypoints: &[Keypoint],
    extractor: &E,
    cfg: ExtractConfig,
) -> FeatScanResult<Features>
where
    E: DescriptorExtractor + Sync + ?Sized,
{
    let _span = trace_span!(
        "extract_descriptors",
        keypoints = keypoints.len(),
        parallel = cfg.parallel
    )
    .entered();

    let prepared = extractor.prepare(image)?;
    let prepared = prepared.view();
    let slots = extract_slots(prepared, keypoints, extractor, cfg);

    let mut kept = Vec::with_capacity(keypoints.len());
    let mut descriptors = DescriptorSet::empty(extractor.metric(), extractor.descriptor_len());
    for (kp, slot) in keypoints.iter().zip(slots) {
        if let Some(descriptor) = slot? {
            descriptors.push(descriptor.as_descriptor())?;
            kept.push(*kp);
        }
    }

    trace_event!(
        "descriptors_extracted",
        count = kept.len(),
        skipped = keypoints.len() - kept.len()
    );
    Ok(Features {
        keypoints: kept,
        descriptors,
    })
}

type Slot = FeatScanResult<Option<OwnedDescriptor>>;

fn extract_slots<E>(
    prepared: ImageView<'_, f32>,
    keypoints: &[Keypoint],
    extractor: &E,
    cfg: ExtractConfig,
) -> Vec<Slot>
where
    E: DescriptorExtractor + Sync + ?Sized,
{
    #[cfg(feature = "rayon")]
    if cfg.parallel {
        return keypoints
            .par_iter()
            .map(|kp| extractor.extract(prepared, kp, cfg.border))
            .collect();
    }

    keypoints
        .iter()
        .map(|kp| extractor.extract(prepared, kp, cfg.border))
        .collect()
}

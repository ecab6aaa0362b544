//! Low-level building blocks for custom feature pipelines.
//!
//! These functions expose the individual stages behind [`CornerDetector`],
//! the descriptor extractors and [`WindowScanner`]. Most users should prefer
//! the top-level detector, extractor and matcher types.
//!
//! [`CornerDetector`]: crate::CornerDetector
//! [`WindowScanner`]: crate::WindowScanner

pub use crate::candidate::topk::{Peak, TopK};
pub use crate::corner::{assign_orientations, corner_response, estimate_orientation, select_keypoints};
pub use crate::descriptor::patch_fits;
pub use crate::image::filter::box_blur;
pub use crate::image::gradient::sobel_gradients;
pub use crate::image::pyramid::PyramidLevel;
pub use crate::image::resize::resize_bilinear;
pub use crate::matching::distance::{descriptor_distance, hamming, l2, l2_squared};
pub use crate::matching::sort_matches;

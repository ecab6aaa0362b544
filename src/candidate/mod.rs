//! Candidate selection and pruning utilities.
//!
//! Includes deterministic peak ordering, Top-K collection and spatial
//! minimum-distance suppression.

pub(crate) mod nms;
pub(crate) mod topk;

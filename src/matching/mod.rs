//! Brute-force descriptor matching.
//!
//! Every query descriptor is compared against every reference descriptor
//! (`O(|A| |B| len)`). Best matches break distance ties toward the lower
//! index. Returned match lists are sorted by ascending distance, then query
//! index, then reference index.

pub mod distance;
#[cfg(feature = "simd")]
pub(crate) mod simd;

use crate::descriptor::{Descriptor, DescriptorSet, Metric};
use crate::trace::{trace_event, trace_span};
use crate::util::{FeatScanError, FeatScanResult};
use distance::descriptor_distance;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::cmp::Ordering;

/// Correspondence between a query and a reference descriptor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    /// Index into the query set.
    pub query_idx: usize,
    /// Index into the reference set.
    pub reference_idx: usize,
    /// Distance under the sets' metric; lower is better.
    pub distance: f32,
}

/// Ascending distance, then query index, then reference index.
pub(crate) fn match_cmp(a: &Match, b: &Match) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.query_idx.cmp(&b.query_idx))
        .then_with(|| a.reference_idx.cmp(&b.reference_idx))
}

/// Sorts matches best first with deterministic tie-breaking.
pub fn sort_matches(matches: &mut [Match]) {
    matches.sort_by(match_cmp);
}

/// Matcher parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatchConfig {
    /// Metric both descriptor sets must use.
    pub metric: Metric,
    /// Keep only mutual best matches.
    pub cross_check: bool,
    /// Compare queries on the rayon pool when the feature is enabled.
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Hamming,
            cross_check: true,
            parallel: false,
        }
    }
}

/// Matching capability over two descriptor sets.
pub trait DescriptorMatcher {
    /// Returns matches sorted best first.
    fn match_descriptors(
        &self,
        query: &DescriptorSet,
        reference: &DescriptorSet,
    ) -> FeatScanResult<Vec<Match>>;
}

/// Exhaustive matcher.
#[derive(Clone, Debug, Default)]
pub struct BruteForceMatcher {
    cfg: MatchConfig,
}

impl BruteForceMatcher {
    /// Creates a matcher with `cfg`.
    pub fn new(cfg: MatchConfig) -> Self {
        Self { cfg }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    fn check_sets(&self, query: &DescriptorSet, reference: &DescriptorSet) -> FeatScanResult<()> {
        if query.metric() != self.cfg.metric {
            return Err(FeatScanError::IncompatibleDescriptors {
                reason: "query metric differs from the matcher metric",
            });
        }
        query.check_compatible(reference)
    }

    /// Returns up to `k` nearest references for every query, each list
    /// sorted best first, lists in query order. Cross-check is not applied.
    pub fn knn_match(
        &self,
        query: &DescriptorSet,
        reference: &DescriptorSet,
        k: usize,
    ) -> FeatScanResult<Vec<Vec<Match>>> {
        self.check_sets(query, reference)?;
        let _span = trace_span!("knn_match", queries = query.len(), k = k).entered();
        if k == 0 {
            return Ok(vec![Vec::new(); query.len()]);
        }
        map_indices(query.len(), self.cfg.parallel, |i| {
            let q = query.get(i).expect("query index in range");
            let mut row = Vec::with_capacity(reference.len());
            for (j, r) in reference.iter().enumerate() {
                row.push(Match {
                    query_idx: i,
                    reference_idx: j,
                    distance: descriptor_distance(q, r)?,
                });
            }
            row.sort_by(match_cmp);
            row.truncate(k);
            Ok(row)
        })
    }

    /// Lowe's ratio test: keeps the nearest reference when its distance is
    /// below `ratio` times the second nearest. A query with a single
    /// candidate keeps it.
    pub fn ratio_test(
        &self,
        query: &DescriptorSet,
        reference: &DescriptorSet,
        ratio: f32,
    ) -> FeatScanResult<Vec<Match>> {
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(FeatScanError::InvalidParameter {
                name: "ratio",
                reason: "must be in (0, 1]",
            });
        }
        let knn = self.knn_match(query, reference, 2)?;
        let mut out: Vec<Match> = knn
            .into_iter()
            .filter_map(|row| match row.as_slice() {
                [best] => Some(*best),
                [best, second] if best.distance < ratio * second.distance => Some(*best),
                _ => None,
            })
            .collect();
        sort_matches(&mut out);
        trace_event!("ratio_matches", count = out.len());
        Ok(out)
    }
}

impl DescriptorMatcher for BruteForceMatcher {
    fn match_descriptors(
        &self,
        query: &DescriptorSet,
        reference: &DescriptorSet,
    ) -> FeatScanResult<Vec<Match>> {
        self.check_sets(query, reference)?;
        let _span = trace_span!(
            "match_descriptors",
            queries = query.len(),
            references = reference.len(),
            cross_check = self.cfg.cross_check
        )
        .entered();

        if query.is_empty() || reference.is_empty() {
            trace_event!("matches", count = 0usize);
            return Ok(Vec::new());
        }

        let forward = best_matches(query, reference, self.cfg.parallel)?;
        let mut matches: Vec<Match> = if self.cfg.cross_check {
            let backward = best_matches(reference, query, self.cfg.parallel)?;
            forward
                .into_iter()
                .enumerate()
                .filter_map(|(i, (j, distance))| {
                    (backward[j].0 == i).then_some(Match {
                        query_idx: i,
                        reference_idx: j,
                        distance,
                    })
                })
                .collect()
        } else {
            forward
                .into_iter()
                .enumerate()
                .map(|(i, (j, distance))| Match {
                    query_idx: i,
                    reference_idx: j,
                    distance,
                })
                .collect()
        };

        sort_matches(&mut matches);
        trace_event!("matches", count = matches.len());
        Ok(matches)
    }
}

/// For every descriptor in `from`, the index and distance of its nearest
/// descriptor in `to`; ties keep the lower index. `to` must be non-empty.
fn best_matches(
    from: &DescriptorSet,
    to: &DescriptorSet,
    parallel: bool,
) -> FeatScanResult<Vec<(usize, f32)>> {
    map_indices(from.len(), parallel, |i| {
        let q = from.get(i).expect("index in range");
        nearest(q, to)
    })
}

fn nearest(q: Descriptor<'_>, to: &DescriptorSet) -> FeatScanResult<(usize, f32)> {
    let mut best = (0usize, f32::INFINITY);
    for (j, r) in to.iter().enumerate() {
        let d = descriptor_distance(q, r)?;
        if d < best.1 {
            best = (j, d);
        }
    }
    Ok(best)
}

/// Evaluates `f` for `0..n`, in parallel when requested and available;
/// results keep index order.
fn map_indices<T, F>(n: usize, parallel: bool, f: F) -> FeatScanResult<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> FeatScanResult<T> + Sync + Send,
{
    #[cfg(feature = "rayon")]
    if parallel {
        return (0..n).into_par_iter().map(f).collect();
    }
    #[cfg(not(feature = "rayon"))]
    let _ = parallel;

    (0..n).map(f).collect()
}

//! Greedy minimum-distance suppression for response peaks.

use crate::candidate::topk::{sort_peaks_desc, Peak};

/// Keeps peaks in descending score order, rejecting any peak whose Euclidean
/// distance to an already kept peak is below `min_distance`.
///
/// Stops once `limit` peaks are kept; `limit == 0` means no limit.
pub(crate) fn suppress_min_distance(peaks: &mut [Peak], min_distance: f32, limit: usize) -> Vec<Peak> {
    sort_peaks_desc(peaks);
    let limit = if limit == 0 { usize::MAX } else { limit };
    let min_dist_sq = min_distance * min_distance;
    let mut kept: Vec<Peak> = Vec::new();

    'outer: for peak in peaks.iter().copied() {
        if kept.len() >= limit {
            break;
        }
        if min_distance > 0.0 {
            for kept_peak in kept.iter() {
                let dx = peak.x as f32 - kept_peak.x as f32;
                let dy = peak.y as f32 - kept_peak.y as f32;
                if dx * dx + dy * dy < min_dist_sq {
                    continue 'outer;
                }
            }
        }
        kept.push(peak);
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::suppress_min_distance;
    use crate::candidate::topk::Peak;

    #[test]
    fn weaker_neighbour_is_rejected() {
        let mut peaks = vec![
            Peak { x: 10, y: 10, score: 1.0 },
            Peak { x: 12, y: 10, score: 2.0 },
            Peak { x: 30, y: 10, score: 0.5 },
        ];
        let kept = suppress_min_distance(&mut peaks, 5.0, 0);
        assert_eq!(kept.len(), 2);
        assert_eq!((kept[0].x, kept[1].x), (12, 30));
    }

    #[test]
    fn limit_truncates_in_rank_order() {
        let mut peaks: Vec<Peak> = (0..10)
            .map(|i| Peak { x: i * 10, y: 0, score: i as f32 })
            .collect();
        let kept = suppress_min_distance(&mut peaks, 1.0, 3);
        let xs: Vec<_> = kept.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![90, 80, 70]);
    }
}

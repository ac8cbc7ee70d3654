//! Integer allocation of a deposit across weighted bins
//!
//! Uses largest-remainder apportionment: every bin gets the floor of its
//! proportional share, then the leftover units go one each to the bins with
//! the largest fractional parts. Ties go to the lower index, i.e. the left
//! side first and, within a side, the bin nearest the active bin.

use log::{debug, warn};
use std::cmp::Ordering;

use crate::error::{PreviewError, Result};
use crate::types::{AllocationConstraints, AllocationResult, ShapeSpec};

pub const WARN_NO_BINS: &str = "no bins requested";
pub const WARN_ALL_WEIGHTS_ZERO: &str = "all weights are zero";
pub const WARN_BELOW_MIN_PER_BIN: &str = "one or more bins below min_per_bin";
pub const WARN_EXCEEDS_MAX_BINS: &str = "bins_touched exceeds max_bins";

/// Split `total_amount` across the left and right bins in proportion to their weights.
///
/// Constraints are advisory: they can add warnings but never change the amounts.
pub fn allocate(
    total_amount: i64,
    left_weights: &[f64],
    right_weights: &[f64],
    constraints: &AllocationConstraints,
) -> Result<AllocationResult> {
    if total_amount < 0 {
        return Err(PreviewError::invalid("total_amount must be non-negative"));
    }
    if constraints.min_per_bin < 0 {
        return Err(PreviewError::invalid("min_per_bin must be non-negative"));
    }
    let total = total_amount as u64;

    let split = left_weights.len();
    let weights: Vec<f64> = left_weights.iter().chain(right_weights).copied().collect();

    if weights.iter().any(|&w| w < 0.0) {
        return Err(PreviewError::invalid("weights must be non-negative"));
    }
    if weights.iter().any(|w| !w.is_finite()) {
        return Err(PreviewError::invalid("weights must be finite"));
    }

    if weights.is_empty() {
        warn!("Allocation preview requested with no bins");
        return Ok(unallocated(total, 0, 0, WARN_NO_BINS));
    }

    let total_weight: f64 = weights.iter().sum();
    if !total_weight.is_finite() {
        return Err(PreviewError::invalid("sum of weights must be finite"));
    }
    if total_weight <= 0.0 {
        warn!("All {} bin weights are zero, nothing allocated", weights.len());
        return Ok(unallocated(
            total,
            split,
            right_weights.len(),
            WARN_ALL_WEIGHTS_ZERO,
        ));
    }

    let raw: Vec<f64> = weights
        .iter()
        .map(|w| total as f64 * w / total_weight)
        .collect();
    if raw.iter().any(|r| !r.is_finite()) {
        return Err(PreviewError::invalid("proportional share overflows"));
    }
    let mut allocations: Vec<u64> = raw.iter().map(|r| r.floor() as u64).collect();
    let fractions: Vec<f64> = raw
        .iter()
        .zip(&allocations)
        .map(|(r, &a)| r - a as f64)
        .collect();

    let floored: u64 = allocations.iter().sum();
    match floored.cmp(&total) {
        Ordering::Less => distribute_remainder(&mut allocations, &fractions, total - floored),
        Ordering::Greater => reclaim_excess(&mut allocations, &fractions, floored - total),
        Ordering::Equal => {}
    }

    let total_allocated: u64 = allocations.iter().sum();
    let bins_touched = allocations.iter().filter(|&&a| a > 0).count();

    let mut warnings = Vec::new();
    let min_per_bin = constraints.min_per_bin as u64;
    if min_per_bin > 0 && allocations.iter().any(|&a| a > 0 && a < min_per_bin) {
        warn!("Allocation leaves bins below min_per_bin {}", min_per_bin);
        warnings.push(WARN_BELOW_MIN_PER_BIN.to_string());
    }
    if let Some(max_bins) = constraints.max_bins {
        if bins_touched > max_bins {
            warn!(
                "Allocation touches {} bins, above max_bins {}",
                bins_touched, max_bins
            );
            warnings.push(WARN_EXCEEDS_MAX_BINS.to_string());
        }
    }

    let right = allocations.split_off(split);
    let left = allocations;

    Ok(AllocationResult {
        left,
        right,
        total_allocated,
        remainder: total - total_allocated,
        bins_touched,
        warnings,
    })
}

/// Generate weights for both sides and allocate across them.
pub fn preview_from_shapes(
    total_amount: i64,
    left: &ShapeSpec,
    right: &ShapeSpec,
    constraints: &AllocationConstraints,
) -> Result<AllocationResult> {
    let left_weights = left.weights()?;
    let right_weights = right.weights()?;
    debug!(
        "Previewing {} over {} {} bins left and {} {} bins right",
        total_amount,
        left_weights.len(),
        left.family,
        right_weights.len(),
        right.family
    );

    allocate(total_amount, &left_weights, &right_weights, constraints)
}

fn unallocated(total: u64, left_len: usize, right_len: usize, warning: &str) -> AllocationResult {
    AllocationResult {
        left: vec![0; left_len],
        right: vec![0; right_len],
        total_allocated: 0,
        remainder: total,
        bins_touched: 0,
        warnings: vec![warning.to_string()],
    }
}

/// Hand out `remainder` single units, largest fraction first, lower index on ties.
fn distribute_remainder(allocations: &mut [u64], fractions: &[f64], remainder: u64) {
    let mut order: Vec<usize> = (0..allocations.len()).collect();
    order.sort_by(|&a, &b| fractions[b].total_cmp(&fractions[a]).then(a.cmp(&b)));

    debug!("Distributing remainder of {} units", remainder);
    // Flooring leaves fewer units than bins; full rounds only happen if rounding drifted.
    let bins = order.len() as u64;
    let rounds = remainder / bins;
    if rounds > 0 {
        allocations.iter_mut().for_each(|a| *a += rounds);
    }
    for &index in order.iter().take((remainder % bins) as usize) {
        allocations[index] += 1;
    }
}

/// Undo floating-point overshoot, smallest fraction first, higher index on ties.
fn reclaim_excess(allocations: &mut [u64], fractions: &[f64], mut excess: u64) {
    let mut order: Vec<usize> = (0..allocations.len()).collect();
    order.sort_by(|&a, &b| fractions[a].total_cmp(&fractions[b]).then(b.cmp(&a)));

    debug!("Reclaiming {} units of rounding overshoot", excess);
    while excess > 0 {
        let before = excess;
        for &index in &order {
            if excess == 0 {
                break;
            }
            if allocations[index] > 0 {
                allocations[index] -= 1;
                excess -= 1;
            }
        }
        if excess == before {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ShapeFamily, ShapeParams};

    fn unconstrained() -> AllocationConstraints {
        AllocationConstraints::default()
    }

    #[test]
    fn test_remainder_goes_to_nearest_bin() {
        let result = allocate(10, &[1.0, 1.0], &[1.0], &unconstrained()).unwrap();

        assert_eq!(result.left, vec![4, 3]);
        assert_eq!(result.right, vec![3]);
        assert_eq!(result.total_allocated, 10);
        assert_eq!(result.remainder, 0);
        assert_eq!(result.bins_touched, 3);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_largest_fraction_wins_over_index() {
        // Shares are 1.4, 2.8, 2.8 with 2 units left over after flooring.
        let result = allocate(7, &[1.0], &[2.0, 2.0], &unconstrained()).unwrap();

        assert_eq!(result.left, vec![1]);
        assert_eq!(result.right, vec![3, 3]);
        assert_eq!(result.remainder, 0);
    }

    #[test]
    fn test_exact_shares_need_no_remainder() {
        let result = allocate(100, &[1.0, 3.0], &[4.0, 2.0], &unconstrained()).unwrap();

        assert_eq!(result.left, vec![10, 30]);
        assert_eq!(result.right, vec![40, 20]);
        assert_eq!(result.total_allocated, 100);
    }

    #[test]
    fn test_min_per_bin_warning() {
        let result = allocate(3, &[1.0, 1.0], &[1.0], &AllocationConstraints::new(2, None)).unwrap();

        assert_eq!(result.total_allocated, 3);
        assert_eq!(result.warnings, vec![WARN_BELOW_MIN_PER_BIN.to_string()]);
    }

    #[test]
    fn test_zero_bins_do_not_trigger_min_per_bin() {
        let result = allocate(10, &[1.0, 0.0], &[], &AllocationConstraints::new(5, None)).unwrap();

        assert_eq!(result.left, vec![10, 0]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_max_bins_warning() {
        let result = allocate(9, &[1.0, 1.0], &[1.0], &AllocationConstraints::new(0, Some(2))).unwrap();

        assert_eq!(result.bins_touched, 3);
        assert_eq!(result.warnings, vec![WARN_EXCEEDS_MAX_BINS.to_string()]);
        // Advisory only: the allocation is unchanged.
        assert_eq!(result.left, vec![3, 3]);
        assert_eq!(result.right, vec![3]);
    }

    #[test]
    fn test_both_warnings_in_order() {
        let result = allocate(3, &[1.0, 1.0], &[1.0], &AllocationConstraints::new(2, Some(1))).unwrap();

        assert_eq!(
            result.warnings,
            vec![
                WARN_BELOW_MIN_PER_BIN.to_string(),
                WARN_EXCEEDS_MAX_BINS.to_string()
            ]
        );
    }

    #[test]
    fn test_no_bins_requested() {
        let result = allocate(5, &[], &[], &unconstrained()).unwrap();

        assert!(result.left.is_empty());
        assert!(result.right.is_empty());
        assert_eq!(result.total_allocated, 0);
        assert_eq!(result.remainder, 5);
        assert_eq!(result.bins_touched, 0);
        assert_eq!(result.warnings, vec![WARN_NO_BINS.to_string()]);
    }

    #[test]
    fn test_all_weights_zero() {
        let result = allocate(4, &[0.0, 0.0], &[0.0], &unconstrained()).unwrap();

        assert_eq!(result.left, vec![0, 0]);
        assert_eq!(result.right, vec![0]);
        assert_eq!(result.remainder, 4);
        assert_eq!(result.bins_touched, 0);
        assert_eq!(result.warnings, vec![WARN_ALL_WEIGHTS_ZERO.to_string()]);
        assert!(!result.is_exact());
    }

    #[test]
    fn test_zero_amount() {
        let result = allocate(0, &[1.0], &[2.0], &AllocationConstraints::new(1, Some(0))).unwrap();

        assert_eq!(result.left, vec![0]);
        assert_eq!(result.right, vec![0]);
        assert_eq!(result.bins_touched, 0);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_input_validation() {
        let cases = [
            (allocate(-1, &[1.0], &[], &unconstrained()), "total_amount must be non-negative"),
            (
                allocate(1, &[1.0], &[], &AllocationConstraints::new(-1, None)),
                "min_per_bin must be non-negative",
            ),
            (allocate(1, &[1.0], &[-0.5], &unconstrained()), "weights must be non-negative"),
            (allocate(1, &[f64::NAN], &[], &unconstrained()), "weights must be finite"),
            (allocate(1, &[f64::INFINITY], &[], &unconstrained()), "weights must be finite"),
            (
                allocate(1, &[f64::MAX, f64::MAX], &[], &unconstrained()),
                "sum of weights must be finite",
            ),
        ];

        for (result, expected) in cases {
            assert_eq!(result.unwrap_err().message(), expected);
        }
    }

    #[test]
    fn test_overflowing_share_is_rejected() {
        for right in [&[][..], &[1e307][..]] {
            let err = allocate(10, &[1e308], right, &unconstrained()).unwrap_err();
            assert_eq!(err.message(), "proportional share overflows");
        }
    }

    #[test]
    fn test_distribute_remainder_wraps_in_whole_rounds() {
        let mut allocations = vec![0, 0, 0];
        distribute_remainder(&mut allocations, &[0.2, 0.9, 0.5], 7);
        assert_eq!(allocations, vec![2, 3, 2]);
    }

    #[test]
    fn test_reclaim_stops_when_nothing_is_left() {
        let mut allocations = vec![1, 0];
        reclaim_excess(&mut allocations, &[0.0, 0.0], 5);
        assert_eq!(allocations, vec![0, 0]);
    }

    #[test]
    fn test_reclaim_takes_from_smallest_fraction() {
        let mut allocations = vec![3, 2, 2];
        reclaim_excess(&mut allocations, &[0.1, 0.0, 0.0], 1);
        assert_eq!(allocations, vec![3, 2, 1]);
    }

    #[test]
    fn test_reclaim_skips_empty_bins() {
        let mut allocations = vec![0, 2];
        reclaim_excess(&mut allocations, &[0.0, 0.5], 2);
        assert_eq!(allocations, vec![0, 0]);
    }

    #[test]
    fn test_preview_from_shapes() {
        let left = ShapeSpec::new(
            ShapeFamily::Gaussian,
            2,
            ShapeParams::from([("sigma".to_string(), 1.5)]),
        );
        let right = ShapeSpec::new(
            ShapeFamily::GaussianWithEdgeBoost,
            2,
            ShapeParams::from([("sigma".to_string(), 1.5), ("edge_boost".to_string(), 1.5)]),
        );

        let result = preview_from_shapes(12, &left, &right, &unconstrained()).unwrap();

        assert_eq!(result.total_allocated, 12);
        assert_eq!(result.bins_touched, 4);
        assert_eq!(result.left.len(), 2);
        assert_eq!(result.right.len(), 2);
    }

    #[test]
    fn test_preview_from_shapes_propagates_weight_errors() {
        let left = ShapeSpec::new(ShapeFamily::Flat, 2, ShapeParams::new());
        let right = ShapeSpec::new(ShapeFamily::Exponential, 3, ShapeParams::new());

        let err = preview_from_shapes(10, &left, &right, &unconstrained()).unwrap_err();
        assert_eq!(err.message(), "exponential ratio is required");
    }
}

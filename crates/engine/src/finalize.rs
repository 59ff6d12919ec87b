//! Plan finalization.
//!
//! Merges the heuristic's and the refiner's placements into one
//! invariant-respecting list. Candidates are processed in insertion order
//! (heuristic first), so whenever the refiner proposes an alternative that
//! collides with an earlier seat, the earlier seat wins.

use std::collections::HashMap;

use cutplan_core::{
    fits_within, overlaps, CuttingPlan, OptimizationSettings, Piece, PlacedPiece, ResourceSample,
    Stock,
};

/// Resolves conflicts among candidate placements.
///
/// A candidate is accepted when its piece still has quota left, it lies
/// within its stock instance, and it does not overlap any placement already
/// accepted on that instance (edge contact is fine). Returns the accepted
/// placements plus warnings for candidates that violated a geometric
/// invariant outright; expected cross-stage collisions are dropped
/// silently.
pub fn resolve_conflicts(
    stocks: &[Stock],
    pieces: &[Piece],
    candidates: &[PlacedPiece],
) -> (Vec<PlacedPiece>, Vec<String>) {
    let stock_by_id: HashMap<&str, &Stock> = stocks.iter().map(|s| (s.id.as_str(), s)).collect();
    let mut quota: HashMap<&str, usize> = pieces
        .iter()
        .map(|p| (p.id.as_str(), p.quantity))
        .collect();

    let mut accepted: Vec<PlacedPiece> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    for candidate in candidates {
        let Some(stock) = stock_by_id.get(candidate.stock_id.as_str()) else {
            warnings.push(format!(
                "dropped placement of '{}': unknown stock '{}'",
                candidate.piece_id, candidate.stock_id
            ));
            continue;
        };

        let remaining = match quota.get_mut(candidate.piece_id.as_str()) {
            Some(remaining) => remaining,
            None => {
                warnings.push(format!(
                    "dropped placement of unknown piece '{}'",
                    candidate.piece_id
                ));
                continue;
            }
        };
        if *remaining == 0 {
            log::debug!(
                "dropped placement of '{}': quota exhausted",
                candidate.piece_id
            );
            continue;
        }

        if candidate.stock_instance >= stock.quantity
            || !fits_within(&candidate.rect(), stock.width, stock.height)
        {
            warnings.push(format!(
                "dropped placement of '{}' at {}: outside stock '{}'",
                candidate.piece_id,
                candidate.rect(),
                stock.name
            ));
            continue;
        }

        let collides = accepted
            .iter()
            .filter(|p| p.same_instance(candidate))
            .any(|p| overlaps(&p.rect(), &candidate.rect()));
        if collides {
            log::debug!(
                "dropped placement of '{}' at {}: collides with an earlier seat",
                candidate.piece_id,
                candidate.rect()
            );
            continue;
        }

        *remaining -= 1;
        accepted.push(candidate.clone());
    }

    (accepted, warnings)
}

/// Builds the final plan from the merged stage outputs.
///
/// The returned plan satisfies every geometric invariant: its `validate()`
/// comes back empty, and running the resolution again over its placements
/// reproduces them unchanged.
pub fn finalize_plan(
    stocks: &[Stock],
    pieces: &[Piece],
    settings: &OptimizationSettings,
    candidates: &[PlacedPiece],
    duration_ms: u64,
    samples: Vec<ResourceSample>,
) -> CuttingPlan {
    let (accepted, mut warnings) = resolve_conflicts(stocks, pieces, candidates);

    let dropped = candidates.len() - accepted.len();
    if dropped > 0 {
        log::info!(
            "finalizer accepted {}/{} candidate placement(s)",
            accepted.len(),
            candidates.len()
        );
    }

    let mut plan = CuttingPlan::new(stocks, pieces, settings);
    plan.placements = accepted;
    plan.recompute_metrics();
    plan.metrics.duration_ms = duration_ms;
    plan.metrics.samples = samples;

    // The resolution above guarantees a clean audit; anything it missed is
    // a real defect, so record and drop it rather than emit a broken plan.
    let violations = plan.validate();
    if !violations.is_empty() {
        log::warn!(
            "finalized plan failed its audit ({} violation(s)); pruning",
            violations.len()
        );
        warnings.extend(violations);
        let (pruned, _) = resolve_conflicts(stocks, pieces, &plan.placements);
        plan.placements = pruned;
        plan.recompute_metrics();
        plan.metrics.duration_ms = duration_ms;
    }

    plan.warnings = warnings;
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutplan_core::Rotation;
    use approx::assert_relative_eq;

    fn fixture() -> (Vec<Stock>, Vec<Piece>) {
        let stocks = vec![Stock::new("s1", "sheet", 100.0, 100.0)];
        let pieces = vec![
            Piece::new("p1", "half", 50.0, 100.0).with_quantity(2),
            Piece::new("p2", "tile", 20.0, 20.0).with_quantity(3),
        ];
        (stocks, pieces)
    }

    fn seat(piece_id: &str, w: f64, h: f64, x: f64, y: f64) -> PlacedPiece {
        PlacedPiece::new(piece_id, w, h, x, y, Rotation::R0, "s1", 0)
    }

    #[test]
    fn test_earlier_placement_wins_conflicts() {
        let (stocks, pieces) = fixture();
        let candidates = vec![
            seat("p1", 50.0, 100.0, 0.0, 0.0),
            // Refiner alternative for the same region loses.
            seat("p2", 20.0, 20.0, 40.0, 40.0),
            seat("p2", 20.0, 20.0, 60.0, 0.0),
        ];

        let (accepted, warnings) = resolve_conflicts(&stocks, &pieces, &candidates);

        assert_eq!(accepted.len(), 2);
        assert_eq!(accepted[0].piece_id, "p1");
        assert_eq!((accepted[1].x, accepted[1].y), (60.0, 0.0));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_edge_contact_is_accepted() {
        let (stocks, pieces) = fixture();
        let candidates = vec![
            seat("p1", 50.0, 100.0, 0.0, 0.0),
            seat("p1", 50.0, 100.0, 50.0, 0.0),
        ];

        let (accepted, _) = resolve_conflicts(&stocks, &pieces, &candidates);
        assert_eq!(accepted.len(), 2);
    }

    #[test]
    fn test_quota_is_enforced() {
        let (stocks, pieces) = fixture();
        let candidates = vec![
            seat("p2", 20.0, 20.0, 0.0, 0.0),
            seat("p2", 20.0, 20.0, 20.0, 0.0),
            seat("p2", 20.0, 20.0, 40.0, 0.0),
            seat("p2", 20.0, 20.0, 60.0, 0.0),
        ];

        let (accepted, _) = resolve_conflicts(&stocks, &pieces, &candidates);
        assert_eq!(accepted.len(), 3);
    }

    #[test]
    fn test_out_of_bounds_is_dropped_with_warning() {
        let (stocks, pieces) = fixture();
        let candidates = vec![seat("p2", 20.0, 20.0, 90.0, 0.0)];

        let (accepted, warnings) = resolve_conflicts(&stocks, &pieces, &candidates);
        assert!(accepted.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("outside"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let (stocks, pieces) = fixture();
        let candidates = vec![
            seat("p1", 50.0, 100.0, 0.0, 0.0),
            seat("p2", 20.0, 20.0, 45.0, 45.0),
            seat("p2", 20.0, 20.0, 60.0, 0.0),
            seat("p2", 20.0, 20.0, 60.0, 20.0),
        ];

        let (first, _) = resolve_conflicts(&stocks, &pieces, &candidates);
        let (second, warnings) = resolve_conflicts(&stocks, &pieces, &first);

        assert_eq!(first, second);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_finalized_plan_passes_audit() {
        let (stocks, pieces) = fixture();
        let candidates = vec![
            seat("p1", 50.0, 100.0, 0.0, 0.0),
            seat("p1", 50.0, 100.0, 25.0, 0.0),
            seat("p2", 20.0, 20.0, 50.0, 0.0),
        ];

        let plan = finalize_plan(
            &stocks,
            &pieces,
            &OptimizationSettings::default(),
            &candidates,
            42,
            Vec::new(),
        );

        assert!(plan.validate().is_empty());
        assert_eq!(plan.metrics.pieces_placed, 2);
        assert_eq!(plan.metrics.pieces_remaining, 3);
        assert_eq!(plan.metrics.duration_ms, 42);
        assert_relative_eq!(plan.metrics.total_stock_area, 10_000.0);
        assert_relative_eq!(plan.metrics.total_placed_area, 5_400.0);
        assert_relative_eq!(plan.metrics.utilization_percent, 54.0);
    }

    #[test]
    fn test_metrics_counters_always_balance() {
        let (stocks, pieces) = fixture();
        let plan = finalize_plan(
            &stocks,
            &pieces,
            &OptimizationSettings::default(),
            &[],
            0,
            Vec::new(),
        );

        assert_eq!(
            plan.metrics.pieces_placed + plan.metrics.pieces_remaining,
            5
        );
        assert_eq!(plan.metrics.utilization_percent, 0.0);
    }
}

//! Cutting plan and its metrics.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use crate::geometry::overlaps;
use crate::monitor::ResourceSample;
use crate::piece::Piece;
use crate::placement::PlacedPiece;
use crate::settings::OptimizationSettings;
use crate::stock::Stock;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

static PLAN_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_plan_id() -> u64 {
    PLAN_COUNTER.fetch_add(1, Ordering::Relaxed) + 1
}

/// Aggregate metrics of a finished plan.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlanMetrics {
    /// Sum of stock area times quantity.
    pub total_stock_area: f64,

    /// Sum of placed piece areas.
    pub total_placed_area: f64,

    /// `100 · total_placed_area / total_stock_area` (0 when no stock area).
    pub utilization_percent: f64,

    /// Number of placements in the plan.
    pub pieces_placed: usize,

    /// Requested piece instances that were not placed.
    pub pieces_remaining: usize,

    /// Wall time of the optimization, in milliseconds.
    pub duration_ms: u64,

    /// Advisory resource samples captured during the run.
    pub samples: Vec<ResourceSample>,
}

/// The result of one optimization: inputs snapshot, placements and metrics.
///
/// A plan is created once per run, mutated only by the engine stages, and
/// returned whole. Plan ids come from a process-wide counter and are never
/// reused.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CuttingPlan {
    /// Process-unique identifier.
    pub id: u64,

    /// Creation time of the plan.
    pub created_at: SystemTime,

    /// Snapshot of the input stocks.
    pub stocks: Vec<Stock>,

    /// Snapshot of the input pieces.
    pub pieces: Vec<Piece>,

    /// Accepted placements.
    pub placements: Vec<PlacedPiece>,

    /// Snapshot of the settings the run used.
    pub settings: OptimizationSettings,

    /// Aggregate metrics; kept consistent by `recompute_metrics`.
    pub metrics: PlanMetrics,

    /// Non-fatal issues recorded while finalizing.
    pub warnings: Vec<String>,
}

impl CuttingPlan {
    /// Creates an empty plan over snapshots of the inputs.
    pub fn new(stocks: &[Stock], pieces: &[Piece], settings: &OptimizationSettings) -> Self {
        Self {
            id: next_plan_id(),
            created_at: SystemTime::now(),
            stocks: stocks.to_vec(),
            pieces: pieces.to_vec(),
            placements: Vec::new(),
            settings: settings.clone(),
            metrics: PlanMetrics::default(),
            warnings: Vec::new(),
        }
    }

    /// Total requested piece instances.
    pub fn total_requested(&self) -> usize {
        self.pieces.iter().map(|p| p.quantity).sum()
    }

    /// Recomputes the metric block from the current placements. The wall
    /// time and resource samples are left untouched.
    pub fn recompute_metrics(&mut self) {
        let total_stock_area: f64 = self.stocks.iter().map(|s| s.total_area()).sum();
        let total_placed_area: f64 = self.placements.iter().map(|p| p.area()).sum();

        self.metrics.total_stock_area = total_stock_area;
        self.metrics.total_placed_area = total_placed_area;
        self.metrics.utilization_percent = if total_stock_area > 0.0 {
            100.0 * total_placed_area / total_stock_area
        } else {
            0.0
        };
        self.metrics.pieces_placed = self.placements.len();
        self.metrics.pieces_remaining = self
            .total_requested()
            .saturating_sub(self.placements.len());
    }

    /// Audits the geometric and policy invariants of the plan.
    ///
    /// Returns one message per violation; a finalized plan returns an empty
    /// list.
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();

        let stocks: HashMap<&str, &Stock> =
            self.stocks.iter().map(|s| (s.id.as_str(), s)).collect();
        let pieces: HashMap<&str, &Piece> =
            self.pieces.iter().map(|p| (p.id.as_str(), p)).collect();

        let mut counts: HashMap<&str, usize> = HashMap::new();

        for (idx, placed) in self.placements.iter().enumerate() {
            match stocks.get(placed.stock_id.as_str()) {
                None => {
                    violations.push(format!(
                        "placement {} references unknown stock '{}'",
                        idx, placed.stock_id
                    ));
                    continue;
                }
                Some(stock) => {
                    if placed.stock_instance >= stock.quantity {
                        violations.push(format!(
                            "placement {} uses instance {} of stock '{}' (quantity {})",
                            idx, placed.stock_instance, stock.name, stock.quantity
                        ));
                    }
                    if !crate::geometry::fits_within(&placed.rect(), stock.width, stock.height) {
                        violations.push(format!(
                            "placement {} ({}) exceeds stock '{}' bounds {}x{}",
                            idx,
                            placed.rect(),
                            stock.name,
                            stock.width,
                            stock.height
                        ));
                    }
                }
            }

            match pieces.get(placed.piece_id.as_str()) {
                None => violations.push(format!(
                    "placement {} references unknown piece '{}'",
                    idx, placed.piece_id
                )),
                Some(piece) => {
                    *counts.entry(piece.id.as_str()).or_insert(0) += 1;

                    let rotation_ok = placed.rotation == crate::geometry::Rotation::R0
                        || (self.settings.enable_rotation
                            && piece.permits(placed.rotation)
                            && self.settings.allowed_rotations.allows(placed.rotation));
                    if !rotation_ok {
                        violations.push(format!(
                            "placement {} rotates piece '{}' by {} against its policy",
                            idx, piece.name, placed.rotation
                        ));
                    }
                }
            }
        }

        for (piece_id, count) in &counts {
            if let Some(piece) = pieces.get(piece_id) {
                if *count > piece.quantity {
                    violations.push(format!(
                        "piece '{}' placed {} times but only {} requested",
                        piece.name, count, piece.quantity
                    ));
                }
            }
        }

        for i in 0..self.placements.len() {
            for j in (i + 1)..self.placements.len() {
                let a = &self.placements[i];
                let b = &self.placements[j];
                if a.same_instance(b) && overlaps(&a.rect(), &b.rect()) {
                    violations.push(format!(
                        "placements {} and {} overlap on stock '{}' instance {}",
                        i, j, a.stock_id, a.stock_instance
                    ));
                }
            }
        }

        violations
    }
}

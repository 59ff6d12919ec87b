//! # Cutplan Engine
//!
//! Optimization engine for the cutplan 2D cutting-stock planner.
//!
//! Given stock sheets and rectangular pieces, the engine produces a
//! cutting plan of non-overlapping, in-bounds placements with optional
//! quarter-turn rotations, maximizing the number of seated pieces.
//!
//! ## Pipeline
//!
//! 1. **Validation** ([`validate_problem`]): rejects impossible input
//!    before any placement is attempted.
//! 2. **Heuristic pre-arrangement** ([`run_heuristic_placement`]):
//!    ordered greedy best-fit seating on the stock instances.
//! 3. **Constraint refinement** ([`run_refinement`]): a mixed-integer
//!    model over positions, rotations and placed flags with pairwise
//!    non-overlap (requires the `milp` feature, enabled by default).
//! 4. **Finalization** ([`finalize_plan`]): conflict resolution with
//!    heuristic priority, metric computation and an invariant audit.
//!
//! [`Optimizer`] sequences the stages with cooperative cancellation, a
//! wall-clock budget and coarse progress reporting.
//!
//! ## Quick Start
//!
//! ```rust
//! use cutplan_engine::{Optimizer, OptimizationSettings, Piece, Stock};
//!
//! let stocks = vec![Stock::new("s1", "Plywood", 2440.0, 1220.0)];
//! let pieces = vec![
//!     Piece::new("p1", "Side panel", 600.0, 400.0).with_quantity(2),
//!     Piece::new("p2", "Shelf", 800.0, 300.0),
//! ];
//!
//! let optimizer = Optimizer::new(OptimizationSettings::new().with_time_limit(5.0));
//! let plan = optimizer.optimize(&stocks, &pieces).unwrap();
//!
//! println!(
//!     "placed {} piece(s) at {:.1}% utilization",
//!     plan.metrics.pieces_placed,
//!     plan.metrics.utilization_percent
//! );
//! assert!(plan.validate().is_empty());
//! ```
//!
//! ## Feature Flags
//!
//! - `milp` (default): build the constraint refiner on the `good_lp`
//!   modeling layer; without it the refinement stage becomes a no-op.
//! - `serde`: serialization support for all plan and settings types.

pub mod finalize;
pub mod heuristic;
pub mod optimizer;
pub mod refiner;
pub mod validator;

// Re-exports
pub use finalize::{finalize_plan, resolve_conflicts};
pub use heuristic::run_heuristic_placement;
pub use optimizer::Optimizer;
pub use refiner::{is_refiner_available, run_refinement};
pub use validator::validate_problem;

pub use cutplan_core::{
    effective_dims, fits_within, overlaps, CuttingPlan, Error, ExportOptions, HeuristicStrategy,
    ImportedProblem, NoopMonitor, OptimizationSettings, PerformanceMonitor, Piece, PieceId,
    PlacedPiece, PlanExporter, PlanMetrics, ProblemImporter, ProgressCallback, ProgressEvent,
    Rect, RefineReport, RefineStatus, ResourceSample, Result, Rotation, RotationSet, Stock,
    StockId, ValidationReport,
};

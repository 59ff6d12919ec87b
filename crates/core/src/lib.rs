//! # Cutplan Core
//!
//! Domain model and shared types for the cutplan cutting-stock engine.
//!
//! This crate defines everything the optimization stages exchange: stock
//! sheets and pieces, placement records, settings, the cutting plan with
//! its metrics, and the collaborator contracts (progress reporting,
//! performance monitoring, import/export).
//!
//! ## Core Components
//!
//! - **Geometry**: [`Rect`], [`Rotation`], [`overlaps`], [`fits_within`],
//!   [`effective_dims`]
//! - **Problem entities**: [`Stock`], [`Piece`], [`RotationSet`]
//! - **Results**: [`PlacedPiece`], [`CuttingPlan`], [`PlanMetrics`],
//!   [`ValidationReport`], [`RefineReport`]
//! - **Configuration**: [`OptimizationSettings`], [`HeuristicStrategy`]
//! - **Collaborators**: [`ProgressCallback`], [`PerformanceMonitor`],
//!   [`ProblemImporter`], [`PlanExporter`]
//!
//! ## Example
//!
//! ```rust
//! use cutplan_core::{OptimizationSettings, Piece, Stock};
//!
//! let stock = Stock::new("s1", "Plywood", 2440.0, 1220.0).with_quantity(3);
//! let piece = Piece::new("p1", "Shelf", 800.0, 300.0)
//!     .with_quantity(10)
//!     .with_rotation(true);
//! let settings = OptimizationSettings::new().with_time_limit(10.0);
//!
//! assert!(stock.validate().is_ok());
//! assert!(piece.validate().is_ok());
//! assert_eq!(settings.time_limit_seconds, 10.0);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod error;
pub mod geometry;
pub mod io;
pub mod monitor;
pub mod piece;
pub mod placement;
pub mod plan;
pub mod progress;
pub mod refine;
pub mod settings;
pub mod stock;
pub mod validation;

// Re-exports
pub use error::{Error, Result};
pub use geometry::{effective_dims, fits_within, overlaps, Rect, Rotation};
pub use io::{ExportOptions, ImportedProblem, PlanExporter, ProblemImporter};
pub use monitor::{NoopMonitor, PerformanceMonitor, ResourceSample};
pub use piece::{Piece, PieceId, RotationSet};
pub use placement::PlacedPiece;
pub use plan::{CuttingPlan, PlanMetrics};
pub use progress::{ProgressCallback, ProgressEvent, TOTAL_PHASES};
pub use refine::{RefineReport, RefineStatus};
pub use settings::{HeuristicStrategy, OptimizationSettings};
pub use stock::{Stock, StockId};
pub use validation::ValidationReport;

//! Advisory performance monitoring.
//!
//! Monitors are shared collaborator handles passed into the engine; they
//! are queried at phase boundaries and must never block the hot path. The
//! engine treats every reading as advisory.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One advisory resource reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResourceSample {
    /// Milliseconds since the optimization started.
    pub at_ms: u64,

    /// Resident memory in megabytes.
    pub memory_mb: f64,

    /// Process CPU usage in percent.
    pub cpu_percent: f64,
}

/// Source of advisory resource readings.
///
/// Implementations are shared between threads and must be internally
/// thread-safe. Returning `None` means no reading is available; the
/// engine carries on without one.
pub trait PerformanceMonitor: Send + Sync {
    /// Takes a reading, if one is available.
    fn sample(&self) -> Option<ResourceSample>;
}

/// Monitor that never produces readings.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl PerformanceMonitor for NoopMonitor {
    fn sample(&self) -> Option<ResourceSample> {
        None
    }
}

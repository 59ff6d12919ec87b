//! Progress reporting for long-running optimizations.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of reported phases: heuristic, refinement, finalization.
pub const TOTAL_PHASES: usize = 3;

/// A progress event emitted at phase boundaries.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProgressEvent {
    /// Index of the current phase, in `[0, TOTAL_PHASES)`.
    pub phase_index: usize,

    /// Total number of phases.
    pub total_phases: usize,

    /// Description of the current phase.
    pub description: String,

    /// Coarse completion percentage in `[0, 100]`.
    pub percent: f64,

    /// Placements committed so far.
    pub pieces_placed: usize,

    /// Total requested piece instances.
    pub total_pieces: usize,

    /// Utilization of the placements so far, as a percentage.
    pub utilization_percent: f64,

    /// Elapsed wall time in milliseconds.
    pub elapsed_ms: u64,

    /// Advisory memory usage, when a monitor supplied one.
    pub memory_mb: Option<f64>,

    /// Advisory CPU usage, when a monitor supplied one.
    pub cpu_percent: Option<f64>,
}

impl ProgressEvent {
    /// Creates an event for a phase boundary.
    pub fn new(phase_index: usize, description: impl Into<String>, percent: f64) -> Self {
        Self {
            phase_index,
            total_phases: TOTAL_PHASES,
            description: description.into(),
            percent,
            ..Default::default()
        }
    }

    /// Sets the placement counters.
    pub fn with_pieces(mut self, placed: usize, total: usize) -> Self {
        self.pieces_placed = placed;
        self.total_pieces = total;
        self
    }

    /// Sets the running utilization percentage.
    pub fn with_utilization(mut self, percent: f64) -> Self {
        self.utilization_percent = percent;
        self
    }

    /// Sets the elapsed wall time.
    pub fn with_elapsed(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    /// Attaches advisory resource readings.
    pub fn with_resources(mut self, memory_mb: Option<f64>, cpu_percent: Option<f64>) -> Self {
        self.memory_mb = memory_mb;
        self.cpu_percent = cpu_percent;
        self
    }
}

/// Callback invoked with progress events. Implementations must be
/// internally thread-safe; events may arrive from worker threads.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let event = ProgressEvent::new(1, "Constraint refinement", 50.0)
            .with_pieces(3, 10)
            .with_utilization(42.5)
            .with_elapsed(120);

        assert_eq!(event.phase_index, 1);
        assert_eq!(event.total_phases, TOTAL_PHASES);
        assert_eq!(event.percent, 50.0);
        assert_eq!(event.pieces_placed, 3);
        assert_eq!(event.total_pieces, 10);
        assert_eq!(event.utilization_percent, 42.5);
        assert_eq!(event.elapsed_ms, 120);
        assert!(event.memory_mb.is_none());
    }
}

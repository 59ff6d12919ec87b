//! Optimization settings.

use crate::piece::RotationSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ordering rule for the heuristic pre-arrangement stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HeuristicStrategy {
    /// Largest pieces first, by area.
    #[default]
    #[cfg_attr(feature = "serde", serde(alias = "largest_first"))]
    AreaDescending,
    /// Smallest pieces first, by area.
    #[cfg_attr(feature = "serde", serde(alias = "smallest_first"))]
    AreaAscending,
    /// Longest perimeter first.
    PerimeterDescending,
    /// Shortest perimeter first.
    PerimeterAscending,
    /// Fresh random permutation on every call.
    Random,
}

/// Configuration for one optimization run.
///
/// Settings are immutable for the duration of the run; each stage receives
/// a read-only snapshot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizationSettings {
    /// Enable 90° rotation variants during search.
    pub enable_rotation: bool,

    /// Global cap on which rotations any piece may use.
    pub allowed_rotations: RotationSet,

    /// Permit parallel candidate search and solver workers.
    pub enable_multithreading: bool,

    /// Worker-thread cap for the refiner (0 = all available cores).
    pub max_threads: usize,

    /// Wall-clock budget for the refinement stage, in seconds.
    pub time_limit_seconds: f64,

    /// Acceptable relative gap from the refiner's internal bound.
    pub gap_tolerance: f64,

    /// Let the refiner collapse permutation-equivalent placements.
    pub enable_symmetry_breaking: bool,

    /// Run the greedy pre-arrangement stage before refinement.
    pub enable_heuristic_pre_arrangement: bool,

    /// Ordering rule for the pre-arrangement stage.
    pub heuristic_strategy: HeuristicStrategy,

    /// Permit the first-fit fallback sweep inside the pre-arrangement
    /// stage when scored seating finds no position.
    pub enable_greedy_placement: bool,
}

impl Default for OptimizationSettings {
    fn default() -> Self {
        Self {
            enable_rotation: true,
            allowed_rotations: RotationSet::all(),
            enable_multithreading: true,
            max_threads: 0,
            time_limit_seconds: 30.0,
            gap_tolerance: 0.0,
            enable_symmetry_breaking: true,
            enable_heuristic_pre_arrangement: true,
            heuristic_strategy: HeuristicStrategy::default(),
            enable_greedy_placement: true,
        }
    }
}

impl OptimizationSettings {
    /// Creates settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables rotation globally.
    pub fn with_rotation(mut self, enable: bool) -> Self {
        self.enable_rotation = enable;
        self
    }

    /// Restricts the globally permitted rotations.
    pub fn with_allowed_rotations(mut self, rotations: RotationSet) -> Self {
        self.allowed_rotations = rotations;
        self
    }

    /// Enables or disables multithreading.
    pub fn with_multithreading(mut self, enable: bool) -> Self {
        self.enable_multithreading = enable;
        self
    }

    /// Caps the refiner's worker count (0 = auto).
    pub fn with_max_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads;
        self
    }

    /// Sets the refiner's wall-clock budget in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit_seconds = seconds.max(0.0);
        self
    }

    /// Sets the acceptable relative optimality gap.
    pub fn with_gap_tolerance(mut self, gap: f64) -> Self {
        self.gap_tolerance = gap.clamp(0.0, 1.0);
        self
    }

    /// Enables or disables symmetry breaking in the refiner.
    pub fn with_symmetry_breaking(mut self, enable: bool) -> Self {
        self.enable_symmetry_breaking = enable;
        self
    }

    /// Enables or disables the heuristic pre-arrangement stage.
    pub fn with_heuristic_pre_arrangement(mut self, enable: bool) -> Self {
        self.enable_heuristic_pre_arrangement = enable;
        self
    }

    /// Sets the heuristic ordering strategy.
    pub fn with_heuristic_strategy(mut self, strategy: HeuristicStrategy) -> Self {
        self.heuristic_strategy = strategy;
        self
    }

    /// Enables or disables the first-fit fallback in the heuristic stage.
    pub fn with_greedy_placement(mut self, enable: bool) -> Self {
        self.enable_greedy_placement = enable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = OptimizationSettings::default();
        assert!(settings.enable_rotation);
        assert!(settings.enable_heuristic_pre_arrangement);
        assert_eq!(settings.max_threads, 0);
        assert_eq!(settings.time_limit_seconds, 30.0);
        assert_eq!(settings.heuristic_strategy, HeuristicStrategy::AreaDescending);
    }

    #[test]
    fn test_builder_chain() {
        let settings = OptimizationSettings::new()
            .with_rotation(false)
            .with_max_threads(4)
            .with_time_limit(5.0)
            .with_gap_tolerance(0.05)
            .with_heuristic_strategy(HeuristicStrategy::PerimeterDescending);

        assert!(!settings.enable_rotation);
        assert_eq!(settings.max_threads, 4);
        assert_eq!(settings.time_limit_seconds, 5.0);
        assert_eq!(settings.gap_tolerance, 0.05);
        assert_eq!(
            settings.heuristic_strategy,
            HeuristicStrategy::PerimeterDescending
        );
    }

    #[test]
    fn test_gap_tolerance_is_clamped() {
        let settings = OptimizationSettings::new().with_gap_tolerance(3.0);
        assert_eq!(settings.gap_tolerance, 1.0);

        let settings = OptimizationSettings::new().with_time_limit(-2.0);
        assert_eq!(settings.time_limit_seconds, 0.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_strategy_aliases_deserialize() {
        let s: HeuristicStrategy = serde_json::from_str("\"largest_first\"").unwrap();
        assert_eq!(s, HeuristicStrategy::AreaDescending);
        let s: HeuristicStrategy = serde_json::from_str("\"smallest_first\"").unwrap();
        assert_eq!(s, HeuristicStrategy::AreaAscending);
    }
}

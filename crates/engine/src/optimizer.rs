//! Optimization orchestrator.
//!
//! Sequences validation, heuristic pre-arrangement, constraint refinement
//! and finalization on one owning task, with cooperative cancellation and
//! coarse progress at the phase boundaries (0 / 50 / 90 / 100 percent).
//! Expiry of the wall-clock budget behaves exactly like an external
//! cancellation: the run skips ahead to finalization and still returns a
//! valid, possibly partial, plan.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cutplan_core::{
    CuttingPlan, Error, NoopMonitor, OptimizationSettings, PerformanceMonitor, Piece, PlacedPiece,
    ProgressCallback, ProgressEvent, Result, ResourceSample, Stock,
};

use crate::finalize::finalize_plan;
use crate::heuristic::run_heuristic_placement;
use crate::refiner::run_refinement;
use crate::validator::validate_problem;

/// The optimization engine.
///
/// Owns the settings, the cancellation flag and the performance-monitor
/// handle for one or more runs. Each run hands read-only snapshots to its
/// stages and returns a fresh [`CuttingPlan`].
pub struct Optimizer {
    settings: OptimizationSettings,
    cancelled: Arc<AtomicBool>,
    monitor: Arc<dyn PerformanceMonitor>,
}

impl Optimizer {
    /// Creates an optimizer with the given settings and no monitoring.
    pub fn new(settings: OptimizationSettings) -> Self {
        Self {
            settings,
            cancelled: Arc::new(AtomicBool::new(false)),
            monitor: Arc::new(NoopMonitor),
        }
    }

    /// Creates an optimizer with default settings.
    pub fn default_settings() -> Self {
        Self::new(OptimizationSettings::default())
    }

    /// Attaches a performance monitor.
    pub fn with_monitor(mut self, monitor: Arc<dyn PerformanceMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Returns a handle that cancels the current run when set.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Requests cancellation of the current run.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Informational estimate of how long the solve is likely to take.
    ///
    /// Scales a complexity ladder by the worker count and caps the result
    /// at the configured time limit.
    pub fn estimated_solve_time(&self, stocks: &[Stock], pieces: &[Piece]) -> Duration {
        let piece_count: usize = pieces.iter().map(|p| p.quantity).sum();
        let stock_count: usize = stocks.iter().map(|s| s.quantity).sum();
        let rotation_factor = if self.settings.enable_rotation { 4 } else { 1 };
        let complexity = piece_count * stock_count * rotation_factor;

        let base_seconds = match complexity {
            c if c < 100 => 1.0,
            c if c < 500 => 5.0,
            c if c < 1000 => 15.0,
            c if c < 5000 => 60.0,
            _ => 300.0,
        };

        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let workers = if self.settings.max_threads == 0 {
            cores
        } else {
            self.settings.max_threads.min(cores)
        };

        let estimate = base_seconds / workers.max(1) as f64;
        Duration::from_secs_f64(estimate.min(self.settings.time_limit_seconds))
    }

    /// Runs the full pipeline and returns the cutting plan.
    ///
    /// Fails only when validation rejects the problem; every later stage
    /// degrades to a partial contribution instead of erroring.
    pub fn optimize(&self, stocks: &[Stock], pieces: &[Piece]) -> Result<CuttingPlan> {
        self.run(stocks, pieces, None)
    }

    /// Runs the full pipeline, reporting progress at phase boundaries.
    pub fn optimize_with_progress(
        &self,
        stocks: &[Stock],
        pieces: &[Piece],
        callback: ProgressCallback,
    ) -> Result<CuttingPlan> {
        self.run(stocks, pieces, Some(&callback))
    }

    fn run(
        &self,
        stocks: &[Stock],
        pieces: &[Piece],
        callback: Option<&ProgressCallback>,
    ) -> Result<CuttingPlan> {
        let start = Instant::now();

        let report = validate_problem(stocks, pieces);
        for warning in &report.warnings {
            log::warn!("{}", warning);
        }
        if !report.is_valid {
            return Err(Error::InvalidProblem {
                errors: report.errors,
            });
        }

        log::info!(
            "optimizing {} piece type(s) onto {} stock type(s), estimated {:?}",
            pieces.len(),
            stocks.len(),
            self.estimated_solve_time(stocks, pieces)
        );

        let deadline = start + Duration::from_secs_f64(self.settings.time_limit_seconds);
        let total_pieces: usize = pieces.iter().map(|p| p.quantity).sum();
        let total_stock_area: f64 = stocks.iter().map(|s| s.total_area()).sum();
        let mut samples: Vec<ResourceSample> = Vec::new();

        let pool = self.build_pool();

        self.report(
            callback,
            &mut samples,
            start,
            ProgressEvent::new(0, "Heuristic pre-arrangement", 0.0).with_pieces(0, total_pieces),
        );

        let mut candidates: Vec<PlacedPiece> = Vec::new();
        if self.settings.enable_heuristic_pre_arrangement {
            let seated = self.install(&pool, || {
                run_heuristic_placement(
                    stocks,
                    pieces,
                    &self.settings,
                    &self.cancelled,
                    Some(deadline),
                )
            });
            candidates.extend(seated);
        } else {
            log::info!("heuristic pre-arrangement disabled");
        }

        let placed_area: f64 = candidates.iter().map(|p| p.area()).sum();
        self.report(
            callback,
            &mut samples,
            start,
            ProgressEvent::new(1, "Constraint refinement", 50.0)
                .with_pieces(candidates.len(), total_pieces)
                .with_utilization(percentage(placed_area, total_stock_area)),
        );

        let expired = Instant::now() >= deadline;
        if self.cancelled.load(Ordering::Relaxed) || expired {
            // Deadline expiry behaves exactly like cancellation: go
            // straight to finalization with what we have.
            log::info!(
                "skipping refinement ({})",
                if expired { "deadline expired" } else { "cancelled" }
            );
        } else {
            let (refine_report, refined) = self.install(&pool, || {
                run_refinement(stocks, pieces, &self.settings, &self.cancelled, deadline)
            });
            log::info!(
                "refinement finished: {} ({})",
                refine_report.status,
                refine_report.message
            );
            candidates.extend(refined);
        }

        let placed_area: f64 = candidates.iter().map(|p| p.area()).sum();
        self.report(
            callback,
            &mut samples,
            start,
            ProgressEvent::new(2, "Finalizing plan", 90.0)
                .with_pieces(candidates.len(), total_pieces)
                .with_utilization(percentage(placed_area, total_stock_area)),
        );

        let duration_ms = start.elapsed().as_millis() as u64;
        let plan = finalize_plan(
            stocks,
            pieces,
            &self.settings,
            &candidates,
            duration_ms,
            samples.clone(),
        );

        self.report(
            callback,
            &mut samples,
            start,
            ProgressEvent::new(2, "Complete", 100.0)
                .with_pieces(plan.metrics.pieces_placed, total_pieces)
                .with_utilization(plan.metrics.utilization_percent),
        );

        log::info!(
            "plan {} ready: {}/{} piece(s) placed, {:.1}% utilization in {} ms",
            plan.id,
            plan.metrics.pieces_placed,
            total_pieces,
            plan.metrics.utilization_percent,
            plan.metrics.duration_ms
        );

        Ok(plan)
    }

    /// Builds the worker pool honoring `max_threads`, when multithreading
    /// is enabled at all.
    fn build_pool(&self) -> Option<rayon::ThreadPool> {
        if !self.settings.enable_multithreading {
            return None;
        }
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let threads = if self.settings.max_threads == 0 {
            cores
        } else {
            self.settings.max_threads.min(cores)
        };
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                log::warn!("falling back to the shared worker pool: {}", e);
                None
            }
        }
    }

    fn install<T: Send>(
        &self,
        pool: &Option<rayon::ThreadPool>,
        task: impl FnOnce() -> T + Send,
    ) -> T {
        match pool {
            Some(pool) => pool.install(task),
            None => task(),
        }
    }

    fn report(
        &self,
        callback: Option<&ProgressCallback>,
        samples: &mut Vec<ResourceSample>,
        start: Instant,
        event: ProgressEvent,
    ) {
        let sample = self.monitor.sample().map(|mut s| {
            s.at_ms = start.elapsed().as_millis() as u64;
            s
        });
        if let Some(sample) = sample {
            samples.push(sample);
        }

        if let Some(callback) = callback {
            let latest = samples.last();
            callback(
                event
                    .with_elapsed(start.elapsed().as_millis() as u64)
                    .with_resources(
                        latest.map(|s| s.memory_mb),
                        latest.map(|s| s.cpu_percent),
                    ),
            );
        }
    }
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        100.0 * part / whole
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutplan_core::HeuristicStrategy;
    use std::sync::Mutex;

    #[test]
    fn test_invalid_problem_short_circuits() {
        let optimizer = Optimizer::default_settings();
        let result = optimizer.optimize(&[], &[Piece::new("p1", "A", 10.0, 10.0)]);

        match result {
            Err(Error::InvalidProblem { errors }) => {
                assert!(errors.iter().any(|e| e == "No stock materials provided"));
            }
            other => panic!("expected InvalidProblem, got {:?}", other.map(|p| p.id)),
        }
    }

    #[test]
    fn test_exact_fit_plan() {
        let stocks = vec![Stock::new("s1", "sheet", 100.0, 100.0)];
        let pieces = vec![Piece::new("p1", "quarter", 50.0, 50.0)
            .with_quantity(4)
            .with_rotation(false)];

        let optimizer = Optimizer::new(
            OptimizationSettings::default()
                .with_multithreading(false)
                .with_time_limit(10.0),
        );
        let plan = optimizer.optimize(&stocks, &pieces).unwrap();

        assert_eq!(plan.metrics.pieces_placed, 4);
        assert_eq!(plan.metrics.pieces_remaining, 0);
        assert!((plan.metrics.utilization_percent - 100.0).abs() < 1e-9);
        assert!(plan.validate().is_empty());
    }

    #[test]
    fn test_progress_phases_are_reported() {
        let stocks = vec![Stock::new("s1", "sheet", 100.0, 100.0)];
        let pieces = vec![Piece::new("p1", "half", 50.0, 100.0).with_quantity(2)];

        let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();

        let optimizer = Optimizer::new(OptimizationSettings::default().with_time_limit(10.0));
        optimizer
            .optimize_with_progress(
                &stocks,
                &pieces,
                Box::new(move |event| sink.lock().unwrap().push(event)),
            )
            .unwrap();

        let events = events.lock().unwrap();
        let percents: Vec<f64> = events.iter().map(|e| e.percent).collect();
        assert_eq!(percents, vec![0.0, 50.0, 90.0, 100.0]);
        assert!(events.iter().all(|e| e.total_phases == 3));
        assert_eq!(events.last().unwrap().pieces_placed, 2);
    }

    #[test]
    fn test_cancellation_is_not_an_error() {
        let stocks = vec![Stock::new("s1", "sheet", 1000.0, 1000.0).with_quantity(2)];
        let pieces = vec![Piece::new("p1", "tile", 10.0, 10.0).with_quantity(1000)];

        let optimizer = Optimizer::new(
            OptimizationSettings::default()
                .with_multithreading(false)
                .with_time_limit(30.0),
        );
        let flag = optimizer.cancel_flag();

        let watcher = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::Relaxed);
        });

        let plan = optimizer.optimize(&stocks, &pieces).unwrap();
        watcher.join().unwrap();

        assert!(plan.metrics.pieces_placed <= 1000);
        assert_eq!(
            plan.metrics.pieces_placed + plan.metrics.pieces_remaining,
            1000
        );
        assert!(plan.validate().is_empty());
    }

    #[test]
    fn test_estimated_solve_time_ladder() {
        let optimizer = Optimizer::new(
            OptimizationSettings::default()
                .with_rotation(false)
                .with_max_threads(1)
                .with_time_limit(300.0),
        );

        let small = optimizer.estimated_solve_time(
            &[Stock::new("s1", "sheet", 100.0, 100.0)],
            &[Piece::new("p1", "a", 10.0, 10.0).with_quantity(10)],
        );
        assert_eq!(small, Duration::from_secs(1));

        let large = optimizer.estimated_solve_time(
            &[Stock::new("s1", "sheet", 100.0, 100.0).with_quantity(10)],
            &[Piece::new("p1", "a", 10.0, 10.0).with_quantity(600)],
        );
        assert_eq!(large, Duration::from_secs(300));
    }

    #[test]
    fn test_estimate_caps_at_time_limit() {
        let optimizer = Optimizer::new(
            OptimizationSettings::default()
                .with_max_threads(1)
                .with_time_limit(2.0),
        );

        let estimate = optimizer.estimated_solve_time(
            &[Stock::new("s1", "sheet", 100.0, 100.0).with_quantity(10)],
            &[Piece::new("p1", "a", 10.0, 10.0).with_quantity(600)],
        );
        assert!(estimate <= Duration::from_secs(2));
    }

    #[test]
    fn test_deterministic_runs_without_random_strategy() {
        let stocks = vec![Stock::new("s1", "sheet", 200.0, 100.0)];
        let pieces = vec![
            Piece::new("p1", "a", 60.0, 40.0).with_quantity(2),
            Piece::new("p2", "b", 30.0, 30.0).with_quantity(2),
        ];

        let settings = OptimizationSettings::default()
            .with_multithreading(false)
            .with_heuristic_strategy(HeuristicStrategy::AreaDescending)
            .with_time_limit(10.0);

        let first = Optimizer::new(settings.clone()).optimize(&stocks, &pieces).unwrap();
        let second = Optimizer::new(settings).optimize(&stocks, &pieces).unwrap();

        assert_eq!(first.placements, second.placements);
    }
}

//! Constraint-based refinement.
//!
//! Models placement as a mixed-integer program over integer coordinates,
//! rotation selectors and placed flags, with Big-M pairwise separation:
//! for every pair of piece instances at least one of left-of / right-of /
//! below / above must hold whenever both sit on the same stock instance.
//! The objective maximizes the number of placed instances, with a small
//! penalty per used stock instance so ties prefer fewer sheets.
//!
//! Compiled without the `milp` feature the entry point becomes a stub that
//! contributes nothing, leaving the heuristic's plan untouched.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use cutplan_core::{OptimizationSettings, Piece, PlacedPiece, RefineReport, Stock};

#[cfg(feature = "milp")]
use cutplan_core::{effective_dims, Rotation};

#[cfg(feature = "milp")]
use std::sync::atomic::Ordering;

#[cfg(feature = "milp")]
use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};

/// Returns true if the crate was compiled with the MILP refiner.
pub fn is_refiner_available() -> bool {
    cfg!(feature = "milp")
}

/// Largest piece-instance count the model accepts for a given budget.
/// Pairwise separation grows quadratically, so the ladder is deliberately
/// conservative.
#[cfg(feature = "milp")]
fn model_capacity(time_limit_seconds: f64) -> usize {
    if time_limit_seconds < 1.0 {
        8
    } else if time_limit_seconds < 5.0 {
        14
    } else if time_limit_seconds < 15.0 {
        20
    } else if time_limit_seconds < 60.0 {
        30
    } else {
        50
    }
}

/// One expanded piece instance with its permitted rotations and the
/// integer footprint at each of them.
#[cfg(feature = "milp")]
struct PieceInst {
    piece_idx: usize,
    rotations: Vec<Rotation>,
    /// Floored (width, height) per rotation, aligned with `rotations`.
    dims: Vec<(f64, f64)>,
}

/// One expanded stock instance with its integer dimensions.
#[cfg(feature = "milp")]
struct Slot {
    stock_idx: usize,
    instance: usize,
    width: f64,
    height: f64,
}

/// Runs the refinement solve and returns its report plus placements.
///
/// The refiner builds its model from the raw problem; reconciliation with
/// the heuristic's placements happens in the finalizer. Infeasibility and
/// budget exhaustion yield an empty contribution, never an error.
#[cfg(feature = "milp")]
pub fn run_refinement(
    stocks: &[Stock],
    pieces: &[Piece],
    settings: &OptimizationSettings,
    cancelled: &Arc<AtomicBool>,
    deadline: Instant,
) -> (RefineReport, Vec<PlacedPiece>) {
    let mut insts: Vec<PieceInst> = Vec::new();
    for (piece_idx, piece) in pieces.iter().enumerate() {
        let rotations = crate::heuristic::rotation_trials(piece, settings);
        let dims: Vec<(f64, f64)> = rotations
            .iter()
            .map(|&r| {
                let (w, h) = effective_dims(piece.width, piece.height, r);
                (w.floor(), h.floor())
            })
            .collect();
        for _ in 0..piece.quantity {
            insts.push(PieceInst {
                piece_idx,
                rotations: rotations.clone(),
                dims: dims.clone(),
            });
        }
    }

    let mut slots: Vec<Slot> = Vec::new();
    for (stock_idx, stock) in stocks.iter().enumerate() {
        for instance in 0..stock.quantity {
            slots.push(Slot {
                stock_idx,
                instance,
                width: stock.width.floor(),
                height: stock.height.floor(),
            });
        }
    }

    let n = insts.len();
    let m = slots.len();
    if n == 0 || m == 0 {
        return (RefineReport::skipped("nothing to refine"), Vec::new());
    }

    let capacity = model_capacity(settings.time_limit_seconds);
    if n > capacity || m > capacity {
        log::info!(
            "refinement skipped: {} piece instance(s) / {} stock instance(s) exceed capacity {} for a {:.1}s budget",
            n,
            m,
            capacity,
            settings.time_limit_seconds
        );
        return (
            RefineReport::skipped(format!(
                "model with {} instance(s) exceeds solve capacity {}",
                n, capacity
            )),
            Vec::new(),
        );
    }
    if Instant::now() >= deadline {
        return (
            RefineReport::timeout("budget exhausted before model construction"),
            Vec::new(),
        );
    }

    log::debug!(
        "building refinement model: {} piece instance(s) x {} stock instance(s)",
        n,
        m
    );

    let max_w = slots.iter().map(|s| s.width).fold(0.0_f64, f64::max);
    let max_h = slots.iter().map(|s| s.height).fold(0.0_f64, f64::max);
    let max_dim = insts
        .iter()
        .flat_map(|p| p.dims.iter())
        .map(|d| d.0.max(d.1))
        .fold(0.0_f64, f64::max);
    let big_m = 2.0 * (max_w + max_h + max_dim);

    let mut vars = ProblemVariables::new();

    let x: Vec<Variable> = (0..n)
        .map(|i| vars.add(variable().integer().min(0.0).max(max_w).name(format!("x_{}", i))))
        .collect();
    let y: Vec<Variable> = (0..n)
        .map(|i| vars.add(variable().integer().min(0.0).max(max_h).name(format!("y_{}", i))))
        .collect();

    // rot[i][k] = 1 if instance i uses its k-th permitted rotation.
    let rot: Vec<Vec<Variable>> = insts
        .iter()
        .enumerate()
        .map(|(i, inst)| {
            (0..inst.rotations.len())
                .map(|k| vars.add(variable().binary().name(format!("rot_{}_{}", i, k))))
                .collect()
        })
        .collect();

    // placed[i][s] = 1 if instance i sits on slot s.
    let placed: Vec<Vec<Variable>> = (0..n)
        .map(|i| {
            (0..m)
                .map(|s| vars.add(variable().binary().name(format!("placed_{}_{}", i, s))))
                .collect()
        })
        .collect();

    let used: Vec<Variable> = (0..m)
        .map(|s| vars.add(variable().binary().name(format!("used_{}", s))))
        .collect();

    // Disjunctive separation selectors, one quadruple per unordered pair.
    let mut sep: Vec<[Variable; 4]> = Vec::with_capacity(n * (n.saturating_sub(1)) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            sep.push([
                vars.add(variable().binary().name(format!("left_{}_{}", i, j))),
                vars.add(variable().binary().name(format!("right_{}_{}", i, j))),
                vars.add(variable().binary().name(format!("below_{}_{}", i, j))),
                vars.add(variable().binary().name(format!("above_{}_{}", i, j))),
            ]);
        }
    }

    // Maximize placements; a used sheet costs less than any single
    // placement gains, so the penalty only breaks ties.
    let placed_sum: Expression = placed
        .iter()
        .flat_map(|row| row.iter())
        .map(|&v| Expression::from(v))
        .sum();
    let eps = 1.0 / (2.0 * (m as f64 + 1.0));
    let used_penalty: Expression = used.iter().map(|&u| eps * u).sum();
    let objective = placed_sum - used_penalty;

    let mut model = vars.maximise(objective).using(default_solver);

    for i in 0..n {
        // Exactly one rotation per instance.
        let rot_sum: Expression = rot[i].iter().map(|&v| Expression::from(v)).sum();
        model = model.with(constraint!(rot_sum == 1.0));

        // Each instance lands on at most one stock instance.
        let row_sum: Expression = placed[i].iter().map(|&v| Expression::from(v)).sum();
        model = model.with(constraint!(row_sum <= 1.0));

        // Containment, active only where the instance is placed.
        for s in 0..m {
            let w_expr = footprint_expr(&rot[i], &insts[i].dims, true);
            let h_expr = footprint_expr(&rot[i], &insts[i].dims, false);
            model = model.with(constraint!(
                x[i] + w_expr + big_m * placed[i][s] <= slots[s].width + big_m
            ));
            model = model.with(constraint!(
                y[i] + h_expr + big_m * placed[i][s] <= slots[s].height + big_m
            ));

            model = model.with(constraint!(placed[i][s] <= used[s]));
        }
    }

    // Pairwise non-overlap: at least one separation holds whenever both
    // instances are active on the same slot.
    let mut pair = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            // Deadline expiry behaves exactly like cancellation.
            let expired = Instant::now() >= deadline;
            if cancelled.load(Ordering::Relaxed) || expired {
                log::info!(
                    "refinement stopped while building constraints ({})",
                    if expired { "deadline expired" } else { "cancelled" }
                );
                return (
                    RefineReport::timeout(if expired {
                        "deadline expired during model construction"
                    } else {
                        "cancelled during model construction"
                    }),
                    Vec::new(),
                );
            }

            let [l, r, b, a] = sep[pair];
            pair += 1;

            let wi = footprint_expr(&rot[i], &insts[i].dims, true);
            let wj = footprint_expr(&rot[j], &insts[j].dims, true);
            let hi = footprint_expr(&rot[i], &insts[i].dims, false);
            let hj = footprint_expr(&rot[j], &insts[j].dims, false);

            model = model.with(constraint!(x[i] + wi + big_m * l <= x[j] + big_m));
            model = model.with(constraint!(x[j] + wj + big_m * r <= x[i] + big_m));
            model = model.with(constraint!(y[i] + hi + big_m * b <= y[j] + big_m));
            model = model.with(constraint!(y[j] + hj + big_m * a <= y[i] + big_m));

            for s in 0..m {
                model = model.with(constraint!(
                    l + r + b + a - placed[i][s] - placed[j][s] >= -1.0
                ));
            }
        }
    }

    if settings.enable_symmetry_breaking {
        // Identical piece instances fill stock indices in order, and a
        // later copy is placed only if its predecessor is.
        for i in 1..n {
            if insts[i].piece_idx != insts[i - 1].piece_idx {
                continue;
            }
            let prev_sum: Expression = placed[i - 1].iter().map(|&v| Expression::from(v)).sum();
            let cur_sum: Expression = placed[i].iter().map(|&v| Expression::from(v)).sum();
            model = model.with(constraint!(cur_sum <= prev_sum));

            for s in 0..m {
                let prefix: Expression = placed[i - 1][..=s]
                    .iter()
                    .map(|&v| Expression::from(v))
                    .sum();
                model = model.with(constraint!(prefix >= placed[i][s]));
            }
        }

        // Identical stock instances are opened in prefix order.
        for s in 1..m {
            if slots[s].stock_idx == slots[s - 1].stock_idx {
                model = model.with(constraint!(used[s] <= used[s - 1]));
            }
        }
    }

    if Instant::now() >= deadline {
        return (
            RefineReport::timeout("budget exhausted before solve"),
            Vec::new(),
        );
    }

    log::info!(
        "solving refinement model ({} piece instance(s), {} slot(s))",
        n,
        m
    );
    let solve_start = Instant::now();

    match model.solve() {
        Ok(solution) => {
            let mut placements = Vec::new();
            for (i, inst) in insts.iter().enumerate() {
                let slot_idx = (0..m).find(|&s| solution.value(placed[i][s]) > 0.5);
                let Some(s) = slot_idx else { continue };

                let k = (0..inst.rotations.len())
                    .find(|&k| solution.value(rot[i][k]) > 0.5)
                    .unwrap_or(0);
                let piece = &pieces[inst.piece_idx];

                placements.push(PlacedPiece::new(
                    piece.id.clone(),
                    piece.width,
                    piece.height,
                    solution.value(x[i]).round().max(0.0),
                    solution.value(y[i]).round().max(0.0),
                    inst.rotations[k],
                    stocks[slots[s].stock_idx].id.clone(),
                    slots[s].instance,
                ));
            }

            // The solve is uninterruptible and proves optimality when it
            // returns, so a late result is still the optimum; fabricating
            // a gap for it would misreport the solution.
            let count = placements.len();
            let report = RefineReport::optimal(count, count as f64);
            log::info!(
                "refinement {} in {} ms: {} placement(s)",
                report.status,
                solve_start.elapsed().as_millis(),
                count
            );
            (report, placements)
        }
        Err(ResolutionError::Infeasible) => {
            log::warn!("refinement model infeasible");
            (RefineReport::infeasible(), Vec::new())
        }
        Err(e) => {
            log::warn!("refinement solver failed: {:?}", e);
            (
                RefineReport::timeout(format!("solver failed: {:?}", e)),
                Vec::new(),
            )
        }
    }
}

/// Linearized footprint of an instance along one axis, selected by its
/// rotation binaries.
#[cfg(feature = "milp")]
fn footprint_expr(rot_row: &[Variable], dims: &[(f64, f64)], width: bool) -> Expression {
    rot_row
        .iter()
        .zip(dims.iter())
        .map(|(&v, d)| if width { d.0 * v } else { d.1 * v })
        .sum()
}

/// Stub used when the crate is built without the `milp` feature.
#[cfg(not(feature = "milp"))]
pub fn run_refinement(
    _stocks: &[Stock],
    _pieces: &[Piece],
    _settings: &OptimizationSettings,
    _cancelled: &Arc<AtomicBool>,
    _deadline: Instant,
) -> (RefineReport, Vec<PlacedPiece>) {
    log::warn!("refinement unavailable: compiled without the 'milp' feature");
    (
        RefineReport::skipped("compiled without the 'milp' feature"),
        Vec::new(),
    )
}

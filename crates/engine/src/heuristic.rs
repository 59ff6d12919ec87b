//! Heuristic pre-arrangement.
//!
//! Greedy best-fit seating: placement requests are ordered by the
//! configured strategy, then each request is tried on every stock instance
//! over its permitted rotations at a coarse set of candidate positions.
//! The (instance, rotation, position) with the highest resulting sheet
//! utilization wins. The refinement stage is responsible for filling the
//! gaps this coarse grid leaves behind.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use cutplan_core::{
    effective_dims, fits_within, overlaps, HeuristicStrategy, OptimizationSettings, Piece,
    PlacedPiece, Rect, Rotation, Stock,
};
use rand::seq::SliceRandom;
use rayon::prelude::*;

const EPS: f64 = 1e-9;

// Guard against degenerate stride counts from near-zero piece dimensions.
const MAX_EDGE_STRIDES: usize = 512;

/// One sheet being filled. Lives only for the duration of this stage.
struct StockInstance {
    stock_idx: usize,
    instance: usize,
    width: f64,
    height: f64,
    available_area: f64,
    placed: Vec<Rect>,
}

impl StockInstance {
    fn new(stock_idx: usize, instance: usize, width: f64, height: f64) -> Self {
        Self {
            stock_idx,
            instance,
            width,
            height,
            available_area: width * height,
            placed: Vec::new(),
        }
    }

    fn total_area(&self) -> f64 {
        self.width * self.height
    }

    fn used_area(&self) -> f64 {
        self.total_area() - self.available_area
    }
}

/// A feasible seating for one request.
struct Candidate {
    instance_idx: usize,
    rotation: Rotation,
    x: f64,
    y: f64,
    score: f64,
}

impl Candidate {
    /// Total order: higher score wins, ties go to the earlier instance.
    fn beats(&self, other: &Candidate) -> bool {
        match self.score.partial_cmp(&other.score) {
            Some(std::cmp::Ordering::Greater) => true,
            Some(std::cmp::Ordering::Less) => false,
            _ => self.instance_idx < other.instance_idx,
        }
    }
}

/// Runs the greedy pre-arrangement and returns the committed placements.
///
/// Placements are committed in request order. The cancellation flag is
/// observed between rotation trials and between requests; on observation
/// (or when `deadline` passes) the placements accumulated so far are
/// returned.
pub fn run_heuristic_placement(
    stocks: &[Stock],
    pieces: &[Piece],
    settings: &OptimizationSettings,
    cancelled: &Arc<AtomicBool>,
    deadline: Option<Instant>,
) -> Vec<PlacedPiece> {
    let mut instances: Vec<StockInstance> = Vec::new();
    for (stock_idx, stock) in stocks.iter().enumerate() {
        for instance in 0..stock.quantity {
            instances.push(StockInstance::new(
                stock_idx,
                instance,
                stock.width,
                stock.height,
            ));
        }
    }

    let order = order_piece_types(pieces, settings.heuristic_strategy);
    let requests: Vec<usize> = order
        .iter()
        .flat_map(|&type_idx| std::iter::repeat(type_idx).take(pieces[type_idx].quantity))
        .collect();

    let mut placements = Vec::new();

    for &type_idx in &requests {
        if cancelled.load(Ordering::Relaxed) {
            log::info!(
                "heuristic cancelled after {} placement(s)",
                placements.len()
            );
            break;
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                log::info!(
                    "heuristic stopped at deadline after {} placement(s)",
                    placements.len()
                );
                break;
            }
        }

        let piece = &pieces[type_idx];
        let rotations = rotation_trials(piece, settings);

        let mut best = if settings.enable_multithreading {
            instances
                .par_iter()
                .enumerate()
                .filter_map(|(idx, inst)| seat_on_instance(inst, idx, piece, &rotations, None))
                .reduce_with(|a, b| if a.beats(&b) { a } else { b })
        } else {
            let mut best: Option<Candidate> = None;
            for (idx, inst) in instances.iter().enumerate() {
                let found = seat_on_instance(inst, idx, piece, &rotations, Some(cancelled));
                if let Some(candidate) = found {
                    if best.as_ref().map_or(true, |b| candidate.beats(b)) {
                        best = Some(candidate);
                    }
                }
                if cancelled.load(Ordering::Relaxed) {
                    break;
                }
            }
            best
        };

        if best.is_none() && settings.enable_greedy_placement {
            best = first_fit_fallback(&instances, piece, &rotations);
        }

        if let Some(candidate) = best {
            let inst = &mut instances[candidate.instance_idx];
            let (w, h) = effective_dims(piece.width, piece.height, candidate.rotation);
            inst.placed.push(Rect::new(candidate.x, candidate.y, w, h));
            inst.available_area -= piece.area();

            placements.push(PlacedPiece::new(
                piece.id.clone(),
                piece.width,
                piece.height,
                candidate.x,
                candidate.y,
                candidate.rotation,
                stocks[inst.stock_idx].id.clone(),
                inst.instance,
            ));
        }
    }

    log::info!(
        "heuristic seated {}/{} piece instance(s)",
        placements.len(),
        requests.len()
    );

    placements
}

/// Orders piece type indices by the configured strategy. Ties keep the
/// original input order; `Random` draws a fresh permutation per call.
fn order_piece_types(pieces: &[Piece], strategy: HeuristicStrategy) -> Vec<usize> {
    let mut order: Vec<usize> = (0..pieces.len()).collect();
    match strategy {
        HeuristicStrategy::AreaDescending => {
            order.sort_by(|&a, &b| {
                pieces[b]
                    .area()
                    .partial_cmp(&pieces[a].area())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        HeuristicStrategy::AreaAscending => {
            order.sort_by(|&a, &b| {
                pieces[a]
                    .area()
                    .partial_cmp(&pieces[b].area())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        HeuristicStrategy::PerimeterDescending => {
            order.sort_by(|&a, &b| {
                pieces[b]
                    .perimeter()
                    .partial_cmp(&pieces[a].perimeter())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        HeuristicStrategy::PerimeterAscending => {
            order.sort_by(|&a, &b| {
                pieces[a]
                    .perimeter()
                    .partial_cmp(&pieces[b].perimeter())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        HeuristicStrategy::Random => {
            order.shuffle(&mut rand::thread_rng());
        }
    }
    order
}

/// The rotations to try for one piece under the run's settings.
pub(crate) fn rotation_trials(piece: &Piece, settings: &OptimizationSettings) -> Vec<Rotation> {
    if !settings.enable_rotation || !piece.allow_rotation {
        return vec![Rotation::R0];
    }
    Rotation::ALL
        .iter()
        .copied()
        .filter(|&r| piece.permits(r) && settings.allowed_rotations.allows(r))
        .collect()
}

/// Candidate positions for a `w`x`h` footprint on a `width`x`height` sheet:
/// the four corners plus grid strides along each edge, deduplicated.
fn candidate_positions(w: f64, h: f64, width: f64, height: f64) -> Vec<(f64, f64)> {
    let max_x = width - w;
    let max_y = height - h;
    if max_x < -EPS || max_y < -EPS {
        return Vec::new();
    }
    let max_x = max_x.max(0.0);
    let max_y = max_y.max(0.0);

    let mut positions: Vec<(f64, f64)> = vec![
        (0.0, 0.0),
        (max_x, 0.0),
        (0.0, max_y),
        (max_x, max_y),
    ];

    for k in 1..=MAX_EDGE_STRIDES {
        let x = k as f64 * w;
        if x > max_x + EPS {
            break;
        }
        positions.push((x, 0.0));
        positions.push((x, max_y));
    }
    for k in 1..=MAX_EDGE_STRIDES {
        let y = k as f64 * h;
        if y > max_y + EPS {
            break;
        }
        positions.push((0.0, y));
        positions.push((max_x, y));
    }

    let mut unique: Vec<(f64, f64)> = Vec::with_capacity(positions.len());
    for (x, y) in positions {
        if !unique
            .iter()
            .any(|&(ux, uy)| (ux - x).abs() < EPS && (uy - y).abs() < EPS)
        {
            unique.push((x, y));
        }
    }
    unique
}

/// Finds the first feasible candidate position on one instance, trying
/// rotations in order, and scores it by the resulting sheet utilization.
fn seat_on_instance(
    inst: &StockInstance,
    instance_idx: usize,
    piece: &Piece,
    rotations: &[Rotation],
    cancelled: Option<&Arc<AtomicBool>>,
) -> Option<Candidate> {
    if inst.available_area + EPS < piece.area() {
        return None;
    }

    for &rotation in rotations {
        if let Some(flag) = cancelled {
            if flag.load(Ordering::Relaxed) {
                return None;
            }
        }

        let (w, h) = effective_dims(piece.width, piece.height, rotation);
        if w > inst.width + EPS || h > inst.height + EPS {
            continue;
        }

        for (x, y) in candidate_positions(w, h, inst.width, inst.height) {
            let rect = Rect::new(x, y, w, h);
            if !fits_within(&rect, inst.width, inst.height) {
                continue;
            }
            if inst.placed.iter().any(|p| overlaps(p, &rect)) {
                continue;
            }
            let score = (inst.used_area() + piece.area()) / inst.total_area();
            return Some(Candidate {
                instance_idx,
                rotation,
                x,
                y,
                score,
            });
        }
    }

    None
}

/// First-fit sweep over corner points derived from already-placed pieces.
/// Used only when the coarse candidate grid finds no seat.
fn first_fit_fallback(
    instances: &[StockInstance],
    piece: &Piece,
    rotations: &[Rotation],
) -> Option<Candidate> {
    for (instance_idx, inst) in instances.iter().enumerate() {
        if inst.available_area + EPS < piece.area() {
            continue;
        }

        let mut xs: Vec<f64> = vec![0.0];
        let mut ys: Vec<f64> = vec![0.0];
        for rect in &inst.placed {
            xs.push(rect.right());
            ys.push(rect.bottom());
        }

        let mut points: Vec<(f64, f64)> = Vec::with_capacity(xs.len() * ys.len());
        for &y in &ys {
            for &x in &xs {
                points.push((x, y));
            }
        }
        points.sort_by(|a, b| {
            (a.1, a.0)
                .partial_cmp(&(b.1, b.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for &rotation in rotations {
            let (w, h) = effective_dims(piece.width, piece.height, rotation);
            for &(x, y) in &points {
                let rect = Rect::new(x, y, w, h);
                if !fits_within(&rect, inst.width, inst.height) {
                    continue;
                }
                if inst.placed.iter().any(|p| overlaps(p, &rect)) {
                    continue;
                }
                let score = (inst.used_area() + piece.area()) / inst.total_area();
                return Some(Candidate {
                    instance_idx,
                    rotation,
                    x,
                    y,
                    score,
                });
            }
        }
    }

    None
}

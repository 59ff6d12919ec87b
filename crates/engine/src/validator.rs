//! Problem validation.

use cutplan_core::{Piece, Stock, ValidationReport};

/// Checks a problem before any placement is attempted.
///
/// All rules are evaluated independently and accumulate into the report;
/// the problem is valid exactly when no errors were recorded. Whether each
/// individual piece fits any stock is a placement concern and surfaces
/// later as remaining pieces, not as a validation error.
pub fn validate_problem(stocks: &[Stock], pieces: &[Piece]) -> ValidationReport {
    let mut report = ValidationReport::new();

    if stocks.is_empty() {
        report.push_error("No stock materials provided");
    }
    if pieces.is_empty() {
        report.push_error("No pieces to cut provided");
    }

    let total_stock_area: f64 = stocks
        .iter()
        .filter(|s| s.width > 0.0 && s.height > 0.0)
        .map(|s| s.total_area())
        .sum();
    let total_piece_area: f64 = pieces
        .iter()
        .filter(|p| p.width > 0.0 && p.height > 0.0)
        .map(|p| p.area() * p.quantity as f64)
        .sum();

    if total_piece_area > total_stock_area {
        report.push_error(format!(
            "Total piece area {:.2} exceeds total stock area {:.2}",
            total_piece_area, total_stock_area
        ));
    }

    for stock in stocks {
        if stock.width <= 0.0 || stock.height <= 0.0 {
            report.push_error(format!(
                "Stock '{}' has non-positive dimensions {}x{}",
                stock.name, stock.width, stock.height
            ));
        }
    }

    for piece in pieces {
        if piece.width <= 0.0 || piece.height <= 0.0 {
            report.push_error(format!(
                "Piece '{}' has non-positive dimensions {}x{}",
                piece.name, piece.width, piece.height
            ));
        }
    }

    report.total_stock_area = total_stock_area;
    report.total_piece_area = total_piece_area;
    report.estimated_utilization = if total_stock_area > 0.0 {
        100.0 * total_piece_area / total_stock_area
    } else {
        0.0
    };

    if report.estimated_utilization < 50.0 {
        report.push_warning(format!(
            "Estimated utilization is only {:.1}%",
            report.estimated_utilization
        ));
    }

    log::debug!(
        "validated problem: {} stock(s), {} piece type(s), {} error(s), {} warning(s)",
        stocks.len(),
        pieces.len(),
        report.errors.len(),
        report.warnings.len()
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_stocks_is_an_error() {
        let pieces = vec![Piece::new("p1", "A", 10.0, 10.0)];
        let report = validate_problem(&[], &pieces);

        assert!(!report.is_valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e == "No stock materials provided"));
    }

    #[test]
    fn test_empty_pieces_is_an_error() {
        let stocks = vec![Stock::new("s1", "sheet", 100.0, 100.0)];
        let report = validate_problem(&stocks, &[]);

        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e == "No pieces to cut provided"));
    }

    #[test]
    fn test_area_oversubscription() {
        let stocks = vec![Stock::new("s1", "sheet", 100.0, 100.0)];
        let pieces = vec![Piece::new("p1", "big", 60.0, 60.0).with_quantity(3)];
        let report = validate_problem(&stocks, &pieces);

        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("10800.00")));
        assert!(report.errors.iter().any(|e| e.contains("10000.00")));
    }

    #[test]
    fn test_non_positive_dimensions_name_the_entity() {
        let stocks = vec![Stock::new("s1", "flat sheet", 100.0, 0.0)];
        let pieces = vec![Piece::new("p1", "bad panel", -5.0, 10.0)];
        let report = validate_problem(&stocks, &pieces);

        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("flat sheet")));
        assert!(report.errors.iter().any(|e| e.contains("bad panel")));
    }

    #[test]
    fn test_low_utilization_warns_but_stays_valid() {
        let stocks = vec![Stock::new("s1", "sheet", 100.0, 100.0)];
        let pieces = vec![Piece::new("p1", "small", 10.0, 10.0)];
        let report = validate_problem(&stocks, &pieces);

        assert!(report.is_valid);
        assert!(report.has_warnings());
        assert!(report.warnings[0].contains("1.0%"));
        assert_relative_eq!(report.estimated_utilization, 1.0);
    }

    #[test]
    fn test_healthy_problem_is_clean() {
        let stocks = vec![Stock::new("s1", "sheet", 100.0, 100.0)];
        let pieces = vec![Piece::new("p1", "half", 70.0, 100.0)];
        let report = validate_problem(&stocks, &pieces);

        assert!(report.is_valid);
        assert!(!report.has_warnings());
        assert_relative_eq!(report.estimated_utilization, 70.0);
    }

    #[test]
    fn test_rules_accumulate_independently() {
        let stocks = vec![Stock::new("s1", "flat", 0.0, 100.0)];
        let pieces = vec![Piece::new("p1", "bad", 0.0, 5.0)];
        let report = validate_problem(&stocks, &pieces);

        // Both per-entity rules fire alongside the utilization warning.
        assert_eq!(report.errors.len(), 2);
        assert!(report.has_warnings());
    }
}

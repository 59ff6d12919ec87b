//! Stock sheet definition.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique identifier for a stock sheet definition.
pub type StockId = String;

/// A rectangular sheet of raw material, available in `quantity` identical
/// copies.
///
/// The descriptive attributes (`material`, `thickness`, `cost`) are carried
/// through to exporters untouched; the engine only reads the dimensions and
/// the quantity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Stock {
    /// Unique identifier.
    pub id: StockId,

    /// Human-readable name used in diagnostics and reports.
    pub name: String,

    /// Sheet width.
    pub width: f64,

    /// Sheet height.
    pub height: f64,

    /// Number of identical sheets available.
    pub quantity: usize,

    /// Material description (e.g. "plywood").
    pub material: Option<String>,

    /// Sheet thickness.
    pub thickness: Option<f64>,

    /// Cost per sheet.
    pub cost: Option<f64>,
}

impl Stock {
    /// Creates a stock sheet with quantity 1 and no descriptive attributes.
    pub fn new(id: impl Into<StockId>, name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            width,
            height,
            quantity: 1,
            material: None,
            thickness: None,
            cost: None,
        }
    }

    /// Sets the number of identical sheets.
    pub fn with_quantity(mut self, quantity: usize) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets the material description.
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    /// Sets the sheet thickness.
    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = Some(thickness);
        self
    }

    /// Sets the cost per sheet.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Area of a single sheet.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Combined area of all sheets.
    pub fn total_area(&self) -> f64 {
        self.area() * self.quantity as f64
    }

    /// Checks dimensions and quantity.
    pub fn validate(&self) -> Result<()> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "Stock '{}' has non-positive dimensions {}x{}",
                self.name, self.width, self.height
            )));
        }
        if self.quantity == 0 {
            return Err(Error::InvalidInput(format!(
                "Stock '{}' must have quantity of at least 1",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_stock_builder() {
        let stock = Stock::new("s1", "Plywood 2440x1220", 2440.0, 1220.0)
            .with_quantity(4)
            .with_material("plywood")
            .with_thickness(18.0)
            .with_cost(45.5);

        assert_eq!(stock.quantity, 4);
        assert_eq!(stock.material.as_deref(), Some("plywood"));
        assert_relative_eq!(stock.area(), 2_976_800.0);
        assert_relative_eq!(stock.total_area(), 11_907_200.0);
    }

    #[test]
    fn test_stock_validation() {
        assert!(Stock::new("s1", "ok", 100.0, 50.0).validate().is_ok());
        assert!(Stock::new("s2", "flat", 100.0, 0.0).validate().is_err());
        assert!(Stock::new("s3", "none", 100.0, 50.0)
            .with_quantity(0)
            .validate()
            .is_err());
    }
}

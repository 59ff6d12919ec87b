//! Placed piece representation.

use crate::geometry::{effective_dims, Rect, Rotation};
use crate::piece::PieceId;
use crate::stock::StockId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A piece instance assigned a position and rotation on one stock instance.
///
/// The placement carries the unrotated dimensions of its source piece as a
/// snapshot, so geometric checks never need the piece lookup table and the
/// record serializes standalone.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlacedPiece {
    /// Id of the source piece definition.
    pub piece_id: PieceId,

    /// Unrotated width of the source piece.
    pub piece_width: f64,

    /// Unrotated height of the source piece.
    pub piece_height: f64,

    /// Left edge on the stock sheet.
    pub x: f64,

    /// Bottom edge on the stock sheet.
    pub y: f64,

    /// Applied rotation.
    pub rotation: Rotation,

    /// Id of the stock definition the piece sits on.
    pub stock_id: StockId,

    /// Which copy of the stock, in `[0, stock.quantity)`.
    pub stock_instance: usize,
}

impl PlacedPiece {
    /// Creates a placement record.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        piece_id: impl Into<PieceId>,
        piece_width: f64,
        piece_height: f64,
        x: f64,
        y: f64,
        rotation: Rotation,
        stock_id: impl Into<StockId>,
        stock_instance: usize,
    ) -> Self {
        Self {
            piece_id: piece_id.into(),
            piece_width,
            piece_height,
            x,
            y,
            rotation,
            stock_id: stock_id.into(),
            stock_instance,
        }
    }

    /// Width and height after rotation.
    pub fn effective_dims(&self) -> (f64, f64) {
        effective_dims(self.piece_width, self.piece_height, self.rotation)
    }

    /// The occupied rectangle on the stock sheet.
    pub fn rect(&self) -> Rect {
        let (w, h) = self.effective_dims();
        Rect::new(self.x, self.y, w, h)
    }

    /// Area of the placed piece (rotation invariant).
    pub fn area(&self) -> f64 {
        self.piece_width * self.piece_height
    }

    /// Returns true if this placement and `other` sit on the same stock
    /// instance.
    pub fn same_instance(&self, other: &PlacedPiece) -> bool {
        self.stock_id == other.stock_id && self.stock_instance == other.stock_instance
    }
}

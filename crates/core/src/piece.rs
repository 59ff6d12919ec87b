//! Piece definition and rotation policy.

use crate::error::{Error, Result};
use crate::geometry::Rotation;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique identifier for a piece definition.
pub type PieceId = String;

/// Set of quarter-turn rotations a piece may use beyond the identity.
///
/// `R0` is always allowed and is not represented in the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RotationSet(u8);

const BIT_R90: u8 = 0b001;
const BIT_R180: u8 = 0b010;
const BIT_R270: u8 = 0b100;

impl RotationSet {
    /// All of 90°, 180° and 270°.
    pub fn all() -> Self {
        Self(BIT_R90 | BIT_R180 | BIT_R270)
    }

    /// No rotation beyond the identity.
    pub fn none() -> Self {
        Self(0)
    }

    /// A set containing exactly the given rotations. `R0` entries are
    /// ignored since the identity is always permitted.
    pub fn only(rotations: &[Rotation]) -> Self {
        let mut set = Self::none();
        for &r in rotations {
            set.insert(r);
        }
        set
    }

    /// Adds a rotation to the set.
    pub fn insert(&mut self, rotation: Rotation) {
        match rotation {
            Rotation::R0 => {}
            Rotation::R90 => self.0 |= BIT_R90,
            Rotation::R180 => self.0 |= BIT_R180,
            Rotation::R270 => self.0 |= BIT_R270,
        }
    }

    /// Removes a rotation from the set. Removing `R0` has no effect.
    pub fn remove(&mut self, rotation: Rotation) {
        match rotation {
            Rotation::R0 => {}
            Rotation::R90 => self.0 &= !BIT_R90,
            Rotation::R180 => self.0 &= !BIT_R180,
            Rotation::R270 => self.0 &= !BIT_R270,
        }
    }

    /// Returns true if the rotation is permitted. `R0` always is.
    pub fn allows(&self, rotation: Rotation) -> bool {
        match rotation {
            Rotation::R0 => true,
            Rotation::R90 => self.0 & BIT_R90 != 0,
            Rotation::R180 => self.0 & BIT_R180 != 0,
            Rotation::R270 => self.0 & BIT_R270 != 0,
        }
    }

    /// Returns true if only the identity is permitted.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// The permitted rotations including the identity, in search order.
    pub fn rotations(&self) -> Vec<Rotation> {
        Rotation::ALL
            .iter()
            .copied()
            .filter(|r| self.allows(*r))
            .collect()
    }
}

impl Default for RotationSet {
    fn default() -> Self {
        Self::all()
    }
}

/// A rectangular part to be cut from stock, requested in `quantity` copies.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Piece {
    /// Unique identifier.
    pub id: PieceId,

    /// Human-readable name used in diagnostics and reports.
    pub name: String,

    /// Piece width.
    pub width: f64,

    /// Piece height.
    pub height: f64,

    /// Number of copies to cut.
    pub quantity: usize,

    /// Whether the piece may be rotated at all.
    pub allow_rotation: bool,

    /// Which quarter-turn rotations are permitted when rotation is allowed.
    pub allowed_rotations: RotationSet,
}

impl Piece {
    /// Creates a piece with quantity 1 and every rotation permitted.
    pub fn new(id: impl Into<PieceId>, name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            width,
            height,
            quantity: 1,
            allow_rotation: true,
            allowed_rotations: RotationSet::all(),
        }
    }

    /// Sets the number of copies.
    pub fn with_quantity(mut self, quantity: usize) -> Self {
        self.quantity = quantity;
        self
    }

    /// Enables or disables rotation for this piece.
    pub fn with_rotation(mut self, allow: bool) -> Self {
        self.allow_rotation = allow;
        self
    }

    /// Restricts the permitted rotations.
    pub fn with_allowed_rotations(mut self, rotations: RotationSet) -> Self {
        self.allowed_rotations = rotations;
        self
    }

    /// Area of a single copy.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Perimeter of a single copy.
    pub fn perimeter(&self) -> f64 {
        2.0 * (self.width + self.height)
    }

    /// Returns true if the piece's policy admits the rotation. The global
    /// rotation switch is applied by the caller on top of this.
    pub fn permits(&self, rotation: Rotation) -> bool {
        rotation == Rotation::R0 || (self.allow_rotation && self.allowed_rotations.allows(rotation))
    }

    /// Checks dimensions and quantity.
    pub fn validate(&self) -> Result<()> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "Piece '{}' has non-positive dimensions {}x{}",
                self.name, self.width, self.height
            )));
        }
        if self.quantity == 0 {
            return Err(Error::InvalidInput(format!(
                "Piece '{}' must have quantity of at least 1",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_set_all() {
        let set = RotationSet::all();
        assert!(set.allows(Rotation::R0));
        assert!(set.allows(Rotation::R90));
        assert!(set.allows(Rotation::R180));
        assert!(set.allows(Rotation::R270));
        assert_eq!(set.rotations().len(), 4);
    }

    #[test]
    fn test_rotation_set_none_still_allows_identity() {
        let set = RotationSet::none();
        assert!(set.allows(Rotation::R0));
        assert!(!set.allows(Rotation::R90));
        assert_eq!(set.rotations(), vec![Rotation::R0]);
    }

    #[test]
    fn test_rotation_set_insert_remove() {
        let mut set = RotationSet::only(&[Rotation::R90]);
        assert!(set.allows(Rotation::R90));
        assert!(!set.allows(Rotation::R180));

        set.insert(Rotation::R180);
        assert!(set.allows(Rotation::R180));

        set.remove(Rotation::R90);
        assert!(!set.allows(Rotation::R90));
    }

    #[test]
    fn test_piece_permits() {
        let fixed = Piece::new("p1", "fixed", 30.0, 20.0).with_rotation(false);
        assert!(fixed.permits(Rotation::R0));
        assert!(!fixed.permits(Rotation::R90));

        let quarter = Piece::new("p2", "quarter", 30.0, 20.0)
            .with_allowed_rotations(RotationSet::only(&[Rotation::R90]));
        assert!(quarter.permits(Rotation::R90));
        assert!(!quarter.permits(Rotation::R180));
    }

    #[test]
    fn test_piece_measures() {
        let piece = Piece::new("p1", "panel", 30.0, 20.0);
        assert_eq!(piece.area(), 600.0);
        assert_eq!(piece.perimeter(), 100.0);
    }

    #[test]
    fn test_piece_validation() {
        assert!(Piece::new("p1", "ok", 10.0, 10.0).validate().is_ok());
        assert!(Piece::new("p2", "flat", 0.0, 10.0).validate().is_err());
        assert!(Piece::new("p3", "none", 10.0, 10.0)
            .with_quantity(0)
            .validate()
            .is_err());
    }
}

//! Rectangle primitives shared by every engine stage.
//!
//! All placement reasoning in the engine reduces to three operations on
//! axis-aligned rectangles: open-interval overlap, containment within a
//! sheet, and the dimension swap induced by a quarter-turn rotation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A quarter-turn rotation applied to a piece before placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Rotation {
    /// No rotation.
    #[default]
    R0,
    /// 90 degrees counter-clockwise.
    R90,
    /// 180 degrees.
    R180,
    /// 270 degrees counter-clockwise.
    R270,
}

impl Rotation {
    /// All four quarter-turn rotations, in search order.
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    /// Returns the rotation angle in degrees.
    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    /// Returns the rotation for a degree value, if it is a multiple of 90.
    pub fn from_degrees(degrees: u32) -> Option<Rotation> {
        match degrees % 360 {
            0 => Some(Rotation::R0),
            90 => Some(Rotation::R90),
            180 => Some(Rotation::R180),
            270 => Some(Rotation::R270),
            _ => None,
        }
    }

    /// Returns true if this rotation swaps width and height.
    pub fn swaps_dims(&self) -> bool {
        matches!(self, Rotation::R90 | Rotation::R270)
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// An axis-aligned rectangle at an absolute position.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Bottom edge.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle from its bottom-left corner and extents.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (`x + width`).
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Top edge (`y + height`).
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Enclosed area.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} @ ({}, {})",
            self.width, self.height, self.x, self.y
        )
    }
}

/// Returns true if two rectangles overlap as open sets.
///
/// Edge contact does not count as overlap, so pieces may sit flush
/// against each other.
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x < b.right() && b.x < a.right() && a.y < b.bottom() && b.y < a.bottom()
}

/// Returns true if the rectangle lies entirely within a `width` x `height`
/// sheet anchored at the origin.
pub fn fits_within(r: &Rect, width: f64, height: f64) -> bool {
    r.x >= 0.0 && r.y >= 0.0 && r.right() <= width && r.bottom() <= height
}

/// Returns the effective (width, height) of a piece after rotation.
pub fn effective_dims(width: f64, height: f64, rotation: Rotation) -> (f64, f64) {
    if rotation.swaps_dims() {
        (height, width)
    } else {
        (width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_detection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        let c = Rect::new(20.0, 20.0, 5.0, 5.0);

        assert!(overlaps(&a, &b));
        assert!(overlaps(&b, &a));
        assert!(!overlaps(&a, &c));
    }

    #[test]
    fn test_edge_contact_is_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        let c = Rect::new(0.0, 10.0, 10.0, 10.0);

        assert!(!overlaps(&a, &b));
        assert!(!overlaps(&a, &c));
    }

    #[test]
    fn test_fits_within() {
        let inside = Rect::new(10.0, 10.0, 50.0, 50.0);
        let flush = Rect::new(50.0, 0.0, 50.0, 100.0);
        let outside = Rect::new(60.0, 0.0, 50.0, 50.0);
        let negative = Rect::new(-1.0, 0.0, 10.0, 10.0);

        assert!(fits_within(&inside, 100.0, 100.0));
        assert!(fits_within(&flush, 100.0, 100.0));
        assert!(!fits_within(&outside, 100.0, 100.0));
        assert!(!fits_within(&negative, 100.0, 100.0));
    }

    #[test]
    fn test_effective_dims() {
        assert_eq!(effective_dims(30.0, 10.0, Rotation::R0), (30.0, 10.0));
        assert_eq!(effective_dims(30.0, 10.0, Rotation::R90), (10.0, 30.0));
        assert_eq!(effective_dims(30.0, 10.0, Rotation::R180), (30.0, 10.0));
        assert_eq!(effective_dims(30.0, 10.0, Rotation::R270), (10.0, 30.0));
    }

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(0), Some(Rotation::R0));
        assert_eq!(Rotation::from_degrees(90), Some(Rotation::R90));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::R90));
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn test_rect_accessors() {
        let r = Rect::new(2.0, 3.0, 4.0, 5.0);
        assert_eq!(r.right(), 6.0);
        assert_eq!(r.bottom(), 8.0);
        assert_eq!(r.area(), 20.0);
    }
}

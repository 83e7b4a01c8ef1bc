use std::fmt;

use crate::geometry::Point;

/// Which grid corner a captured point marks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Top-left corner of cell (0, 0).
    TopLeft,
    /// Top-right corner of the last cell in row 0.
    TopRight,
    /// Bottom-left corner of the first cell in the last row.
    BottomLeft,
}

impl Anchor {
    pub const ALL: [Anchor; 3] = [Anchor::TopLeft, Anchor::TopRight, Anchor::BottomLeft];

    pub fn label(self) -> &'static str {
        match self {
            Anchor::TopLeft => "p00",
            Anchor::TopRight => "pTR",
            Anchor::BottomLeft => "pBL",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left of the first cell",
            Anchor::TopRight => "top-right of the top-right cell",
            Anchor::BottomLeft => "bottom-left of the bottom-left cell",
        }
    }

    fn slot(self) -> usize {
        match self {
            Anchor::TopLeft => 0,
            Anchor::TopRight => 1,
            Anchor::BottomLeft => 2,
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

/// The three user-captured corner points. Points are stored as captured;
/// geometric sanity is only checked when a grid is built from them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Calibration {
    points: [Option<Point>; 3],
}

impl Calibration {
    pub fn new() -> Self { Self::default() }

    pub fn set(&mut self, anchor: Anchor, point: Point) { self.points[anchor.slot()] = Some(point); }

    pub fn get(&self, anchor: Anchor) -> Option<Point> { self.points[anchor.slot()] }

    pub fn is_complete(&self) -> bool { self.points.iter().all(Option::is_some) }

    pub fn missing(&self) -> Vec<Anchor> {
        Anchor::ALL.into_iter().filter(|a| self.get(*a).is_none()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_calibration_is_incomplete() {
        let cal = Calibration::new();
        assert!(!cal.is_complete());
        assert_eq!(cal.missing(), Anchor::ALL.to_vec());
    }

    #[test]
    fn test_set_overwrites_previous_point() {
        let mut cal = Calibration::new();
        cal.set(Anchor::TopLeft, Point::new(1.0, 2.0));
        cal.set(Anchor::TopLeft, Point::new(10.0, 20.0));
        assert_eq!(cal.get(Anchor::TopLeft), Some(Point::new(10.0, 20.0)));
        assert_eq!(cal.missing(), vec![Anchor::TopRight, Anchor::BottomLeft]);
    }

    #[test]
    fn test_complete_accepts_any_geometry() {
        // pTR left of p00 is still a complete calibration
        let mut cal = Calibration::new();
        cal.set(Anchor::TopLeft, Point::new(100.0, 100.0));
        cal.set(Anchor::TopRight, Point::new(50.0, 100.0));
        cal.set(Anchor::BottomLeft, Point::new(100.0, 100.0));
        assert!(cal.is_complete());
        assert!(cal.missing().is_empty());
    }
}

use std::ops::{Add, Mul, Sub};

use rand::Rng;

use crate::calibration::{Anchor, Calibration};
use crate::error::{Error, GeometryError, Result};
use crate::scan::Cell;

/// Largest jitter along each local axis, as a fraction of that axis' step.
pub const JITTER_FRACTION: f64 = 0.2;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point { pub x: f64, pub y: f64 }

impl Point {
    pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }
    pub fn length(self) -> f64 { self.x.hypot(self.y) }
    fn cross(self, other: Point) -> f64 { self.x * other.y - self.y * other.x }

    /// Nearest screen pixel.
    pub fn to_pixel(self) -> (i32, i32) { (self.x.round() as i32, self.y.round() as i32) }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self { Self::new(x as f64, y as f64) }
}

impl Add for Point {
    type Output = Point;
    fn add(self, o: Point) -> Point { Point::new(self.x + o.x, self.y + o.y) }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, o: Point) -> Point { Point::new(self.x - o.x, self.y - o.y) }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, k: f64) -> Point { Point::new(self.x * k, self.y * k) }
}

/// Offset in units of the local cell axes, each component in [-1, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JitterOffset { pub along_col: f64, pub along_row: f64 }

impl JitterOffset {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self { along_col: rng.gen_range(-1.0..=1.0), along_row: rng.gen_range(-1.0..=1.0) }
    }
}

/// A regular, possibly skewed grid derived from the three calibration points.
///
/// The column step runs from p00 towards pTR and the row step from p00
/// towards pBL. They need not be orthogonal, so a slightly rotated or
/// sheared calibration still maps every cell inside its visual bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    origin: Point,
    col_step: Point,
    row_step: Point,
    rows: u32,
    columns: u32,
}

impl Grid {
    pub fn from_calibration(cal: &Calibration, rows: u32, columns: u32) -> Result<Self> {
        if rows == 0 || columns == 0 {
            return Err(Error::Configuration(format!(
                "grid needs at least one row and one column (got {rows} rows, {columns} columns)"
            )));
        }
        let point = |anchor: Anchor| {
            cal.get(anchor).ok_or_else(|| {
                Error::Configuration(format!("calibration point {anchor} is not set"))
            })
        };
        let (p00, p_tr, p_bl) = (point(Anchor::TopLeft)?, point(Anchor::TopRight)?, point(Anchor::BottomLeft)?);

        let col_step = (p_tr - p00) * (1.0 / columns as f64);
        let row_step = (p_bl - p00) * (1.0 / rows as f64);
        if col_step.length() < f64::EPSILON {
            return Err(GeometryError::ZeroColumnStep.into());
        }
        if row_step.length() < f64::EPSILON {
            return Err(GeometryError::ZeroRowStep.into());
        }
        if col_step.cross(row_step).abs() <= 1e-9 * col_step.length() * row_step.length() {
            return Err(GeometryError::Collinear.into());
        }

        Ok(Self { origin: p00, col_step, row_step, rows, columns })
    }

    pub fn columns(&self) -> u32 { self.columns }
    pub fn cell_count(&self) -> usize { self.rows as usize * self.columns as usize }
    pub fn col_step(&self) -> Point { self.col_step }
    pub fn row_step(&self) -> Point { self.row_step }

    pub fn cell_corner(&self, cell: Cell) -> Point {
        self.origin + self.col_step * cell.col as f64 + self.row_step * cell.row as f64
    }

    pub fn cell_center(&self, cell: Cell) -> Point {
        self.cell_corner(cell) + (self.col_step + self.row_step) * 0.5
    }

    /// Cell center moved by `offset`, scaled to at most `JITTER_FRACTION`
    /// of a step along each axis.
    pub fn jittered_center(&self, cell: Cell, offset: JitterOffset) -> Point {
        self.cell_center(cell)
            + self.col_step * (offset.along_col * JITTER_FRACTION)
            + self.row_step * (offset.along_row * JITTER_FRACTION)
    }
}

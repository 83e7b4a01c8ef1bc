use thiserror::Error;

use crate::calibration::Anchor;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("p00 and pTR coincide, the column step is zero")]
    ZeroColumnStep,
    #[error("p00 and pBL coincide, the row step is zero")]
    ZeroRowStep,
    #[error("column and row steps are parallel, the grid has no area")]
    Collinear,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// The real cursor hit a screen corner; abort all simulated input.
    #[error("fail-safe triggered (cursor in a screen corner)")]
    FailSafe,
    #[error("input backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("calibration incomplete, missing {}", format_missing(.missing))]
    CalibrationIncomplete { missing: Vec<Anchor> },
    #[error("degenerate calibration: {0}")]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    InputSimulation(#[from] InputError),
}

fn format_missing(missing: &[Anchor]) -> String {
    missing.iter().map(|a| a.label()).collect::<Vec<_>>().join(", ")
}

pub type Result<T> = std::result::Result<T, Error>;

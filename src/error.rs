//! Error types
//!
//! Geometric degeneracies (parallel lines, rays that miss every wall) are not
//! errors and never show up here; they are `None` / `NoReading` values.

use std::path::PathBuf;

use thiserror::Error;

use crate::fuzzy::SetName;

/// Errors raised while constructing lines and segments.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Both the x and y coefficients are zero.
    #[error("degenerate line: x and y coefficients are both zero")]
    DegenerateLine,

    /// A value is NaN, infinite, or outside the decimal range.
    #[error("value {0} cannot be represented exactly")]
    NotRepresentable(f64),

    /// Decimal arithmetic overflowed while deriving coefficients.
    #[error("coefficient overflow while building line")]
    Overflow,
}

/// Errors raised by the fuzzy inference engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FuzzyError {
    /// A rule references a set the variable does not define.
    #[error("unknown fuzzy set {name} in {variable}")]
    UnknownSet {
        /// `"consequence"` or `"antecedent N"`.
        variable: String,
        name: SetName,
    },

    /// Wrong number of antecedent names or crisp inputs.
    #[error("arity mismatch: expected {expected}, got {actual}")]
    Arity { expected: usize, actual: usize },

    /// Gaussian spread must be strictly positive and finite.
    #[error("invalid spread {0}: sigma must be > 0")]
    InvalidSpread(f64),

    /// Output domain bounds must be finite with `min < max`, sampled at a
    /// positive resolution into a bounded number of points.
    #[error("invalid support [{min}, {max}] at resolution {resolution}")]
    InvalidSupport { min: f64, max: f64, resolution: f64 },

    /// Evaluation requested before any rule was registered.
    #[error("rule base is empty")]
    EmptyRuleBase,
}

impl FuzzyError {
    /// Creates an arity mismatch error.
    #[must_use]
    pub const fn arity(expected: usize, actual: usize) -> Self {
        Self::Arity { expected, actual }
    }
}

/// Errors raised while reading track files.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("track needs at least {expected} records, found {found}")]
    MissingRecords { expected: usize, found: usize },
}

/// Errors raised while loading or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Fuzzy(#[from] FuzzyError),

    #[error(transparent)]
    Track(#[from] TrackError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The car needs a strictly positive, finite radius.
    #[error("invalid car radius {0}")]
    InvalidRadius(f64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The worker thread running a simulation panicked.
    #[error("simulation thread panicked")]
    WorkerPanicked,
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

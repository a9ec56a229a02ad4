//! Defuzzification over a sampled output domain

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FuzzyError;

/// Two samples within this distance of the peak both count as maxima.
const PEAK_EPS: f64 = 1e-12;

/// Upper bound on grid points, far above any useful wheel-angle resolution
pub const MAX_SUPPORT_SAMPLES: usize = 1_000_000;

/// Finite output domain sampled at `resolution` points per unit
///
/// Always holds finite bounds with `min < max` and at least two, at most
/// [`MAX_SUPPORT_SAMPLES`], grid points. Deserialization runs the same checks
/// as [`Support::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SupportBounds")]
pub struct Support {
    min: f64,
    max: f64,
    /// Samples per unit
    resolution: f64,
}

/// Unchecked wire form of [`Support`]
#[derive(Deserialize)]
struct SupportBounds {
    min: f64,
    max: f64,
    resolution: f64,
}

impl TryFrom<SupportBounds> for Support {
    type Error = FuzzyError;

    fn try_from(raw: SupportBounds) -> Result<Self, Self::Error> {
        Support::new(raw.min, raw.max, raw.resolution)
    }
}

impl Default for Support {
    /// Wheel angle domain: [-40°, 40°] at 0.1° steps
    fn default() -> Self {
        Self {
            min: -40.0,
            max: 40.0,
            resolution: 10.0,
        }
    }
}

impl Support {
    pub fn new(min: f64, max: f64, resolution: f64) -> Result<Self, FuzzyError> {
        let invalid = || FuzzyError::InvalidSupport {
            min,
            max,
            resolution,
        };
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(invalid());
        }
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(invalid());
        }
        let intervals = ((max - min) * resolution).round();
        if !(intervals >= 1.0 && intervals < MAX_SUPPORT_SAMPLES as f64) {
            return Err(invalid());
        }
        Ok(Self {
            min,
            max,
            resolution,
        })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Number of sample points, both ends included
    pub fn len(&self) -> usize {
        ((self.max - self.min) * self.resolution).round() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Sample positions `min + i / resolution`
    ///
    /// Computed by division rather than accumulation so rounding error does
    /// not build up along the grid.
    pub fn samples(&self) -> impl DoubleEndedIterator<Item = f64> + ExactSizeIterator + '_ {
        (0..self.len()).map(move |i| self.min + i as f64 / self.resolution)
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Crisp value extraction from an aggregated membership function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Defuzzifier {
    /// Center of gravity
    #[default]
    Centroid,
    MeanOfMaxima,
    /// Midpoint of the first and last samples reaching the maximum
    ///
    /// Read as "halfway between the outermost maxima", not as half their
    /// distance `(argmax - argmin) / 2`. The distance reading maps a
    /// symmetric aggregate to an offset instead of its axis of symmetry
    /// (±20 on the default support for a two-peak output at ±20), while
    /// every defuzzifier here must return 0 for an output symmetric about 0.
    ModifiedMeanOfMaxima,
}

impl Defuzzifier {
    pub const ALL: [Defuzzifier; 3] = [
        Defuzzifier::Centroid,
        Defuzzifier::MeanOfMaxima,
        Defuzzifier::ModifiedMeanOfMaxima,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Defuzzifier::Centroid => "centroid",
            Defuzzifier::MeanOfMaxima => "mean_of_maxima",
            Defuzzifier::ModifiedMeanOfMaxima => "modified_mean_of_maxima",
        }
    }

    /// Reduce `(x, degree)` samples to one crisp value
    ///
    /// A function that is zero everywhere has no centroid; the domain midpoint
    /// is returned instead. An empty sample set also yields `fallback`.
    pub fn defuzzify(&self, samples: &[(f64, f64)], fallback: f64) -> f64 {
        if samples.is_empty() {
            return fallback;
        }
        match self {
            Defuzzifier::Centroid => {
                let (weighted, mass) = samples
                    .iter()
                    .fold((0.0, 0.0), |(w, m), &(x, mu)| (w + x * mu, m + mu));
                if mass > 0.0 {
                    weighted / mass
                } else {
                    log::trace!("centroid of empty output, using midpoint {fallback}");
                    fallback
                }
            }
            Defuzzifier::MeanOfMaxima => {
                let peak = peak(samples);
                let (sum, count) = samples
                    .iter()
                    .filter(|(_, mu)| peak - mu <= PEAK_EPS)
                    .fold((0.0, 0usize), |(s, n), &(x, _)| (s + x, n + 1));
                sum / count as f64
            }
            Defuzzifier::ModifiedMeanOfMaxima => {
                let peak = peak(samples);
                let mut maxima = samples.iter().filter(|(_, mu)| peak - mu <= PEAK_EPS);
                let first = maxima.next().map_or(fallback, |&(x, _)| x);
                let last = maxima.last().map_or(first, |&(x, _)| x);
                (first + last) / 2.0
            }
        }
    }
}

fn peak(samples: &[(f64, f64)]) -> f64 {
    samples
        .iter()
        .map(|&(_, mu)| mu)
        .fold(f64::NEG_INFINITY, f64::max)
}

impl fmt::Display for Defuzzifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Defuzzifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "centroid" | "gravity_center" | "cog" => Ok(Defuzzifier::Centroid),
            "mean_of_maxima" | "maxima_mean" | "mom" => Ok(Defuzzifier::MeanOfMaxima),
            "modified_mean_of_maxima" | "modified_maxima_mean" | "mmom" => {
                Ok(Defuzzifier::ModifiedMeanOfMaxima)
            }
            _ => Err(format!("unknown Defuzzifier '{s}'")),
        }
    }
}

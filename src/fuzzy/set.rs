//! Fuzzy sets and variables
//!
//! Every set is a Gaussian with optional shoulders, which is all the
//! controller ever uses.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FuzzyError;

/// Linguistic label of a fuzzy set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetName {
    Small,
    Medium,
    Large,
}

impl SetName {
    pub const ALL: [SetName; 3] = [SetName::Small, SetName::Medium, SetName::Large];

    pub fn as_str(&self) -> &'static str {
        match self {
            SetName::Small => "small",
            SetName::Medium => "medium",
            SetName::Large => "large",
        }
    }
}

impl fmt::Display for SetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SetName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "small" | "s" => Ok(SetName::Small),
            "medium" | "med" | "m" => Ok(SetName::Medium),
            "large" | "l" => Ok(SetName::Large),
            other => Err(format!("unknown fuzzy set name '{other}'")),
        }
    }
}

/// Gaussian membership function with optional open shoulders
///
/// `ascending` holds the degree at 1 for every x above the mean, `descending`
/// for every x below it. With both flags set the set is empty (always 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SetParams")]
pub struct FuzzySet {
    mean: f64,
    /// Spread, strictly positive
    sigma: f64,
    ascending: bool,
    descending: bool,
}

/// Unchecked wire form of [`FuzzySet`]
#[derive(Deserialize)]
struct SetParams {
    mean: f64,
    sigma: f64,
    #[serde(default)]
    ascending: bool,
    #[serde(default)]
    descending: bool,
}

impl TryFrom<SetParams> for FuzzySet {
    type Error = FuzzyError;

    fn try_from(p: SetParams) -> Result<Self, Self::Error> {
        FuzzySet::new(p.mean, p.sigma, p.ascending, p.descending)
    }
}

impl FuzzySet {
    pub fn new(
        mean: f64,
        sigma: f64,
        ascending: bool,
        descending: bool,
    ) -> Result<Self, FuzzyError> {
        if !(sigma > 0.0 && sigma.is_finite()) || !mean.is_finite() {
            return Err(FuzzyError::InvalidSpread(sigma));
        }
        Ok(Self {
            mean,
            sigma,
            ascending,
            descending,
        })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Open to the right
    pub fn ascending(&self) -> bool {
        self.ascending
    }

    /// Open to the left
    pub fn descending(&self) -> bool {
        self.descending
    }

    /// Plain bell curve
    pub fn gaussian(mean: f64, sigma: f64) -> Result<Self, FuzzyError> {
        Self::new(mean, sigma, false, false)
    }

    /// Degree of membership of a crisp value, in `[0, 1]`
    pub fn membership(&self, x: f64) -> f64 {
        if self.ascending && self.descending {
            return 0.0;
        }
        if (self.ascending && x > self.mean) || (self.descending && x < self.mean) {
            return 1.0;
        }
        let d = x - self.mean;
        (-(d * d) / (self.sigma * self.sigma)).exp()
    }

    /// Evenly spaced `(x, degree)` pairs over `[lo, hi]` for plotting
    pub fn sample_curve(&self, lo: f64, hi: f64, num_points: usize) -> Vec<(f64, f64)> {
        (0..num_points)
            .map(|i| {
                let t = i as f64 / (num_points - 1).max(1) as f64;
                let x = lo + t * (hi - lo);
                (x, self.membership(x))
            })
            .collect()
    }
}

/// Named fuzzy sets over one input or output quantity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FuzzyVariable {
    sets: BTreeMap<SetName, FuzzySet>,
}

impl FuzzyVariable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a set, replacing any set already under that name
    pub fn add_set(&mut self, name: SetName, set: FuzzySet) {
        self.sets.insert(name, set);
    }

    /// Builder form of [`add_set`](Self::add_set)
    pub fn with_set(mut self, name: SetName, set: FuzzySet) -> Self {
        self.add_set(name, set);
        self
    }

    pub fn get(&self, name: SetName) -> Option<&FuzzySet> {
        self.sets.get(&name)
    }

    pub fn contains(&self, name: SetName) -> bool {
        self.sets.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SetName, &FuzzySet)> {
        self.sets.iter().map(|(name, set)| (*name, set))
    }
}

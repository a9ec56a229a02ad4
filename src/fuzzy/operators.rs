//! Operator families selectable per run
//!
//! Each family is a closed enum; `FromStr` accepts both the descriptive names
//! and the short codes used by older configuration files (`tn_min`, `imp_m`...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fuzzy AND, used to combine the antecedents of one rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TNorm {
    #[default]
    Minimum,
    AlgebraicProduct,
    BoundedProduct,
    DrasticProduct,
}

impl TNorm {
    pub const ALL: [TNorm; 4] = [
        TNorm::Minimum,
        TNorm::AlgebraicProduct,
        TNorm::BoundedProduct,
        TNorm::DrasticProduct,
    ];

    #[inline]
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            TNorm::Minimum => a.min(b),
            TNorm::AlgebraicProduct => a * b,
            TNorm::BoundedProduct => (a + b - 1.0).max(0.0),
            TNorm::DrasticProduct => {
                if b == 1.0 {
                    a
                } else if a == 1.0 {
                    b
                } else {
                    0.0
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TNorm::Minimum => "minimum",
            TNorm::AlgebraicProduct => "algebraic_product",
            TNorm::BoundedProduct => "bounded_product",
            TNorm::DrasticProduct => "drastic_product",
        }
    }
}

/// Fuzzy OR, used to aggregate rule outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TConorm {
    #[default]
    Maximum,
    AlgebraicSum,
    BoundedSum,
    DrasticSum,
}

impl TConorm {
    pub const ALL: [TConorm; 4] = [
        TConorm::Maximum,
        TConorm::AlgebraicSum,
        TConorm::BoundedSum,
        TConorm::DrasticSum,
    ];

    #[inline]
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            TConorm::Maximum => a.max(b),
            TConorm::AlgebraicSum => a + b - a * b,
            TConorm::BoundedSum => (a + b).min(1.0),
            TConorm::DrasticSum => {
                if b == 0.0 {
                    a
                } else if a == 0.0 {
                    b
                } else {
                    1.0
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TConorm::Maximum => "maximum",
            TConorm::AlgebraicSum => "algebraic_sum",
            TConorm::BoundedSum => "bounded_sum",
            TConorm::DrasticSum => "drastic_sum",
        }
    }
}

/// Fuzzy implication `a → b`
///
/// `a` is the firing strength of a rule, `b` the consequent's degree at one
/// point of the output domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Implication {
    DienesRescher,
    Lukasiewicz,
    Zadeh,
    Godel,
    #[default]
    Mamdani,
    Product,
}

impl Implication {
    pub const ALL: [Implication; 6] = [
        Implication::DienesRescher,
        Implication::Lukasiewicz,
        Implication::Zadeh,
        Implication::Godel,
        Implication::Mamdani,
        Implication::Product,
    ];

    #[inline]
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            Implication::DienesRescher => (1.0 - a).max(b),
            Implication::Lukasiewicz => (1.0 - a + b).min(1.0),
            Implication::Zadeh => a.min(b).max(1.0 - a),
            Implication::Godel => {
                if a <= b {
                    1.0
                } else {
                    b / a
                }
            }
            Implication::Mamdani => a.min(b),
            Implication::Product => a * b,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Implication::DienesRescher => "dienes_rescher",
            Implication::Lukasiewicz => "lukasiewicz",
            Implication::Zadeh => "zadeh",
            Implication::Godel => "godel",
            Implication::Mamdani => "mamdani",
            Implication::Product => "product",
        }
    }
}

macro_rules! impl_operator_text {
    ($ty:ty, { $($alias:pat => $variant:expr),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let key = s.trim().to_lowercase().replace('-', "_");
                if let Some(op) = Self::ALL.iter().find(|op| op.as_str() == key) {
                    return Ok(*op);
                }
                match key.as_str() {
                    $($alias => Ok($variant),)+
                    _ => Err(format!("unknown {} '{}'", stringify!($ty), s)),
                }
            }
        }
    };
}

impl_operator_text!(TNorm, {
    "tn_min" | "min" => TNorm::Minimum,
    "tn_ap" | "product" => TNorm::AlgebraicProduct,
    "tn_bp" => TNorm::BoundedProduct,
    "tn_dp" => TNorm::DrasticProduct,
});

impl_operator_text!(TConorm, {
    "tc_max" | "max" => TConorm::Maximum,
    "tc_as" | "sum" => TConorm::AlgebraicSum,
    "tc_bs" => TConorm::BoundedSum,
    "tc_ds" => TConorm::DrasticSum,
});

impl_operator_text!(Implication, {
    "imp_dr" => Implication::DienesRescher,
    "imp_l" => Implication::Lukasiewicz,
    "imp_z" => Implication::Zadeh,
    "imp_g" | "goedel" => Implication::Godel,
    "imp_m" => Implication::Mamdani,
    "imp_p" => Implication::Product,
});

/// Fold a sequence pairwise from the right: `op(x0, op(x1, ... op(xn-1, xn)))`
pub(crate) fn fold_right<I, F>(values: I, op: F) -> Option<f64>
where
    I: DoubleEndedIterator<Item = f64>,
    F: Fn(f64, f64) -> f64,
{
    values.rev().reduce(|acc, v| op(v, acc))
}

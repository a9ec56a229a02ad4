//! Fuzzy inference engine
//!
//! Crisp inputs in, one crisp output out. The engine holds no per-call state:
//! - Sets are Gaussian, optionally with an open shoulder
//! - Operators are closed enums selected once per run
//! - The output domain is sampled on a fixed grid for aggregation

pub mod defuzzify;
pub mod operators;
pub mod set;
pub mod system;

pub use defuzzify::{Defuzzifier, Support};
pub use operators::{Implication, TConorm, TNorm};
pub use set::{FuzzySet, FuzzyVariable, SetName};
pub use system::{FuzzySystem, Operators, RuleOutput};

//! Mamdani-style inference with singleton fuzzification

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::defuzzify::{Defuzzifier, Support};
use super::operators::{Implication, TConorm, TNorm, fold_right};
use super::set::{FuzzySet, FuzzyVariable, SetName};
use crate::error::FuzzyError;

/// Operator selection for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Operators {
    /// Combination of antecedents within a rule
    pub t_norm: TNorm,
    /// Combination of rules
    pub t_conorm: TConorm,
    pub implication: Implication,
    pub defuzzifier: Defuzzifier,
}

/// Output of a single fired rule: a membership function over the consequence
/// domain derived from the consequent set and the rule's firing strength.
#[derive(Debug, Clone, Copy)]
pub struct RuleOutput<'a> {
    strength: f64,
    consequent: &'a FuzzySet,
    implication: Implication,
}

impl RuleOutput<'_> {
    /// Combined antecedent degree
    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn membership(&self, y: f64) -> f64 {
        self.implication
            .apply(self.strength, self.consequent.membership(y))
    }
}

/// Rule base plus the variables it refers to
///
/// Immutable while evaluating, so one system can be shared through an `Arc`
/// by several simulations.
#[derive(Debug, Clone)]
pub struct FuzzySystem {
    consequence: FuzzyVariable,
    antecedents: Vec<FuzzyVariable>,
    rules: BTreeMap<Vec<SetName>, SetName>,
    operators: Operators,
    support: Support,
}

impl FuzzySystem {
    /// Antecedent order here fixes the order of rule keys and crisp inputs.
    pub fn new(consequence: FuzzyVariable, antecedents: Vec<FuzzyVariable>) -> Self {
        Self {
            consequence,
            antecedents,
            rules: BTreeMap::new(),
            operators: Operators::default(),
            support: Support::default(),
        }
    }

    pub fn with_operators(mut self, operators: Operators) -> Self {
        self.operators = operators;
        self
    }

    pub fn with_support(mut self, support: Support) -> Self {
        self.support = support;
        self
    }

    pub fn set_operators(&mut self, operators: Operators) {
        self.operators = operators;
    }

    pub fn operators(&self) -> Operators {
        self.operators
    }

    pub fn support(&self) -> Support {
        self.support
    }

    pub fn antecedent_count(&self) -> usize {
        self.antecedents.len()
    }

    pub fn consequence(&self) -> &FuzzyVariable {
        &self.consequence
    }

    pub fn antecedents(&self) -> &[FuzzyVariable] {
        &self.antecedents
    }

    /// Register `antecedents → consequence`
    ///
    /// Every name must exist in its variable; on error the rule base is left
    /// untouched. A rule with the same antecedents replaces the old one.
    pub fn add_rule(
        &mut self,
        antecedents: &[SetName],
        consequence: SetName,
    ) -> Result<(), FuzzyError> {
        if antecedents.len() != self.antecedents.len() {
            return Err(FuzzyError::arity(self.antecedents.len(), antecedents.len()));
        }
        if !self.consequence.contains(consequence) {
            return Err(FuzzyError::UnknownSet {
                variable: "consequence".into(),
                name: consequence,
            });
        }
        for (idx, (name, variable)) in antecedents.iter().zip(&self.antecedents).enumerate() {
            if !variable.contains(*name) {
                return Err(FuzzyError::UnknownSet {
                    variable: format!("antecedent {idx}"),
                    name: *name,
                });
            }
        }

        if let Some(old) = self.rules.insert(antecedents.to_vec(), consequence) {
            log::debug!("rule {antecedents:?} overwritten ({old} -> {consequence})");
        }
        Ok(())
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule(&self, antecedents: &[SetName]) -> Option<SetName> {
        self.rules.get(antecedents).copied()
    }

    pub fn rules(&self) -> impl Iterator<Item = (&[SetName], SetName)> {
        self.rules.iter().map(|(k, v)| (k.as_slice(), *v))
    }

    /// Fire every rule for the given crisp inputs
    pub fn rule_outputs(&self, inputs: &[f64]) -> Result<Vec<RuleOutput<'_>>, FuzzyError> {
        if inputs.len() != self.antecedents.len() {
            return Err(FuzzyError::arity(self.antecedents.len(), inputs.len()));
        }

        self.rules
            .iter()
            .map(|(names, consequence)| {
                let degrees = names
                    .iter()
                    .zip(&self.antecedents)
                    .zip(inputs)
                    .enumerate()
                    .map(|(idx, ((name, variable), &x))| {
                        variable
                            .get(*name)
                            .map(|set| set.membership(x))
                            .ok_or_else(|| FuzzyError::UnknownSet {
                                variable: format!("antecedent {idx}"),
                                name: *name,
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let strength = fold_right(degrees.into_iter(), |a, b| {
                    self.operators.t_norm.apply(a, b)
                })
                .unwrap_or(1.0);

                let consequent =
                    self.consequence
                        .get(*consequence)
                        .ok_or_else(|| FuzzyError::UnknownSet {
                            variable: "consequence".into(),
                            name: *consequence,
                        })?;

                Ok(RuleOutput {
                    strength,
                    consequent,
                    implication: self.operators.implication,
                })
            })
            .collect()
    }

    /// Aggregated output membership sampled over the support, as `(y, degree)`
    pub fn aggregate(&self, inputs: &[f64]) -> Result<Vec<(f64, f64)>, FuzzyError> {
        let outputs = self.rule_outputs(inputs)?;
        if outputs.is_empty() {
            return Err(FuzzyError::EmptyRuleBase);
        }

        let t_conorm = self.operators.t_conorm;
        Ok(self
            .support
            .samples()
            .map(|y| {
                let degree = fold_right(outputs.iter().map(|r| r.membership(y)), |a, b| {
                    t_conorm.apply(a, b)
                })
                .unwrap_or(0.0);
                (y, degree)
            })
            .collect())
    }

    /// Crisp output for one crisp value per antecedent, in declared order
    pub fn singleton_result(&self, inputs: &[f64]) -> Result<f64, FuzzyError> {
        let aggregated = self.aggregate(inputs)?;
        Ok(self
            .operators
            .defuzzifier
            .defuzzify(&aggregated, self.support.midpoint()))
    }
}

//! Run settings
//!
//! Persisted as JSON. The defaults are the stock controller: three Gaussian
//! sets per variable and a nine-entry rule table.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_CAR_RADIUS, DEFAULT_FPS, DEFAULT_MAX_STEPS};
use crate::error::{FuzzyError, SettingsError};
use crate::fuzzy::{FuzzySet, FuzzySystem, FuzzyVariable, Operators, SetName, Support};

/// Membership parameters of one fuzzy set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetSettings {
    pub mean: f64,
    pub sigma: f64,
    #[serde(default)]
    pub ascending: bool,
    #[serde(default)]
    pub descending: bool,
}

impl SetSettings {
    const fn new(mean: f64, sigma: f64, ascending: bool, descending: bool) -> Self {
        Self {
            mean,
            sigma,
            ascending,
            descending,
        }
    }

    pub fn to_set(&self) -> Result<FuzzySet, FuzzyError> {
        FuzzySet::new(self.mean, self.sigma, self.ascending, self.descending)
    }
}

/// The small / medium / large sets of one variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariableSettings {
    pub small: SetSettings,
    pub medium: SetSettings,
    pub large: SetSettings,
}

impl VariableSettings {
    /// Small is open to the left, large open to the right
    const fn shouldered(means: [f64; 3], sigma: f64) -> Self {
        Self {
            small: SetSettings::new(means[0], sigma, false, true),
            medium: SetSettings::new(means[1], sigma, false, false),
            large: SetSettings::new(means[2], sigma, true, false),
        }
    }

    pub fn get(&self, name: SetName) -> &SetSettings {
        match name {
            SetName::Small => &self.small,
            SetName::Medium => &self.medium,
            SetName::Large => &self.large,
        }
    }

    pub fn to_variable(&self) -> Result<FuzzyVariable, FuzzyError> {
        let mut var = FuzzyVariable::new();
        for name in SetName::ALL {
            var.add_set(name, self.get(name).to_set()?);
        }
        Ok(var)
    }
}

/// `if front is F and left-right is D then wheel is C`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSettings {
    pub front: SetName,
    pub lr_diff: SetName,
    pub wheel: SetName,
}

/// Settings for a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Loop ===
    /// Ticks per second of wall-clock pacing; 0 runs as fast as possible
    pub fps: f64,
    /// Abort after this many ticks
    pub max_steps: Option<u64>,

    // === Car ===
    pub car_radius: f64,

    // === Controller ===
    pub operators: Operators,
    /// Sampled output domain used for aggregation
    pub support: Support,
    /// Front distance
    pub front: VariableSettings,
    /// Left minus right distance
    pub lr_diff: VariableSettings,
    /// Wheel angle
    pub consequence: VariableSettings,
    pub rules: Vec<RuleSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        use SetName::{Large, Small};

        // (front, lr_diff) pairs in small, medium, large order
        let table = [Large, Small, Small, Large, Small, Small, Large, Small, Small];
        let rules = SetName::ALL
            .into_iter()
            .flat_map(|front| SetName::ALL.into_iter().map(move |lr_diff| (front, lr_diff)))
            .zip(table)
            .map(|((front, lr_diff), wheel)| RuleSettings {
                front,
                lr_diff,
                wheel,
            })
            .collect();

        Self {
            fps: DEFAULT_FPS,
            max_steps: Some(DEFAULT_MAX_STEPS),

            car_radius: DEFAULT_CAR_RADIUS,

            operators: Operators::default(),
            support: Support::default(),
            front: VariableSettings::shouldered([5.0, 12.0, 20.0], 5.0),
            lr_diff: VariableSettings::shouldered([-10.0, 0.0, 10.0], 5.0),
            consequence: VariableSettings::shouldered([-12.0, 0.0, 12.0], 20.0),
            rules,
        }
    }
}

impl Settings {
    /// Wall-clock pause between ticks
    pub fn tick_interval(&self) -> Duration {
        if self.fps > 0.0 && self.fps.is_finite() {
            Duration::from_secs_f64(1.0 / self.fps)
        } else {
            Duration::ZERO
        }
    }

    /// Build the controller: antecedents are (front, left - right)
    pub fn build_fuzzy_system(&self) -> Result<FuzzySystem, FuzzyError> {
        let mut system = FuzzySystem::new(
            self.consequence.to_variable()?,
            vec![self.front.to_variable()?, self.lr_diff.to_variable()?],
        )
        .with_operators(self.operators)
        .with_support(self.support);

        for rule in &self.rules {
            system.add_rule(&[rule.front, rule.lr_diff], rule.wheel)?;
        }
        Ok(system)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Settings from `path`, or the defaults when it is missing or invalid
    pub fn from_file_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("Using default settings");
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Ignoring {}: {err}", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_rule_table() {
        let settings = Settings::default();
        assert_eq!(settings.rules.len(), 9);
        assert_eq!(
            settings.rules[0],
            RuleSettings {
                front: SetName::Small,
                lr_diff: SetName::Small,
                wheel: SetName::Large
            }
        );
        assert_eq!(
            settings.rules[5],
            RuleSettings {
                front: SetName::Medium,
                lr_diff: SetName::Large,
                wheel: SetName::Small
            }
        );
    }

    #[test]
    fn test_default_sets() {
        let settings = Settings::default();
        assert_eq!(settings.front.medium.mean, 12.0);
        assert!(settings.lr_diff.small.descending);
        assert!(settings.consequence.large.ascending);
        assert_eq!(settings.consequence.small.sigma, 20.0);
        assert_relative_eq!(settings.tick_interval().as_secs_f64(), 0.05);
    }

    #[test]
    fn test_default_system_builds() {
        let system = Settings::default().build_fuzzy_system().unwrap();
        assert_eq!(system.antecedent_count(), 2);
        assert_eq!(system.rule_count(), 9);
        let wheel = system.singleton_result(&[15.0, 2.0]).unwrap();
        assert!((-40.0..=40.0).contains(&wheel));
    }

    #[test]
    fn test_invalid_sigma_rejected() {
        let mut settings = Settings::default();
        settings.front.large.sigma = 0.0;
        assert_eq!(
            settings.build_fuzzy_system().unwrap_err(),
            FuzzyError::InvalidSpread(0.0)
        );
    }

    #[test]
    fn test_invalid_support_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        for (name, support) in [
            ("zero.json", r#"{ "min": -40.0, "max": 40.0, "resolution": 0.0 }"#),
            ("negative.json", r#"{ "min": -40.0, "max": 40.0, "resolution": -10.0 }"#),
            ("reversed.json", r#"{ "min": 40.0, "max": -40.0, "resolution": 10.0 }"#),
            ("huge.json", r#"{ "min": -40.0, "max": 40.0, "resolution": 1e12 }"#),
        ] {
            let path = dir.path().join(name);
            fs::write(&path, format!(r#"{{ "support": {support} }}"#)).unwrap();
            assert!(
                matches!(Settings::load(&path), Err(SettingsError::Json(_))),
                "{name} loaded"
            );
        }
    }

    #[test]
    fn test_custom_support_steers_within_bounds() {
        let settings = Settings {
            support: Support::new(-20.0, 20.0, 5.0).unwrap(),
            ..Default::default()
        };
        let system = settings.build_fuzzy_system().unwrap();
        assert_eq!(system.support().len(), 201);
        let wheel = system.singleton_result(&[30.0, 0.0]).unwrap();
        assert!(wheel > -20.0 && wheel < 20.0, "got {wheel}");
    }

    #[test]
    fn test_zero_fps_is_headless() {
        let settings = Settings {
            fps: 0.0,
            ..Default::default()
        };
        assert_eq!(settings.tick_interval(), Duration::ZERO);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.operators.t_norm = crate::fuzzy::TNorm::AlgebraicProduct;
        settings.max_steps = None;
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{ "car_radius": 2.5, "operators": { "t_norm": "bounded_product", "t_conorm": "maximum", "implication": "zadeh", "defuzzifier": "mean_of_maxima" } }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.car_radius, 2.5);
        assert_eq!(settings.operators.implication, crate::fuzzy::Implication::Zadeh);
        assert_eq!(settings.rules, Settings::default().rules);
    }

    #[test]
    fn test_fallback_on_missing_or_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            Settings::from_file_or_default(dir.path().join("absent.json")),
            Settings::default()
        );

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(Settings::load(&broken), Err(SettingsError::Json(_))));
        assert_eq!(Settings::from_file_or_default(&broken), Settings::default());
    }
}

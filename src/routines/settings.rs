use crate::routines::output::OutputFile;
use crate::structs::criteria::CriteriaScope;
use crate::structs::parameters::Bounds;
use config::Config as eConfig;
use eyre::{bail, Result, WrapErr};
use serde::Deserialize;
use serde_derive::Serialize;
use std::path::PathBuf;

/// Contains all settings of an experiment
///
/// Every stage of the experiment receives a reference to the same, immutable [Settings].
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq, Default)]
#[serde(deny_unknown_fields, default)]
pub struct Settings {
    /// Sampling of the ground-truth parameters and generation of the observations
    pub experiment: Experiment,
    /// The original, uninformed bounds of the parameters
    pub parameters: Parameters,
    /// The simulator to use
    pub model: Simulator,
    /// Configuration of the history matching stage
    pub hm: HistoryMatching,
    /// Configuration of the ABC rejection stage
    pub abc: Abc,
    /// Configuration for logging
    pub log: Log,
}

impl Settings {
    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        self.experiment.validate()?;
        self.parameters.bounds()?;
        self.model.validate()?;
        self.hm.validate()?;
        self.abc.validate()?;
        Ok(())
    }

    pub fn new() -> Self {
        Settings::default()
    }

    /// The folder all results are written to
    pub fn output_folder(&self) -> PathBuf {
        PathBuf::from(&self.experiment.output)
    }

    /// Writes a copy of the settings to `settings.json` in the output folder
    pub fn write(&self) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        let outputfile = OutputFile::new(&self.experiment.output, "settings.json")?;
        let mut file = outputfile.file;
        std::io::Write::write_all(&mut file, serialized.as_bytes())
            .wrap_err("Could not write settings to file")?;
        Ok(())
    }
}

/// The sequence used to draw the ground-truth parameters
#[derive(Debug, Deserialize, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sampler {
    Sobol,
    #[default]
    Latin,
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Experiment {
    /// Number of ground-truth parameter points
    pub samples: usize,
    /// Number of replications per point, giving the observation uncertainty
    pub repetitions: usize,
    /// Seed for the sampler and all simulator runs
    pub seed: u64,
    pub sampler: Sampler,
    /// Number of decimals the sampled parameters are rounded to
    pub rounding: u32,
    /// The (relative) path of the folder results are written to
    pub output: String,
}

impl Default for Experiment {
    fn default() -> Self {
        Experiment {
            samples: 100,
            repetitions: 10,
            seed: 1,
            sampler: Sampler::Latin,
            rounding: 4,
            output: String::from("results/"),
        }
    }
}

impl Experiment {
    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 {
            bail!("The number of samples must be positive");
        }
        if self.repetitions == 0 {
            bail!("The number of repetitions must be positive");
        }
        if self.rounding > 12 {
            bail!(
                "Rounding to {} decimals cannot be represented in a directory name, use at most 12",
                self.rounding
            );
        }
        if self.output.is_empty() {
            bail!("The output folder may not be empty");
        }
        Ok(())
    }
}

/// The uninformed bounds of the parameter space
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Parameters {
    pub scout_prob: (f64, f64),
    pub survival_prob: (f64, f64),
}

impl Default for Parameters {
    fn default() -> Self {
        let bounds = Bounds::default();
        Parameters {
            scout_prob: bounds.scout_prob,
            survival_prob: bounds.survival_prob,
        }
    }
}

impl Parameters {
    /// The parameters as [Bounds]
    ///
    /// Both parameters are probabilities, and the lower bound must be strictly less than the upper bound.
    pub fn bounds(&self) -> Result<Bounds> {
        for (name, (lower, upper)) in [("scout_prob", self.scout_prob), ("survival_prob", self.survival_prob)] {
            if lower >= upper {
                bail!(
                    "In key '{}', lower bound ({}) is not less than upper bound ({})",
                    name,
                    lower,
                    upper
                );
            }
            if lower < 0.0 || upper > 1.0 {
                bail!(
                    "In key '{}', bounds ({}, {}) are not within [0, 1]",
                    name,
                    lower,
                    upper
                );
            }
        }
        Bounds::new(self.scout_prob, self.survival_prob)
    }
}

/// The simulator used to produce model outputs
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Simulator {
    /// The built-in territory model
    Territory(Territory),
    /// An external program
    Command(Command),
}

impl Default for Simulator {
    fn default() -> Self {
        Simulator::Territory(Territory::default())
    }
}

impl Simulator {
    pub fn validate(&self) -> Result<()> {
        match self {
            Simulator::Territory(territory) => territory.validate(),
            Simulator::Command(command) => {
                if command.program.is_empty() {
                    bail!("The simulator program may not be empty");
                }
                Ok(())
            }
        }
    }
}

/// Parameters of the territory model that are not calibrated
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Territory {
    /// Number of breeding sites
    pub territories: u32,
    /// Years simulated before outputs are recorded
    pub burn_in: u32,
    /// Years over which the outputs are recorded
    pub years: u32,
    /// Mean number of fledglings per breeding pair and year
    pub fecundity: f64,
    /// Probability of a fledgling surviving its first year
    pub juvenile_survival: f64,
    /// Fraction of sites occupied at the start
    pub initial_occupancy: f64,
}

impl Default for Territory {
    fn default() -> Self {
        Territory {
            territories: 50,
            burn_in: 50,
            years: 20,
            fecundity: 1.5,
            juvenile_survival: 0.2,
            initial_occupancy: 0.5,
        }
    }
}

impl Territory {
    pub fn validate(&self) -> Result<()> {
        if self.territories == 0 {
            bail!("The territory model needs at least one territory");
        }
        if self.years == 0 {
            bail!("The territory model must record at least one year");
        }
        if !(self.fecundity >= 0.0) || !self.fecundity.is_finite() {
            bail!("Fecundity must be a non-negative number, got {}", self.fecundity);
        }
        for (name, value) in [
            ("juvenile_survival", self.juvenile_survival),
            ("initial_occupancy", self.initial_occupancy),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("'{}' must be a probability, got {}", name, value);
            }
        }
        Ok(())
    }
}

/// An external simulator
///
/// The program is called as `program [args...] <scout_prob> <survival_prob> <seed>` and must print the abundance,
/// variation and vacancies, separated by whitespace, to stdout.
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq, Default)]
#[serde(deny_unknown_fields, default)]
pub struct Command {
    pub program: String,
    pub args: Vec<String>,
}

/// Configuration of the history matching waves
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct HistoryMatching {
    /// Maximum number of waves
    pub waves: usize,
    /// Candidate points evaluated per wave
    pub points: usize,
    /// Replications per candidate point
    pub repetitions: usize,
    /// Maximum implausibility of a non-implausible point
    pub cutoff: f64,
    /// Stop once a wave reduces the area of the non-implausible bounds by less than this fraction
    pub min_shrinkage: f64,
}

impl Default for HistoryMatching {
    fn default() -> Self {
        HistoryMatching {
            waves: 5,
            points: 256,
            repetitions: 10,
            cutoff: 3.0,
            min_shrinkage: 0.01,
        }
    }
}

impl HistoryMatching {
    pub fn validate(&self) -> Result<()> {
        if self.waves == 0 || self.points == 0 || self.repetitions == 0 {
            bail!("History matching needs at least one wave, point and repetition");
        }
        if self.points > u32::MAX as usize {
            bail!("At most {} points can be drawn per wave", u32::MAX);
        }
        if !(self.cutoff > 0.0) {
            bail!("The implausibility cutoff must be positive, got {}", self.cutoff);
        }
        if !(0.0..1.0).contains(&self.min_shrinkage) {
            bail!(
                "The minimum shrinkage must be in [0, 1), got {}",
                self.min_shrinkage
            );
        }
        Ok(())
    }
}

/// Configuration of ABC rejection sampling
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Abc {
    /// Number of points to accept per run
    pub accepted: usize,
    /// Maximum distance of an accepted point
    pub threshold: f64,
    /// Outputs the distance is computed over
    pub criteria: CriteriaScope,
    /// Abort a run after this many simulator runs
    pub max_attempts: u64,
}

impl Default for Abc {
    fn default() -> Self {
        Abc {
            accepted: 1000,
            threshold: 1.0,
            criteria: CriteriaScope::LastOutput,
            max_attempts: 10_000_000,
        }
    }
}

impl Abc {
    pub fn validate(&self) -> Result<()> {
        if self.accepted == 0 {
            bail!("ABC must accept at least one point");
        }
        if !(self.threshold >= 0.0) {
            bail!("The ABC threshold must be non-negative, got {}", self.threshold);
        }
        if self.max_attempts < self.accepted as u64 {
            bail!(
                "The maximum number of attempts ({}) is less than the number of points to accept ({})",
                self.max_attempts,
                self.accepted
            );
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Log {
    /// The maximum log level to display
    ///
    /// The log level is defined as a string, and can be one of the following:
    /// - `trace`
    /// - `debug`
    /// - `info`
    /// - `warn`
    /// - `error`
    pub level: String,
    /// The file to write the log to, relative to the output folder
    pub file: String,
    /// Whether to write logs
    ///
    /// If set to `false`, no global subscriber is set.
    pub write: bool,
}

impl Default for Log {
    fn default() -> Self {
        Log {
            level: String::from("info"),
            file: String::from("log.txt"),
            write: true,
        }
    }
}

/// Parses the settings from a TOML configuration file
///
/// Entries in the TOML file may be overridden by environment variables. The environment variables must be prefixed
/// with `HOOPOES`, and the TOML entry must be in uppercase. A double underscore, `__`, is used as the separator for
/// nested entries, e.g. `HOOPOES__ABC__THRESHOLD=0.5`. Values that look like numbers or booleans are parsed as such.
pub fn read(path: impl Into<String>) -> Result<Settings> {
    let settings_path = path.into();

    let parsed = eConfig::builder()
        .add_source(config::File::with_name(&settings_path).format(config::FileFormat::Toml))
        .add_source(
            config::Environment::with_prefix("HOOPOES")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .wrap_err_with(|| format!("Unable to read settings from '{}'", settings_path))?;

    let settings: Settings = parsed
        .try_deserialize()
        .wrap_err_with(|| format!("Invalid settings in '{}'", settings_path))?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::new();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.parameters.bounds().unwrap(), Bounds::default());
        assert_eq!(settings.abc.criteria, CriteriaScope::LastOutput);
    }

    #[test]
    fn test_invalid_parameters() {
        let mut settings = Settings::new();
        settings.parameters.scout_prob = (0.5, 0.1);
        assert!(settings.validate().is_err());
        settings.parameters.scout_prob = (0.0, 1.5);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_abc() {
        let mut settings = Settings::new();
        settings.abc.max_attempts = 10;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut settings = Settings::new();
        settings.model = Simulator::Command(Command {
            program: "pyrun".to_string(),
            args: vec!["--solo".to_string()],
        });
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"kind\":\"command\""));
        let deserialized: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, settings);
    }

    #[test]
    fn test_unknown_model_fields() {
        let territory = r#"{"kind": "territory", "territorys": 10}"#;
        assert!(serde_json::from_str::<Simulator>(territory).is_err());
        let command = r#"{"kind": "command", "program": "pyrun", "arg": ["--solo"]}"#;
        assert!(serde_json::from_str::<Simulator>(command).is_err());

        let valid = r#"{"kind": "territory", "territories": 10}"#;
        match serde_json::from_str::<Simulator>(valid).unwrap() {
            Simulator::Territory(territory) => assert_eq!(territory.territories, 10),
            other => panic!("Expected the territory model, got {:?}", other),
        }
    }
}

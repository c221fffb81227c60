use super::Model;
use crate::routines::settings::Command;
use crate::structs::observation::OutputTriple;
use crate::structs::parameters::ParameterPoint;
use eyre::{bail, Result, WrapErr};

/// A simulator implemented by an external program
#[derive(Debug, Clone)]
pub struct CommandModel {
    settings: Command,
}

impl CommandModel {
    pub fn new(settings: Command) -> Self {
        CommandModel { settings }
    }
}

/// Parse the abundance, variation and vacancies printed by the simulator
pub(crate) fn parse_output(stdout: &str) -> Result<OutputTriple> {
    let values = stdout
        .split_whitespace()
        .map(|v| {
            v.parse::<f64>()
                .wrap_err_with(|| format!("Unable to parse simulator output '{}'", v))
        })
        .collect::<Result<Vec<f64>>>()?;
    match values.as_slice() {
        [abundance, variation, vacancies] => Ok(OutputTriple::new(*abundance, *variation, *vacancies)),
        _ => bail!(
            "Expected three values (abundance, variation, vacancies) from the simulator, got {}",
            values.len()
        ),
    }
}

impl Model for CommandModel {
    fn simulate(&self, point: &ParameterPoint, seed: u64) -> Result<OutputTriple> {
        let output = std::process::Command::new(&self.settings.program)
            .args(&self.settings.args)
            .arg(point.scout_prob.to_string())
            .arg(point.survival_prob.to_string())
            .arg(seed.to_string())
            .output()
            .wrap_err_with(|| format!("Unable to run simulator '{}'", self.settings.program))?;

        if !output.status.success() {
            bail!(
                "Simulator '{}' failed ({}) for {}: {}",
                self.settings.program,
                output.status,
                point,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        parse_output(&String::from_utf8_lossy(&output.stdout))
            .wrap_err_with(|| format!("Invalid output of simulator '{}'", self.settings.program))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output() {
        let output = parse_output("24.5 1.25\n25.5\n").unwrap();
        assert_eq!(output, OutputTriple::new(24.5, 1.25, 25.5));
        assert!(parse_output("1.0 2.0").is_err());
        assert!(parse_output("1.0 two 3.0").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_echo_simulator() {
        let model = CommandModel::new(Command {
            program: "echo".to_string(),
            args: vec![],
        });
        // `echo` prints its arguments back: scout_prob, survival_prob and seed
        let output = model.simulate(&ParameterPoint::new(0.25, 0.975), 7).unwrap();
        assert_eq!(output, OutputTriple::new(0.25, 0.975, 7.0));
    }

    #[test]
    fn test_missing_program() {
        let model = CommandModel::new(Command {
            program: "this-simulator-does-not-exist".to_string(),
            args: vec![],
        });
        assert!(model.simulate(&ParameterPoint::new(0.25, 0.975), 7).is_err());
    }
}

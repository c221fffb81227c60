//! Environment overrides are process wide, so they live in their own test binary.

use eyre::Result;
use hoopoes::prelude::*;
use hoopoes::routines::settings::Simulator;

#[test]
fn test_environment_overrides() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[experiment]
samples = 10

[model]
kind = "territory"
territories = 30

[abc]
threshold = 1.0
"#,
    )?;

    std::env::set_var("HOOPOES__MODEL__TERRITORIES", "60");
    std::env::set_var("HOOPOES__ABC__THRESHOLD", "0.5");
    std::env::set_var("HOOPOES__EXPERIMENT__SAMPLES", "7");
    let result = settings::read(path.to_string_lossy().into_owned());
    for key in [
        "HOOPOES__MODEL__TERRITORIES",
        "HOOPOES__ABC__THRESHOLD",
        "HOOPOES__EXPERIMENT__SAMPLES",
    ] {
        std::env::remove_var(key);
    }

    let settings = result?;
    assert_eq!(settings.experiment.samples, 7);
    assert_eq!(settings.abc.threshold, 0.5);
    match settings.model {
        Simulator::Territory(territory) => {
            assert_eq!(territory.territories, 60);
            assert_eq!(territory.years, 20);
        }
        other => panic!("Expected the territory model, got {:?}", other),
    }
    Ok(())
}

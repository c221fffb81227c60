#[cfg(test)]
use crate::prelude::*;
#[cfg(test)]
use crate::routines::settings::{Sampler, Simulator};

#[test]
fn basic_sobol() {
    let points = sobol::generate(5, &ORIG_BOUNDS, 347).unwrap();
    assert_eq!(points.len(), 5);
    for point in &points {
        assert!(ORIG_BOUNDS.contains(point));
    }
    assert_eq!(points, sobol::generate(5, &ORIG_BOUNDS, 347).unwrap());
    assert_ne!(points, sobol::generate(5, &ORIG_BOUNDS, 348).unwrap());
}

#[test]
fn read_mandatory_settings() {
    let settings = settings::read("src/tests/config.toml").unwrap();
    assert_eq!(settings.experiment.samples, 20);
    assert_eq!(settings.experiment.repetitions, 5);
    assert_eq!(settings.experiment.seed, 347);
    assert_eq!(settings.experiment.sampler, Sampler::Sobol);
    assert_eq!(settings.hm.waves, 3);
    assert_eq!(settings.abc.criteria, CriteriaScope::AllOutputs);
    assert!(!settings.log.write);
}

#[test]
fn read_parameter_ranges() {
    let settings = settings::read("src/tests/config.toml").unwrap();
    assert_eq!(settings.parameters.bounds().unwrap(), ORIG_BOUNDS);
}

#[test]
fn read_model() {
    let settings = settings::read("src/tests/config.toml").unwrap();
    match &settings.model {
        Simulator::Territory(territory) => {
            assert_eq!(territory.territories, 30);
            assert_eq!(territory.juvenile_survival, 0.25);
            // Not given, so the default applies
            assert_eq!(territory.initial_occupancy, 0.5);
        }
        other => panic!("Expected the territory model, got {:?}", other),
    }
}

#[test]
fn sample_space_is_rounded() {
    let settings = settings::read("src/tests/config.toml").unwrap();
    let points = sample_space(&settings.experiment, &ORIG_BOUNDS).unwrap();
    assert_eq!(points.len(), 20);
    for point in points {
        assert_eq!(point, point.rounded(4));
    }
}

#[test]
fn territory_model_from_settings() {
    let settings = settings::read("src/tests/config.toml").unwrap();
    let engine = Engine::new(&settings.model).unwrap();
    let ensemble = engine
        .run_ensemble(&ParameterPoint::new(0.25, 0.98), 3, 1)
        .unwrap();
    assert_eq!(ensemble.len(), 3);
    for output in ensemble {
        assert!(output.abundance >= 0.0 && output.abundance <= 30.0);
        assert!((output.abundance + output.vacancies - 30.0).abs() < 1e-9);
    }
}

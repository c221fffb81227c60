mod common;

use common::{test_settings, Counting};
use eyre::Result;
use hoopoes::analysis::abc::Outcome;
use hoopoes::prelude::*;

fn hm_done(store: &Store, records: &[ObservationRecord]) -> Result<Vec<ObservationRecord>> {
    let mut done = Vec::new();
    for record in records {
        if store.status(record)?.status == SampleStatus::HmDone {
            done.push(record.clone());
        }
    }
    Ok(done)
}

#[test]
fn test_same_seed_same_sample() -> Result<()> {
    let (_first_dir, first) = test_settings();
    let (_second_dir, second) = test_settings();
    let model = Counting::default();

    let a = entrypoints::observe_with(&first, &model)?;
    let b = entrypoints::observe_with(&second, &model)?;
    assert_eq!(a, b);

    let mut other = first.clone();
    other.experiment.seed += 1;
    assert_ne!(
        sample_space(&first.experiment, &ORIG_BOUNDS)?,
        sample_space(&other.experiment, &ORIG_BOUNDS)?
    );
    Ok(())
}

#[test]
fn test_observations_resume_after_last_record() -> Result<()> {
    let (_dir, settings) = test_settings();
    let model = Counting::default();
    let records = entrypoints::observe_with(&settings, &model)?;
    assert_eq!(records.len(), 4);
    assert_eq!(model.calls(), 4 * 5);

    // Keep only the first two records, as if the run had been interrupted
    let store = Store::new(settings.output_folder());
    let contents = std::fs::read_to_string(store.observations_path())?;
    let kept: Vec<&str> = contents.lines().take(2).collect();
    std::fs::write(store.observations_path(), kept.join("\n") + "\n")?;

    model.reset();
    let resumed = entrypoints::observe_with(&settings, &model)?;
    assert_eq!(model.calls(), 2 * 5);
    assert_eq!(resumed, records);
    assert_eq!(store.load_observations()?, records);

    // Nothing left to do
    model.reset();
    entrypoints::observe_with(&settings, &model)?;
    assert_eq!(model.calls(), 0);
    Ok(())
}

#[test]
fn test_observations_resume_after_interrupted_append() -> Result<()> {
    let (_dir, settings) = test_settings();
    let model = Counting::default();
    let records = entrypoints::observe_with(&settings, &model)?;

    // Two complete records and the start of the third
    let store = Store::new(settings.output_folder());
    let contents = std::fs::read_to_string(store.observations_path())?;
    let lines: Vec<&str> = contents.lines().collect();
    let torn = format!("{}\n{}\n{}", lines[0], lines[1], &lines[2][..20]);
    std::fs::write(store.observations_path(), torn)?;
    assert_eq!(entrypoints::status(&settings)?.pending, 2);

    model.reset();
    let resumed = entrypoints::observe_with(&settings, &model)?;
    assert_eq!(model.calls(), 2 * 5);
    assert_eq!(resumed, records);
    assert_eq!(store.load_observations()?, records);
    assert_eq!(std::fs::read_to_string(store.observations_path())?, contents);
    Ok(())
}

#[test]
fn test_observations_of_another_experiment_are_rejected() -> Result<()> {
    let (_dir, settings) = test_settings();
    let model = Counting::default();
    entrypoints::observe_with(&settings, &model)?;

    let mut other = settings.clone();
    other.experiment.seed = 7;
    assert!(entrypoints::observe_with(&other, &model).is_err());
    Ok(())
}

#[test]
fn test_missing_observations() {
    let (_dir, settings) = test_settings();
    let model = Counting::default();
    for result in [
        entrypoints::history_match_with(&settings, &model).map(|_| ()),
        entrypoints::abc_with(&settings, &model).map(|_| ()),
        entrypoints::analyse_hm(&settings).map(|_| ()),
        entrypoints::analyse_abc(&settings).map(|_| ()),
    ] {
        let message = format!("{:?}", result.unwrap_err());
        assert!(message.contains("hoopoes observe"), "{}", message);
    }
    assert_eq!(model.calls(), 0);
}

#[test]
fn test_history_matching_is_idempotent() -> Result<()> {
    let (_dir, settings) = test_settings();
    let model = Counting::default();
    let records = entrypoints::observe_with(&settings, &model)?;

    model.reset();
    let first = entrypoints::history_match_with(&settings, &model)?;
    assert_eq!(first.completed, records.len());
    assert_eq!(first.simulator_runs as usize, model.calls());

    let store = Store::new(settings.output_folder());
    for record in &records {
        let state = store.status(record)?;
        assert!(state.status.hm_complete());
        assert!(state.hm_runs.is_some());
        assert!(store.last_wave(record)?.is_some());
    }

    model.reset();
    let second = entrypoints::history_match_with(&settings, &model)?;
    assert_eq!(model.calls(), 0);
    assert_eq!(second.completed, 0);
    assert_eq!(second.skipped, records.len());
    Ok(())
}

#[test]
fn test_abc_skips_existing_results() -> Result<()> {
    let (_dir, settings) = test_settings();
    let model = Counting::default();
    let records = entrypoints::observe_with(&settings, &model)?;
    entrypoints::history_match_with(&settings, &model)?;

    let store = Store::new(settings.output_folder());
    let done = hm_done(&store, &records)?;
    assert!(!done.is_empty());

    model.reset();
    let report = entrypoints::abc_with(&settings, &model)?;
    assert_eq!(report.completed, done.len());
    assert!(model.calls() > 0);
    for record in &done {
        assert!(store.has_abc_run(record, Variant::Informed));
        assert!(store.has_abc_run(record, Variant::Uninformed));
        assert_eq!(store.status(record)?.status, SampleStatus::AbcDone);
    }

    // Both result files exist, but the status was lost
    let record = &done[0];
    let state = store.status(record)?;
    store.set_status(record, &state.advance(SampleStatus::HmDone))?;
    let before = store.read_abc_run(record, Variant::Informed)?;

    model.reset();
    let report = entrypoints::abc_with(&settings, &model)?;
    assert_eq!(model.calls(), 0);
    assert_eq!(report.completed, 1);
    assert_eq!(store.status(record)?.status, SampleStatus::AbcDone);
    assert_eq!(store.read_abc_run(record, Variant::Informed)?, before);
    Ok(())
}

#[test]
fn test_informed_prior_is_hm_bounds() -> Result<()> {
    let (_dir, settings) = test_settings();
    let model = Counting::default();
    let records = entrypoints::observe_with(&settings, &model)?;
    entrypoints::history_match_with(&settings, &model)?;
    entrypoints::abc_with(&settings, &model)?;

    let store = Store::new(settings.output_folder());
    let finished: Vec<&ObservationRecord> = records
        .iter()
        .filter(|r| store.has_abc_run(r, Variant::Informed))
        .collect();
    assert!(!finished.is_empty());
    for record in finished {
        let wave = store.last_wave(record)?.unwrap();
        let informed = store.read_abc_run(record, Variant::Informed)?;
        let uninformed = store.read_abc_run(record, Variant::Uninformed)?;
        let bounds = wave.bounds().unwrap();
        assert_eq!(informed.prior, bounds);
        assert_eq!(uninformed.prior, ORIG_BOUNDS);
        assert_eq!(informed.len(), 20);
        for point in informed.points() {
            assert!(bounds.contains(&point));
        }
    }
    Ok(())
}

#[test]
fn test_run_all() -> Result<()> {
    let (dir, settings) = test_settings();
    let model = Counting::default();
    let results = entrypoints::run_all_with(&settings, &model)?;

    let report = entrypoints::status(&settings)?;
    assert_eq!(report.pending, 0);
    let printed = report.to_string();
    assert!(printed.starts_with("not yet observed: 0\n"), "{}", printed);
    let done = format!("ABC rejection done: {}\n", report.count(SampleStatus::AbcDone));
    assert!(printed.contains(&done), "{}", printed);
    assert_eq!(report.count(SampleStatus::Sampled), 0);
    assert_eq!(report.count(SampleStatus::Observed), 0);
    assert_eq!(report.count(SampleStatus::HmDone), 0);
    assert_eq!(
        report.count(SampleStatus::HmEmpty) + report.count(SampleStatus::AbcDone),
        results.records.len()
    );

    assert_eq!(results.hm.rows.len(), results.records.len());
    assert_eq!(results.hm.empty, report.count(SampleStatus::HmEmpty));
    assert_eq!(results.abc.rows.len(), report.count(SampleStatus::AbcDone));
    assert_eq!(results.abc.tally.total(), results.abc.rows.len());
    for row in &results.abc.rows {
        assert_eq!(
            row.outcome,
            Outcome::classify(row.contained_with_hm, row.contained_without_hm)
        );
        assert!(row.hm_runs.is_some());
        assert!(row.runs_with_hm >= 20 && row.runs_without_hm >= 20);
    }

    for file in ["hm_analysis.csv", "abc_analysis.csv", "observations.jsonl"] {
        assert!(dir.path().join(file).exists(), "{} is missing", file);
    }

    // A second pass has nothing left to do
    model.reset();
    entrypoints::run_all_with(&settings, &model)?;
    assert_eq!(model.calls(), 0);
    Ok(())
}

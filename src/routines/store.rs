//! On-disk layout of an experiment
//!
//! ```text
//! <output>/observations.jsonl          one observation record per line
//! <output>/<results_dir>/status.json   the stage a sample has reached
//! <output>/<results_dir>/wave_<n>.json history matching waves
//! <output>/<results_dir>/abc_reject.json, abc_reject_hm.json
//! ```
//!
//! Every artifact is wrapped in a versioned envelope, `{"version": 1, "kind": "...", "data": ...}`.

use crate::algorithms::{SampleState, SampleStatus};
use crate::structs::observation::ObservationRecord;
use crate::structs::region::{AbcRun, Variant, Wave};
use eyre::{bail, Result, WrapErr};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Version of the serialization format written by this crate
pub const FORMAT_VERSION: u32 = 1;

const OBSERVATIONS: &str = "observations.jsonl";
const STATUS: &str = "status.json";

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    kind: String,
    data: T,
}

fn unwrap_envelope<T>(envelope: Envelope<T>, kind: &str, origin: &Path) -> Result<T> {
    if envelope.version != FORMAT_VERSION {
        bail!(
            "{} was written with format version {}, but only version {} is supported",
            origin.display(),
            envelope.version,
            FORMAT_VERSION
        );
    }
    if envelope.kind != kind {
        bail!(
            "{} holds a '{}' record, expected '{}'",
            origin.display(),
            envelope.kind,
            kind
        );
    }
    Ok(envelope.data)
}

/// Serialize `data` to `path`
///
/// The data is written to a temporary file first and then renamed, so that `path` never holds a partial record.
pub fn write_versioned<T: Serialize>(path: &Path, kind: &str, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Unable to create folder {}", parent.display()))?;
    }
    let envelope = Envelope {
        version: FORMAT_VERSION,
        kind: kind.to_string(),
        data,
    };
    let serialized = serde_json::to_string_pretty(&envelope)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serialized).wrap_err_with(|| format!("Unable to write {}", tmp.display()))?;
    fs::rename(&tmp, path).wrap_err_with(|| format!("Unable to write {}", path.display()))?;
    Ok(())
}

pub fn read_versioned<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<T> {
    let contents =
        fs::read_to_string(path).wrap_err_with(|| format!("Unable to read {}", path.display()))?;
    let envelope: Envelope<T> = serde_json::from_str(&contents)
        .wrap_err_with(|| format!("Malformed {} in {}", kind, path.display()))?;
    unwrap_envelope(envelope, kind, path)
}

/// Path of the file holding history matching wave `wave`
pub fn wave_path(dir: &Path, wave: usize) -> PathBuf {
    dir.join(format!("wave_{}.json", wave))
}

pub fn write_wave(dir: &Path, wave: &Wave) -> Result<()> {
    write_versioned(&wave_path(dir, wave.wave), "wave", wave)
}

/// The numbers of all waves present in `dir`, in increasing order
pub fn wave_numbers(dir: &Path) -> Result<Vec<usize>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut numbers = Vec::new();
    for entry in fs::read_dir(dir).wrap_err_with(|| format!("Unable to list {}", dir.display()))? {
        let name = entry?.file_name();
        let number = name
            .to_str()
            .and_then(|n| n.strip_prefix("wave_"))
            .and_then(|n| n.strip_suffix(".json"))
            .and_then(|n| n.parse::<usize>().ok());
        if let Some(number) = number {
            numbers.push(number);
        }
    }
    numbers.sort_unstable();
    Ok(numbers)
}

/// Delete all history matching waves in `dir`, returning how many were removed
pub fn remove_waves(dir: &Path) -> Result<usize> {
    let numbers = wave_numbers(dir)?;
    for &number in &numbers {
        let path = wave_path(dir, number);
        fs::remove_file(&path).wrap_err_with(|| format!("Unable to remove {}", path.display()))?;
    }
    Ok(numbers.len())
}

/// The final history matching wave written to `dir`, if any
pub fn last_wave(dir: &Path) -> Result<Option<Wave>> {
    match wave_numbers(dir)?.last() {
        Some(&number) => Ok(Some(read_versioned(&wave_path(dir, number), "wave")?)),
        None => Ok(None),
    }
}

/// Observation records read from disk, with what is needed to repair an interrupted append
#[derive(Debug, Default)]
struct ObservationScan {
    records: Vec<ObservationRecord>,
    /// Length in bytes of the well-formed prefix
    valid_len: usize,
    /// The final line is incomplete
    torn: bool,
    /// The file does not end with a newline
    unterminated: bool,
}

/// Access to all artifacts of an experiment below its output folder
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Store { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn observations_path(&self) -> PathBuf {
        self.root.join(OBSERVATIONS)
    }

    pub fn sample_dir(&self, record: &ObservationRecord) -> PathBuf {
        self.root.join(&record.results_dir)
    }

    /// Read all observation records, or an empty list if none have been generated yet
    ///
    /// An unterminated final line that does not parse is the remains of an interrupted append. It is skipped with a
    /// warning; use [Store::repair_observations] to remove it before appending.
    pub fn read_observations(&self) -> Result<Vec<ObservationRecord>> {
        Ok(self.scan_observations()?.records)
    }

    fn scan_observations(&self) -> Result<ObservationScan> {
        let path = self.observations_path();
        if !path.exists() {
            return Ok(ObservationScan::default());
        }
        let bytes = fs::read(&path).wrap_err_with(|| format!("Unable to read {}", path.display()))?;
        let mut scan = ObservationScan {
            unterminated: bytes.last().is_some_and(|b| *b != b'\n'),
            ..ObservationScan::default()
        };
        for (number, chunk) in bytes.split_inclusive(|b| *b == b'\n').enumerate() {
            let line = chunk.strip_suffix(b"\n").unwrap_or(chunk);
            if line.iter().all(u8::is_ascii_whitespace) {
                scan.valid_len += chunk.len();
                continue;
            }
            let envelope: Envelope<ObservationRecord> = match serde_json::from_slice(line) {
                Ok(envelope) => envelope,
                Err(error) if line.len() == chunk.len() => {
                    tracing::warn!(
                        "Ignoring incomplete observation on line {} of {}: {}",
                        number + 1,
                        path.display(),
                        error
                    );
                    scan.torn = true;
                    return Ok(scan);
                }
                Err(error) => {
                    return Err(error).wrap_err_with(|| {
                        format!("Malformed observation on line {} of {}", number + 1, path.display())
                    });
                }
            };
            let record = unwrap_envelope(envelope, "observation", &path)?;
            if record.index != scan.records.len() {
                bail!(
                    "Observation on line {} of {} has index {}, expected {}",
                    number + 1,
                    path.display(),
                    record.index,
                    scan.records.len()
                );
            }
            scan.records.push(record);
            scan.valid_len += chunk.len();
        }
        Ok(scan)
    }

    /// Read all observation records and leave the file ready for appending
    ///
    /// An incomplete final line is truncated, and a complete final line without its newline is terminated.
    pub fn repair_observations(&self) -> Result<Vec<ObservationRecord>> {
        let scan = self.scan_observations()?;
        let path = self.observations_path();
        if scan.torn {
            let file = OpenOptions::new()
                .write(true)
                .open(&path)
                .wrap_err_with(|| format!("Unable to open {}", path.display()))?;
            file.set_len(scan.valid_len as u64)
                .and_then(|_| file.sync_data())
                .wrap_err_with(|| format!("Unable to truncate {}", path.display()))?;
            tracing::warn!(
                "Removed an incomplete observation after record {} of {}",
                scan.records.len(),
                path.display()
            );
        } else if scan.unterminated {
            let mut file = OpenOptions::new()
                .append(true)
                .open(&path)
                .wrap_err_with(|| format!("Unable to open {}", path.display()))?;
            file.write_all(b"\n")
                .and_then(|_| file.sync_data())
                .wrap_err_with(|| format!("Unable to write {}", path.display()))?;
        }
        Ok(scan.records)
    }

    /// Read all observation records, failing if the observations have not been generated
    pub fn load_observations(&self) -> Result<Vec<ObservationRecord>> {
        let records = self.read_observations()?;
        if records.is_empty() {
            bail!(
                "No observations found in {}. Run `hoopoes observe` first.",
                self.observations_path().display()
            );
        }
        Ok(records)
    }

    /// Append a single record to the observations, flushing it to disk
    pub fn append_observation(&self, record: &ObservationRecord) -> Result<()> {
        fs::create_dir_all(&self.root)
            .wrap_err_with(|| format!("Unable to create folder {}", self.root.display()))?;
        let path = self.observations_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .wrap_err_with(|| format!("Unable to open {}", path.display()))?;
        let envelope = Envelope {
            version: FORMAT_VERSION,
            kind: "observation".to_string(),
            data: record,
        };
        let mut line = serde_json::to_string(&envelope)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        file.sync_data()?;
        Ok(())
    }

    /// The state of a sample; samples without a status file are [SampleStatus::Sampled]
    pub fn status(&self, record: &ObservationRecord) -> Result<SampleState> {
        let path = self.sample_dir(record).join(STATUS);
        if !path.exists() {
            return Ok(SampleState::new(SampleStatus::Sampled));
        }
        read_versioned(&path, "status")
    }

    pub fn set_status(&self, record: &ObservationRecord, state: &SampleState) -> Result<()> {
        write_versioned(&self.sample_dir(record).join(STATUS), "status", state)
    }

    pub fn last_wave(&self, record: &ObservationRecord) -> Result<Option<Wave>> {
        last_wave(&self.sample_dir(record))
    }

    pub fn abc_path(&self, record: &ObservationRecord, variant: Variant) -> PathBuf {
        self.sample_dir(record)
            .join(format!("abc_reject{}.json", variant.suffix()))
    }

    pub fn has_abc_run(&self, record: &ObservationRecord, variant: Variant) -> bool {
        self.abc_path(record, variant).exists()
    }

    pub fn write_abc_run(&self, record: &ObservationRecord, run: &AbcRun) -> Result<()> {
        write_versioned(&self.abc_path(record, run.variant), "abc_reject", run)
    }

    pub fn read_abc_run(&self, record: &ObservationRecord, variant: Variant) -> Result<AbcRun> {
        let run: AbcRun = read_versioned(&self.abc_path(record, variant), "abc_reject")?;
        if run.variant != variant {
            bail!(
                "{} holds an {} run, expected {}",
                self.abc_path(record, variant).display(),
                run.variant,
                variant
            );
        }
        Ok(run)
    }
}

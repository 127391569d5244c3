//! Model and metrics artifacts on disk
//!
//! Model file layout: 4 magic bytes, then a bincode [`ArtifactHeader`], then the
//! bincode-encoded [`TrainedModel`]. The header is checked before the body is
//! decoded so a file written for another feature order is rejected instead of
//! silently mispredicting.

use crate::error::{Result, WindError};
use crate::features::FEATURE_NAMES;
use crate::training::{MetricsRecord, TrainedModel};
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Leading bytes of every model artifact
pub const ARTIFACT_MAGIC: [u8; 4] = *b"WSPD";

/// Bumped whenever the body encoding changes
pub const SCHEMA_VERSION: u32 = 1;

/// Metadata written ahead of the model body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    pub schema_version: u32,
    pub feature_names: Vec<String>,
}

impl ArtifactHeader {
    /// Header describing models produced by this build
    pub fn current() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn check(&self) -> Result<()> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(WindError::ArtifactMismatch(format!(
                "schema version {} (expected {})",
                self.schema_version, SCHEMA_VERSION
            )));
        }
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(WindError::ArtifactMismatch(format!(
                "feature order {:?} (expected {:?})",
                self.feature_names, FEATURE_NAMES
            )));
        }
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write the model artifact, replacing any previous one
pub fn save_model(model: &TrainedModel, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&ARTIFACT_MAGIC)?;
    bincode::serialize_into(&mut writer, &ArtifactHeader::current())?;
    bincode::serialize_into(&mut writer, model)?;
    writer.flush()?;

    info!(path = %path.display(), trees = model.regressor().n_trees(), "Saved model");
    Ok(())
}

/// Read only the header of a model artifact
pub fn read_header(path: &Path) -> Result<ArtifactHeader> {
    let (mut reader, len) = open_artifact(path)?;
    read_checked_prefix(&mut reader, len)
}

/// Load a model artifact.
///
/// A missing file is `ModelNotLoadedError`; a foreign or outdated file is
/// `ArtifactMismatch`.
pub fn load_model(path: &Path) -> Result<TrainedModel> {
    let (mut reader, len) = open_artifact(path)?;
    let header = read_checked_prefix(&mut reader, len)?;
    header.check()?;

    let model: TrainedModel = decode_bounded(&mut reader, len)
        .map_err(|e| WindError::ArtifactMismatch(format!("unreadable model body: {}", e)))?;
    debug!(path = %path.display(), trees = model.regressor().n_trees(), "Loaded model");
    Ok(model)
}

fn open_artifact(path: &Path) -> Result<(BufReader<File>, u64)> {
    match File::open(path) {
        Ok(file) => {
            let len = file.metadata()?.len();
            Ok((BufReader::new(file), len))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(WindError::ModelNotLoadedError(path.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Decode one bincode value, never reading past `limit` bytes.
///
/// Length prefixes in a corrupt file would otherwise drive unbounded allocations.
fn decode_bounded<T: DeserializeOwned, R: Read>(reader: R, limit: u64) -> bincode::Result<T> {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_limit(limit)
        .deserialize_from(reader)
}

fn read_checked_prefix<R: Read>(reader: &mut R, len: u64) -> Result<ArtifactHeader> {
    let mut magic = [0u8; 4];
    reader
        .read_exact(&mut magic)
        .map_err(|_| WindError::ArtifactMismatch("file too short for a model artifact".to_string()))?;
    if magic != ARTIFACT_MAGIC {
        return Err(WindError::ArtifactMismatch(
            "not a wind speed model artifact".to_string(),
        ));
    }
    decode_bounded(reader, len)
        .map_err(|e| WindError::ArtifactMismatch(format!("unreadable header: {}", e)))
}

/// Write the three-line metrics report
pub fn write_metrics(metrics: &MetricsRecord, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, metrics.to_text())?;
    info!(path = %path.display(), "Saved metrics");
    Ok(())
}

/// Read the raw metrics report
pub fn read_metrics_text(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

/// Read and parse the metrics report
pub fn read_metrics(path: &Path) -> Result<MetricsRecord> {
    MetricsRecord::from_text(&read_metrics_text(path)?)
}

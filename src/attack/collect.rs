use std::fs;
use std::path::Path;

use crate::error::{TreeError, TreeResult};

use super::parse::{IngestOptions, ingest, parse_bundle};
use super::record::Dataset;

pub fn load_dataset(path: &Path, options: IngestOptions) -> TreeResult<Dataset> {
    let raw = fs::read_to_string(path).map_err(|source| TreeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let objects = parse_bundle(&raw)?;
    tracing::info!(path = %path.display(), objects = objects.len(), "loaded bundle");
    Ok(ingest(&objects, options))
}

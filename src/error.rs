//! Error types for tree construction and dataset loading.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::attack::RecordKind;

pub type TreeResult<T> = Result<T, TreeError>;

/// Fatal failures. Anything that lands here aborts tree construction and no
/// partial tree is exposed.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("duplicate record id '{id}'")]
    DuplicateId { id: String },

    #[error("invalid root: {0}")]
    InvalidRoot(#[from] InvalidRoot),

    #[error("bundle has no `objects` array")]
    MissingObjects,

    #[error("invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidRoot {
    #[error("dataset contains no matrix record")]
    Missing,

    #[error("dataset contains {count} matrix records, expected exactly one")]
    Ambiguous { count: usize },

    #[error("record '{id}' is a {kind:?}, not a matrix")]
    WrongKind { id: String, kind: RecordKind },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ReferenceKind {
    SubTechniqueSource,
    SubTechniqueTarget,
    KillChainPhase,
    TacticRef,
}

/// A reference that points at nothing. Recoverable: the reference is dropped
/// and contributes no child.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DanglingReference {
    pub from: String,
    pub reference: String,
    pub kind: ReferenceKind,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            ReferenceKind::SubTechniqueSource => "sub-technique source",
            ReferenceKind::SubTechniqueTarget => "sub-technique target",
            ReferenceKind::KillChainPhase => "kill-chain phase",
            ReferenceKind::TacticRef => "tactic ref",
        };
        write!(f, "{} '{}' referenced by '{}' does not exist", what, self.reference, self.from)
    }
}

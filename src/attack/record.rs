use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum RecordKind {
    Matrix,
    Tactic,
    Technique,
    SubTechnique,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: String,
    pub kind: RecordKind,
    pub name: String,
    pub external_code: Option<String>,
    /// Kill-chain phase names; only meaningful for techniques.
    pub tactic_short_names: BTreeSet<String>,
    /// A tactic's own `x_mitre_shortname`.
    pub short_name: Option<String>,
    /// Declared tactic order of a matrix.
    pub tactic_refs: Vec<String>,
}

impl Record {
    pub fn new(id: impl Into<String>, kind: RecordKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            external_code: None,
            tactic_short_names: BTreeSet::new(),
            short_name: None,
            tactic_refs: Vec::new(),
        }
    }

    pub fn display_label(&self) -> String {
        match &self.external_code {
            Some(code) => format!("{code}: {}", self.name),
            None => self.name.clone(),
        }
    }

    /// Sibling order: by external code, records without one last, then by id.
    pub fn sibling_order(&self, other: &Self) -> Ordering {
        match (&self.external_code, &other.external_code) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| self.id.cmp(&other.id))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EdgeKind {
    SubTechniqueOf,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RelationshipEdge {
    pub source_id: String,
    pub target_id: String,
    pub kind: EdgeKind,
}

#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub records: Vec<Record>,
    pub edges: Vec<RelationshipEdge>,
}

use serde::Deserialize;
use serde_json::Value;

use crate::error::{TreeError, TreeResult};

use super::record::{Dataset, EdgeKind, Record, RecordKind, RelationshipEdge};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawExternalReference {
    #[serde(default)]
    pub external_id: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawKillChainPhase {
    #[serde(default)]
    pub phase_name: String,
}

/// One entry of a bundle's `objects` array, reduced to the fields the tree
/// needs. Everything else in the object is ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawObject {
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub external_references: Vec<RawExternalReference>,
    #[serde(default)]
    pub x_mitre_is_subtechnique: bool,
    #[serde(default)]
    pub x_mitre_shortname: Option<String>,
    #[serde(default)]
    pub kill_chain_phases: Vec<RawKillChainPhase>,
    #[serde(default)]
    pub tactic_refs: Vec<String>,
    #[serde(default)]
    pub relationship_type: Option<String>,
    #[serde(default)]
    pub source_ref: Option<String>,
    #[serde(default)]
    pub target_ref: Option<String>,
    #[serde(default)]
    pub revoked: bool,
    #[serde(default)]
    pub x_mitre_deprecated: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestOptions {
    pub include_deprecated: bool,
}

/// Parses a bundle document. Entries are deserialized one by one; an entry
/// that does not fit `RawObject` is skipped rather than failing the bundle.
pub fn parse_bundle(raw: &str) -> TreeResult<Vec<RawObject>> {
    let parsed: Value = serde_json::from_str(raw)?;
    let objects = parsed
        .get("objects")
        .and_then(Value::as_array)
        .ok_or(TreeError::MissingObjects)?;

    let mut out = Vec::with_capacity(objects.len());
    for (position, value) in objects.iter().enumerate() {
        match RawObject::deserialize(value) {
            Ok(object) => out.push(object),
            Err(error) => {
                tracing::warn!(position, %error, "skipping unparseable bundle object");
            }
        }
    }
    Ok(out)
}

pub fn ingest(raw_objects: &[RawObject], options: IngestOptions) -> Dataset {
    let mut dataset = Dataset::default();
    let mut discarded = 0usize;

    for raw in raw_objects {
        if !options.include_deprecated && (raw.revoked || raw.x_mitre_deprecated) {
            discarded += 1;
            continue;
        }

        if raw.object_type == "relationship" {
            match edge_from_raw(raw) {
                Some(edge) => dataset.edges.push(edge),
                None => discarded += 1,
            }
            continue;
        }

        match record_from_raw(raw) {
            Some(record) => dataset.records.push(record),
            None => discarded += 1,
        }
    }

    tracing::debug!(
        records = dataset.records.len(),
        edges = dataset.edges.len(),
        discarded,
        "ingested bundle objects"
    );
    dataset
}

fn classify(raw: &RawObject) -> Option<RecordKind> {
    match raw.object_type.as_str() {
        "x-mitre-matrix" => Some(RecordKind::Matrix),
        "x-mitre-tactic" => Some(RecordKind::Tactic),
        "attack-pattern" if raw.x_mitre_is_subtechnique => Some(RecordKind::SubTechnique),
        "attack-pattern" => Some(RecordKind::Technique),
        _ => None,
    }
}

fn record_from_raw(raw: &RawObject) -> Option<Record> {
    let kind = classify(raw)?;
    let Some(id) = raw.id.as_deref().filter(|id| !id.is_empty()) else {
        tracing::warn!(object_type = %raw.object_type, "skipping record without id");
        return None;
    };

    let mut record = Record::new(id, kind, raw.name.clone().unwrap_or_default());
    record.external_code = raw
        .external_references
        .first()
        .and_then(|reference| reference.external_id.clone());

    match kind {
        RecordKind::Matrix => record.tactic_refs = raw.tactic_refs.clone(),
        RecordKind::Tactic => record.short_name = raw.x_mitre_shortname.clone(),
        RecordKind::Technique | RecordKind::SubTechnique => {
            record.tactic_short_names = raw
                .kill_chain_phases
                .iter()
                .map(|phase| phase.phase_name.clone())
                .filter(|phase| !phase.is_empty())
                .collect();
        }
    }

    Some(record)
}

fn edge_from_raw(raw: &RawObject) -> Option<RelationshipEdge> {
    let kind = match raw.relationship_type.as_deref() {
        Some("subtechnique-of") => EdgeKind::SubTechniqueOf,
        _ => return None,
    };

    Some(RelationshipEdge {
        source_id: raw.source_ref.clone()?,
        target_id: raw.target_ref.clone()?,
        kind,
    })
}

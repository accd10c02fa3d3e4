use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{DanglingReference, InvalidRoot, ReferenceKind, TreeError, TreeResult};

use super::record::{EdgeKind, Record, RecordKind, RelationshipEdge};

/// Lookup tables over one loaded dataset. Sole owner of record storage; tree
/// nodes hold shared handles into it.
#[derive(Clone, Debug)]
pub struct RelationshipIndex {
    records: HashMap<String, Arc<Record>>,
    // bundle order
    tactics: Vec<Arc<Record>>,
    tactic_by_short_name: HashMap<String, Arc<Record>>,
    techniques_by_tactic: HashMap<String, Vec<Arc<Record>>>,
    edges_by_target: HashMap<String, Vec<RelationshipEdge>>,
    matrices: Vec<Arc<Record>>,
    dangling: Vec<DanglingReference>,
    edge_count: usize,
}

impl RelationshipIndex {
    pub fn build(records: Vec<Record>, edges: Vec<RelationshipEdge>) -> TreeResult<Self> {
        let mut by_id = HashMap::with_capacity(records.len());
        let mut tactics = Vec::new();
        let mut matrices = Vec::new();

        for record in records {
            let record = Arc::new(record);
            match record.kind {
                RecordKind::Matrix => matrices.push(Arc::clone(&record)),
                RecordKind::Tactic => tactics.push(Arc::clone(&record)),
                RecordKind::Technique | RecordKind::SubTechnique => {}
            }
            if by_id.insert(record.id.clone(), Arc::clone(&record)).is_some() {
                return Err(TreeError::DuplicateId {
                    id: record.id.clone(),
                });
            }
        }

        let mut dangling = Vec::new();

        let mut tactic_by_short_name = HashMap::with_capacity(tactics.len());
        for tactic in &tactics {
            if let Some(short_name) = &tactic.short_name {
                tactic_by_short_name
                    .entry(short_name.clone())
                    .or_insert_with(|| Arc::clone(tactic));
            }
        }

        let mut techniques_by_tactic: HashMap<String, Vec<Arc<Record>>> = HashMap::new();
        let mut technique_ids = by_id
            .values()
            .filter(|record| record.kind == RecordKind::Technique)
            .collect::<Vec<_>>();
        technique_ids.sort_by(|a, b| a.id.cmp(&b.id));
        for technique in technique_ids {
            for phase in &technique.tactic_short_names {
                if !tactic_by_short_name.contains_key(phase) {
                    dangling.push(DanglingReference {
                        from: technique.id.clone(),
                        reference: phase.clone(),
                        kind: ReferenceKind::KillChainPhase,
                    });
                    continue;
                }
                techniques_by_tactic
                    .entry(phase.clone())
                    .or_default()
                    .push(Arc::clone(technique));
            }
        }
        for techniques in techniques_by_tactic.values_mut() {
            techniques.sort_by(|a, b| a.sibling_order(b));
        }

        let edge_count = edges.len();
        let mut edges_by_target: HashMap<String, Vec<RelationshipEdge>> = HashMap::new();
        for edge in edges {
            if !by_id.contains_key(&edge.source_id) {
                dangling.push(DanglingReference {
                    from: edge.target_id.clone(),
                    reference: edge.source_id.clone(),
                    kind: ReferenceKind::SubTechniqueSource,
                });
                continue;
            }
            if !by_id.contains_key(&edge.target_id) {
                dangling.push(DanglingReference {
                    from: edge.source_id.clone(),
                    reference: edge.target_id.clone(),
                    kind: ReferenceKind::SubTechniqueTarget,
                });
                continue;
            }
            edges_by_target
                .entry(edge.target_id.clone())
                .or_default()
                .push(edge);
        }

        for matrix in &matrices {
            for tactic_ref in &matrix.tactic_refs {
                let resolves = by_id
                    .get(tactic_ref)
                    .is_some_and(|record| record.kind == RecordKind::Tactic);
                if !resolves {
                    dangling.push(DanglingReference {
                        from: matrix.id.clone(),
                        reference: tactic_ref.clone(),
                        kind: ReferenceKind::TacticRef,
                    });
                }
            }
        }

        for reference in &dangling {
            tracing::warn!(%reference, "dropping dangling reference");
        }
        tracing::debug!(
            records = by_id.len(),
            edges = edge_count,
            tactics = tactics.len(),
            dangling = dangling.len(),
            "built relationship index"
        );

        Ok(Self {
            records: by_id,
            tactics,
            tactic_by_short_name,
            techniques_by_tactic,
            edges_by_target,
            matrices,
            dangling,
            edge_count,
        })
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Record>> {
        self.records.get(id)
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn dangling(&self) -> &[DanglingReference] {
        &self.dangling
    }

    pub fn matrix(&self) -> TreeResult<&Arc<Record>> {
        match self.matrices.as_slice() {
            [matrix] => Ok(matrix),
            [] => Err(InvalidRoot::Missing.into()),
            many => Err(InvalidRoot::Ambiguous { count: many.len() }.into()),
        }
    }

    /// Tactics under `matrix` in declared order: its `tactic_refs` when it
    /// lists any, bundle order otherwise.
    pub fn tactics_for_matrix(&self, matrix: &Record) -> Vec<Arc<Record>> {
        if matrix.tactic_refs.is_empty() {
            return self.tactics.clone();
        }

        let mut seen = HashSet::new();
        matrix
            .tactic_refs
            .iter()
            .filter_map(|id| self.records.get(id))
            .filter(|record| record.kind == RecordKind::Tactic)
            .filter(|record| seen.insert(record.id.as_str()))
            .cloned()
            .collect()
    }

    pub fn tactic_by_short_name(&self, short_name: &str) -> Option<&Arc<Record>> {
        self.tactic_by_short_name.get(short_name)
    }

    pub fn techniques_for_tactic(&self, short_name: &str) -> &[Arc<Record>] {
        self.techniques_by_tactic
            .get(short_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn sub_techniques_of(&self, technique_id: &str) -> Vec<Arc<Record>> {
        let Some(edges) = self.edges_by_target.get(technique_id) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut subs = edges
            .iter()
            .filter(|edge| match edge.kind {
                EdgeKind::SubTechniqueOf => true,
            })
            .filter_map(|edge| self.records.get(&edge.source_id))
            .filter(|record| seen.insert(record.id.as_str()))
            .cloned()
            .collect::<Vec<_>>();
        subs.sort_by(|a, b| a.sibling_order(b));
        subs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tactic(id: &str, short_name: &str) -> Record {
        let mut record = Record::new(id, RecordKind::Tactic, short_name);
        record.short_name = Some(short_name.to_string());
        record
    }

    fn technique(id: &str, code: &str, phases: &[&str]) -> Record {
        let mut record = Record::new(id, RecordKind::Technique, id);
        record.external_code = Some(code.to_string());
        record.tactic_short_names = phases.iter().map(|p| p.to_string()).collect();
        record
    }

    fn sub(id: &str, code: &str) -> Record {
        let mut record = Record::new(id, RecordKind::SubTechnique, id);
        record.external_code = Some(code.to_string());
        record
    }

    fn edge(source: &str, target: &str) -> RelationshipEdge {
        RelationshipEdge {
            source_id: source.to_string(),
            target_id: target.to_string(),
            kind: EdgeKind::SubTechniqueOf,
        }
    }

    #[test]
    fn rejects_duplicate_ids() {
        let records = vec![tactic("t", "a"), tactic("t", "b")];
        let error = RelationshipIndex::build(records, Vec::new()).unwrap_err();
        assert!(matches!(error, TreeError::DuplicateId { id } if id == "t"));
    }

    #[test]
    fn techniques_sorted_by_code() {
        let records = vec![
            tactic("tac", "execution"),
            technique("b", "T2000", &["execution"]),
            technique("a", "T1000", &["execution"]),
            technique("c", "T1500", &["execution", "persistence"]),
        ];
        let index = RelationshipIndex::build(records, Vec::new()).unwrap();
        let ids = index
            .techniques_for_tactic("execution")
            .iter()
            .map(|record| record.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["a", "c", "b"]);
        assert!(index.techniques_for_tactic("persistence").is_empty());
        assert_eq!(index.dangling().len(), 1);
        assert_eq!(index.dangling()[0].kind, ReferenceKind::KillChainPhase);
    }

    #[test]
    fn sub_techniques_follow_edges() {
        let records = vec![
            technique("t", "T1000", &[]),
            sub("s2", "T1000.002"),
            sub("s1", "T1000.001"),
        ];
        let edges = vec![edge("s2", "t"), edge("s1", "t"), edge("s1", "t"), edge("ghost", "t")];
        let index = RelationshipIndex::build(records, edges).unwrap();

        let ids = index
            .sub_techniques_of("t")
            .iter()
            .map(|record| record.id.clone())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["s1", "s2"]);
        assert!(index.sub_techniques_of("s1").is_empty());
        assert_eq!(index.dangling()[0].kind, ReferenceKind::SubTechniqueSource);
    }

    #[test]
    fn matrix_must_be_unique() {
        let index = RelationshipIndex::build(vec![tactic("t", "a")], Vec::new()).unwrap();
        assert!(matches!(
            index.matrix(),
            Err(TreeError::InvalidRoot(InvalidRoot::Missing))
        ));

        let records = vec![
            Record::new("m1", RecordKind::Matrix, "one"),
            Record::new("m2", RecordKind::Matrix, "two"),
        ];
        let index = RelationshipIndex::build(records, Vec::new()).unwrap();
        assert!(matches!(
            index.matrix(),
            Err(TreeError::InvalidRoot(InvalidRoot::Ambiguous { count: 2 }))
        ));
    }

    #[test]
    fn tactic_order_prefers_matrix_refs() {
        let mut matrix = Record::new("m", RecordKind::Matrix, "Enterprise");
        matrix.tactic_refs = vec!["t2".to_string(), "missing".to_string(), "t1".to_string()];
        let records = vec![matrix, tactic("t1", "one"), tactic("t2", "two")];
        let index = RelationshipIndex::build(records, Vec::new()).unwrap();

        let matrix = index.matrix().unwrap();
        let ids = index
            .tactics_for_matrix(matrix)
            .iter()
            .map(|record| record.id.clone())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["t2", "t1"]);
        assert_eq!(index.dangling()[0].kind, ReferenceKind::TacticRef);

        let bare = Record::new("m", RecordKind::Matrix, "Enterprise");
        let ids = index
            .tactics_for_matrix(&bare)
            .iter()
            .map(|record| record.id.clone())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["t1", "t2"]);
    }
}

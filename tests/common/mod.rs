#![allow(dead_code)]

use attack_tree::attack::{
    Dataset, EdgeKind, IngestOptions, Record, RecordKind, RelationshipEdge, ingest, parse_bundle,
};
use serde_json::{Value, json};

pub fn bundle(objects: Vec<Value>) -> Dataset {
    let text = json!({ "type": "bundle", "id": "bundle--1", "objects": objects }).to_string();
    let objects = parse_bundle(&text).unwrap();
    ingest(&objects, IngestOptions::default())
}

pub fn matrix(id: &str, tactic_refs: &[&str]) -> Value {
    json!({
        "type": "x-mitre-matrix",
        "id": id,
        "name": "Enterprise ATT&CK",
        "tactic_refs": tactic_refs,
    })
}

pub fn tactic(id: &str, short_name: &str, code: &str, name: &str) -> Value {
    json!({
        "type": "x-mitre-tactic",
        "id": id,
        "name": name,
        "x_mitre_shortname": short_name,
        "external_references": [{ "source_name": "mitre-attack", "external_id": code }],
    })
}

pub fn technique(id: &str, code: &str, name: &str, phases: &[&str]) -> Value {
    let phases = phases
        .iter()
        .map(|phase| json!({ "kill_chain_name": "mitre-attack", "phase_name": phase }))
        .collect::<Vec<_>>();
    json!({
        "type": "attack-pattern",
        "id": id,
        "name": name,
        "x_mitre_is_subtechnique": false,
        "external_references": [{ "source_name": "mitre-attack", "external_id": code }],
        "kill_chain_phases": phases,
    })
}

pub fn sub_technique(id: &str, code: &str, name: &str) -> Value {
    json!({
        "type": "attack-pattern",
        "id": id,
        "name": name,
        "x_mitre_is_subtechnique": true,
        "external_references": [{ "source_name": "mitre-attack", "external_id": code }],
    })
}

pub fn sub_technique_of(source: &str, target: &str) -> Value {
    json!({
        "type": "relationship",
        "id": format!("relationship--{source}--{target}"),
        "relationship_type": "subtechnique-of",
        "source_ref": source,
        "target_ref": target,
    })
}

/// Two tactics; `T` sits in both, `P` has three sub-techniques.
pub fn sample() -> Dataset {
    bundle(vec![
        matrix("matrix", &["tac-initial-access", "tac-persistence"]),
        tactic("tac-initial-access", "initial-access", "TA0001", "Initial Access"),
        tactic("tac-persistence", "persistence", "TA0003", "Persistence"),
        technique("T", "T1078", "Valid Accounts", &["initial-access", "persistence"]),
        technique("P", "T1566", "Phishing", &["initial-access"]),
        sub_technique("P1", "T1566.001", "Spearphishing Attachment"),
        sub_technique("P2", "T1566.002", "Spearphishing Link"),
        sub_technique("P3", "T1566.003", "Spearphishing via Service"),
        sub_technique_of("P1", "P"),
        sub_technique_of("P2", "P"),
        sub_technique_of("P3", "P"),
        json!({ "type": "intrusion-set", "id": "intrusion-set--1", "name": "APT0" }),
    ])
}

/// Random-shape dataset: `tactics` tactics, and per technique a bitmask of
/// tactics it belongs to plus a sub-technique count.
pub fn generated(tactics: usize, techniques: &[(u8, usize, String)]) -> Dataset {
    let mut records = Vec::new();
    let mut edges = Vec::new();

    let mut matrix = Record::new("matrix", RecordKind::Matrix, "Matrix");
    matrix.tactic_refs = (0..tactics).map(|index| format!("tactic-{index}")).collect();
    records.push(matrix);

    for index in 0..tactics {
        let mut record = Record::new(
            format!("tactic-{index}"),
            RecordKind::Tactic,
            format!("Tactic {index}"),
        );
        record.short_name = Some(format!("phase-{index}"));
        record.external_code = Some(format!("TA{index:04}"));
        records.push(record);
    }

    for (index, (mask, subs, name)) in techniques.iter().enumerate() {
        let id = format!("technique-{index}");
        let mut record = Record::new(&id, RecordKind::Technique, name.clone());
        record.external_code = Some(format!("T{index:04}"));
        record.tactic_short_names = (0..tactics)
            .filter(|bit| mask & (1 << bit) != 0)
            .map(|bit| format!("phase-{bit}"))
            .collect();
        records.push(record);

        for sub in 0..*subs {
            let sub_id = format!("{id}.{sub}");
            let mut record = Record::new(&sub_id, RecordKind::SubTechnique, format!("{name} {sub}"));
            record.external_code = Some(format!("T{index:04}.{sub:03}"));
            records.push(record);
            edges.push(RelationshipEdge {
                source_id: sub_id,
                target_id: id.clone(),
                kind: EdgeKind::SubTechniqueOf,
            });
        }
    }

    Dataset { records, edges }
}

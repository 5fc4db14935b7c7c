use msk_audit::{verify_hash_chain_str, AuditWriter, VerifyResult, EVENT_ORDER_DELIVER};
use msk_schemas::{ActorRole, ActorStamp};

#[test]
fn scenario_journal_tamper_detected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.jsonl");

    let actor = ActorStamp {
        role: ActorRole::Staff,
        id: "u-2".to_string(),
        name: "Ravi".to_string(),
    };

    let mut w = AuditWriter::new(&path, true).unwrap();
    for i in 0..3 {
        w.append(
            &format!("ord-{i}"),
            &actor,
            EVENT_ORDER_DELIVER,
            serde_json::json!({"note": format!("batch-{i}")}),
        )
        .unwrap();
    }

    // Tamper with the payload on the middle line. ("batch-1" cannot collide
    // with hex hashes or timestamps.)
    let content = std::fs::read_to_string(&path).unwrap();
    let tampered = content.replace("batch-1", "batch-X");
    assert_ne!(content, tampered, "tamper target must exist");

    match verify_hash_chain_str(&tampered).unwrap() {
        VerifyResult::Broken { line, .. } => assert_eq!(line, 2),
        VerifyResult::Valid { .. } => panic!("tampered journal must not verify"),
    }
}

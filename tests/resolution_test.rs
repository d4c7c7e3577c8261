// Integration tests for credential resolution and the begin-get listing
use passkey_provider::passkey::{
    CredentialResolutionEngine, InMemoryCredentialStore, PasskeyProvider, PrivateKeyMaterial,
    SyncStatus,
};
use passkey_provider::testing::constants::TEST_RP_ID;
use passkey_provider::testing::mock::{
    ColdStartStore, RecordingAuditTrail, ScriptedGate, StaticAppIdentity,
};
use passkey_provider::testing::{CredentialRecordBuilder, TestFixtures};
use passkey_provider::webauthn::credential_id::normalize;
use std::collections::HashSet;
use std::sync::Arc;

fn allow(ids: &[&str]) -> HashSet<String> {
    ids.iter().filter_map(|id| normalize(id)).collect()
}

fn settled_provider(store: Arc<InMemoryCredentialStore>) -> PasskeyProvider {
    TestFixtures::provider(
        store,
        Arc::new(ScriptedGate::approving()),
        Arc::new(RecordingAuditTrail::default()),
    )
}

#[tokio::test]
async fn test_strict_pass_matches_any_encoding() {
    let record = CredentialRecordBuilder::new(TEST_RP_ID).build();
    let wire_id = record.wire_id();
    let store = InMemoryCredentialStore::with_records(vec![
        record,
        CredentialRecordBuilder::new(TEST_RP_ID).build(),
    ]);
    let engine = CredentialResolutionEngine::new(&store);

    let found = engine.resolve(TEST_RP_ID, &allow(&[&wire_id]), true).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].wire_id(), wire_id);
}

#[tokio::test]
async fn test_unknown_allow_list_falls_back_to_rp() {
    let record = CredentialRecordBuilder::new(TEST_RP_ID).build();
    let store = InMemoryCredentialStore::with_records(vec![record.clone()]);
    let engine = CredentialResolutionEngine::new(&store);
    let allowed = allow(&["c3RhbGUtY3JlZGVudGlhbA"]);

    assert!(engine.resolve(TEST_RP_ID, &allowed, true).await.unwrap().is_empty());

    let relaxed = engine.resolve(TEST_RP_ID, &allowed, false).await.unwrap();
    assert_eq!(relaxed, vec![record.clone()]);

    let entries = settled_provider(Arc::new(store))
        .begin_get(&TestFixtures::assertion_request(TEST_RP_ID, &["c3RhbGUtY3JlZGVudGlhbA"]))
        .await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].credential_id, record.wire_id());
}

#[tokio::test]
async fn test_unusable_records_never_resolve() {
    let blank = CredentialRecordBuilder::new(TEST_RP_ID)
        .private_key(PrivateKeyMaterial::Raw(Vec::new()))
        .build();
    let blank_alias = CredentialRecordBuilder::new(TEST_RP_ID)
        .private_key(PrivateKeyMaterial::KeystoreAlias("  ".to_string()))
        .build();
    let reference = CredentialRecordBuilder::new(TEST_RP_ID)
        .sync_status(SyncStatus::Reference)
        .build();
    let ids: Vec<String> = [&blank, &blank_alias, &reference]
        .iter()
        .map(|r| r.wire_id())
        .collect();
    let allowed = allow(&ids.iter().map(String::as_str).collect::<Vec<_>>());

    let store = InMemoryCredentialStore::with_records(vec![blank, blank_alias, reference]);
    let engine = CredentialResolutionEngine::new(&store);

    assert!(engine.resolve(TEST_RP_ID, &allowed, true).await.unwrap().is_empty());
    assert!(engine.resolve(TEST_RP_ID, &allowed, false).await.unwrap().is_empty());
    assert!(engine.resolve(TEST_RP_ID, &HashSet::new(), false).await.unwrap().is_empty());
    assert!(engine.resolve("", &HashSet::new(), false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_rp_lists_discoverable_only() {
    let discoverable = CredentialRecordBuilder::new("a.example").build();
    let hidden = CredentialRecordBuilder::new("b.example")
        .discoverable(false)
        .build();
    let hidden_id = hidden.wire_id();
    let store = InMemoryCredentialStore::with_records(vec![discoverable.clone(), hidden]);
    let engine = CredentialResolutionEngine::new(&store);

    let relaxed = engine.resolve("  ", &HashSet::new(), false).await.unwrap();
    assert_eq!(relaxed, vec![discoverable]);

    // A strict pass without an RP still finds the non-discoverable record by ID
    let strict = engine.resolve("", &allow(&[&hidden_id]), true).await.unwrap();
    assert_eq!(strict.len(), 1);
    assert_eq!(strict[0].wire_id(), hidden_id);
}

#[tokio::test]
async fn test_results_are_most_recent_first() {
    let older = CredentialRecordBuilder::new(TEST_RP_ID).last_used_at(1_000).build();
    let newer = CredentialRecordBuilder::new(TEST_RP_ID).last_used_at(2_000).build();
    let store = InMemoryCredentialStore::with_records(vec![older.clone(), newer.clone()]);

    let found = CredentialResolutionEngine::new(&store)
        .resolve(TEST_RP_ID, &HashSet::new(), false)
        .await
        .unwrap();
    assert_eq!(found, vec![newer, older]);
}

#[tokio::test]
async fn test_begin_get_entries() {
    let record = CredentialRecordBuilder::new(TEST_RP_ID)
        .rp_name("Example Corp")
        .user_name("bob")
        .display_name("")
        .build();
    let other_rp = CredentialRecordBuilder::new("other.example").build();
    let store = Arc::new(InMemoryCredentialStore::with_records(vec![record.clone(), other_rp]));

    let entries = settled_provider(store)
        .begin_get(&TestFixtures::assertion_request(TEST_RP_ID, &[]))
        .await;

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].credential_id, record.wire_id());
    assert_eq!(entries[0].title, "bob");
    assert_eq!(entries[0].subtitle, "Example Corp");
    assert_eq!(entries[0].rp_id, TEST_RP_ID);
}

#[tokio::test]
async fn test_cold_start_retry_after_update() {
    let record = CredentialRecordBuilder::new(TEST_RP_ID).build();
    let store = Arc::new(ColdStartStore::with_records(vec![record.clone()]));
    let provider =
        TestFixtures::just_updated_provider(store.clone(), Arc::new(ScriptedGate::approving()));

    let entries = provider
        .begin_get(&TestFixtures::assertion_request(TEST_RP_ID, &[]))
        .await;

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].credential_id, record.wire_id());
    assert_eq!(store.ping_count(), 1);
}

#[tokio::test]
async fn test_no_cold_start_retry_when_settled() {
    let store = Arc::new(ColdStartStore::with_records(vec![
        CredentialRecordBuilder::new(TEST_RP_ID).build(),
    ]));
    let provider = PasskeyProvider::new(
        store.clone(),
        Arc::new(ScriptedGate::approving()),
        Arc::new(StaticAppIdentity::settled()),
    );

    let entries = provider
        .begin_get(&TestFixtures::assertion_request(TEST_RP_ID, &[]))
        .await;

    assert!(entries.is_empty());
    assert_eq!(store.ping_count(), 0);
}

#[tokio::test]
async fn test_cold_start_gives_up_when_still_empty() {
    let store = Arc::new(ColdStartStore::default());
    let provider =
        TestFixtures::just_updated_provider(store.clone(), Arc::new(ScriptedGate::approving()));

    let entries = provider
        .begin_get(&TestFixtures::assertion_request(TEST_RP_ID, &[]))
        .await;

    assert!(entries.is_empty());
    assert_eq!(store.ping_count(), 1);
}

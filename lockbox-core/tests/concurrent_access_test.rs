//! Concurrent access tests
//!
//! Many tasks hammering one vault must serialize cleanly, and a vault
//! directory can only be opened by one context at a time.
//!
//! Run with: cargo test --test concurrent_access_test -- --nocapture

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tempfile::TempDir;
use tokio::sync::Barrier;

use lockbox_core::adapters::biometric::NoBiometricHardware;
use lockbox_core::adapters::duckdb::DuckDbRepository;
use lockbox_core::adapters::memory::{MemorySecretStore, MemoryTransport, ScriptedBiometric};
use lockbox_core::services::Authenticator;
use lockbox_core::{CredentialFields, Error, ExportOptions, LockboxContext, NoteFields, Vault, DB_KEY_SECRET};

/// Number of concurrent tasks for stress tests
const TASK_COUNT: usize = 8;

/// Number of iterations per task
const ITERATIONS_PER_TASK: usize = 10;

fn in_memory_vault() -> Vault {
    let repo = DuckDbRepository::in_memory().expect("Failed to open database");
    repo.ensure_schema().expect("Failed to initialize schema");
    let authenticator = Authenticator::new(
        Arc::new(MemorySecretStore::new()),
        Arc::new(ScriptedBiometric::new(false, false)),
    );
    Vault::new(Arc::new(repo), authenticator, Arc::new(MemoryTransport::new()))
}

/// Test: many tasks creating records at once get distinct ids and every
/// record shows up in the next listing.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_produce_unique_ids() {
    let vault = Arc::new(in_memory_vault());
    let barrier = Arc::new(Barrier::new(TASK_COUNT));
    let start = Instant::now();

    let mut handles = Vec::new();
    for t in 0..TASK_COUNT {
        let vault = Arc::clone(&vault);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let mut ids = Vec::new();
            for i in 0..ITERATIONS_PER_TASK {
                let fields = CredentialFields::new(format!("site-{}-{}", t, i), "user", "pw");
                ids.push(vault.add_credential(fields).await.unwrap().id);
                if i % 3 == 0 {
                    ids.push(vault.add_note(NoteFields::new("n", "b")).await.unwrap().id);
                }
            }
            ids
        }));
    }

    let mut all_ids = HashSet::new();
    let mut total = 0;
    for handle in handles {
        for id in handle.await.unwrap() {
            all_ids.insert(id);
            total += 1;
        }
    }
    println!("{} records from {} tasks in {:?}", total, TASK_COUNT, start.elapsed());

    assert_eq!(all_ids.len(), total);
    let snapshot = vault.snapshot().await.unwrap();
    assert_eq!(snapshot.credentials.len(), TASK_COUNT * ITERATIONS_PER_TASK);
    assert_eq!(snapshot.record_count(), total);
}

/// Test: listings taken while writers run never see a partial batch.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_listing_during_import_sees_whole_batches() {
    let vault = Arc::new(in_memory_vault());
    for i in 0..5 {
        vault
            .add_credential(CredentialFields::new(format!("seed-{}", i), "u", "p"))
            .await
            .unwrap();
    }
    let receipt = vault.export_backup(ExportOptions::default()).await.unwrap();

    let writer = {
        let vault = Arc::clone(&vault);
        let location = receipt.location.clone();
        tokio::spawn(async move {
            for _ in 0..ITERATIONS_PER_TASK {
                vault.import_backup(&location, None).await.unwrap();
            }
        })
    };

    let reader = {
        let vault = Arc::clone(&vault);
        tokio::spawn(async move {
            for _ in 0..ITERATIONS_PER_TASK * 2 {
                let count = vault.list_credentials().await.unwrap().len();
                assert_eq!(count % 5, 0, "observed a partially applied import: {}", count);
                tokio::task::yield_now().await;
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();
    assert_eq!(vault.list_credentials().await.unwrap().len(), 5 * (ITERATIONS_PER_TASK + 1));
}

/// Test: a second context on the same directory is refused while the first
/// is alive, and the directory opens again once it is dropped.
#[tokio::test]
async fn test_second_open_is_refused() {
    let temp_dir = TempDir::new().unwrap();

    let first = LockboxContext::open(temp_dir.path(), Arc::new(NoBiometricHardware))
        .await
        .unwrap();
    first
        .vault
        .add_credential(CredentialFields::new("Bank", "alice", "hunter2"))
        .await
        .unwrap();

    let second = LockboxContext::open(temp_dir.path(), Arc::new(NoBiometricHardware)).await;
    assert!(matches!(second, Err(Error::Storage(_))));

    drop(first);

    let reopened = LockboxContext::open(temp_dir.path(), Arc::new(NoBiometricHardware))
        .await
        .unwrap();
    let listing = reopened.vault.list_credentials().await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing.records()[0].secret, "hunter2");
}

/// Test: a fresh vault is encrypted with a generated key kept in the secret
/// store, and backups land in the backups directory.
#[tokio::test]
async fn test_fresh_vault_is_encrypted() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = LockboxContext::open(temp_dir.path(), Arc::new(NoBiometricHardware))
        .await
        .unwrap();
    assert!(ctx.repository.is_encrypted());

    let secrets: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(temp_dir.path().join("secrets.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(secrets[DB_KEY_SECRET].as_str().map(str::len), Some(64));

    ctx.vault
        .add_note(NoteFields::new("Wifi", "on the fridge"))
        .await
        .unwrap();
    ctx.vault.export_backup(ExportOptions::default()).await.unwrap();
    assert_eq!(ctx.backups.list().unwrap().len(), 1);
}

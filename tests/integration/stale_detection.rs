use leafsync::error::SyncError;
use leafsync::paths::ManagedNamespace;
use leafsync::sync::{
    check_stale, push_snapshot, spawn_stale_watcher, NoopObserver, PullOptions, PushOptions,
    StaleStatus, SyncEngine, SyncKind,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::integration::support::{work_snapshot, FakeRepo};

fn engine(repo: FakeRepo) -> SyncEngine<FakeRepo> {
    SyncEngine::new(repo, PushOptions::default(), PullOptions::default())
}

/// Push a changed snapshot as a second device sharing the repository.
async fn push_from_other_device(repo: &FakeRepo) -> u64 {
    let mut snapshot = work_snapshot();
    snapshot.leaves[0].content = format!("edited elsewhere {:?}", repo.head());
    push_snapshot(repo, &snapshot, &PushOptions::default())
        .await
        .unwrap()
        .push_count
}

#[tokio::test]
async fn missing_metadata_is_up_to_date() {
    let repo = FakeRepo::new();
    let status = check_stale(&repo, &ManagedNamespace::default(), 0).await;
    assert!(matches!(status, StaleStatus::UpToDate { remote: 0 }));
    assert_eq!(status.message_key(), "github.upToDate");
}

#[tokio::test]
async fn remote_ahead_of_baseline_is_stale() {
    let repo = FakeRepo::with_files(&[("notes/metadata.json", r#"{"pushCount":5}"#)]);
    let ns = ManagedNamespace::default();

    assert!(check_stale(&repo, &ns, 3).await.is_stale());
    assert!(!check_stale(&repo, &ns, 5).await.is_stale());
    // A local count ahead of the remote is not stale.
    assert!(matches!(
        check_stale(&repo, &ns, 9).await,
        StaleStatus::UpToDate { remote: 5 }
    ));
}

#[tokio::test]
async fn unreadable_metadata_fails_the_check() {
    let repo = FakeRepo::with_files(&[("notes/metadata.json", "[]")]);
    let status = check_stale(&repo, &ManagedNamespace::default(), 0).await;
    assert!(matches!(status, StaleStatus::CheckFailed(_)));

    let repo = FakeRepo::with_files(&[("notes/metadata.json", r#"{"pushCount":1}"#)]);
    repo.fail_path("notes/metadata.json");
    let status = check_stale(&repo, &ManagedNamespace::default(), 0).await;
    assert!(matches!(status, StaleStatus::CheckFailed(SyncError::Network(_))));
    assert_eq!(status.message_key(), "github.networkError");
}

#[tokio::test]
async fn engine_tracks_the_baseline() {
    let engine = engine(FakeRepo::new());
    assert_eq!(engine.last_known_push_count(), None);

    engine.push(&work_snapshot()).await.unwrap();
    assert_eq!(engine.last_known_push_count(), Some(1));

    push_from_other_device(engine.api()).await;
    assert!(engine.check_stale().await.is_stale());

    engine.pull(&NoopObserver).await.unwrap();
    assert_eq!(engine.last_known_push_count(), Some(2));
    assert!(!engine.check_stale().await.is_stale());
}

#[tokio::test]
async fn push_if_fresh_refuses_to_overwrite_newer_remote() {
    let engine = engine(FakeRepo::new());
    engine.push(&work_snapshot()).await.unwrap();
    let theirs = push_from_other_device(engine.api()).await;
    assert_eq!(theirs, 2);
    engine.api().reset_calls();

    let err = engine.push_if_fresh(&work_snapshot()).await.unwrap_err();

    match err {
        SyncError::StaleRemote { remote, local } => {
            assert_eq!(remote, 2);
            assert_eq!(local, 1);
        }
        other => panic!("expected StaleRemote, got {:?}", other),
    }
    assert_eq!(engine.api().write_calls(), 0);
    assert!(!engine.gate().is_busy());

    engine.pull(&NoopObserver).await.unwrap();
    let mut mine = work_snapshot();
    mine.leaves[1].content = "rebased on theirs".to_string();
    let outcome = engine.push_if_fresh(&mine).await.unwrap();
    assert_eq!(outcome.push_count, 3);
}

#[tokio::test]
async fn concurrent_operations_are_rejected() {
    let engine = engine(FakeRepo::new());
    let guard = engine.gate().try_acquire(SyncKind::Pull).unwrap();
    assert_eq!(engine.gate().current(), Some(SyncKind::Pull));

    assert!(matches!(
        engine.push(&work_snapshot()).await,
        Err(SyncError::Busy)
    ));
    assert!(matches!(engine.pull(&NoopObserver).await, Err(SyncError::Busy)));
    assert_eq!(engine.api().write_calls(), 0);

    drop(guard);
    assert!(engine.push(&work_snapshot()).await.is_ok());
    assert!(!engine.gate().is_busy());
}

#[tokio::test]
async fn watcher_reports_remote_pushes() {
    let engine = Arc::new(engine(FakeRepo::new()));
    engine.push(&work_snapshot()).await.unwrap();
    push_from_other_device(engine.api()).await;

    let mut watcher = spawn_stale_watcher(Arc::clone(&engine), Duration::from_millis(10));
    let status = timeout(Duration::from_secs(2), watcher.recv())
        .await
        .unwrap()
        .unwrap();

    assert!(matches!(status, StaleStatus::Stale { remote: 2, local: 1 }));
    watcher.stop();
}

#[tokio::test]
async fn watcher_waits_for_a_baseline_and_an_idle_gate() {
    let engine = Arc::new(engine(FakeRepo::with_files(&[(
        "notes/metadata.json",
        r#"{"pushCount":4}"#,
    )])));
    let mut watcher = spawn_stale_watcher(Arc::clone(&engine), Duration::from_millis(10));

    // No baseline yet: every tick is skipped.
    assert!(timeout(Duration::from_millis(80), watcher.recv()).await.is_err());

    engine.set_last_known_push_count(4);
    let guard = engine.gate().try_acquire(SyncKind::Push).unwrap();
    assert!(timeout(Duration::from_millis(80), watcher.recv()).await.is_err());

    drop(guard);
    let status = timeout(Duration::from_secs(2), watcher.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(status, StaleStatus::UpToDate { remote: 4 }));
}

use leafsync::error::SyncError;
use leafsync::github::FILE_MODE;
use leafsync::metadata::MetadataDocument;
use leafsync::sync::{push_snapshot, PushOptions};
use leafsync::tree::{hash_blob, EMPTY_BLOB_HEX};
use leafsync::types::Snapshot;

use crate::integration::support::{items_by_path, leaf, note, work_snapshot, FakeRepo};

fn remote_metadata(repo: &FakeRepo) -> MetadataDocument {
    MetadataDocument::from_json(&repo.file("notes/metadata.json").unwrap()).unwrap()
}

#[tokio::test]
async fn first_push_bootstraps_the_branch() {
    let repo = FakeRepo::new();
    let outcome = push_snapshot(&repo, &work_snapshot(), &PushOptions::default())
        .await
        .unwrap();

    assert!(outcome.bootstrap);
    assert!(!outcome.no_changes);
    assert_eq!(outcome.push_count, 1);
    assert_eq!(outcome.changed_leaf_count, 3);
    assert_eq!(repo.calls_to("create_ref"), 1);
    assert_eq!(repo.calls_to("update_ref"), 0);
    // No metadata to read on an empty branch.
    assert_eq!(repo.calls_to("get_file"), 0);
    assert!(repo.parents_of_head().is_empty());

    assert_eq!(
        repo.paths(),
        vec![
            "notes/.gitkeep",
            "notes/Ideas/.gitkeep",
            "notes/Work/.gitkeep",
            "notes/Work/Meeting/.gitkeep",
            "notes/Work/Meeting/Notes.md",
            "notes/Work/Plan.md",
            "notes/Work/Todo.md",
            "notes/metadata.json",
        ]
    );
    assert_eq!(
        repo.file("notes/Work/Meeting/Notes.md").as_deref(),
        Some("# Standup\n- ship it\n")
    );

    let doc = remote_metadata(&repo);
    assert_eq!(doc.push_count, 1);
    assert_eq!(doc.notes["Work/Meeting"].id, "n-meeting");
    assert_eq!(doc.leaves["Work/Meeting/Notes.md"].id, "l-notes");
    assert_eq!(
        doc.leaves["Work/Meeting/Notes.md"].badge_color.as_deref(),
        Some("#ff8800")
    );
}

#[tokio::test]
async fn unchanged_snapshot_is_a_no_op() {
    let repo = FakeRepo::new();
    let snapshot = work_snapshot();
    push_snapshot(&repo, &snapshot, &PushOptions::default())
        .await
        .unwrap();
    let head = repo.head();
    repo.reset_calls();

    let outcome = push_snapshot(&repo, &snapshot, &PushOptions::default())
        .await
        .unwrap();

    assert!(outcome.no_changes);
    assert_eq!(outcome.message_key(), "github.noChanges");
    assert_eq!(outcome.push_count, 1);
    assert_eq!(outcome.commit_sha, None);
    assert_eq!(repo.write_calls(), 0);
    assert_eq!(repo.head(), head);
    assert_eq!(remote_metadata(&repo).push_count, 1);
}

#[tokio::test]
async fn unchanged_leaves_are_referenced_by_sha() {
    let repo = FakeRepo::new();
    let mut snapshot = work_snapshot();
    push_snapshot(&repo, &snapshot, &PushOptions::default())
        .await
        .unwrap();

    snapshot.leaves[1].content = "Q3 plan, revised".to_string();
    let outcome = push_snapshot(&repo, &snapshot, &PushOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.changed_leaf_count, 1);
    assert_eq!(outcome.push_count, 2);
    assert!(!outcome.bootstrap);
    assert_eq!(repo.calls_to("update_ref"), 1);
    assert_eq!(repo.parents_of_head().len(), 1);

    let items = items_by_path(&repo.last_tree_items());
    let untouched = &items["notes/Work/Todo.md"];
    assert!(!untouched.is_inline());
    assert_eq!(
        untouched.sha.as_deref(),
        Some(hash_blob("- [ ] review").to_hex().as_str())
    );
    assert_eq!(
        items["notes/Work/Plan.md"].content.as_deref(),
        Some("Q3 plan, revised")
    );
    assert_eq!(items["notes/.gitkeep"].sha.as_deref(), Some(EMPTY_BLOB_HEX));
    assert_eq!(remote_metadata(&repo).push_count, 2);
}

#[tokio::test]
async fn metadata_only_change_bumps_push_count() {
    let repo = FakeRepo::new();
    let mut snapshot = work_snapshot();
    push_snapshot(&repo, &snapshot, &PushOptions::default())
        .await
        .unwrap();

    snapshot.notes[2].badge_icon = Some("bulb".to_string());
    let outcome = push_snapshot(&repo, &snapshot, &PushOptions::default())
        .await
        .unwrap();

    assert!(!outcome.no_changes);
    assert!(outcome.metadata_changed);
    assert_eq!(outcome.changed_leaf_count, 0);
    assert_eq!(outcome.push_count, 2);
    assert_eq!(
        remote_metadata(&repo).notes["Ideas"].badge_icon.as_deref(),
        Some("bulb")
    );
}

#[tokio::test]
async fn files_outside_the_namespace_survive() {
    let repo = FakeRepo::with_files(&[
        ("README.md", "# My notes"),
        ("assets/logo.svg", "<svg/>"),
        ("notes/Old/Gone.md", "deleted locally"),
    ]);

    push_snapshot(&repo, &work_snapshot(), &PushOptions::default())
        .await
        .unwrap();

    let paths = repo.paths();
    assert!(paths.contains(&"README.md".to_string()));
    assert!(paths.contains(&"assets/logo.svg".to_string()));
    assert!(!paths.iter().any(|p| p.starts_with("notes/Old")));
    assert_eq!(repo.file("README.md").as_deref(), Some("# My notes"));

    let items = items_by_path(&repo.last_tree_items());
    assert!(!items["README.md"].is_inline());
    assert_eq!(items["README.md"].mode, FILE_MODE);
}

#[tokio::test]
async fn renamed_leaf_moves_its_file() {
    let repo = FakeRepo::new();
    let mut snapshot = work_snapshot();
    push_snapshot(&repo, &snapshot, &PushOptions::default())
        .await
        .unwrap();

    snapshot.leaves[2].title = "Done".to_string();
    push_snapshot(&repo, &snapshot, &PushOptions::default())
        .await
        .unwrap();

    let paths = repo.paths();
    assert!(paths.contains(&"notes/Work/Done.md".to_string()));
    assert!(!paths.contains(&"notes/Work/Todo.md".to_string()));
    let doc = remote_metadata(&repo);
    assert_eq!(doc.leaves["Work/Done.md"].id, "l-todo");
    assert!(!doc.leaves.contains_key("Work/Todo.md"));
}

#[tokio::test]
async fn empty_snapshot_is_refused() {
    let repo = FakeRepo::new();
    let snapshot = Snapshot::new(vec![note("n1", "Work", None, 0)], Vec::new());

    let err = push_snapshot(&repo, &snapshot, &PushOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::NoLeaves));
    assert_eq!(err.message_key(), "toast.noLeaves");
    assert!(repo.head().is_none());
}

#[tokio::test]
async fn corrupt_metadata_restarts_the_counter() {
    let repo = FakeRepo::with_files(&[("notes/metadata.json", "{not json")]);

    let outcome = push_snapshot(&repo, &work_snapshot(), &PushOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.push_count, 1);
    assert_eq!(remote_metadata(&repo).push_count, 1);
}

#[tokio::test]
async fn metadata_read_failure_aborts_before_writing() {
    let repo = FakeRepo::with_files(&[("notes/metadata.json", "{\"pushCount\":3}")]);
    repo.fail_path("notes/metadata.json");
    let head = repo.head();

    let err = push_snapshot(&repo, &work_snapshot(), &PushOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Network(_)));
    assert_eq!(repo.write_calls(), 0);
    assert_eq!(repo.head(), head);
}

#[tokio::test]
async fn virtual_leaf_badges_are_carried_forward() {
    let repo = FakeRepo::with_files(&[(
        "notes/metadata.json",
        r#"{"version":1,"pushCount":7,"notes":{},"leaves":{"__Inbox":{"id":"v1","order":0,"badgeIcon":"inbox"}}}"#,
    )]);

    let outcome = push_snapshot(&repo, &work_snapshot(), &PushOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.push_count, 8);
    let doc = remote_metadata(&repo);
    assert_eq!(doc.leaves["__Inbox"].badge_icon.as_deref(), Some("inbox"));
}

#[tokio::test]
async fn orphan_and_duplicate_leaves_are_skipped() {
    let repo = FakeRepo::new();
    let mut snapshot = work_snapshot();
    snapshot
        .leaves
        .push(leaf("l-orphan", "Lost", "n-missing", "nowhere", 9));
    snapshot
        .leaves
        .push(leaf("l-dup", "Plan", "n-work", "second plan", 10));

    let outcome = push_snapshot(&repo, &snapshot, &PushOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.changed_leaf_count, 3);
    assert_eq!(repo.file("notes/Work/Plan.md").as_deref(), Some("Q3 plan"));
    let doc = remote_metadata(&repo);
    assert_eq!(doc.leaves["Work/Plan.md"].id, "l-plan");
    assert!(!doc.leaves.values().any(|m| m.id == "l-orphan"));
}

#[tokio::test]
async fn custom_namespace_and_commit_message() {
    let repo = FakeRepo::new();
    let options = PushOptions {
        namespace: leafsync::paths::ManagedNamespace::new("vault/leaves"),
        commit_message: "sync from laptop".to_string(),
        ..PushOptions::default()
    };

    push_snapshot(&repo, &work_snapshot(), &options)
        .await
        .unwrap();

    let paths = repo.paths();
    assert!(paths.contains(&"vault/leaves/metadata.json".to_string()));
    assert!(paths.contains(&"vault/leaves/Work/Plan.md".to_string()));
    assert!(!paths.iter().any(|p| p.starts_with("notes/")));
}

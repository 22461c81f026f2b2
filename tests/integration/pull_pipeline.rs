use leafsync::metadata::MetadataDocument;
use leafsync::sync::{pull_snapshot, NoopObserver, PullObserver, PullOptions, PullPriority};
use leafsync::types::{Leaf, LeafSkeleton, Note};
use parking_lot::Mutex;
use std::time::Duration;

use crate::integration::support::FakeRepo;

/// Records every callback in arrival order.
#[derive(Default)]
struct Recorder {
    priority: Option<PullPriority>,
    events: Mutex<Vec<String>>,
    skeletons: Mutex<Vec<LeafSkeleton>>,
}

impl Recorder {
    fn with_priority(leaf_paths: &[&str]) -> Self {
        Self {
            priority: Some(PullPriority {
                leaf_paths: leaf_paths.iter().map(|p| p.to_string()).collect(),
                note_ids: Default::default(),
            }),
            ..Self::default()
        }
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl PullObserver for Recorder {
    fn on_structure(
        &self,
        notes: &[Note],
        _metadata: &MetadataDocument,
        leaves: &[LeafSkeleton],
    ) -> Option<PullPriority> {
        self.events
            .lock()
            .push(format!("structure:{}:{}", notes.len(), leaves.len()));
        *self.skeletons.lock() = leaves.to_vec();
        self.priority.clone()
    }

    fn on_leaf(&self, leaf: &Leaf) {
        self.events.lock().push(format!("leaf:{}", leaf.title));
    }

    fn on_priority_complete(&self) {
        self.events.lock().push("priority".to_string());
    }
}

fn options(concurrency: usize) -> PullOptions {
    PullOptions {
        concurrency,
        ..PullOptions::default()
    }
}

#[tokio::test]
async fn empty_repository_pulls_nothing() {
    let repo = FakeRepo::new();
    let recorder = Recorder::default();

    let outcome = pull_snapshot(&repo, &PullOptions::default(), &recorder)
        .await
        .unwrap();

    assert!(outcome.empty_repository);
    assert!(outcome.notes.is_empty());
    assert!(outcome.leaves.is_empty());
    assert_eq!(outcome.message_key(), "github.pullOk");
    assert_eq!(recorder.events(), vec!["structure:0:0", "priority"]);
    assert_eq!(repo.calls_to("get_tree_recursive"), 0);
}

#[tokio::test]
async fn metadata_supplies_ids_order_and_badges() {
    let repo = FakeRepo::with_files(&[
        ("notes/.gitkeep", ""),
        ("notes/Work/.gitkeep", ""),
        ("notes/Work/Meeting/Notes.md", "# Standup"),
        ("notes/Work/Plan.md", "plan"),
        ("notes/Ideas/.gitkeep", ""),
        ("README.md", "not a leaf"),
        (
            "notes/metadata.json",
            r#"{"version":1,"pushCount":4,
               "notes":{"Work":{"id":"n-work","order":0,"badgeIcon":"briefcase"},
                        "Work/Meeting":{"id":"n-meeting","order":1},
                        "Ideas":{"id":"n-ideas","order":2}},
               "leaves":{"Work/Meeting/Notes.md":{"id":"l-notes","updatedAt":99,"order":0,"badgeColor":"red"},
                         "Work/Plan.md":{"id":"l-plan","updatedAt":98,"order":1}}}"#,
        ),
    ]);

    let outcome = pull_snapshot(&repo, &PullOptions::default(), &NoopObserver)
        .await
        .unwrap();

    assert!(!outcome.empty_repository);
    assert_eq!(outcome.metadata.push_count, 4);
    let ids: Vec<_> = outcome.notes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["n-work", "n-meeting", "n-ideas"]);
    assert_eq!(outcome.notes[0].badge_icon.as_deref(), Some("briefcase"));
    assert_eq!(outcome.notes[1].parent_id.as_deref(), Some("n-work"));
    assert_eq!(outcome.notes[1].name, "Meeting");
    assert_eq!(outcome.notes[2].parent_id, None);

    assert_eq!(outcome.leaves.len(), 2);
    let standup = &outcome.leaves[0];
    assert_eq!(standup.id, "l-notes");
    assert_eq!(standup.title, "Notes");
    assert_eq!(standup.note_id, "n-meeting");
    assert_eq!(standup.content, "# Standup");
    assert_eq!(standup.updated_at, 99);
    assert_eq!(standup.badge_color.as_deref(), Some("red"));
    assert_eq!(outcome.leaves[1].id, "l-plan");
    assert!(outcome.failed_paths.is_empty());
}

#[tokio::test]
async fn missing_metadata_generates_ids() {
    let repo = FakeRepo::with_files(&[
        ("notes/A/B/C/D.md", "deep"),
        ("notes/A/top.md", "top"),
    ]);

    let outcome = pull_snapshot(&repo, &PullOptions::default(), &NoopObserver)
        .await
        .unwrap();

    let names: Vec<_> = outcome.notes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B/C"]);
    assert_eq!(outcome.notes[1].parent_id.as_deref(), Some(outcome.notes[0].id.as_str()));
    let deep = outcome.leaves.iter().find(|l| l.title == "D").unwrap();
    assert_eq!(deep.note_id, outcome.notes[1].id);
    assert!(!deep.id.is_empty());
    assert_ne!(outcome.notes[0].id, outcome.notes[1].id);
    assert_eq!(outcome.metadata, MetadataDocument::default());
}

#[tokio::test]
async fn failed_leaf_fetch_is_reported_not_fatal() {
    let repo = FakeRepo::with_files(&[
        ("notes/Work/Good.md", "ok"),
        ("notes/Work/Bad.md", "lost"),
    ]);
    repo.fail_path("notes/Work/Bad.md");

    let outcome = pull_snapshot(&repo, &PullOptions::default(), &NoopObserver)
        .await
        .unwrap();

    assert_eq!(outcome.leaves.len(), 1);
    assert_eq!(outcome.leaves[0].title, "Good");
    assert_eq!(outcome.failed_paths, vec!["notes/Work/Bad.md"]);
}

#[tokio::test]
async fn priority_leaves_are_fetched_first() {
    let mut files: Vec<(String, String)> = (0..5)
        .map(|i| (format!("notes/Home/Item {}.md", i), format!("home {}", i)))
        .collect();
    files.push(("notes/Work/Notes.md".to_string(), "urgent".to_string()));
    files.push(("notes/Work/Later.md".to_string(), "later".to_string()));
    let borrowed: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
    let repo = FakeRepo::with_files(&borrowed);
    let recorder = Recorder::with_priority(&["Work/Notes.md"]);

    pull_snapshot(&repo, &options(1), &recorder).await.unwrap();

    assert_eq!(repo.fetched_paths()[0], "notes/Work/Notes.md");
    let events = recorder.events();
    assert_eq!(events[0], "structure:2:7");
    assert_eq!(events[1], "leaf:Notes");
    assert_eq!(events[2], "priority");
    assert_eq!(events.iter().filter(|e| *e == "priority").count(), 1);
    assert_eq!(events.len(), 9);

    let skeletons = recorder.skeletons.lock().clone();
    assert!(skeletons.iter().any(|s| s.path == "Work/Notes.md"));
}

#[tokio::test]
async fn priority_completes_while_other_leaves_are_in_flight() {
    let mut files: Vec<(String, String)> = (0..19)
        .map(|i| (format!("notes/Bulk/Leaf {:02}.md", i), format!("bulk {}", i)))
        .collect();
    files.push(("notes/Work/Notes.md".to_string(), "urgent".to_string()));
    let borrowed: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
    let repo = FakeRepo::with_files(&borrowed);
    for (path, _) in files.iter().filter(|(p, _)| p.starts_with("notes/Bulk")) {
        repo.delay_path(path, Duration::from_millis(50));
    }
    let recorder = Recorder::with_priority(&["Work/Notes.md"]);

    let outcome = pull_snapshot(&repo, &options(10), &recorder).await.unwrap();

    assert_eq!(outcome.leaves.len(), 20);
    let events = recorder.events();
    let priority_at = events.iter().position(|e| e == "priority").unwrap();
    let urgent_at = events.iter().position(|e| e == "leaf:Notes").unwrap();
    assert!(urgent_at < priority_at);
    // Only the structure event and the priority leaf precede the signal.
    assert_eq!(priority_at, 2);
    assert_eq!(events.iter().filter(|e| *e == "priority").count(), 1);
}

#[tokio::test]
async fn priority_fires_even_when_the_priority_leaf_fails() {
    let repo = FakeRepo::with_files(&[
        ("notes/Work/Notes.md", "urgent"),
        ("notes/Work/Other.md", "other"),
    ]);
    repo.fail_path("notes/Work/Notes.md");
    let recorder = Recorder::with_priority(&["Work/Notes.md"]);

    let outcome = pull_snapshot(&repo, &options(1), &recorder).await.unwrap();

    assert_eq!(outcome.failed_paths, vec!["notes/Work/Notes.md"]);
    let events = recorder.events();
    assert_eq!(events[1], "priority");
    assert_eq!(events[2], "leaf:Other");
}

#[tokio::test]
async fn unmatched_priority_fires_before_any_content() {
    let repo = FakeRepo::with_files(&[("notes/Work/Plan.md", "plan")]);
    let recorder = Recorder::with_priority(&["Nowhere/Missing.md"]);

    pull_snapshot(&repo, &PullOptions::default(), &recorder)
        .await
        .unwrap();

    assert_eq!(recorder.events(), vec!["structure:1:1", "priority", "leaf:Plan"]);
}

#[tokio::test]
async fn note_priority_ranks_between_leaf_priority_and_the_rest() {
    let repo = FakeRepo::with_files(&[
        ("notes/Alpha/a.md", "a"),
        ("notes/Beta/b.md", "b"),
        ("notes/Gamma/c.md", "c"),
        (
            "notes/metadata.json",
            r#"{"notes":{"Alpha":{"id":"n-a","order":0},"Beta":{"id":"n-b","order":1},"Gamma":{"id":"n-c","order":2}},
               "leaves":{"Alpha/a.md":{"id":"la","order":0},"Beta/b.md":{"id":"lb","order":1},"Gamma/c.md":{"id":"lc","order":2}}}"#,
        ),
    ]);
    let recorder = Recorder {
        priority: Some(PullPriority {
            leaf_paths: ["Gamma/c.md".to_string()].into_iter().collect(),
            note_ids: ["n-b".to_string()].into_iter().collect(),
        }),
        ..Recorder::default()
    };

    pull_snapshot(&repo, &options(1), &recorder).await.unwrap();

    assert_eq!(
        repo.fetched_paths(),
        vec!["notes/Gamma/c.md", "notes/Beta/b.md", "notes/Alpha/a.md"]
    );
}

//! Human-readable rendering of command results.

use crate::sync::{ConnectionInfo, PullOutcome, PushOutcome, StaleStatus};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::collections::HashMap;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_connection(info: &ConnectionInfo) -> String {
    let mut out = format!("{}\n", format_section_heading("Connection"));
    out.push_str(&format!("  Status: {}\n", "ok".green()));
    out.push_str(&format!("  User: {}\n", info.login));
    if !info.repository.is_empty() {
        out.push_str(&format!("  Repository: {}\n", info.repository));
    }
    if let Some(branch) = &info.default_branch {
        out.push_str(&format!("  Default branch: {}\n", branch));
    }
    out
}

/// Notes with their leaf counts, then every leaf under its note path.
pub fn format_pull_summary(outcome: &PullOutcome) -> String {
    let mut out = format!("{}\n", format_section_heading("Pull"));
    if outcome.empty_repository {
        out.push_str("  Repository is empty, nothing pulled.\n");
        return out;
    }
    out.push_str(&format!(
        "  Notes: {}  Leaves: {}  pushCount: {}\n\n",
        outcome.notes.len(),
        outcome.leaves.len(),
        outcome.metadata.push_count
    ));

    let names: HashMap<&str, String> = outcome
        .notes
        .iter()
        .map(|n| {
            let parent = n
                .parent_id
                .as_deref()
                .and_then(|pid| outcome.notes.iter().find(|p| p.id == pid));
            let label = match parent {
                Some(p) => format!("{}/{}", p.name, n.name),
                None => n.name.clone(),
            };
            (n.id.as_str(), label)
        })
        .collect();

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Note", "Leaf", "Order", "Bytes"]);
    for leaf in &outcome.leaves {
        let note = names
            .get(leaf.note_id.as_str())
            .cloned()
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            note,
            leaf.title.clone(),
            leaf.order.to_string(),
            leaf.content.len().to_string(),
        ]);
    }
    out.push_str(&format!("{}\n", table));

    if !outcome.failed_paths.is_empty() {
        out.push_str(&format!(
            "\n  {} {} leaf file(s) could not be fetched:\n",
            "warning:".yellow(),
            outcome.failed_paths.len()
        ));
        for path in &outcome.failed_paths {
            out.push_str(&format!("    - {}\n", path));
        }
    }
    out
}

pub fn format_push_outcome(outcome: &PushOutcome) -> String {
    let mut out = format!("{}\n", format_section_heading("Push"));
    if outcome.no_changes {
        out.push_str(&format!(
            "  {} (pushCount {})\n",
            "No changes".dimmed(),
            outcome.push_count
        ));
        return out;
    }
    out.push_str(&format!("  Status: {}\n", "pushed".green()));
    if let Some(sha) = &outcome.commit_sha {
        out.push_str(&format!("  Commit: {}\n", &sha[..sha.len().min(7)]));
    }
    out.push_str(&format!("  Leaves uploaded: {}\n", outcome.changed_leaf_count));
    out.push_str(&format!(
        "  Metadata changed: {}\n",
        if outcome.metadata_changed { "yes" } else { "no" }
    ));
    out.push_str(&format!("  pushCount: {}\n", outcome.push_count));
    if outcome.bootstrap {
        out.push_str("  Branch created by this push.\n");
    }
    out
}

pub fn format_stale_status(status: &StaleStatus) -> String {
    match status {
        StaleStatus::Stale { remote, local } => format!(
            "{} remote pushCount {} is ahead of local {}",
            "stale:".yellow(),
            remote,
            local
        ),
        StaleStatus::UpToDate { remote } => {
            format!("{} remote pushCount {}", "up to date:".green(), remote)
        }
        StaleStatus::CheckFailed(err) => format!("{} {}", "check failed:".red(), err),
    }
}

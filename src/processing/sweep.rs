//! Bulk deletion of leftover sample resource groups.

use super::lifecycle::Lifecycle;
use crate::models::ResourceGroup;
use futures::future::join_all;

/// Groups whose name starts with `prefix` (case-insensitive), sorted by name.
pub fn select_groups<'a>(groups: &'a [ResourceGroup], prefix: &str) -> Vec<&'a ResourceGroup> {
    let prefix = prefix.to_lowercase();
    let mut selected: Vec<&ResourceGroup> = groups
        .iter()
        .filter(|g| g.name.to_lowercase().starts_with(&prefix))
        .collect();
    selected.sort_by(|a, b| a.name.cmp(&b.name));
    selected
}

#[derive(Debug, Default, PartialEq)]
pub struct SweepSummary {
    pub deleted: Vec<String>,
    /// `(group, error)` for every failed deletion.
    pub failed: Vec<(String, String)>,
}

/// Delete every group concurrently; each failure is logged and collected, never retried.
pub async fn sweep(lifecycle: &Lifecycle, groups: &[&ResourceGroup]) -> SweepSummary {
    let results = join_all(groups.iter().map(|group| async move {
        (group.name.clone(), lifecycle.cleanup(group).await)
    }))
    .await;

    let mut summary = SweepSummary::default();
    for (name, result) in results {
        match result {
            Ok(()) => summary.deleted.push(name),
            Err(e) => {
                log::error!("{e}");
                summary.failed.push((name, e.to_string()));
            }
        }
    }
    log::info!(
        "sweep: {} deleted, {} failed",
        summary.deleted.len(),
        summary.failed.len()
    );
    summary
}

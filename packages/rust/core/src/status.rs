//! `--fetch-status`: master index → status snapshot and working-group lists.

use std::path::PathBuf;

use tracing::{info, instrument};

use rfctrans_shared::Result;

use crate::pipeline::ProgressReporter;
use crate::workspace::Workspace;

#[derive(Debug, Clone)]
pub struct StatusReport {
    pub entries: usize,
    pub groups: usize,
    pub snapshot_path: PathBuf,
    pub groups_path: PathBuf,
}

/// Download the master index and replace the stored snapshot wholesale.
#[instrument(skip_all)]
pub async fn fetch_status(ws: &Workspace, progress: &dyn ProgressReporter) -> Result<StatusReport> {
    progress.phase("Fetching the RFC master index");
    let snapshot = ws.fetcher().fetch_index().await?;
    let groups = snapshot.group_by_wg();

    let snapshot_path = ws.store().save_snapshot(&snapshot)?;
    let groups_path = ws.store().save_wg_groups(&groups)?;

    info!(
        entries = snapshot.len(),
        groups = groups.len(),
        "status snapshot saved"
    );
    Ok(StatusReport {
        entries: snapshot.len(),
        groups: groups.len(),
        snapshot_path,
        groups_path,
    })
}

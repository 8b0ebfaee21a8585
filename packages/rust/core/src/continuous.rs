//! Batch runs: explicit lists and the continuous catch-up mode.

use std::collections::BTreeSet;

use tracing::{info, instrument};

use rfctrans_fetch::FetchOptions;
use rfctrans_shared::{Result, RfcId};

use crate::pipeline::{Outcome, ProgressReporter, process};
use crate::workspace::Workspace;

/// RFCs below this number are never picked up by continuous mode.
pub const CONTINUOUS_MIN_RFC: u32 = 2220;

/// Which untranslated RFCs a continuous run takes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    /// Inclusive lower bound.
    pub begin: Option<u32>,
    /// Exclusive upper bound.
    pub end: Option<u32>,
    /// Take only the smallest matching number.
    pub only_first: bool,
}

impl Window {
    fn contains(&self, n: u32) -> bool {
        self.begin.is_none_or(|b| n >= b) && self.end.is_none_or(|e| n < e)
    }
}

/// Per-RFC results of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub done: Vec<RfcId>,
    pub not_found: Vec<RfcId>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.done.len() + self.not_found.len()
    }
}

/// RFC numbers listed remotely but with no local page or not-found marker,
/// from [`CONTINUOUS_MIN_RFC`] upwards, ascending.
pub fn diff_remote_and_local(
    remote: impl IntoIterator<Item = u32>,
    local: &BTreeSet<u32>,
) -> Vec<u32> {
    let diff: BTreeSet<u32> = remote
        .into_iter()
        .filter(|n| *n >= CONTINUOUS_MIN_RFC && !local.contains(n))
        .collect();
    diff.into_iter().collect()
}

/// Apply the window bounds and `only_first` to an ascending list.
pub fn select(numbers: &[u32], window: Window) -> Vec<u32> {
    let selected = numbers.iter().copied().filter(|n| window.contains(*n));
    if window.only_first {
        selected.take(1).collect()
    } else {
        selected.collect()
    }
}

/// Run the full pipeline for each id in order.
///
/// A missing RFC is recorded and the batch moves on; any other error stops it.
#[instrument(skip_all, fields(count = ids.len()))]
pub async fn run_batch(
    ws: &Workspace,
    ids: &[RfcId],
    opts: FetchOptions,
    progress: &dyn ProgressReporter,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    for id in ids {
        match process(ws, id, opts, progress).await? {
            Outcome::Done => report.done.push(id.clone()),
            Outcome::NotFound => report.not_found.push(id.clone()),
        }
    }
    info!(
        done = report.done.len(),
        not_found = report.not_found.len(),
        "batch finished"
    );
    Ok(report)
}

/// Discover RFCs published upstream but not yet handled locally and process them.
#[instrument(skip(ws, opts, progress))]
pub async fn run_continuous(
    ws: &Workspace,
    window: Window,
    opts: FetchOptions,
    progress: &dyn ProgressReporter,
) -> Result<BatchReport> {
    progress.phase("Comparing the master index with local pages");
    let snapshot = ws.fetcher().fetch_index().await?;
    let local = ws.store().local_rfc_numbers()?;

    let diff = diff_remote_and_local(snapshot.numbers(), &local);
    let queue = select(&diff, window);
    info!(
        remote = snapshot.len(),
        local = local.len(),
        untranslated = diff.len(),
        queued = queue.len(),
        "continuous queue built"
    );

    let ids: Vec<RfcId> = queue.into_iter().map(RfcId::number).collect();
    run_batch(ws, &ids, opts, progress).await
}

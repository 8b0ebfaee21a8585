//! `--make-index` and `--make-index-draft`.

use std::path::PathBuf;

use tracing::{info, instrument};

use rfctrans_render::{IndexEntry, render_draft_index, render_index};
use rfctrans_shared::{Result, RfcId};
use rfctrans_storage::ArtifactStore;

/// Regenerate `html/index.html` from every translated RFC.
#[instrument(skip_all)]
pub fn make_index(store: &ArtifactStore) -> Result<PathBuf> {
    let entries = entries(store, |id| !id.is_draft())?;
    let snapshot = store.load_snapshot()?;
    if snapshot.is_none() {
        info!("no status snapshot, run --fetch-status to add status columns");
    }

    let html = render_index(&entries, snapshot.as_ref());
    let path = store.write_index_page(&html)?;
    info!(entries = entries.len(), path = %path.display(), "index page written");
    Ok(path)
}

/// Regenerate `html/draft/index.html` from every translated draft.
#[instrument(skip_all)]
pub fn make_index_draft(store: &ArtifactStore) -> Result<PathBuf> {
    let entries = entries(store, RfcId::is_draft)?;
    let html = render_draft_index(&entries);
    let path = store.write_draft_index_page(&html)?;
    info!(entries = entries.len(), path = %path.display(), "draft index page written");
    Ok(path)
}

fn entries(store: &ArtifactStore, keep: impl Fn(&RfcId) -> bool) -> Result<Vec<IndexEntry>> {
    let mut entries = Vec::new();
    for id in store.translated_ids()?.into_iter().filter(|id| keep(id)) {
        if let Some(trans) = store.load_translation(&id)? {
            entries.push(IndexEntry {
                id,
                title: trans.title.text,
                translated_title: trans.title.translated,
            });
        }
    }
    Ok(entries)
}

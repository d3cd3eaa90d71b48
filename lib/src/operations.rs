//! Front-end facing API over the store, the codec and the enrichment pool.

use crate::db::TreeStore;
use crate::enrich::{EnrichReport, IconEnricher};
use crate::error::{BkmError, Result};
use crate::favicon;
use crate::import_export::{self, ImportSummary};
use crate::models::{Bookmark, Folder};
use crate::walker::{self, CountMismatch, Forest, TreeNode};
use std::sync::Arc;

/// Folder listing as served to clients: the folder, its breadcrumb and its direct content
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FolderView {
    /// `None` for the root
    pub folder: Option<Folder>,
    pub path: Vec<Folder>,
    pub folders: Vec<Folder>,
    pub bookmarks: Vec<Bookmark>,
}

pub struct BookmarkApi {
    store: Arc<TreeStore>,
    enricher: Option<IconEnricher>,
}

impl BookmarkApi {
    /// API without background enrichment
    pub fn new(store: Arc<TreeStore>) -> Self {
        Self {
            store,
            enricher: None,
        }
    }

    pub fn with_enricher(store: Arc<TreeStore>, enricher: IconEnricher) -> Self {
        Self {
            store,
            enricher: Some(enricher),
        }
    }

    pub fn store(&self) -> &Arc<TreeStore> {
        &self.store
    }

    pub fn is_online(&self) -> bool {
        self.enricher.is_some()
    }

    // ---- folders ----

    /// Content of a folder; `0` lists the root
    pub fn list(&self, folder_id: usize) -> Result<FolderView> {
        let folder = match folder_id {
            0 => None,
            id => Some(self.get_folder(id)?),
        };
        let path = match &folder {
            Some(f) => self.store.folder_path(f.id)?,
            None => Vec::new(),
        };
        Ok(FolderView {
            folder,
            path,
            folders: self.store.list_child_folders(folder_id)?,
            bookmarks: self.store.list_folder_bookmarks(folder_id)?,
        })
    }

    pub fn get_folder(&self, id: usize) -> Result<Folder> {
        self.store.get_folder(id)?.ok_or(BkmError::FolderNotFound(id))
    }

    pub fn add_folder(&self, title: &str, parent: Option<usize>) -> Result<Folder> {
        let id = self.store.create_folder(title, parent)?;
        self.get_folder(id)
    }

    pub fn rename_folder(&self, id: usize, title: &str) -> Result<Folder> {
        self.store.rename_folder(id, title)?;
        self.get_folder(id)
    }

    pub fn move_folder(&self, id: usize, parent: Option<usize>) -> Result<Folder> {
        self.store.move_folder(id, parent)?;
        self.get_folder(id)
    }

    pub fn delete_folder(&self, id: usize) -> Result<()> {
        self.store.delete_folder(id)
    }

    pub fn tree(&self, folder_id: usize) -> Result<TreeNode> {
        walker::walk_id(&self.store, folder_id)?.ok_or(BkmError::FolderNotFound(folder_id))
    }

    pub fn forest(&self) -> Result<Forest> {
        walker::walk_all(&self.store)
    }

    pub fn check(&self) -> Result<Vec<CountMismatch>> {
        walker::check_consistency(&self.store)
    }

    // ---- bookmarks ----

    pub fn get_bookmark(&self, id: usize) -> Result<Bookmark> {
        self.store
            .get_bookmark(id)?
            .ok_or(BkmError::BookmarkNotFound(id))
    }

    /// Icon of a bookmark as content type and bytes; the generic globe when none was fetched
    pub fn bookmark_icon(&self, id: usize) -> Result<(String, Vec<u8>)> {
        let bookmark = self.get_bookmark(id)?;
        favicon::decode(&favicon::display_icon(&bookmark.favicon))
    }

    /// Create a bookmark and hand it to the enrichment pool without waiting for its icon
    pub fn add_bookmark(&self, url: &str, title: Option<&str>, folder: Option<usize>) -> Result<Bookmark> {
        let id = self
            .store
            .create_bookmark(title.unwrap_or_default(), url, folder)?;
        let bookmark = self.get_bookmark(id)?;
        if let Some(enricher) = &self.enricher {
            if !enricher.enqueue(bookmark.id, &bookmark.url) {
                log::warn!("Icon enrichment is stopped, bookmark {} keeps no icon", id);
            }
        }
        Ok(bookmark)
    }

    pub fn update_bookmark(&self, id: usize, title: Option<&str>, url: Option<&str>) -> Result<Bookmark> {
        self.store.update_bookmark(id, title, url)?;
        self.get_bookmark(id)
    }

    pub fn move_bookmark(&self, id: usize, folder: Option<usize>) -> Result<Bookmark> {
        self.store.move_bookmark(id, folder)?;
        self.get_bookmark(id)
    }

    pub fn star_bookmark(&self, id: usize, starred: bool) -> Result<Bookmark> {
        self.store.star_bookmark(id, starred)?;
        self.get_bookmark(id)
    }

    pub fn delete_bookmark(&self, id: usize) -> Result<()> {
        self.store.delete_bookmark(id)
    }

    pub fn search(&self, term: &str) -> Result<Vec<Bookmark>> {
        self.store.search_bookmarks(term)
    }

    pub fn starred(&self) -> Result<Vec<Bookmark>> {
        self.store.list_starred_bookmarks()
    }

    // ---- bookmark files ----

    pub fn export_all(&self) -> Result<Vec<u8>> {
        import_export::export_all(&self.store)
    }

    pub fn export_folder(&self, id: usize) -> Result<Vec<u8>> {
        import_export::export_folder(&self.store, id)
    }

    pub fn import(&self, bytes: &[u8]) -> Result<ImportSummary> {
        import_export::import_bytes(&self.store, bytes)
    }

    // ---- enrichment ----

    /// Queue every bookmark without an icon; 0 when running offline
    pub fn enrich_missing(&self) -> Result<usize> {
        match &self.enricher {
            Some(enricher) => enricher.enqueue_missing(&self.store),
            None => Ok(0),
        }
    }

    /// Wait for queued icon fetches to finish
    pub fn shutdown(self) -> EnrichReport {
        self.enricher
            .map(IconEnricher::shutdown)
            .unwrap_or_default()
    }
}

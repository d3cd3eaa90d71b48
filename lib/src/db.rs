use crate::error::{BkmError, Result};
use crate::events::{EventBus, StoreEvent};
use crate::models::{Bookmark, Folder};
use crate::utils;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// SQLite-backed folder/bookmark tree.
///
/// The connection sits behind a mutex so one store can be shared between
/// request threads and the enrichment pool as `Arc<TreeStore>`. Every mutation
/// runs in its own immediate transaction, which keeps the cached child counts
/// of both parents consistent when folders move concurrently.
pub struct TreeStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    events: EventBus,
}

impl TreeStore {
    pub fn init_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, PathBuf::from(":memory:"))
    }

    pub fn init(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn, db_path.to_path_buf())
    }

    fn with_connection(conn: Connection, db_path: PathBuf) -> Result<Self> {
        log::debug!("Opening tree store at {:?}", db_path);
        setup_tables(&conn)?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path,
            events: EventBus::new(),
        };
        let repaired = store.refresh_child_counts()?;
        if repaired > 0 {
            log::info!("Repaired cached child count of {} folder(s)", repaired);
        }
        Ok(store)
    }

    /// Get the database file path
    pub fn get_path(&self) -> &Path {
        &self.db_path
    }

    /// Mutation notifications, published after each successful commit
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panicking writer leaves an uncommitted transaction that rolled back on drop,
        // so the connection itself is still usable.
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` inside one immediate transaction, committing on success
    fn write<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn query_folders<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<Folder>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let folders = stmt
            .query_map(params, row_to_folder)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(folders)
    }

    fn query_bookmarks<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<Bookmark>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let bookmarks = stmt
            .query_map(params, row_to_bookmark)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bookmarks)
    }

    // ---- creation ----

    pub fn create_folder(&self, title: &str, parent: Option<usize>) -> Result<usize> {
        let title = require_text(title, "folder title")?;
        let parent = utils::folder_ref(parent);
        log::debug!("create_folder title={:?} parent={:?}", title, parent);

        let id = self.write(|tx| {
            if let Some(pid) = parent {
                ensure_folder(tx, pid)?;
            }
            tx.execute(
                "INSERT INTO folder (title, parent_folder_id, nb_children_folders) VALUES (?1, ?2, 0)",
                params![title, parent],
            )?;
            let id = tx.last_insert_rowid() as usize;
            if let Some(pid) = parent {
                recount_children(tx, pid)?;
            }
            Ok(id)
        })?;

        self.events.publish(StoreEvent::FolderCreated {
            id,
            parent_id: parent,
        });
        Ok(id)
    }

    pub fn create_bookmark(&self, title: &str, url: &str, folder: Option<usize>) -> Result<usize> {
        self.create_bookmark_with_favicon(title, url, "", folder)
    }

    /// Insert a bookmark that already carries its inline favicon (e.g. from an import)
    pub fn create_bookmark_with_favicon(
        &self,
        title: &str,
        url: &str,
        favicon: &str,
        folder: Option<usize>,
    ) -> Result<usize> {
        let url = require_text(url, "bookmark url")?;
        let title = match title.trim() {
            "" => url,
            t => t,
        };
        let folder = utils::folder_ref(folder);
        let favicon = (!favicon.is_empty()).then_some(favicon);
        log::debug!(
            "create_bookmark title={:?} url={:?} folder={:?}",
            title,
            url,
            folder
        );

        let id = self.write(|tx| {
            if let Some(fid) = folder {
                ensure_folder(tx, fid)?;
            }
            tx.execute(
                "INSERT INTO bookmark (title, url, favicon, starred, folder_id) VALUES (?1, ?2, ?3, 0, ?4)",
                params![title, url, favicon, folder],
            )?;
            Ok(tx.last_insert_rowid() as usize)
        })?;

        self.events.publish(StoreEvent::BookmarkCreated {
            id,
            folder_id: folder,
        });
        Ok(id)
    }

    // ---- lookups ----

    /// Returns `None` for id 0 and for missing rows
    pub fn get_folder(&self, id: usize) -> Result<Option<Folder>> {
        if id == 0 {
            return Ok(None);
        }
        let conn = self.conn();
        let folder = conn
            .query_row(
                "SELECT id, title, parent_folder_id, nb_children_folders FROM folder WHERE id = ?1",
                [id],
                row_to_folder,
            )
            .optional()?;
        Ok(folder)
    }

    pub fn get_bookmark(&self, id: usize) -> Result<Option<Bookmark>> {
        if id == 0 {
            return Ok(None);
        }
        let conn = self.conn();
        let bookmark = conn
            .query_row(
                "SELECT id, title, url, favicon, starred, folder_id FROM bookmark WHERE id = ?1",
                [id],
                row_to_bookmark,
            )
            .optional()?;
        Ok(bookmark)
    }

    /// Parent chain of a folder, nearest parent first, ending with a root-level folder
    pub fn folder_ancestors(&self, id: usize) -> Result<Vec<Folder>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, title, parent_folder_id, nb_children_folders FROM folder WHERE id = ?1",
        )?;

        let mut ancestors = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut next = stmt
            .query_row([id], |row| row.get::<_, Option<usize>>(2))
            .optional()?
            .flatten();

        while let Some(parent_id) = next {
            if !seen.insert(parent_id) {
                return Err(BkmError::CycleDetected(parent_id));
            }
            let Some(parent) = stmt.query_row([parent_id], row_to_folder).optional()? else {
                break;
            };
            next = parent.parent_id;
            ancestors.push(parent);
        }
        Ok(ancestors)
    }

    /// Breadcrumb from the root-level folder down to `id` itself
    pub fn folder_path(&self, id: usize) -> Result<Vec<Folder>> {
        let Some(folder) = self.get_folder(id)? else {
            return Ok(Vec::new());
        };
        let mut path = self.folder_ancestors(id)?;
        path.reverse();
        path.push(folder);
        Ok(path)
    }

    pub fn list_root_folders(&self) -> Result<Vec<Folder>> {
        self.query_folders(
            "SELECT id, title, parent_folder_id, nb_children_folders FROM folder
             WHERE parent_folder_id IS NULL ORDER BY title, id",
            [],
        )
    }

    pub fn list_root_bookmarks(&self) -> Result<Vec<Bookmark>> {
        self.query_bookmarks(
            "SELECT id, title, url, favicon, starred, folder_id FROM bookmark
             WHERE folder_id IS NULL ORDER BY title, id",
            [],
        )
    }

    /// Child folders ordered by title; `0` selects root-level folders
    pub fn list_child_folders(&self, parent_id: usize) -> Result<Vec<Folder>> {
        if parent_id == 0 {
            return self.list_root_folders();
        }
        self.query_folders(
            "SELECT id, title, parent_folder_id, nb_children_folders FROM folder
             WHERE parent_folder_id = ?1 ORDER BY title, id",
            [parent_id],
        )
    }

    /// Bookmarks of a folder ordered by title; `0` selects root-level bookmarks
    pub fn list_folder_bookmarks(&self, folder_id: usize) -> Result<Vec<Bookmark>> {
        if folder_id == 0 {
            return self.list_root_bookmarks();
        }
        self.query_bookmarks(
            "SELECT id, title, url, favicon, starred, folder_id FROM bookmark
             WHERE folder_id = ?1 ORDER BY title, id",
            [folder_id],
        )
    }

    pub fn list_starred_bookmarks(&self) -> Result<Vec<Bookmark>> {
        self.query_bookmarks(
            "SELECT id, title, url, favicon, starred, folder_id FROM bookmark
             WHERE starred = 1 ORDER BY title, id",
            [],
        )
    }

    pub fn list_bookmarks_missing_favicon(&self) -> Result<Vec<Bookmark>> {
        self.query_bookmarks(
            "SELECT id, title, url, favicon, starred, folder_id FROM bookmark
             WHERE favicon IS NULL OR favicon = '' ORDER BY title, id",
            [],
        )
    }

    /// Substring match on title or url
    pub fn search_bookmarks(&self, term: &str) -> Result<Vec<Bookmark>> {
        let pattern = format!("%{}%", escape_like(term.trim()));
        self.query_bookmarks(
            "SELECT id, title, url, favicon, starred, folder_id FROM bookmark
             WHERE title LIKE ?1 ESCAPE '\\' OR url LIKE ?1 ESCAPE '\\' ORDER BY title, id",
            [pattern],
        )
    }

    pub fn count_folders(&self) -> Result<usize> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM folder", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn count_bookmarks(&self) -> Result<usize> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM bookmark", [], |row| row.get(0))?;
        Ok(count)
    }

    // ---- in-place updates ----

    pub fn rename_folder(&self, id: usize, title: &str) -> Result<()> {
        let title = require_text(title, "folder title")?;
        self.write(|tx| {
            let changed = tx.execute(
                "UPDATE folder SET title = ?1 WHERE id = ?2",
                params![title, id],
            )?;
            if changed == 0 {
                return Err(BkmError::FolderNotFound(id));
            }
            Ok(())
        })?;
        self.events.publish(StoreEvent::FolderRenamed { id });
        Ok(())
    }

    pub fn rename_bookmark(&self, id: usize, title: &str) -> Result<()> {
        self.update_bookmark(id, Some(title), None)
    }

    /// Partial edit of title and/or url; `None` keeps the stored value
    pub fn update_bookmark(&self, id: usize, title: Option<&str>, url: Option<&str>) -> Result<()> {
        let title = title.map(|t| require_text(t, "bookmark title")).transpose()?;
        let url = url.map(|u| require_text(u, "bookmark url")).transpose()?;
        if title.is_none() && url.is_none() {
            return Ok(());
        }

        self.write(|tx| {
            let changed = tx.execute(
                "UPDATE bookmark SET title = COALESCE(?1, title), url = COALESCE(?2, url) WHERE id = ?3",
                params![title, url, id],
            )?;
            if changed == 0 {
                return Err(BkmError::BookmarkNotFound(id));
            }
            Ok(())
        })?;
        self.events.publish(StoreEvent::BookmarkUpdated { id });
        Ok(())
    }

    /// Reparent a folder. `None` or `Some(0)` moves it to the root.
    ///
    /// Fails with [`BkmError::CyclicMove`] when the destination is the folder
    /// itself or one of its descendants.
    pub fn move_folder(&self, id: usize, new_parent: Option<usize>) -> Result<()> {
        let new_parent = utils::folder_ref(new_parent);
        log::debug!("move_folder id={} new_parent={:?}", id, new_parent);

        let old_parent = self.write(|tx| {
            let old_parent = parent_of(tx, id)?.ok_or(BkmError::FolderNotFound(id))?;
            if let Some(target) = new_parent {
                ensure_folder(tx, target)?;
                if target == id || is_ancestor(tx, id, target)? {
                    return Err(BkmError::CyclicMove { folder: id, target });
                }
            }

            tx.execute(
                "UPDATE folder SET parent_folder_id = ?1 WHERE id = ?2",
                params![new_parent, id],
            )?;
            if let Some(old) = old_parent {
                recount_children(tx, old)?;
            }
            if let Some(new) = new_parent {
                recount_children(tx, new)?;
            }
            Ok(old_parent)
        })?;

        self.events.publish(StoreEvent::FolderMoved {
            id,
            from: old_parent,
            to: new_parent,
        });
        Ok(())
    }

    /// Reparent a bookmark. `None` or `Some(0)` moves it to the root.
    pub fn move_bookmark(&self, id: usize, new_folder: Option<usize>) -> Result<()> {
        let new_folder = utils::folder_ref(new_folder);

        let old_folder = self.write(|tx| {
            let old_folder = tx
                .query_row(
                    "SELECT folder_id FROM bookmark WHERE id = ?1",
                    [id],
                    |row| row.get::<_, Option<usize>>(0),
                )
                .optional()?
                .ok_or(BkmError::BookmarkNotFound(id))?;
            if let Some(fid) = new_folder {
                ensure_folder(tx, fid)?;
            }
            tx.execute(
                "UPDATE bookmark SET folder_id = ?1 WHERE id = ?2",
                params![new_folder, id],
            )?;
            Ok(old_folder)
        })?;

        self.events.publish(StoreEvent::BookmarkMoved {
            id,
            from: old_folder,
            to: new_folder,
        });
        Ok(())
    }

    pub fn star_bookmark(&self, id: usize, starred: bool) -> Result<()> {
        self.write(|tx| {
            let changed = tx.execute(
                "UPDATE bookmark SET starred = ?1 WHERE id = ?2",
                params![starred, id],
            )?;
            if changed == 0 {
                return Err(BkmError::BookmarkNotFound(id));
            }
            Ok(())
        })?;
        self.events
            .publish(StoreEvent::BookmarkStarred { id, starred });
        Ok(())
    }

    pub fn update_bookmark_favicon(&self, id: usize, icon: &str) -> Result<()> {
        self.write(|tx| {
            let changed = tx.execute(
                "UPDATE bookmark SET favicon = ?1 WHERE id = ?2",
                params![icon, id],
            )?;
            if changed == 0 {
                return Err(BkmError::BookmarkNotFound(id));
            }
            Ok(())
        })?;
        self.events.publish(StoreEvent::FaviconUpdated { id });
        Ok(())
    }

    // ---- deletion ----

    /// Delete a folder with every descendant folder and bookmark
    pub fn delete_folder(&self, id: usize) -> Result<()> {
        let removed = self.write(|tx| {
            let parent = parent_of(tx, id)?.ok_or(BkmError::FolderNotFound(id))?;
            let before: usize = tx.query_row("SELECT COUNT(*) FROM folder", [], |row| row.get(0))?;
            tx.execute("DELETE FROM folder WHERE id = ?1", [id])?;
            let after: usize = tx.query_row("SELECT COUNT(*) FROM folder", [], |row| row.get(0))?;
            if let Some(pid) = parent {
                recount_children(tx, pid)?;
            }
            Ok(before - after)
        })?;

        log::debug!("delete_folder id={} removed {} folder(s)", id, removed);
        self.events.publish(StoreEvent::FolderDeleted { id });
        Ok(())
    }

    pub fn delete_bookmark(&self, id: usize) -> Result<()> {
        self.write(|tx| {
            if tx.execute("DELETE FROM bookmark WHERE id = ?1", [id])? == 0 {
                return Err(BkmError::BookmarkNotFound(id));
            }
            Ok(())
        })?;
        self.events.publish(StoreEvent::BookmarkDeleted { id });
        Ok(())
    }

    // ---- maintenance ----

    /// Recompute every cached child count, returning how many were wrong
    pub fn refresh_child_counts(&self) -> Result<usize> {
        self.write(|tx| {
            let fixed = tx.execute(
                "UPDATE folder SET nb_children_folders =
                    (SELECT COUNT(*) FROM folder AS child WHERE child.parent_folder_id = folder.id)
                 WHERE nb_children_folders IS NOT
                    (SELECT COUNT(*) FROM folder AS child WHERE child.parent_folder_id = folder.id)",
                [],
            )?;
            Ok(fixed)
        })
    }

    /// Seed an empty database with a small example tree. Returns false if folders already exist.
    pub fn populate_sample(&self) -> Result<bool> {
        if self.count_folders()? > 0 {
            return Ok(false);
        }
        let it = self.create_folder("IT", None)?;
        let development = self.create_folder("Development", Some(it))?;
        self.create_bookmark("GoLang", "https://golang.org/", Some(development))?;
        log::info!("Populated database with sample folders");
        Ok(true)
    }
}

fn setup_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS folder (
            id integer PRIMARY KEY AUTOINCREMENT,
            title text NOT NULL,
            parent_folder_id integer DEFAULT NULL REFERENCES folder(id) ON DELETE CASCADE,
            nb_children_folders integer NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS bookmark (
            id integer PRIMARY KEY AUTOINCREMENT,
            title text NOT NULL,
            url text NOT NULL,
            favicon text DEFAULT NULL,
            starred integer NOT NULL DEFAULT 0,
            folder_id integer DEFAULT NULL REFERENCES folder(id) ON DELETE CASCADE
        )",
        [],
    )?;

    // Migration: databases created before starring existed
    if !has_column(conn, "bookmark", "starred")? {
        conn.execute(
            "ALTER TABLE bookmark ADD COLUMN starred integer NOT NULL DEFAULT 0",
            [],
        )?;
    }

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_folder_parent ON folder(parent_folder_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_bookmark_folder ON bookmark(folder_id)",
        [],
    )?;

    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names.iter().any(|name| name == column))
}

fn row_to_folder(row: &Row) -> rusqlite::Result<Folder> {
    Ok(Folder {
        id: row.get(0)?,
        title: row.get(1)?,
        parent_id: row.get(2)?,
        child_folder_count: row.get(3)?,
    })
}

fn row_to_bookmark(row: &Row) -> rusqlite::Result<Bookmark> {
    Ok(Bookmark {
        id: row.get(0)?,
        title: row.get(1)?,
        url: row.get(2)?,
        favicon: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        starred: row.get(4)?,
        folder_id: row.get(5)?,
    })
}

fn require_text<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    match value.trim() {
        "" => Err(BkmError::InvalidInput(format!("{} must not be empty", field))),
        trimmed => Ok(trimmed),
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn ensure_folder(conn: &Connection, id: usize) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM folder WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(BkmError::FolderNotFound(id))
    }
}

/// `Some(parent)` when the folder exists, `None` when it does not
fn parent_of(conn: &Connection, id: usize) -> Result<Option<Option<usize>>> {
    let parent = conn
        .query_row(
            "SELECT parent_folder_id FROM folder WHERE id = ?1",
            [id],
            |row| row.get::<_, Option<usize>>(0),
        )
        .optional()?;
    Ok(parent)
}

/// Whether `ancestor` appears on the parent chain of `node`
fn is_ancestor(conn: &Connection, ancestor: usize, node: usize) -> Result<bool> {
    let found: bool = conn.query_row(
        "WITH RECURSIVE chain(id) AS (
            SELECT parent_folder_id FROM folder WHERE id = ?1
            UNION
            SELECT folder.parent_folder_id FROM folder INNER JOIN chain ON folder.id = chain.id
        )
        SELECT EXISTS(SELECT 1 FROM chain WHERE id = ?2)",
        params![node, ancestor],
        |row| row.get(0),
    )?;
    Ok(found)
}

fn recount_children(conn: &Connection, folder_id: usize) -> Result<()> {
    conn.execute(
        "UPDATE folder SET nb_children_folders =
            (SELECT COUNT(*) FROM folder AS child WHERE child.parent_folder_id = ?1)
         WHERE id = ?1",
        [folder_id],
    )?;
    Ok(())
}

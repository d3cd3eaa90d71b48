use super::entities::escape;
use crate::db::TreeStore;
use crate::error::{BkmError, Result};
use crate::models::Bookmark;
use crate::walker::{self, Forest, TreeNode};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const HEADER: &str = "<!DOCTYPE NETSCAPE-Bookmark-file-1>
<!-- This is an automatically generated file.
     It will be read and overwritten.
     DO NOT EDIT! -->
<META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=UTF-8\">
<TITLE>Bookmarks</TITLE>
<H1>Bookmarks</H1>
";

const INDENT: &str = "    ";

/// What an export wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportSummary {
    pub folders: usize,
    pub bookmarks: usize,
}

fn indent<W: Write>(w: &mut W, depth: usize) -> io::Result<()> {
    for _ in 0..depth {
        w.write_all(INDENT.as_bytes())?;
    }
    Ok(())
}

fn write_bookmark<W: Write>(w: &mut W, bookmark: &Bookmark, depth: usize) -> io::Result<()> {
    indent(w, depth)?;
    writeln!(
        w,
        "<DT><A HREF=\"{}\" ICON=\"{}\">{}</A>",
        escape(&bookmark.url),
        escape(&bookmark.favicon),
        escape(&bookmark.title)
    )
}

/// Write one folder: its heading, then a list holding subfolders first and bookmarks after
pub fn write_tree<W: Write>(w: &mut W, node: &TreeNode, depth: usize) -> io::Result<()> {
    indent(w, depth)?;
    writeln!(w, "<DT><H3>{}</H3>", escape(&node.folder.title))?;
    indent(w, depth)?;
    writeln!(w, "<DL><p>")?;

    for child in &node.children {
        write_tree(w, child, depth + 1)?;
    }
    for bookmark in &node.bookmarks {
        write_bookmark(w, bookmark, depth + 1)?;
    }

    indent(w, depth)?;
    writeln!(w, "</DL><p>")
}

/// Write a complete document holding every root folder and root bookmark
pub fn write_forest<W: Write>(w: &mut W, forest: &Forest) -> io::Result<()> {
    w.write_all(HEADER.as_bytes())?;
    writeln!(w, "<DL><p>")?;
    for node in &forest.folders {
        write_tree(w, node, 1)?;
    }
    for bookmark in &forest.bookmarks {
        write_bookmark(w, bookmark, 1)?;
    }
    writeln!(w, "</DL><p>")
}

/// Document containing a single folder subtree
pub fn export_folder(store: &TreeStore, id: usize) -> Result<Vec<u8>> {
    let node = walker::walk_id(store, id)?.ok_or(BkmError::FolderNotFound(id))?;
    let forest = Forest {
        folders: vec![node],
        bookmarks: Vec::new(),
    };
    let mut out = Vec::new();
    write_forest(&mut out, &forest)?;
    Ok(out)
}

pub fn export_all(store: &TreeStore) -> Result<Vec<u8>> {
    let forest = walker::walk_all(store)?;
    let mut out = Vec::new();
    write_forest(&mut out, &forest)?;
    log::info!(
        "Exported {} folder(s) and {} bookmark(s)",
        forest.folder_count(),
        forest.bookmark_count()
    );
    Ok(out)
}

/// Write the whole store, or one folder when `folder` is given, to `path`
pub fn export_to_file(store: &TreeStore, path: &Path, folder: Option<usize>) -> Result<ExportSummary> {
    let forest = match crate::utils::folder_ref(folder) {
        Some(id) => Forest {
            folders: vec![walker::walk_id(store, id)?.ok_or(BkmError::FolderNotFound(id))?],
            bookmarks: Vec::new(),
        },
        None => walker::walk_all(store)?,
    };

    let mut writer = BufWriter::new(File::create(path)?);
    write_forest(&mut writer, &forest)?;
    writer.flush()?;

    let summary = ExportSummary {
        folders: forest.folder_count(),
        bookmarks: forest.bookmark_count(),
    };
    log::info!(
        "Exported {} folder(s) and {} bookmark(s) to {:?}",
        summary.folders,
        summary.bookmarks,
        path
    );
    Ok(summary)
}

use super::{AppContext, BkmCommand};
use bkmtree::error::{BkmError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCommand {
    pub url: String,
    pub title: Option<String>,
    pub folder: Option<usize>,
}

impl BkmCommand for AddCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let bookmark = ctx
            .api
            .add_bookmark(&self.url, self.title.as_deref(), self.folder)?;
        eprintln!("Added bookmark at index {}", bookmark.id);
        if !ctx.api.is_online() {
            log::debug!("Offline: bookmark {} keeps no icon", bookmark.id);
        }
        ctx.format.print_bookmark(&bookmark, ctx.no_color)
    }
}

/// Change title and/or url of a bookmark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditCommand {
    pub id: usize,
    pub title: Option<String>,
    pub url: Option<String>,
}

impl BkmCommand for EditCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        if self.title.is_none() && self.url.is_none() {
            return Err(BkmError::InvalidInput(
                "nothing to edit, pass --title and/or --url".to_string(),
            ));
        }
        let bookmark =
            ctx.api
                .update_bookmark(self.id, self.title.as_deref(), self.url.as_deref())?;
        ctx.format.print_bookmark(&bookmark, ctx.no_color)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarCommand {
    pub id: usize,
    pub starred: bool,
}

impl BkmCommand for StarCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let bookmark = ctx.api.star_bookmark(self.id, self.starred)?;
        let verb = if bookmark.starred { "Starred" } else { "Unstarred" };
        eprintln!("{} bookmark {}", verb, bookmark.id);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCommand {
    pub terms: Vec<String>,
}

impl BkmCommand for SearchCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let term = self.terms.join(" ");
        if term.trim().is_empty() {
            return Err(BkmError::InvalidInput("search term is empty".to_string()));
        }
        let records = ctx.api.search(&term)?;
        if records.is_empty() {
            eprintln!("No bookmarks found matching {:?}", term);
            return Ok(());
        }
        ctx.format.print_bookmarks(&records, ctx.no_color)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarredCommand;

impl BkmCommand for StarredCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let records = ctx.api.starred()?;
        if records.is_empty() {
            eprintln!("No starred bookmarks.");
            return Ok(());
        }
        ctx.format.print_bookmarks(&records, ctx.no_color)
    }
}

/// Write a bookmark's icon to a file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IconCommand {
    pub id: usize,
    pub file: PathBuf,
}

impl BkmCommand for IconCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let (content_type, bytes) = ctx.api.bookmark_icon(self.id)?;
        std::fs::write(&self.file, &bytes)?;
        eprintln!(
            "Wrote {} ({} bytes) to {}",
            content_type,
            bytes.len(),
            self.file.display()
        );
        Ok(())
    }
}

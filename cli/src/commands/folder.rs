use super::{AppContext, BkmCommand};
use bkmtree::error::Result;
use bkmtree::utils;
use serde::{Deserialize, Serialize};

/// Content of one folder; `0` is the root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCommand {
    pub folder: usize,
}

impl BkmCommand for ListCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let view = ctx.api.list(self.folder)?;
        if view.folders.is_empty() && view.bookmarks.is_empty() {
            eprintln!("Folder is empty.");
        }
        ctx.format.print_folder_view(&view, ctx.no_color)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeCommand {
    pub folder: Option<usize>,
}

impl BkmCommand for TreeCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        match utils::folder_ref(self.folder) {
            Some(id) => ctx.format.print_tree(&ctx.api.tree(id)?, ctx.no_color),
            None => ctx.format.print_forest(&ctx.api.forest()?, ctx.no_color),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MkdirCommand {
    pub title: String,
    pub parent: Option<usize>,
}

impl BkmCommand for MkdirCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let folder = ctx.api.add_folder(&self.title, self.parent)?;
        eprintln!("Created folder {} ({})", folder.id, folder.title);
        Ok(())
    }
}

/// Verify cached subfolder counts, optionally repairing them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckCommand {
    pub repair: bool,
}

impl BkmCommand for CheckCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let mismatches = ctx.api.check()?;
        if mismatches.is_empty() {
            eprintln!("All folder counts are consistent.");
            return Ok(());
        }

        ctx.format.print_value(&mismatches, |list| {
            list.iter()
                .map(|m| {
                    format!(
                        "{}. {}: cached {}, actual {}",
                        m.folder_id, m.title, m.cached, m.actual
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        })?;

        if self.repair {
            let fixed = ctx.api.store().refresh_child_counts()?;
            eprintln!("Repaired {} folder(s).", fixed);
        } else {
            eprintln!("Run with --repair to fix {} folder(s).", mismatches.len());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleCommand;

impl BkmCommand for SampleCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        if ctx.api.store().populate_sample()? {
            eprintln!("Sample folders created.");
        } else {
            eprintln!("Database already has folders, nothing to do.");
        }
        Ok(())
    }
}

use crate::format::OutputFormat;
use bkmtree::config::Config;
use bkmtree::error::Result;
use bkmtree::operations::BookmarkApi;
use serde::{Deserialize, Serialize};

pub struct AppContext<'a> {
    pub api: &'a BookmarkApi,
    pub config: &'a Config,
    pub format: OutputFormat,
    pub no_color: bool,
}

pub mod bookmark;
pub mod edit;
pub mod folder;
pub mod import_export;

/// Which kind of item an id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Folder,
    Bookmark,
}

pub trait BkmCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()>;
}

/// Enum-based dispatch for commands (avoids Box<dyn BkmCommand>)
pub enum CommandEnum {
    List(folder::ListCommand),
    Tree(folder::TreeCommand),
    Mkdir(folder::MkdirCommand),
    Check(folder::CheckCommand),
    Sample(folder::SampleCommand),
    Add(bookmark::AddCommand),
    Edit(bookmark::EditCommand),
    Star(bookmark::StarCommand),
    Search(bookmark::SearchCommand),
    Starred(bookmark::StarredCommand),
    Icon(bookmark::IconCommand),
    Rename(edit::RenameCommand),
    Move(edit::MoveCommand),
    Remove(edit::RemoveCommand),
    Import(import_export::ImportCommand),
    Export(import_export::ExportCommand),
    Enrich(import_export::EnrichCommand),
}

impl CommandEnum {
    pub fn execute(&self, ctx: &AppContext) -> Result<()> {
        match self {
            Self::List(cmd) => cmd.execute(ctx),
            Self::Tree(cmd) => cmd.execute(ctx),
            Self::Mkdir(cmd) => cmd.execute(ctx),
            Self::Check(cmd) => cmd.execute(ctx),
            Self::Sample(cmd) => cmd.execute(ctx),
            Self::Add(cmd) => cmd.execute(ctx),
            Self::Edit(cmd) => cmd.execute(ctx),
            Self::Star(cmd) => cmd.execute(ctx),
            Self::Search(cmd) => cmd.execute(ctx),
            Self::Starred(cmd) => cmd.execute(ctx),
            Self::Icon(cmd) => cmd.execute(ctx),
            Self::Rename(cmd) => cmd.execute(ctx),
            Self::Move(cmd) => cmd.execute(ctx),
            Self::Remove(cmd) => cmd.execute(ctx),
            Self::Import(cmd) => cmd.execute(ctx),
            Self::Export(cmd) => cmd.execute(ctx),
            Self::Enrich(cmd) => cmd.execute(ctx),
        }
    }
}

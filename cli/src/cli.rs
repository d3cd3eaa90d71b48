use crate::commands::{
    bookmark, edit, folder, import_export, AppContext, CommandEnum, Target,
};
use crate::format::OutputFormat;
use bkmtree::config::Config;
use bkmtree::error::Result;
use bkmtree::operations::BookmarkApi;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None, disable_version_flag = true)]
pub struct Cli {
    /// Show the program version and exit
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Optional custom database file path
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Optional custom configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Disable color output
    #[arg(long)]
    pub nc: bool,

    /// Show debug information
    #[arg(short = 'g', long = "debug")]
    pub debug: bool,

    /// Output format: json, yaml or colored
    #[arg(short = 'f', long)]
    pub format: Option<String>,

    /// Never contact the icon provider
    #[arg(long)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List a folder (default: the root)
    Ls {
        #[arg(default_value_t = 0)]
        folder: usize,
    },

    /// Print a folder subtree, or the whole tree
    Tree { folder: Option<usize> },

    /// Create a folder
    Mkdir {
        title: String,

        /// Parent folder id
        #[arg(short, long)]
        parent: Option<usize>,
    },

    /// Add a new bookmark
    Add {
        /// URL to bookmark
        url: String,

        /// Bookmark title (defaults to the URL)
        #[arg(long)]
        title: Option<String>,

        /// Folder id
        #[arg(short = 'd', long = "folder")]
        folder: Option<usize>,
    },

    /// Change a bookmark's title or URL
    Edit {
        id: usize,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        url: Option<String>,
    },

    /// Rename a folder or bookmark
    Rename {
        #[arg(value_enum)]
        target: Target,
        id: usize,
        title: String,
    },

    /// Move a folder or bookmark (destination 0 is the root)
    Mv {
        #[arg(value_enum)]
        target: Target,
        id: usize,
        #[arg(default_value_t = 0)]
        dest: usize,
    },

    /// Delete a folder (with its content) or a bookmark
    Rm {
        #[arg(value_enum)]
        target: Target,
        id: usize,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Star a bookmark
    Star { id: usize },

    /// Remove the star from a bookmark
    Unstar { id: usize },

    /// Search bookmark titles and URLs
    Search {
        #[arg(required = true)]
        terms: Vec<String>,
    },

    /// List starred bookmarks
    Starred,

    /// Save a bookmark's icon to a file
    Icon { id: usize, file: PathBuf },

    /// Import a Netscape bookmark file under a new import-<date> folder
    Import { file: PathBuf },

    /// Export to a Netscape bookmark file
    Export {
        file: PathBuf,

        /// Export only this folder
        #[arg(long)]
        folder: Option<usize>,
    },

    /// Fetch icons for bookmarks that have none
    Enrich,

    /// Verify cached subfolder counts
    Check {
        #[arg(long)]
        repair: bool,
    },

    /// Create the sample folders in an empty database
    Sample,
}

impl Commands {
    fn into_command(self) -> CommandEnum {
        match self {
            Commands::Ls { folder } => CommandEnum::List(folder::ListCommand { folder }),
            Commands::Tree { folder } => CommandEnum::Tree(folder::TreeCommand { folder }),
            Commands::Mkdir { title, parent } => {
                CommandEnum::Mkdir(folder::MkdirCommand { title, parent })
            }
            Commands::Add { url, title, folder } => {
                CommandEnum::Add(bookmark::AddCommand { url, title, folder })
            }
            Commands::Edit { id, title, url } => {
                CommandEnum::Edit(bookmark::EditCommand { id, title, url })
            }
            Commands::Rename { target, id, title } => {
                CommandEnum::Rename(edit::RenameCommand { target, id, title })
            }
            Commands::Mv { target, id, dest } => {
                CommandEnum::Move(edit::MoveCommand { target, id, dest })
            }
            Commands::Rm { target, id, force } => {
                CommandEnum::Remove(edit::RemoveCommand { target, id, force })
            }
            Commands::Star { id } => CommandEnum::Star(bookmark::StarCommand { id, starred: true }),
            Commands::Unstar { id } => CommandEnum::Star(bookmark::StarCommand {
                id,
                starred: false,
            }),
            Commands::Search { terms } => CommandEnum::Search(bookmark::SearchCommand { terms }),
            Commands::Starred => CommandEnum::Starred(bookmark::StarredCommand),
            Commands::Icon { id, file } => CommandEnum::Icon(bookmark::IconCommand { id, file }),
            Commands::Import { file } => CommandEnum::Import(import_export::ImportCommand { file }),
            Commands::Export { file, folder } => {
                CommandEnum::Export(import_export::ExportCommand { file, folder })
            }
            Commands::Enrich => CommandEnum::Enrich(import_export::EnrichCommand),
            Commands::Check { repair } => CommandEnum::Check(folder::CheckCommand { repair }),
            Commands::Sample => CommandEnum::Sample(folder::SampleCommand),
        }
    }
}

pub fn handle_args(cli: Cli, api: &BookmarkApi, config: &Config) -> Result<()> {
    let ctx = AppContext {
        api,
        config,
        format: cli
            .format
            .as_deref()
            .map(OutputFormat::from_string)
            .unwrap_or(OutputFormat::Colored),
        no_color: cli.nc,
    };

    let command = cli
        .command
        .map(Commands::into_command)
        .unwrap_or(CommandEnum::List(folder::ListCommand { folder: 0 }));
    command.execute(&ctx)
}

use super::{AppContext, BkmCommand};
use bkmtree::error::Result;
use bkmtree::import_export;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportCommand {
    pub file: PathBuf,
}

impl BkmCommand for ImportCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let bytes = std::fs::read(&self.file)?;
        let summary = ctx.api.import(&bytes)?;
        eprintln!(
            "✓ Imported {} folder(s) and {} bookmark(s) from {} into {:?}",
            summary.folders,
            summary.bookmarks,
            self.file.display(),
            summary.folder_title
        );
        if summary.skipped > 0 {
            eprintln!("  {} link(s) without address were skipped", summary.skipped);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportCommand {
    pub file: PathBuf,
    pub folder: Option<usize>,
}

impl BkmCommand for ExportCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let summary = import_export::export_to_file(ctx.api.store(), &self.file, self.folder)?;
        eprintln!(
            "✓ Exported {} folder(s) and {} bookmark(s) to {}",
            summary.folders,
            summary.bookmarks,
            self.file.display()
        );
        Ok(())
    }
}

/// Queue every bookmark without icon; fetches finish before the program exits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichCommand;

impl BkmCommand for EnrichCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        if !ctx.api.is_online() {
            eprintln!("Icon fetching is disabled (--offline).");
            return Ok(());
        }
        let queued = ctx.api.enrich_missing()?;
        eprintln!(
            "Fetching icons for {} bookmark(s) with {} worker(s)...",
            queued, ctx.config.enrich_workers
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{ctx, offline_api};
    use super::*;
    use bkmtree::config::Config;

    #[test]
    fn test_export_then_import_file() {
        let api = offline_api();
        let config = Config::default();
        let ctx = ctx(&api, &config);
        api.store().populate_sample().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bookmarks.html");
        ExportCommand {
            file: file.clone(),
            folder: None,
        }
        .execute(&ctx)
        .unwrap();
        ImportCommand { file }.execute(&ctx).unwrap();

        assert_eq!(api.store().count_folders().unwrap(), 5);
        assert_eq!(api.store().count_bookmarks().unwrap(), 2);
    }

    #[test]
    fn test_enrich_offline_is_noop() {
        let api = offline_api();
        let config = Config::default();
        assert!(EnrichCommand.execute(&ctx(&api, &config)).is_ok());
    }
}

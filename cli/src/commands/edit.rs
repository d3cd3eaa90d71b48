use super::{AppContext, BkmCommand, Target};
use bkmtree::error::Result;
use bkmtree::utils;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameCommand {
    pub target: Target,
    pub id: usize,
    pub title: String,
}

impl BkmCommand for RenameCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        match self.target {
            Target::Folder => {
                let folder = ctx.api.rename_folder(self.id, &self.title)?;
                eprintln!("Renamed folder {} to {:?}", folder.id, folder.title);
            }
            Target::Bookmark => {
                let bookmark = ctx.api.update_bookmark(self.id, Some(&self.title), None)?;
                eprintln!("Renamed bookmark {} to {:?}", bookmark.id, bookmark.title);
            }
        }
        Ok(())
    }
}

/// Reparent a folder or bookmark; destination 0 is the root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveCommand {
    pub target: Target,
    pub id: usize,
    pub dest: usize,
}

impl BkmCommand for MoveCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let dest = utils::folder_ref(Some(self.dest));
        match self.target {
            Target::Folder => {
                ctx.api.move_folder(self.id, dest)?;
            }
            Target::Bookmark => {
                ctx.api.move_bookmark(self.id, dest)?;
            }
        }
        let where_to = dest.map_or_else(|| "root".to_string(), |id| format!("folder {}", id));
        eprintln!("Moved {:?} {} to {}", self.target, self.id, where_to);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveCommand {
    pub target: Target,
    pub id: usize,
    pub force: bool,
}

impl RemoveCommand {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        if self.force {
            return Ok(true);
        }
        print!("{} [y/N]: ", prompt);
        io::stdout().flush()?;

        let mut response = String::new();
        io::stdin().read_line(&mut response)?;
        let response = response.trim().to_lowercase();
        Ok(response == "y" || response == "yes")
    }
}

impl BkmCommand for RemoveCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        match self.target {
            Target::Folder => {
                let tree = ctx.api.tree(self.id)?;
                let folders = tree.folder_count() - 1;
                let bookmarks = tree.bookmark_count();
                if folders + bookmarks > 0 {
                    let prompt = format!(
                        "Delete folder {:?} with {} subfolder(s) and {} bookmark(s)?",
                        tree.folder.title, folders, bookmarks
                    );
                    if !self.confirm(&prompt)? {
                        eprintln!("Aborted.");
                        return Ok(());
                    }
                }
                ctx.api.delete_folder(self.id)?;
                eprintln!("Deleted folder {}", self.id);
            }
            Target::Bookmark => {
                ctx.api.delete_bookmark(self.id)?;
                eprintln!("Deleted bookmark {}", self.id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{ctx, offline_api};
    use super::*;
    use bkmtree::config::Config;
    use bkmtree::error::BkmError;
    use rstest::rstest;

    #[rstest]
    #[case(Target::Folder)]
    #[case(Target::Bookmark)]
    fn test_rename(#[case] target: Target) {
        let api = offline_api();
        let config = Config::default();
        api.add_folder("Old", None).unwrap();
        api.add_bookmark("https://x.test", Some("Old"), None).unwrap();

        RenameCommand {
            target,
            id: 1,
            title: "New".to_string(),
        }
        .execute(&ctx(&api, &config))
        .unwrap();

        let title = match target {
            Target::Folder => api.get_folder(1).unwrap().title,
            Target::Bookmark => api.get_bookmark(1).unwrap().title,
        };
        assert_eq!(title, "New");
    }

    #[test]
    fn test_move_bookmark_to_root() {
        let api = offline_api();
        let config = Config::default();
        let folder = api.add_folder("F", None).unwrap();
        let bookmark = api
            .add_bookmark("https://x.test", None, Some(folder.id))
            .unwrap();

        MoveCommand {
            target: Target::Bookmark,
            id: bookmark.id,
            dest: 0,
        }
        .execute(&ctx(&api, &config))
        .unwrap();

        assert_eq!(api.get_bookmark(bookmark.id).unwrap().folder_id, None);
    }

    #[test]
    fn test_move_folder_into_descendant_fails() {
        let api = offline_api();
        let config = Config::default();
        let a = api.add_folder("A", None).unwrap();
        let b = api.add_folder("B", Some(a.id)).unwrap();

        let err = MoveCommand {
            target: Target::Folder,
            id: a.id,
            dest: b.id,
        }
        .execute(&ctx(&api, &config))
        .unwrap_err();
        assert!(matches!(err, BkmError::CyclicMove { .. }));
    }

    #[test]
    fn test_forced_remove_cascades() {
        let api = offline_api();
        let config = Config::default();
        let it = api.add_folder("IT", None).unwrap();
        let dev = api.add_folder("Development", Some(it.id)).unwrap();
        let go = api
            .add_bookmark("https://golang.org/", Some("GoLang"), Some(dev.id))
            .unwrap();

        RemoveCommand {
            target: Target::Folder,
            id: it.id,
            force: true,
        }
        .execute(&ctx(&api, &config))
        .unwrap();

        assert!(api.get_folder(dev.id).is_err());
        assert!(api.get_bookmark(go.id).is_err());
    }
}

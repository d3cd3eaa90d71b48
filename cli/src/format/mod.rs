use crate::output::colorize::{Colorize, ColorizeBookmark, ColorizeFolder, ColorizeForest, ColorizeTree};
use bkmtree::error::Result;
use bkmtree::models::Bookmark;
use bkmtree::operations::FolderView;
use bkmtree::walker::{Forest, TreeNode};
use serde::Serialize;

pub mod json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Colored,
}

impl OutputFormat {
    pub fn from_string(format: &str) -> Self {
        match format {
            "json" => OutputFormat::Json,
            "yaml" | "yml" => OutputFormat::Yaml,
            _ => OutputFormat::Colored,
        }
    }

    /// Structured rendering; `None` for the human-readable format
    fn structured<T: Serialize + ?Sized>(self, value: &T) -> Result<Option<String>> {
        match self {
            OutputFormat::Json => json::to_json(value).map(Some),
            OutputFormat::Yaml => json::to_yaml(value).map(Some),
            OutputFormat::Colored => Ok(None),
        }
    }

    pub fn print_bookmarks(self, records: &[Bookmark], no_color: bool) -> Result<()> {
        if let Some(out) = self.structured(records)? {
            println!("{}", out);
            return Ok(());
        }
        for b in records {
            print!("{}", ColorizeBookmark(b).render(no_color));
        }
        Ok(())
    }

    pub fn print_bookmark(self, record: &Bookmark, no_color: bool) -> Result<()> {
        match self.structured(record)? {
            Some(out) => println!("{}", out),
            None => print!("{}", ColorizeBookmark(record).render(no_color)),
        }
        Ok(())
    }

    pub fn print_folder_view(self, view: &FolderView, no_color: bool) -> Result<()> {
        if let Some(out) = self.structured(view)? {
            println!("{}", out);
            return Ok(());
        }
        if !view.path.is_empty() {
            let crumbs: Vec<&str> = view.path.iter().map(|f| f.title.as_str()).collect();
            println!("/{}", crumbs.join("/"));
        }
        for folder in &view.folders {
            print!("{}", ColorizeFolder(folder).render(no_color));
        }
        for b in &view.bookmarks {
            print!("{}", ColorizeBookmark(b).render(no_color));
        }
        Ok(())
    }

    pub fn print_tree(self, node: &TreeNode, no_color: bool) -> Result<()> {
        match self.structured(node)? {
            Some(out) => println!("{}", out),
            None => print!("{}", ColorizeTree(node).render(no_color)),
        }
        Ok(())
    }

    pub fn print_forest(self, forest: &Forest, no_color: bool) -> Result<()> {
        match self.structured(forest)? {
            Some(out) => println!("{}", out),
            None => print!("{}", ColorizeForest(forest).render(no_color)),
        }
        Ok(())
    }

    /// Any other serializable result; the human-readable form is produced by `plain`
    pub fn print_value<T: Serialize>(self, value: &T, plain: impl FnOnce(&T) -> String) -> Result<()> {
        match self.structured(value)? {
            Some(out) => println!("{}", out),
            None => println!("{}", plain(value)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("json", OutputFormat::Json)]
    #[case("yaml", OutputFormat::Yaml)]
    #[case("yml", OutputFormat::Yaml)]
    #[case("colored", OutputFormat::Colored)]
    #[case("anything", OutputFormat::Colored)]
    fn test_from_string(#[case] input: &str, #[case] expected: OutputFormat) {
        assert_eq!(OutputFormat::from_string(input), expected);
    }

    #[test]
    fn test_structured_only_for_machine_formats() {
        let value = vec![1, 2, 3];
        assert!(OutputFormat::Colored.structured(&value).unwrap().is_none());
        assert_eq!(
            OutputFormat::Json.structured(&value).unwrap().unwrap(),
            "[\n  1,\n  2,\n  3\n]"
        );
        assert_eq!(
            OutputFormat::Yaml.structured(&value).unwrap().unwrap(),
            "- 1\n- 2\n- 3\n"
        );
    }
}

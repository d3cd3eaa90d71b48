use bkmtree::models::{Bookmark, Folder};
use bkmtree::utils::truncate;
use bkmtree::walker::{Forest, TreeNode};
use owo_colors::OwoColorize;

const TITLE_WIDTH: usize = 60;

pub trait Colorize {
    fn to_colored(&self) -> String;
    fn to_plain(&self) -> String;

    fn render(&self, no_color: bool) -> String {
        if no_color {
            self.to_plain()
        } else {
            self.to_colored()
        }
    }
}

pub struct ColorizeBookmark<'a>(pub &'a Bookmark);

impl<'a> Colorize for ColorizeBookmark<'a> {
    fn to_colored(&self) -> String {
        let mut s = String::new();
        let id = self.0.id.to_string();
        let star = if self.0.starred { " *" } else { "" };
        s.push_str(&format!(
            "{}. {}{}\n",
            id.bright_blue(),
            truncate(&self.0.title, TITLE_WIDTH).bold().green(),
            star.yellow()
        ));
        let padding = id.len() + 3;
        s.push_str(&format!("{:>padding$} {}\n", ">".red(), self.0.url.yellow()));
        if !self.0.has_favicon() {
            s.push_str(&format!("{:>padding$} {}\n", "-".red(), "no icon".dimmed()));
        }
        s
    }

    fn to_plain(&self) -> String {
        let mut s = String::new();
        let id = self.0.id.to_string();
        let star = if self.0.starred { " *" } else { "" };
        s.push_str(&format!(
            "{}. {}{}\n",
            id,
            truncate(&self.0.title, TITLE_WIDTH),
            star
        ));
        let padding = id.len() + 3;
        s.push_str(&format!("{:>padding$} {}\n", ">", self.0.url));
        if !self.0.has_favicon() {
            s.push_str(&format!("{:>padding$} no icon\n", "-"));
        }
        s
    }
}

pub struct ColorizeFolder<'a>(pub &'a Folder);

impl<'a> Colorize for ColorizeFolder<'a> {
    fn to_colored(&self) -> String {
        format!(
            "{}. {}/ {}\n",
            self.0.id.to_string().bright_blue(),
            self.0.title.bold().cyan(),
            format!("({} subfolder(s))", self.0.child_folder_count).dimmed()
        )
    }

    fn to_plain(&self) -> String {
        format!(
            "{}. {}/ ({} subfolder(s))\n",
            self.0.id, self.0.title, self.0.child_folder_count
        )
    }
}

/// Indented outline of a subtree, folders before bookmarks
pub struct ColorizeTree<'a>(pub &'a TreeNode);

fn outline(node: &TreeNode, depth: usize, colored: bool, out: &mut String) {
    let pad = "  ".repeat(depth);
    if colored {
        out.push_str(&format!(
            "{}{} {}/\n",
            pad,
            format!("[{}]", node.folder.id).bright_blue(),
            node.folder.title.bold().cyan()
        ));
    } else {
        out.push_str(&format!("{}[{}] {}/\n", pad, node.folder.id, node.folder.title));
    }
    for child in &node.children {
        outline(child, depth + 1, colored, out);
    }
    for bookmark in &node.bookmarks {
        outline_bookmark(bookmark, depth + 1, colored, out);
    }
}

fn outline_bookmark(bookmark: &Bookmark, depth: usize, colored: bool, out: &mut String) {
    let pad = "  ".repeat(depth);
    let title = truncate(&bookmark.title, TITLE_WIDTH);
    if colored {
        out.push_str(&format!(
            "{}{} {} {}\n",
            pad,
            format!("({})", bookmark.id).bright_blue(),
            title.green(),
            bookmark.url.yellow()
        ));
    } else {
        out.push_str(&format!("{}({}) {} {}\n", pad, bookmark.id, title, bookmark.url));
    }
}

impl<'a> Colorize for ColorizeTree<'a> {
    fn to_colored(&self) -> String {
        let mut out = String::new();
        outline(self.0, 0, true, &mut out);
        out
    }

    fn to_plain(&self) -> String {
        let mut out = String::new();
        outline(self.0, 0, false, &mut out);
        out
    }
}

pub struct ColorizeForest<'a>(pub &'a Forest);

impl<'a> ColorizeForest<'a> {
    fn build(&self, colored: bool) -> String {
        let mut out = String::new();
        for node in &self.0.folders {
            outline(node, 0, colored, &mut out);
        }
        for bookmark in &self.0.bookmarks {
            outline_bookmark(bookmark, 0, colored, &mut out);
        }
        out
    }
}

impl<'a> Colorize for ColorizeForest<'a> {
    fn to_colored(&self) -> String {
        self.build(true)
    }

    fn to_plain(&self) -> String {
        self.build(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn bookmark(starred: bool, favicon: &str) -> Bookmark {
        let mut b = Bookmark::new(
            3,
            "Example".to_string(),
            "https://example.com".to_string(),
            None,
        );
        b.starred = starred;
        b.favicon = favicon.to_string();
        b
    }

    #[test]
    fn test_plain_bookmark() {
        let plain = ColorizeBookmark(&bookmark(false, "AAEC")).to_plain();
        assert_eq!(plain, "3. Example\n   > https://example.com\n");
    }

    #[rstest]
    #[case(true, "AAEC", true, false)]
    #[case(false, "", false, true)]
    fn test_bookmark_markers(
        #[case] starred: bool,
        #[case] favicon: &str,
        #[case] has_star: bool,
        #[case] has_no_icon: bool,
    ) {
        let b = bookmark(starred, favicon);
        for rendered in [ColorizeBookmark(&b).to_plain(), ColorizeBookmark(&b).to_colored()] {
            assert_eq!(rendered.contains(" *"), has_star);
            assert_eq!(rendered.contains("no icon"), has_no_icon);
        }
    }

    #[test]
    fn test_colored_differs_from_plain() {
        let b = bookmark(false, "AAEC");
        assert_ne!(ColorizeBookmark(&b).render(false), ColorizeBookmark(&b).render(true));
        assert!(ColorizeBookmark(&b).render(false).contains("Example"));
    }

    #[test]
    fn test_plain_tree_outline() {
        let mut dev = Folder::new(2, "Development".to_string(), Some(1));
        dev.child_folder_count = 0;
        let mut it = Folder::new(1, "IT".to_string(), None);
        it.child_folder_count = 1;
        let golang = Bookmark::new(
            1,
            "GoLang".to_string(),
            "https://golang.org/".to_string(),
            Some(2),
        );
        let tree = TreeNode {
            folder: it,
            bookmarks: vec![],
            children: vec![TreeNode {
                folder: dev,
                bookmarks: vec![golang],
                children: vec![],
            }],
        };

        assert_eq!(
            ColorizeTree(&tree).to_plain(),
            "[1] IT/\n  [2] Development/\n    (1) GoLang https://golang.org/\n"
        );
    }
}

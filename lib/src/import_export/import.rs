use super::entities::unescape;
use crate::db::TreeStore;
use crate::error::{BkmError, Result};
use crate::walker::MAX_DEPTH;
use chrono::{Local, NaiveDate};
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;
use tl::{HTMLTag, Node, Parser, ParserOptions};

const UNTITLED_FOLDER: &str = "Untitled folder";

/// Parsed content of a bookmark file, before anything is written to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportNode {
    Folder {
        title: String,
        children: Vec<ImportNode>,
    },
    Bookmark {
        title: String,
        url: String,
        icon: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// The `import-<date>` folder everything was placed under
    pub folder_id: usize,
    pub folder_title: String,
    pub folders: usize,
    pub bookmarks: usize,
    /// Links without an address
    pub skipped: usize,
}

#[derive(Debug)]
enum Token {
    Heading(String),
    Link {
        href: String,
        icon: String,
        text: String,
    },
    ListOpen,
    ListClose,
}

/// Tags that end the text of an element left unclosed
const BLOCK_TAGS: [&str; 8] = ["a", "dd", "dl", "dt", "h1", "h3", "hr", "p"];

/// `</DL>` end tags; tl keeps a node per start tag but none per end tag
fn list_end_regex() -> &'static Regex {
    static LIST_END: OnceLock<Regex> = OnceLock::new();
    LIST_END.get_or_init(|| Regex::new(r"(?i)</dl\s*>").expect("list end pattern is valid"))
}

fn is_block(node: &Node) -> bool {
    node.as_tag().is_some_and(|tag| {
        let name = tag.name().as_utf8_str();
        BLOCK_TAGS.iter().any(|block| name.eq_ignore_ascii_case(block))
    })
}

fn attribute(tag: &HTMLTag<'_>, upper: &'static str, lower: &'static str) -> String {
    tag.attributes()
        .get(upper)
        .or_else(|| tag.attributes().get(lower))
        .flatten()
        .map(|value| unescape(value.as_utf8_str().trim()))
        .unwrap_or_default()
}

/// Text of the element at `index`. Browsers write `<DT>` and `<p>` without end
/// tags and tl nests what follows inside them, so an element missing its own
/// end tag only owns the text up to the next block tag.
fn element_text(nodes: &[Node], index: usize, tag: &HTMLTag<'_>, parser: &Parser) -> String {
    let end_tag = format!("</{}>", tag.name().as_utf8_str().to_ascii_lowercase());
    let closed = tag
        .raw()
        .as_utf8_str()
        .trim_end()
        .to_ascii_lowercase()
        .ends_with(&end_tag);

    let text = if closed {
        tag.inner_text(parser).into_owned()
    } else {
        nodes[index + 1..]
            .iter()
            .take_while(|node| !is_block(node))
            .filter_map(|node| node.as_raw())
            .map(|raw| raw.as_utf8_str())
            .collect::<String>()
    };
    unescape(&text).trim().to_string()
}

fn tokenize_segment(segment: &str, tokens: &mut Vec<Token>) -> Result<()> {
    let dom = tl::parse(segment, ParserOptions::default())?;
    let parser = dom.parser();
    let nodes = dom.nodes();

    for (index, node) in nodes.iter().enumerate() {
        let Some(tag) = node.as_tag() else {
            continue;
        };
        let name = tag.name().as_utf8_str();
        if name.eq_ignore_ascii_case("dl") {
            tokens.push(Token::ListOpen);
        } else if name.eq_ignore_ascii_case("h3") {
            tokens.push(Token::Heading(element_text(nodes, index, tag, parser)));
        } else if name.eq_ignore_ascii_case("a") {
            tokens.push(Token::Link {
                href: attribute(tag, "HREF", "href"),
                icon: attribute(tag, "ICON", "icon"),
                text: element_text(nodes, index, tag, parser),
            });
        }
    }
    Ok(())
}

/// Document order token stream: the text between two `</DL>` is parsed as one
/// tl document, each `</DL>` becomes a list end.
fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for list_end in list_end_regex().find_iter(text) {
        tokenize_segment(&text[start..list_end.start()], &mut tokens)?;
        tokens.push(Token::ListClose);
        start = list_end.end();
    }
    tokenize_segment(&text[start..], &mut tokens)?;
    Ok(tokens)
}

/// A list being filled; titled when it belongs to a folder heading
struct Frame {
    title: Option<String>,
    children: Vec<ImportNode>,
}

impl Frame {
    fn root() -> Self {
        Self {
            title: None,
            children: Vec::new(),
        }
    }
}

fn folder_title(heading: String) -> String {
    if heading.is_empty() {
        UNTITLED_FOLDER.to_string()
    } else {
        heading
    }
}

/// A heading not followed by a list is an empty folder
fn flush_heading(stack: &mut [Frame], pending: &mut Option<String>) {
    if let Some(title) = pending.take() {
        if let Some(top) = stack.last_mut() {
            top.children.push(ImportNode::Folder {
                title: folder_title(title),
                children: Vec::new(),
            });
        }
    }
}

fn close_frame(stack: &mut Vec<Frame>) {
    let Some(frame) = stack.pop() else {
        return;
    };
    let Some(parent) = stack.last_mut() else {
        stack.push(frame);
        return;
    };
    match frame.title {
        Some(title) => parent.children.push(ImportNode::Folder {
            title: folder_title(title),
            children: frame.children,
        }),
        // A list without a heading contributes its entries to the enclosing one
        None => parent.children.extend(frame.children),
    }
}

/// Parse a Netscape bookmark document into a tree of folders and bookmarks.
///
/// A `<H3>` names a folder whose content is the next `<DL>` list. Tags are
/// matched case-insensitively and `<DT>`, `<DD>`, `<HR>` and `<p>` are ignored,
/// so documents that never close them parse the same as those that do.
pub fn parse_document(text: &str) -> Result<Vec<ImportNode>> {
    let mut stack = vec![Frame::root()];
    let mut pending: Option<String> = None;
    let mut saw_list = false;
    let mut saw_link = false;

    for token in tokenize(text)? {
        match token {
            Token::Heading(title) => {
                flush_heading(&mut stack, &mut pending);
                pending = Some(title);
            }
            Token::Link { href, icon, text } => {
                flush_heading(&mut stack, &mut pending);
                saw_link = true;
                let title = if text.is_empty() { href.clone() } else { text };
                if let Some(top) = stack.last_mut() {
                    top.children.push(ImportNode::Bookmark {
                        title,
                        url: href,
                        icon,
                    });
                }
            }
            Token::ListOpen => {
                saw_list = true;
                // The import folder itself takes one level
                if stack.len() >= MAX_DEPTH {
                    return Err(BkmError::Decode(format!(
                        "lists nested deeper than {} levels",
                        MAX_DEPTH - 1
                    )));
                }
                stack.push(Frame {
                    title: pending.take(),
                    children: Vec::new(),
                });
            }
            Token::ListClose => {
                flush_heading(&mut stack, &mut pending);
                if stack.len() == 1 {
                    log::warn!("Ignoring unbalanced </DL> in bookmark file");
                    continue;
                }
                close_frame(&mut stack);
            }
        }
    }

    flush_heading(&mut stack, &mut pending);
    if stack.len() > 1 {
        log::warn!("Bookmark file ends with {} unclosed list(s)", stack.len() - 1);
        while stack.len() > 1 {
            close_frame(&mut stack);
        }
    }

    if !saw_list && !saw_link {
        return Err(BkmError::Decode(
            "no bookmark list found in document".to_string(),
        ));
    }

    Ok(stack.pop().map(|root| root.children).unwrap_or_default())
}

/// Import under a new `import-<today>` root folder
pub fn import_bytes(store: &TreeStore, bytes: &[u8]) -> Result<ImportSummary> {
    import_bytes_dated(store, bytes, Local::now().date_naive())
}

pub fn import_bytes_dated(store: &TreeStore, bytes: &[u8], date: NaiveDate) -> Result<ImportSummary> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| BkmError::Decode(format!("bookmark file is not valid UTF-8: {}", e)))?;
    let nodes = parse_document(text)?;

    let folder_title = format!("import-{}", date.format("%Y-%m-%d"));
    let folder_id = store.create_folder(&folder_title, None)?;
    let mut summary = ImportSummary {
        folder_id,
        folder_title,
        folders: 0,
        bookmarks: 0,
        skipped: 0,
    };

    apply_nodes(store, &nodes, folder_id, &mut summary)?;

    log::info!(
        "Imported {} folder(s) and {} bookmark(s) into {:?} ({} skipped)",
        summary.folders,
        summary.bookmarks,
        summary.folder_title,
        summary.skipped
    );
    Ok(summary)
}

pub fn import_file(store: &TreeStore, path: &Path) -> Result<ImportSummary> {
    let bytes = std::fs::read(path)?;
    import_bytes(store, &bytes)
}

fn apply_nodes(
    store: &TreeStore,
    nodes: &[ImportNode],
    parent_id: usize,
    summary: &mut ImportSummary,
) -> Result<()> {
    for node in nodes {
        match node {
            ImportNode::Folder { title, children } => {
                let id = store.create_folder(title, Some(parent_id))?;
                summary.folders += 1;
                apply_nodes(store, children, id, summary)?;
            }
            ImportNode::Bookmark { title, url, icon } => {
                if url.trim().is_empty() {
                    log::warn!("Skipping bookmark {:?} without address", title);
                    summary.skipped += 1;
                    continue;
                }
                store.create_bookmark_with_favicon(title, url, icon, Some(parent_id))?;
                summary.bookmarks += 1;
            }
        }
    }
    Ok(())
}

pub mod bookmark;
pub mod folder;

pub use bookmark::Bookmark;
pub use folder::Folder;

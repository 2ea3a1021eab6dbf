//! Remote folder model

/// Separator Exchange uses inside the raw folder path property (tag
/// `0x66B5`): path segments are joined with U+FFFE, a noncharacter.
pub(crate) const RAW_PATH_SEPARATOR: char = '\u{FFFE}';

/// Opaque identifier of a remote folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderId {
    pub id: String,
    pub change_key: Option<String>,
}

impl FolderId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            change_key: None,
        }
    }
}

/// A folder as returned by the deep folder search: the identifier plus
/// the display metadata requested in the search shape.
#[derive(Debug, Clone)]
pub struct FolderRef {
    pub id: FolderId,
    pub display_name: String,
    /// Total number of items. The enumerator only returns folders where
    /// this is greater than zero.
    pub total_count: u32,
}

/// Normalize a raw folder path value.
///
/// Every occurrence of the U+FFFE segment delimiter is replaced with a
/// backslash, the conventional mailbox path separator.
#[must_use]
pub fn normalize_path(raw: &str) -> String {
    raw.replace(RAW_PATH_SEPARATOR, "\\")
}

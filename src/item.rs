//! Remote item model: messages, sensitivity, extended properties
//!
//! Items are only ever read through the item search and mutated through
//! the sensitivity property (tag `0x36`); everything else about them
//! stays on the server.

use serde::Serialize;
use std::fmt;

/// MAPI property tag holding an item's sensitivity value
/// (`PR_SENSITIVITY`).
pub const SENSITIVITY_TAG: u16 = 0x36;

/// MAPI property tag holding a folder's full path
/// (`PR_FOLDER_PATHNAME`).
pub const FOLDER_PATH_TAG: u16 = 0x66B5;

/// Value type of an extended property definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Integer,
    String,
}

impl PropertyType {
    /// The wire name of this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "Integer",
            Self::String => "String",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Integer" => Some(Self::Integer),
            "String" => Some(Self::String),
            _ => None,
        }
    }
}

/// An extended property definition: numeric tag plus value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDefinition {
    pub tag: u16,
    pub kind: PropertyType,
}

impl PropertyDefinition {
    /// The sensitivity property on items.
    pub const SENSITIVITY: Self = Self {
        tag: SENSITIVITY_TAG,
        kind: PropertyType::Integer,
    };

    /// The full-path property on folders.
    pub const FOLDER_PATH: Self = Self {
        tag: FOLDER_PATH_TAG,
        kind: PropertyType::String,
    };

    /// Wire form of the tag, e.g. `0x36`.
    #[must_use]
    pub fn tag_hex(&self) -> String {
        format!("{:#x}", self.tag)
    }
}

/// A single extended property attached to an item or folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedProperty {
    pub definition: PropertyDefinition,
    pub value: String,
}

/// Sensitivity classification of a mail item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sensitivity {
    Normal,
    Personal,
    Private,
    Confidential,
}

impl Sensitivity {
    /// The wire name of this classification.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Personal => "Personal",
            Self::Private => "Private",
            Self::Confidential => "Confidential",
        }
    }

    /// Raw MAPI value stored in property `0x36`.
    #[must_use]
    pub const fn mapi_value(self) -> i32 {
        match self {
            Self::Normal => 0,
            Self::Personal => 1,
            Self::Private => 2,
            Self::Confidential => 3,
        }
    }

    #[must_use]
    pub const fn from_mapi(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Normal),
            1 => Some(Self::Personal),
            2 => Some(Self::Private),
            3 => Some(Self::Confidential),
            _ => None,
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Normal" => Some(Self::Normal),
            "Personal" => Some(Self::Personal),
            "Private" => Some(Self::Private),
            "Confidential" => Some(Self::Confidential),
            _ => None,
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a remote item.
///
/// Only email messages may be mutated; everything else the search
/// returns (calendar entries, contacts, ...) is reported as `Other`
/// and skipped by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemKind {
    Message,
    Other,
}

/// Opaque identifier of a remote item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemId {
    pub id: String,
    pub change_key: Option<String>,
}

/// A remote mail item as returned by the item search.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub subject: String,
    pub sensitivity: Sensitivity,
    pub extended_properties: Vec<ExtendedProperty>,
}

impl Item {
    #[must_use]
    pub fn is_message(&self) -> bool {
        self.kind == ItemKind::Message
    }
}

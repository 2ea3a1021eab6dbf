//! EWS mailbox sensitivity scanner
//!
//! Connects to an Exchange mailbox over Exchange Web Services, walks
//! every folder under the message root that holds at least one item,
//! finds messages matching a sensitivity or subject predicate, and
//! rewrites the MAPI sensitivity extended property (tag `0x36`) on
//! matching messages, optionally after interactive confirmation.
//!
//! The wire protocol is plain SOAP over HTTP: request envelopes are
//! built from templates, responses are parsed with `quick-xml`. Only
//! the five operations the tool needs are implemented (POX
//! autodiscovery, FindFolder, FindItem, GetFolder, UpdateItem).

mod autodiscover;
mod client;
mod config;
mod error;
mod filter;
mod folder;
mod item;
mod response;
mod scan;
mod soap;

pub use autodiscover::is_secure_url;
pub use client::ExchangeClient;
pub use config::{ConnectConfig, Credentials};
pub use error::{Error, Result};
pub use filter::ItemFilter;
pub use folder::{FolderId, FolderRef, normalize_path};
pub use item::{
    ExtendedProperty, FOLDER_PATH_TAG, Item, ItemId, ItemKind, PropertyDefinition, PropertyType,
    SENSITIVITY_TAG, Sensitivity,
};
pub use scan::{ConfirmPolicy, ScanOptions, ScanSummary, run_scan};

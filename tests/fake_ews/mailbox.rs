//! Test data model for the fake EWS server
//!
//! Provides a builder-style API for constructing mailbox state:
//!
//! ```ignore
//! let mailbox = MailboxBuilder::new()
//!     .folder("Inbox")
//!         .message("Q1 Report", "Private", Some(2))
//!     .folder("Archive")
//!         .calendar_item("Standup", "Private")
//!     .build();
//! ```
//!
//! The `Mailbox` is shared with the server via `Arc<Mutex<_>>` so the
//! UpdateItem handler can mutate item state and tests can snapshot it
//! afterwards.

/// A complete mailbox fixture: folders plus failure switches.
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    pub folders: Vec<Folder>,
    /// Respond to FindFolder with an error response class.
    pub fail_folder_search: bool,
    /// Respond to FindItem with an error response class.
    pub fail_item_search: bool,
    /// Respond to GetFolder with an error response class.
    pub fail_folder_path: bool,
    /// Respond to UpdateItem with an error response class.
    pub fail_updates: bool,
}

impl Mailbox {
    pub fn folder_by_id(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|folder| folder.id == id)
    }

    pub fn item_by_id_mut(&mut self, id: &str) -> Option<&mut TestItem> {
        self.folders
            .iter_mut()
            .flat_map(|folder| folder.items.iter_mut())
            .find(|item| item.id == id)
    }

    /// Convenience lookup for assertions.
    pub fn item_by_subject(&self, subject: &str) -> Option<&TestItem> {
        self.folders
            .iter()
            .flat_map(|folder| folder.items.iter())
            .find(|item| item.subject == subject)
    }
}

/// A single mailbox folder.
#[derive(Debug, Clone)]
pub struct Folder {
    pub id: String,
    pub name: String,
    /// Raw value of the path property (tag 0x66B5): segments joined
    /// with U+FFFE. `None` means the property is absent.
    pub raw_path: Option<String>,
    pub items: Vec<TestItem>,
}

/// A test item stored in a folder.
///
/// - `element`: the response element name ("Message", "CalendarItem",
///   ...); anything but "Message" is a non-message item.
/// - `sensitivity`: the wire classification name.
/// - `sensitivity_value`: value of extended property 0x36; `None`
///   means the item carries no extended properties.
#[derive(Debug, Clone)]
pub struct TestItem {
    pub id: String,
    pub element: String,
    pub subject: String,
    pub sensitivity: String,
    pub sensitivity_value: Option<i32>,
}

/// Builder for constructing a `Mailbox` step by step.
///
/// Call `.folder(name)` to start a new folder, then chain item calls
/// to add to it. Finish with `.build()`.
pub struct MailboxBuilder {
    mailbox: Mailbox,
    next_item: u32,
}

impl MailboxBuilder {
    pub fn new() -> Self {
        Self {
            mailbox: Mailbox::default(),
            next_item: 0,
        }
    }

    /// Add a new folder whose path is its own name. Subsequent item
    /// calls add to this folder.
    pub fn folder(self, name: &str) -> Self {
        self.folder_with_path(name, &[name])
    }

    /// Add a new folder with an explicit path, given as segments from
    /// the root.
    pub fn folder_with_path(mut self, name: &str, segments: &[&str]) -> Self {
        let id = format!("folder-{}", self.mailbox.folders.len() + 1);
        self.mailbox.folders.push(Folder {
            id,
            name: name.to_string(),
            raw_path: Some(segments.join("\u{fffe}")),
            items: Vec::new(),
        });
        self
    }

    /// Drop the path property from the most recently added folder.
    ///
    /// # Panics
    ///
    /// Panics if called before any `.folder()` call.
    pub fn without_path(mut self) -> Self {
        self.mailbox
            .folders
            .last_mut()
            .expect("call .folder() before .without_path()")
            .raw_path = None;
        self
    }

    /// Add an email message to the most recently added folder.
    ///
    /// # Panics
    ///
    /// Panics if called before any `.folder()` call.
    pub fn message(self, subject: &str, sensitivity: &str, value: Option<i32>) -> Self {
        self.item("Message", subject, sensitivity, value)
    }

    /// Add a calendar entry (a non-message item) to the most recently
    /// added folder.
    ///
    /// # Panics
    ///
    /// Panics if called before any `.folder()` call.
    pub fn calendar_item(self, subject: &str, sensitivity: &str) -> Self {
        self.item("CalendarItem", subject, sensitivity, Some(2))
    }

    fn item(mut self, element: &str, subject: &str, sensitivity: &str, value: Option<i32>) -> Self {
        self.next_item += 1;
        let id = format!("item-{}", self.next_item);
        self.mailbox
            .folders
            .last_mut()
            .expect("call .folder() before adding items")
            .items
            .push(TestItem {
                id,
                element: element.to_string(),
                subject: subject.to_string(),
                sensitivity: sensitivity.to_string(),
                sensitivity_value: value,
            });
        self
    }

    pub fn fail_folder_search(mut self) -> Self {
        self.mailbox.fail_folder_search = true;
        self
    }

    pub fn fail_item_search(mut self) -> Self {
        self.mailbox.fail_item_search = true;
        self
    }

    pub fn fail_folder_path(mut self) -> Self {
        self.mailbox.fail_folder_path = true;
        self
    }

    pub fn fail_updates(mut self) -> Self {
        self.mailbox.fail_updates = true;
        self
    }

    /// Consume the builder and return the finished `Mailbox`.
    pub fn build(self) -> Mailbox {
        self.mailbox
    }
}

//! Match predicate for the item search
//!
//! The two historical entry points (clear the private flag, mark
//! subject-tagged items private) collapse into one driver parameterized
//! by this predicate.

use crate::item::{Item, Sensitivity};

/// Which items a scan selects, and implicitly what it does to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemFilter {
    /// Items whose sensitivity classification is `Private`.
    PrivateFlag,
    /// Items whose subject contains the given text (case-insensitive).
    SubjectContains(String),
}

impl ItemFilter {
    /// Local evaluation of the predicate, matching the restriction the
    /// server applies.
    #[must_use]
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Self::PrivateFlag => item.sensitivity == Sensitivity::Private,
            Self::SubjectContains(text) => item
                .subject
                .to_ascii_lowercase()
                .contains(&text.to_ascii_lowercase()),
        }
    }

    /// The sensitivity a confirmed match is rewritten to.
    ///
    /// Private items are changed back to normal; subject matches are
    /// marked private.
    #[must_use]
    pub const fn target(&self) -> Sensitivity {
        match self {
            Self::PrivateFlag => Sensitivity::Normal,
            Self::SubjectContains(_) => Sensitivity::Private,
        }
    }
}

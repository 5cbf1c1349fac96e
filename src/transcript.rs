//! Append-only conversation transcript.
//!
//! Entries are immutable once appended. The only mutation the log allows is
//! removing a transient "thinking" placeholder, and each placeholder is keyed
//! so a completion can only remove its own.

use chrono::{DateTime, Utc};

/// Text shown while a request is outstanding.
pub const THINKING_TEXT: &str = "Thinking...";

/// Who an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Monotonic identifier of a log item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(u64);

/// Handle to a transient placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaceholderId(EntryId);

/// A rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: EntryId,
    pub role: Role,
    pub text: String,
    /// Caption shown under the message (mode, company, `Error`).
    pub caption: Option<String>,
    pub at: DateTime<Utc>,
}

impl Entry {
    /// Message text split into display lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }
}

#[derive(Debug, Clone)]
enum Item {
    Message(Entry),
    Placeholder(EntryId),
}

/// The visual log of one client run.
#[derive(Debug, Default)]
pub struct Transcript {
    items: Vec<Item>,
    next_id: u64,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a message. An empty caption is treated as no caption.
    ///
    /// Returns a copy of the stored entry for the surface to draw.
    pub fn append(&mut self, role: Role, text: impl Into<String>, caption: Option<String>) -> Entry {
        let entry = Entry {
            id: self.allocate(),
            role,
            text: text.into(),
            caption: caption.filter(|c| !c.is_empty()),
            at: Utc::now(),
        };
        self.items.push(Item::Message(entry.clone()));
        entry
    }

    /// Append a transient "thinking" placeholder.
    pub fn push_placeholder(&mut self) -> PlaceholderId {
        let id = self.allocate();
        self.items.push(Item::Placeholder(id));
        PlaceholderId(id)
    }

    /// Remove a placeholder. Returns `false` if it was already gone.
    pub fn remove_placeholder(&mut self, placeholder: PlaceholderId) -> bool {
        let before = self.items.len();
        self.items
            .retain(|item| !matches!(item, Item::Placeholder(id) if *id == placeholder.0));
        self.items.len() != before
    }

    /// Messages in append order, placeholders excluded.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.items.iter().filter_map(|item| match item {
            Item::Message(e) => Some(e),
            Item::Placeholder(_) => None,
        })
    }

    /// Number of outstanding placeholders.
    #[must_use]
    pub fn pending_placeholders(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, Item::Placeholder(_)))
            .count()
    }

    /// Total number of visible items, placeholders included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

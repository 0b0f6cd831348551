//! File events delivered by a watch backend.

use std::path::PathBuf;

use notify::event::ModifyKind;

/// A change to a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// The kind of change.
    pub kind: FileEventKind,

    /// Path to the affected file or directory.
    pub path: PathBuf,
}

impl FileEvent {
    /// Create a new file event.
    pub fn new(kind: FileEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Whether a registered callback should run for this event.
    pub fn is_deliverable(&self) -> bool {
        self.kind.is_deliverable()
    }
}

/// Kind of file event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEventKind {
    /// File was created.
    Created,

    /// File contents were written.
    Modified,

    /// File was removed.
    Removed,

    /// File was renamed, either side of the rename.
    Renamed,

    /// Permissions or other metadata changed.
    MetadataChanged,

    /// File was opened, read or closed.
    Accessed,

    /// Anything the backend could not classify.
    Other,
}

impl FileEventKind {
    /// Removals, writes and metadata changes reach callbacks; creates and
    /// renames of an already registered path do not.
    pub fn is_deliverable(self) -> bool {
        matches!(self, Self::Removed | Self::MetadataChanged | Self::Modified)
    }
}

impl From<notify::EventKind> for FileEventKind {
    fn from(kind: notify::EventKind) -> Self {
        match kind {
            notify::EventKind::Create(_) => Self::Created,
            notify::EventKind::Modify(modify_kind) => match modify_kind {
                ModifyKind::Name(_) => Self::Renamed,
                ModifyKind::Metadata(_) => Self::MetadataChanged,
                ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Other => Self::Modified,
            },
            notify::EventKind::Remove(_) => Self::Removed,
            notify::EventKind::Access(_) => Self::Accessed,
            notify::EventKind::Any | notify::EventKind::Other => Self::Other,
        }
    }
}

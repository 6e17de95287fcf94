//! Linear snapshot history with branch-discarding undo/redo.

use crate::snapshot::ImageSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Undo,
    Redo,
    ResetToOriginal,
}

impl HistoryAction {
    pub const fn applied_message(self) -> &'static str {
        match self {
            Self::Undo => "undo applied",
            Self::Redo => "redo applied",
            Self::ResetToOriginal => "reset to original",
        }
    }

    pub const fn unavailable_message(self) -> &'static str {
        match self {
            Self::Undo => "nothing to undo",
            Self::Redo => "nothing to redo",
            Self::ResetToOriginal => "no image loaded",
        }
    }
}

/// Ordered snapshots plus a cursor.
///
/// Index 0 is the original image. The cursor is `None` only while the history is empty.
#[derive(Debug, Clone, Default)]
pub struct History {
    snapshots: Vec<ImageSnapshot>,
    cursor: Option<usize>,
}

impl History {
    pub const fn new() -> Self {
        Self {
            snapshots: Vec::new(),
            cursor: None,
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub const fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Replaces the whole history with a single original snapshot.
    pub fn load(&mut self, original: ImageSnapshot) {
        tracing::debug!(snapshot = %original.id(), "history reinitialized");
        self.snapshots.clear();
        self.snapshots.push(original);
        self.cursor = Some(0);
    }

    /// Drops everything after the cursor, then pushes `snapshot` as the new current entry.
    pub fn append(&mut self, snapshot: ImageSnapshot) {
        if let Some(cursor) = self.cursor {
            let discarded = self.snapshots.len().saturating_sub(cursor + 1);
            if discarded > 0 {
                tracing::debug!(discarded, "dropping redo branch");
            }
            self.snapshots.truncate(cursor + 1);
        }
        self.snapshots.push(snapshot);
        self.cursor = Some(self.snapshots.len() - 1);
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor
            .is_some_and(|cursor| cursor + 1 < self.snapshots.len())
    }

    pub fn can_reset(&self) -> bool {
        !self.snapshots.is_empty()
    }

    /// Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.navigate(HistoryAction::Undo)
    }

    /// Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        self.navigate(HistoryAction::Redo)
    }

    /// Moves the cursor back to the original; later snapshots stay reachable through redo.
    pub fn reset_to_original(&mut self) -> bool {
        self.navigate(HistoryAction::ResetToOriginal)
    }

    pub fn navigate(&mut self, action: HistoryAction) -> bool {
        let next = match (action, self.cursor) {
            (HistoryAction::Undo, Some(cursor)) if self.can_undo() => cursor - 1,
            (HistoryAction::Redo, Some(cursor)) if self.can_redo() => cursor + 1,
            (HistoryAction::ResetToOriginal, Some(_)) => 0,
            _ => {
                tracing::debug!(?action, "{}", action.unavailable_message());
                return false;
            }
        };
        self.cursor = Some(next);
        tracing::debug!(?action, cursor = next, "{}", action.applied_message());
        true
    }

    pub fn current(&self) -> Option<&ImageSnapshot> {
        self.cursor.and_then(|cursor| self.snapshots.get(cursor))
    }

    pub fn original(&self) -> Option<&ImageSnapshot> {
        self.snapshots.first()
    }

    /// Whether at least one edit exists beyond the original.
    pub fn has_edits(&self) -> bool {
        self.snapshots.len() > 1
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = None;
    }
}

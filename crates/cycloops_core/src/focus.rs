//! Focus bridge: maps element focus/blur events onto the `focus` signal.

use crate::model::note::NoteId;
use crate::state::FocusWriter;
use log::debug;

/// Owner of the `focus` signal.
pub struct FocusBridge {
    writer: FocusWriter,
}

impl FocusBridge {
    pub fn new(writer: FocusWriter) -> Self {
        Self { writer }
    }

    /// A rendered element gained focus. Elements without a note id are ignored.
    pub fn focus_in(&self, note_id: Option<NoteId>) {
        if let Some(id) = note_id {
            self.writer.set(Some(id));
            debug!("event=focus module=focus status=in id={id}");
        }
    }

    /// Focus left the list.
    pub fn focus_out(&self) {
        self.writer.set(None);
    }
}

//! BlinkMD core - session controller and render pipeline
//!
//! The headless heart of a single-document markdown editor: a session state
//! machine with data-loss-prevention guarantees (dirty tracking, close
//! interception, drop validation) coupled to a debounced pipeline that turns
//! raw markdown into sanitized, display-ready markup. The editing widget,
//! native dialogs, and window chrome live in the shell and reach the session
//! only through the collaborator traits in [`host`].

pub mod core;
pub mod host;
pub mod render;
pub mod session;

pub use crate::core::close_guard::{
    resolve_close_request, CloseRequestDecision, CloseRequestInput,
};
pub use crate::core::document::{CursorPos, DocumentModel, ViewMode};
pub use crate::core::drop::{DragDropEvent, DropVerdict, Position, Rect};
pub use crate::host::events::{CloseGuardRegistry, CloseOutcome, EventHub, ShortcutCommand};
pub use crate::host::{ConfirmationPrompt, FileOpError, FilePersistence, FilePicker};
pub use crate::render::markdown::{CommonMarkConverter, MarkupConverter};
pub use crate::session::{attach, Session, SessionBindings};

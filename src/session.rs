//! Session state machine for the one open document
//!
//! Owns the document model, view mode, and busy flag, and orchestrates
//! open/save/edit/close/drop as guarded transitions. Collaborators (picker,
//! persistence, prompt, converter) are injected once at construction; the
//! session itself performs no environment detection.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use crate::core::close_guard::{resolve_close_request, CloseRequestInput};
use crate::core::document::{CursorPos, DocumentModel, ViewMode};
use crate::core::drop::{resolve_drop, DragDropEvent, DropVerdict, Rect};
use crate::host::events::{
    CloseGuardHandle, CloseGuardRegistry, CloseOutcome, EventHub, HostEvent, ShortcutCommand,
    Subscription,
};
use crate::host::{ConfirmationPrompt, FileAction, FileOpError, FilePersistence, FilePicker};
use crate::render::markdown::MarkupConverter;
use crate::render::pipeline::PreviewPipeline;

const STATUS_READY: &str = "Ready";
const STATUS_FILE_OPENED: &str = "File opened.";
const STATUS_OPEN_CANCELLED: &str = "Open cancelled.";
const STATUS_SAVED: &str = "Saved.";
const STATUS_SAVED_AS: &str = "Saved as new file.";
const STATUS_SAVE_CANCELLED: &str = "Save cancelled.";
const STATUS_SAVE_AS_CANCELLED: &str = "Save As cancelled.";
const STATUS_DROP_UNSUPPORTED: &str = "Drop ignored: only .md/.markdown/.txt are supported.";
const STATUS_DROP_BUSY: &str = "Drop ignored because another operation is running.";
const STATUS_CLOSE_SAVE_INCOMPLETE: &str = "Close cancelled because save did not complete.";
const CONFIRM_DISCARD_MESSAGE: &str = "You have unsaved changes. Continue opening another file?";

/// Controller for the lifecycle of a single open document
pub struct Session {
    document: DocumentModel,
    mode: ViewMode,
    cursor: CursorPos,
    /// At most one file-affecting operation runs at a time
    busy: bool,
    drag_active: bool,
    /// One-shot override consumed by the next close decision
    force_close_once: bool,
    close_confirm_visible: bool,
    status: String,
    workspace_bounds: Rect,
    scale_factor: f64,
    pipeline: PreviewPipeline,
    picker: Box<dyn FilePicker>,
    persistence: Box<dyn FilePersistence>,
    prompt: Box<dyn ConfirmationPrompt>,
}

impl Session {
    pub fn new(
        picker: Box<dyn FilePicker>,
        persistence: Box<dyn FilePersistence>,
        prompt: Box<dyn ConfirmationPrompt>,
        converter: Box<dyn MarkupConverter>,
    ) -> Self {
        Self {
            document: DocumentModel::new(),
            mode: ViewMode::default(),
            cursor: CursorPos::default(),
            busy: false,
            drag_active: false,
            force_close_once: false,
            close_confirm_visible: false,
            status: STATUS_READY.to_string(),
            workspace_bounds: Rect::default(),
            scale_factor: 1.0,
            pipeline: PreviewPipeline::new(converter),
            picker,
            persistence,
            prompt,
        }
    }

    pub fn document(&self) -> &DocumentModel {
        &self.document
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn cursor(&self) -> CursorPos {
        self.cursor
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_drag_active(&self) -> bool {
        self.drag_active
    }

    pub fn close_confirm_visible(&self) -> bool {
        self.close_confirm_visible
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn preview_html(&self) -> &str {
        self.pipeline.html()
    }

    /// Workspace geometry used by the drop hit test, reported by the shell
    pub fn set_workspace_bounds(&mut self, bounds: Rect, scale_factor: f64) {
        self.workspace_bounds = bounds;
        self.scale_factor = scale_factor;
    }

    pub fn set_cursor(&mut self, cursor: CursorPos) {
        self.cursor = cursor;
    }

    /// Apply a local edit and reschedule the preview render
    pub fn update_content(&mut self, content: String, now: Instant) {
        self.document.apply_edit(content);
        self.pipeline.schedule(self.document.byte_size(), now);
    }

    /// Flush the debounced render if its deadline has passed
    pub fn tick(&mut self, now: Instant) -> bool {
        self.pipeline.poll(&self.document.content, now)
    }

    /// Switch the visible panes. Entering a mode that shows the preview
    /// snapshots the live content synchronously, so the first paint after
    /// the switch is never stale or empty.
    pub fn switch_mode(&mut self, next: ViewMode) {
        if next.shows_preview() {
            self.pipeline.snapshot(&self.document.content);
        }
        self.mode = next;
    }

    /// Open a document through the file picker
    pub fn open(&mut self) {
        if self.busy {
            tracing::warn!("open rejected, operation in progress");
            return;
        }
        if !self.confirm_discard_unsaved() {
            self.status = STATUS_OPEN_CANCELLED.to_string();
            return;
        }

        self.busy = true;
        let outcome = self.open_via_picker();
        self.busy = false;
        self.finish_open(outcome, 0);
    }

    /// Save to the current path, or prompt for one if the document was
    /// never persisted. Returns whether the document is now clean.
    pub fn save(&mut self) -> bool {
        if self.busy {
            tracing::warn!("save rejected, operation in progress");
            return false;
        }

        self.busy = true;
        let result = self.persist_current(false);
        self.busy = false;
        self.finish_save(result, STATUS_SAVED, STATUS_SAVE_CANCELLED)
    }

    /// Save under a new path chosen in the save dialog
    pub fn save_as(&mut self) -> bool {
        if self.busy {
            tracing::warn!("save-as rejected, operation in progress");
            return false;
        }

        self.busy = true;
        let result = self.persist_current(true);
        self.busy = false;
        self.finish_save(result, STATUS_SAVED_AS, STATUS_SAVE_AS_CANCELLED)
    }

    /// Decide a close request from the host window
    pub fn handle_close_requested(&mut self) -> CloseOutcome {
        let decision = resolve_close_request(CloseRequestInput {
            is_dirty: self.document.is_dirty,
            force_close_once: self.force_close_once,
        });
        self.force_close_once = decision.next_force_close_once;

        if decision.should_block {
            self.close_confirm_visible = true;
            return CloseOutcome::Blocked;
        }
        CloseOutcome::Proceed
    }

    /// Close-confirm resolution: save, then close only if the save
    /// completed
    pub fn confirm_close_save(&mut self) -> CloseOutcome {
        self.close_confirm_visible = false;
        if self.save() {
            self.force_close_once = true;
            self.handle_close_requested()
        } else {
            self.status = STATUS_CLOSE_SAVE_INCOMPLETE.to_string();
            CloseOutcome::Blocked
        }
    }

    /// Close-confirm resolution: discard unsaved changes and close
    pub fn confirm_close_discard(&mut self) -> CloseOutcome {
        self.close_confirm_visible = false;
        self.force_close_once = true;
        self.handle_close_requested()
    }

    /// Close-confirm resolution: keep the document open
    pub fn confirm_close_cancel(&mut self) {
        self.close_confirm_visible = false;
    }

    /// React to a drag-drop event from the host input layer
    pub fn handle_drag_drop(&mut self, event: &DragDropEvent) {
        match event {
            DragDropEvent::Leave => {
                self.drag_active = false;
            }
            DragDropEvent::Enter { position, .. } | DragDropEvent::Over { position, .. } => {
                self.drag_active = crate::core::drop::position_in_workspace(
                    self.workspace_bounds,
                    *position,
                    self.scale_factor,
                );
            }
            DragDropEvent::Drop { position, paths } => {
                self.drag_active = false;
                match resolve_drop(paths, *position, self.workspace_bounds, self.scale_factor) {
                    DropVerdict::OutsideWorkspace => {}
                    DropVerdict::Unsupported => {
                        tracing::warn!("drop rejected, no supported file in payload");
                        self.status = STATUS_DROP_UNSUPPORTED.to_string();
                    }
                    DropVerdict::Open { path, ignored } => self.open_dropped(&path, ignored),
                }
            }
        }
    }

    /// Dispatch an external shortcut signal
    pub fn handle_shortcut(&mut self, command: ShortcutCommand) {
        match command {
            ShortcutCommand::Open => {
                if !self.busy {
                    self.open();
                }
            }
            ShortcutCommand::Save => {
                if !self.busy {
                    self.save();
                }
            }
            ShortcutCommand::SaveAs => {
                if !self.busy {
                    self.save_as();
                }
            }
            ShortcutCommand::EditMode => {
                self.switch_mode(ViewMode::Edit);
                self.status = "Switched to edit mode.".to_string();
            }
            ShortcutCommand::PreviewMode => {
                self.switch_mode(ViewMode::Preview);
                self.status = "Switched to preview mode.".to_string();
            }
            ShortcutCommand::SplitMode => {
                self.switch_mode(ViewMode::Split);
                self.status = "Switched to split mode.".to_string();
            }
        }
    }

    fn confirm_discard_unsaved(&mut self) -> bool {
        if !self.document.is_dirty {
            return true;
        }
        self.prompt.ask(CONFIRM_DISCARD_MESSAGE)
    }

    fn open_via_picker(&mut self) -> Result<DocumentModel, FileOpError> {
        let path = self
            .picker
            .open_dialog()
            .ok_or(FileOpError::Cancelled(FileAction::Open))?;
        self.read_document(&path)
    }

    fn read_document(&mut self, path: &Path) -> Result<DocumentModel, FileOpError> {
        let (path, content) = self
            .persistence
            .read(path)
            .map_err(|error| FileOpError::from_any(FileAction::Open, error))?;
        Ok(DocumentModel::opened(path, content))
    }

    /// Drop-initiated open: same flow as `open` with the path already
    /// resolved. Never queued while busy.
    fn open_dropped(&mut self, path: &Path, ignored: usize) {
        if self.busy {
            tracing::warn!(path = %path.display(), "drop rejected, operation in progress");
            self.status = STATUS_DROP_BUSY.to_string();
            return;
        }
        if !self.confirm_discard_unsaved() {
            self.status = STATUS_OPEN_CANCELLED.to_string();
            return;
        }

        self.busy = true;
        let outcome = self.read_document(path);
        self.busy = false;
        self.finish_open(outcome, ignored);
    }

    fn finish_open(&mut self, outcome: Result<DocumentModel, FileOpError>, ignored: usize) {
        match outcome {
            Ok(document) => {
                tracing::info!(
                    path = %document.display_name(),
                    bytes = document.byte_size(),
                    "document opened"
                );
                // Replaced wholesale; there is no partially opened state
                self.document = document;
                self.switch_mode(ViewMode::Preview);
                self.cursor = CursorPos::default();
                self.status = if ignored > 0 {
                    format!("File opened. Ignored {ignored} additional dropped file(s).")
                } else {
                    STATUS_FILE_OPENED.to_string()
                };
            }
            Err(error) if error.is_cancelled() => {
                self.status = STATUS_OPEN_CANCELLED.to_string();
            }
            Err(error) => {
                tracing::error!(error = %error, "open failed");
                self.status = error.to_string();
            }
        }
    }

    fn persist_current(&mut self, always_prompt: bool) -> Result<PathBuf, FileOpError> {
        let target = match (&self.document.path, always_prompt) {
            (Some(path), false) => path.clone(),
            _ => self
                .picker
                .save_dialog(&self.document.display_name())
                .ok_or(FileOpError::Cancelled(FileAction::Save))?,
        };
        self.persistence
            .write(&target, &self.document.content)
            .map_err(|error| FileOpError::from_any(FileAction::Save, error))
    }

    fn finish_save(
        &mut self,
        result: Result<PathBuf, FileOpError>,
        ok_status: &str,
        cancel_status: &str,
    ) -> bool {
        match result {
            Ok(path) => {
                tracing::info!(path = %path.display(), "document saved");
                self.document.mark_saved(path);
                self.status = ok_status.to_string();
                true
            }
            Err(error) if error.is_cancelled() => {
                self.status = cancel_status.to_string();
                false
            }
            Err(error) => {
                tracing::error!(error = %error, "save failed");
                self.status = error.to_string();
                false
            }
        }
    }
}

/// Subscriptions that feed host events into a shared session. Tearing the
/// bindings down unsubscribes everything deterministically.
pub struct SessionBindings {
    events: Subscription,
    close: CloseGuardHandle,
}

impl SessionBindings {
    pub fn teardown(self) {
        self.events.unsubscribe();
        self.close.retire();
    }
}

/// Wire a shared session into the host dispatchers. Installing into the
/// close registry retires any previously active close handler.
pub fn attach(
    session: &Rc<RefCell<Session>>,
    hub: &EventHub,
    close_registry: &CloseGuardRegistry,
) -> SessionBindings {
    let for_events = Rc::clone(session);
    let events = hub.subscribe(move |event| {
        let mut session = for_events.borrow_mut();
        match event {
            HostEvent::DragDrop(drag) => session.handle_drag_drop(drag),
            HostEvent::Shortcut(command) => session.handle_shortcut(*command),
        }
    });

    let for_close = Rc::clone(session);
    let close = close_registry.install(move || for_close.borrow_mut().handle_close_requested());

    SessionBindings { events, close }
}

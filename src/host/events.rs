//! Host event subscriptions
//!
//! The shell forwards window-level events (drag-drop, shortcut signals,
//! close requests) into these dispatchers. Every subscription hands back an
//! unsubscribe handle; register/unregister cycles leave nothing behind. The
//! close-request handler is a singleton by construction: installing a new
//! one retires the previous one, so re-initialization can never stack stale
//! callbacks.

use std::cell::RefCell;
use std::mem;
use std::rc::{Rc, Weak};

use crate::core::drop::DragDropEvent;

/// Command delivered by the host's shortcut layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutCommand {
    Open,
    Save,
    SaveAs,
    EditMode,
    PreviewMode,
    SplitMode,
}

/// Event forwarded from the host window
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    DragDrop(DragDropEvent),
    Shortcut(ShortcutCommand),
}

/// Verdict on a window close request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The window may be destroyed
    Proceed,
    /// The close was intercepted; the session is presenting resolutions
    Blocked,
}

type Callback = Box<dyn FnMut(&HostEvent)>;

struct Slot {
    id: u64,
    callback: Callback,
}

#[derive(Default)]
struct HubInner {
    next_id: u64,
    slots: Vec<Slot>,
    /// Ids unsubscribed while a dispatch had the slots checked out
    retired: Vec<u64>,
    dispatching: bool,
}

/// Single-threaded subscribe/emit dispatcher for [`HostEvent`]s
#[derive(Default)]
pub struct EventHub {
    inner: Rc<RefCell<HubInner>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every emitted event
    pub fn subscribe(&self, callback: impl FnMut(&HostEvent) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.slots.push(Slot {
            id,
            callback: Box::new(callback),
        });
        Subscription {
            hub: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Deliver `event` to every live subscriber. Callbacks may subscribe or
    /// unsubscribe during dispatch; a subscription made mid-dispatch first
    /// sees the next event. Dispatch itself is not reentrant.
    pub fn emit(&self, event: &HostEvent) {
        let mut active = {
            let mut inner = self.inner.borrow_mut();
            if inner.dispatching {
                return;
            }
            inner.dispatching = true;
            mem::take(&mut inner.slots)
        };

        for slot in &mut active {
            let is_retired = self.inner.borrow().retired.contains(&slot.id);
            if !is_retired {
                (slot.callback)(event);
            }
        }

        let mut inner = self.inner.borrow_mut();
        let added = mem::take(&mut inner.slots);
        active.extend(added);
        let retired = mem::take(&mut inner.retired);
        active.retain(|slot| !retired.contains(&slot.id));
        inner.slots = active;
        inner.dispatching = false;
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().slots.len()
    }
}

/// Unsubscribe handle returned by [`EventHub::subscribe`]. Unsubscribes on
/// drop as well.
pub struct Subscription {
    hub: Weak<RefCell<HubInner>>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.retire();
    }

    fn retire(&mut self) {
        if let Some(inner) = self.hub.upgrade() {
            let mut inner = inner.borrow_mut();
            inner.slots.retain(|slot| slot.id != self.id);
            if inner.dispatching {
                inner.retired.push(self.id);
            }
        }
        self.hub = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.retire();
    }
}

type CloseHandler = Box<dyn FnMut() -> CloseOutcome>;

#[derive(Default)]
struct CloseSlot {
    next_id: u64,
    active: Option<(u64, CloseHandler)>,
    /// Id of the handler currently checked out by `request_close`
    in_flight: Option<u64>,
    in_flight_retired: bool,
}

/// Owner of the single active close-request handler
#[derive(Default)]
pub struct CloseGuardRegistry {
    inner: Rc<RefCell<CloseSlot>>,
}

impl CloseGuardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler`, retiring any previously active handler first
    pub fn install(&self, handler: impl FnMut() -> CloseOutcome + 'static) -> CloseGuardHandle {
        let mut slot = self.inner.borrow_mut();
        slot.next_id += 1;
        let id = slot.next_id;
        slot.active = Some((id, Box::new(handler)));
        CloseGuardHandle {
            registry: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Run the active handler. With none installed, closes proceed.
    pub fn request_close(&self) -> CloseOutcome {
        let taken = {
            let mut slot = self.inner.borrow_mut();
            slot.active.take().map(|(id, handler)| {
                slot.in_flight = Some(id);
                (id, handler)
            })
        };
        let Some((id, mut handler)) = taken else {
            return CloseOutcome::Proceed;
        };

        let outcome = handler();

        let mut slot = self.inner.borrow_mut();
        let was_retired = slot.in_flight_retired;
        slot.in_flight = None;
        slot.in_flight_retired = false;
        // Reinstall unless the handler was replaced or retired mid-call
        if slot.active.is_none() && !was_retired {
            slot.active = Some((id, handler));
        }
        outcome
    }

    pub fn has_active_handler(&self) -> bool {
        self.inner.borrow().active.is_some()
    }
}

/// Handle for the installed close-request handler. Retires on drop; a stale
/// handle never removes a newer handler.
pub struct CloseGuardHandle {
    registry: Weak<RefCell<CloseSlot>>,
    id: u64,
}

impl CloseGuardHandle {
    pub fn retire(mut self) {
        self.retire_in_place();
    }

    fn retire_in_place(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            let mut slot = inner.borrow_mut();
            if slot.in_flight == Some(self.id) {
                slot.in_flight_retired = true;
            }
            if matches!(slot.active, Some((id, _)) if id == self.id) {
                slot.active = None;
            }
        }
        self.registry = Weak::new();
    }
}

impl Drop for CloseGuardHandle {
    fn drop(&mut self) {
        self.retire_in_place();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn shortcut(command: ShortcutCommand) -> HostEvent {
        HostEvent::Shortcut(command)
    }

    #[test]
    fn subscribers_receive_emitted_events() {
        let hub = EventHub::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = hub.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        hub.emit(&shortcut(ShortcutCommand::Save));
        hub.emit(&shortcut(ShortcutCommand::Open));

        assert_eq!(
            *seen.borrow(),
            vec![
                shortcut(ShortcutCommand::Save),
                shortcut(ShortcutCommand::Open)
            ]
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hub = EventHub::new();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let sub = hub.subscribe(move |_| *sink.borrow_mut() += 1);

        hub.emit(&shortcut(ShortcutCommand::Save));
        sub.unsubscribe();
        hub.emit(&shortcut(ShortcutCommand::Save));

        assert_eq!(*count.borrow(), 1);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn dropping_the_handle_unsubscribes() {
        let hub = EventHub::new();
        {
            let _sub = hub.subscribe(|_| {});
            assert_eq!(hub.subscriber_count(), 1);
        }
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn repeated_register_unregister_cycles_leak_nothing() {
        let hub = EventHub::new();
        for _ in 0..100 {
            let sub = hub.subscribe(|_| {});
            sub.unsubscribe();
        }
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn subscription_outliving_the_hub_is_harmless() {
        let sub = {
            let hub = EventHub::new();
            hub.subscribe(|_| {})
        };
        sub.unsubscribe();
    }

    #[test]
    fn subscription_made_during_dispatch_sees_only_later_events() {
        let hub = Rc::new(EventHub::new());
        let late_count = Rc::new(RefCell::new(0));
        let subs = Rc::new(RefCell::new(Vec::new()));

        let hub_for_cb = Rc::clone(&hub);
        let late_for_cb = Rc::clone(&late_count);
        let subs_for_cb = Rc::clone(&subs);
        let _sub = hub.subscribe(move |_| {
            let late = Rc::clone(&late_for_cb);
            let new_sub = hub_for_cb.subscribe(move |_| *late.borrow_mut() += 1);
            subs_for_cb.borrow_mut().push(new_sub);
        });

        hub.emit(&shortcut(ShortcutCommand::Save));
        assert_eq!(*late_count.borrow(), 0);
        hub.emit(&shortcut(ShortcutCommand::Save));
        assert_eq!(*late_count.borrow(), 1);
    }

    #[test]
    fn close_requests_proceed_with_no_handler() {
        let registry = CloseGuardRegistry::new();
        assert_eq!(registry.request_close(), CloseOutcome::Proceed);
    }

    #[test]
    fn installed_handler_decides_the_outcome() {
        let registry = CloseGuardRegistry::new();
        let _handle = registry.install(|| CloseOutcome::Blocked);
        assert_eq!(registry.request_close(), CloseOutcome::Blocked);
        // Handler survives the call and keeps deciding
        assert_eq!(registry.request_close(), CloseOutcome::Blocked);
    }

    #[test]
    fn reinstall_retires_the_previous_handler() {
        let registry = CloseGuardRegistry::new();
        let first = registry.install(|| CloseOutcome::Blocked);
        let _second = registry.install(|| CloseOutcome::Proceed);

        assert_eq!(registry.request_close(), CloseOutcome::Proceed);

        // The stale handle must not remove the newer handler
        first.retire();
        assert!(registry.has_active_handler());
        assert_eq!(registry.request_close(), CloseOutcome::Proceed);
    }

    #[test]
    fn retiring_the_active_handle_clears_the_registry() {
        let registry = CloseGuardRegistry::new();
        let handle = registry.install(|| CloseOutcome::Blocked);
        handle.retire();
        assert!(!registry.has_active_handler());
        assert_eq!(registry.request_close(), CloseOutcome::Proceed);
    }

    #[test]
    fn dropping_the_handle_retires_the_handler() {
        let registry = CloseGuardRegistry::new();
        {
            let _handle = registry.install(|| CloseOutcome::Blocked);
            assert!(registry.has_active_handler());
        }
        assert!(!registry.has_active_handler());
    }
}

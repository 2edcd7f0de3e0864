//! Events.
//!
//! There are two kinds of listeners. Event handlers observe informational events (structure,
//! validity, focus, …), which are queued when the triggering mutation happens and delivered later,
//! in mutation order, by [`ComponentTree::dispatch_events`](crate::ComponentTree::dispatch_events).
//! Veto handlers are consulted synchronously *before* a value or focus change is applied and may
//! refuse it.

use crate::component::{ComponentId, Notification, Status, Value};
use core::fmt;
use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An informational event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A child was added to and/or removed from `parent`’s store.
    ChildrenChanged {
        parent: ComponentId,
        index: usize,
        added: Option<ComponentId>,
        removed: Option<ComponentId>,
    },
    ValidChanged {
        component: ComponentId,
        valid: bool,
    },
    StatusChanged {
        component: ComponentId,
        status: Status,
    },
    NotificationChanged {
        component: ComponentId,
        notification: Option<Notification>,
    },
    ValueChanged {
        component: ComponentId,
        old: Value,
        new: Value,
    },
    PropertyChanged {
        component: ComponentId,
        property: String,
        old: Option<Value>,
        new: Value,
    },
    FocusChanged {
        group: ComponentId,
        old: Option<ComponentId>,
        new: Option<ComponentId>,
    },
    FrameOpened {
        frame: ComponentId,
        modal: bool,
    },
    FrameClosed {
        frame: ComponentId,
    },
    LayoutChanged {
        container: ComponentId,
    },
    Action {
        component: ComponentId,
        command: String,
    },
    SelectionChanged {
        component: ComponentId,
        selected: bool,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ChildrenChanged { .. } => EventKind::Children,
            Event::ValidChanged { .. } => EventKind::Valid,
            Event::StatusChanged { .. } => EventKind::Status,
            Event::NotificationChanged { .. } => EventKind::Notification,
            Event::ValueChanged { .. } => EventKind::Value,
            Event::PropertyChanged { .. } => EventKind::Property,
            Event::FocusChanged { .. } => EventKind::Focus,
            Event::FrameOpened { .. } | Event::FrameClosed { .. } => EventKind::Frame,
            Event::LayoutChanged { .. } => EventKind::Layout,
            Event::Action { .. } => EventKind::Action,
            Event::SelectionChanged { .. } => EventKind::Selection,
        }
    }

    /// The component the event is about.
    pub fn source(&self) -> ComponentId {
        match self {
            Event::ChildrenChanged { parent, .. } => *parent,
            Event::FocusChanged { group, .. } => *group,
            Event::FrameOpened { frame, .. } | Event::FrameClosed { frame } => *frame,
            Event::LayoutChanged { container } => *container,
            Event::ValidChanged { component, .. }
            | Event::StatusChanged { component, .. }
            | Event::NotificationChanged { component, .. }
            | Event::ValueChanged { component, .. }
            | Event::PropertyChanged { component, .. }
            | Event::Action { component, .. }
            | Event::SelectionChanged { component, .. } => *component,
        }
    }
}

/// List of event kinds.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    Children = 0,
    Valid = 1,
    Status = 2,
    Notification = 3,
    Value = 4,
    Property = 5,
    Focus = 6,
    Frame = 7,
    Layout = 8,
    Action = 9,
    Selection = 10,
}

impl EventKind {
    // smallest and largest values in Ord
    pub(crate) const MIN: Self = EventKind::Children;
    pub(crate) const MAX: Self = EventKind::Selection;
}

/// A change that veto handlers get to look at before it’s applied.
#[derive(Debug, Clone, PartialEq)]
pub enum ProposedChange {
    Value {
        component: ComponentId,
        current: Value,
        proposed: Value,
    },
    Focus {
        group: ComponentId,
        current: Option<ComponentId>,
        proposed: Option<ComponentId>,
    },
}

impl ProposedChange {
    /// The component whose veto handlers are asked.
    pub fn target(&self) -> ComponentId {
        match self {
            ProposedChange::Value { component, .. } => *component,
            ProposedChange::Focus { group, .. } => *group,
        }
    }
}

/// A refusal from a veto handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct Veto {
    pub reason: String,
}

impl Veto {
    pub fn new(reason: impl Into<String>) -> Self {
        Veto {
            reason: reason.into(),
        }
    }
}

pub struct EventHandler(Arc<Mutex<dyn FnMut(&Event) + Send>>);

impl Clone for EventHandler {
    fn clone(&self) -> Self {
        EventHandler(Arc::clone(&self.0))
    }
}

impl EventHandler {
    pub fn new<F: 'static + FnMut(&Event) + Send>(handler: F) -> Self {
        EventHandler(Arc::new(Mutex::new(handler)))
    }

    fn call(&self, event: &Event) {
        let mut handler = self.0.lock();
        (&mut *handler)(event)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "EventHandler")
    }
}

pub struct VetoHandler(Arc<Mutex<dyn FnMut(&ProposedChange) -> Result<(), Veto> + Send>>);

impl Clone for VetoHandler {
    fn clone(&self) -> Self {
        VetoHandler(Arc::clone(&self.0))
    }
}

impl VetoHandler {
    pub fn new<F>(handler: F) -> Self
    where
        F: 'static + FnMut(&ProposedChange) -> Result<(), Veto> + Send,
    {
        VetoHandler(Arc::new(Mutex::new(handler)))
    }

    fn call(&self, change: &ProposedChange) -> Result<(), Veto> {
        let mut handler = self.0.lock();
        (&mut *handler)(change)
    }
}

impl fmt::Debug for VetoHandler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "VetoHandler")
    }
}

/// Handle for unregistering a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Refers to the handlers for one kind of event on one component.
type HandlerKey = (ComponentId, EventKind);

/// Registered listeners.
#[derive(Debug, Default)]
pub(crate) struct Listeners {
    next_id: u64,
    handlers: BTreeMap<HandlerKey, Vec<(ListenerId, EventHandler)>>,
    global: Vec<(ListenerId, EventKind, EventHandler)>,
    vetoes: BTreeMap<ComponentId, Vec<(ListenerId, VetoHandler)>>,
}

impl Listeners {
    fn next_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    pub(crate) fn add_handler(
        &mut self,
        source: ComponentId,
        kind: EventKind,
        handler: EventHandler,
    ) -> ListenerId {
        let id = self.next_id();
        self.handlers
            .entry((source, kind))
            .or_insert_with(Vec::new)
            .push((id, handler));
        id
    }

    pub(crate) fn add_global_handler(&mut self, kind: EventKind, handler: EventHandler) -> ListenerId {
        let id = self.next_id();
        self.global.push((id, kind, handler));
        id
    }

    pub(crate) fn add_veto(&mut self, target: ComponentId, handler: VetoHandler) -> ListenerId {
        let id = self.next_id();
        self.vetoes
            .entry(target)
            .or_insert_with(Vec::new)
            .push((id, handler));
        id
    }

    /// Returns false if no such listener exists.
    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let mut found = false;
        for list in self.handlers.values_mut() {
            let len = list.len();
            list.retain(|(i, _)| *i != id);
            found |= list.len() != len;
        }
        for list in self.vetoes.values_mut() {
            let len = list.len();
            list.retain(|(i, _)| *i != id);
            found |= list.len() != len;
        }
        let len = self.global.len();
        self.global.retain(|(i, _, _)| *i != id);
        found |= self.global.len() != len;

        self.handlers.retain(|_, list| !list.is_empty());
        self.vetoes.retain(|_, list| !list.is_empty());
        found
    }

    /// Drops every listener attached to a component.
    pub(crate) fn remove_component(&mut self, component: ComponentId) {
        let keys_to_remove: Vec<_> = self
            .handlers
            .range((component, EventKind::MIN)..=(component, EventKind::MAX))
            .map(|(k, _)| *k)
            .collect();
        for key in keys_to_remove {
            self.handlers.remove(&key);
        }
        self.vetoes.remove(&component);
    }

    pub(crate) fn deliver(&self, event: &Event) {
        let kind = event.kind();
        if let Some(list) = self.handlers.get(&(event.source(), kind)) {
            for (_, handler) in list {
                handler.call(event);
            }
        }
        for (_, k, handler) in &self.global {
            if *k == kind {
                handler.call(event);
            }
        }
    }

    /// Asks the target’s veto handlers in registration order; the first refusal wins.
    pub(crate) fn check_veto(&self, change: &ProposedChange) -> Result<(), Veto> {
        if let Some(list) = self.vetoes.get(&change.target()) {
            for (_, handler) in list {
                handler.call(change)?;
            }
        }
        Ok(())
    }
}

/// FIFO of informational events waiting for delivery.
#[derive(Debug)]
pub(crate) struct EventQueue {
    sender: Sender<Event>,
    receiver: Receiver<Event>,
}

impl EventQueue {
    pub(crate) fn new() -> EventQueue {
        let (sender, receiver) = channel::unbounded();
        EventQueue { sender, receiver }
    }

    pub(crate) fn push(&self, event: Event) {
        log::trace!("queue {:?}", event);
        if let Err(err) = self.sender.send(event) {
            log::error!("failed to queue event: {}", err);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Takes the next event, if any.
    pub(crate) fn pop(&self) -> Option<Event> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            // the queue owns its own sender, so it can’t disconnect
            Err(TryRecvError::Disconnected) => None,
        }
    }
}

#[test]
fn test_listener_registry() {
    let a = ComponentId::new();
    let b = ComponentId::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut listeners = Listeners::default();
    let sink = Arc::clone(&seen);
    let on_a = listeners.add_handler(
        a,
        EventKind::Valid,
        EventHandler::new(move |e| sink.lock().push(e.source())),
    );
    let sink = Arc::clone(&seen);
    listeners.add_global_handler(
        EventKind::Frame,
        EventHandler::new(move |e| sink.lock().push(e.source())),
    );

    listeners.deliver(&Event::ValidChanged {
        component: a,
        valid: false,
    });
    listeners.deliver(&Event::ValidChanged {
        component: b,
        valid: false,
    });
    listeners.deliver(&Event::FrameClosed { frame: b });
    assert_eq!(*seen.lock(), vec![a, b], "only a’s valid event and the frame event");

    assert!(listeners.remove(on_a));
    assert!(!listeners.remove(on_a), "second removal finds nothing");
    listeners.deliver(&Event::ValidChanged {
        component: a,
        valid: true,
    });
    assert_eq!(seen.lock().len(), 2);
}

#[test]
fn test_veto_order_and_removal() {
    let group = ComponentId::new();
    let mut listeners = Listeners::default();
    listeners.add_veto(group, VetoHandler::new(|_| Ok(())));
    listeners.add_veto(group, VetoHandler::new(|_| Err(Veto::new("busy"))));
    listeners.add_handler(group, EventKind::Selection, EventHandler::new(|_| ()));

    let change = ProposedChange::Focus {
        group,
        current: None,
        proposed: None,
    };
    assert_eq!(listeners.check_veto(&change), Err(Veto::new("busy")));

    listeners.remove_component(group);
    assert_eq!(listeners.check_veto(&change), Ok(()));
    assert!(listeners.handlers.is_empty(), "handlers for all kinds should be gone");
}

#[test]
fn test_queue_is_fifo() {
    let queue = EventQueue::new();
    let frame = ComponentId::new();
    queue.push(Event::FrameOpened { frame, modal: false });
    queue.push(Event::FrameClosed { frame });
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.pop(), Some(Event::FrameOpened { frame, modal: false }));
    assert_eq!(queue.pop(), Some(Event::FrameClosed { frame }));
    assert_eq!(queue.pop(), None);
}

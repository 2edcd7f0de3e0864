use crate::component::{Component, ComponentId, Value};
use crate::config::{Config, LayoutReplacement};
use crate::error::TreeError;
use crate::events::{Event, EventHandler, EventKind, EventQueue, ListenerId, Listeners, VetoHandler};
use crate::frame::FrameState;
use crate::layout::{AnyLayout, Constraints, FlowLayout, Layout, LayoutBinding};
use crate::store::{
    Adoption, ChildStore, ComponentState, EnumIndexedArray, FixedPositionalArray,
    KeyedComponentMap, OrderedChildList, ParentLinks, SlotKey, Snapshot, ValueKeyedStateMap,
};
use core::any;
use core::fmt;
use core::hash::Hash;
use std::collections::{BTreeMap, HashMap};

/// A tree of components.
///
/// The tree owns every component it knows about, whether or not the component currently has a
/// parent; removing a component from its parent only detaches it, and [`destroy`](Self::destroy)
/// drops it for good. Parent links are kept separately from the child stores and only ever
/// changed through [`Adoption`], so a component is in at most one store at any time.
///
/// There are three kinds of composites:
///
/// - plain composites, created with any [`ChildStore`] and mutated through the store operations
///   ([`with_store`](Self::with_store), [`add_child`](Self::add_child), …)
/// - containers, which keep children in an [`OrderedChildList`] and bind each child to layout
///   constraints; their children can only be changed through [`add`](Self::add) and
///   [`remove`](Self::remove)
/// - frames, which are containers that can be opened and closed
///
/// Every mutation queues its informational events right away; they are delivered by
/// [`dispatch_events`](Self::dispatch_events).
pub struct ComponentTree {
    pub(crate) config: Config,
    pub(crate) components: HashMap<ComponentId, Component>,
    pub(crate) links: ParentLinks,
    pub(crate) stores: HashMap<ComponentId, Box<dyn ChildStore>>,
    /// Layout bindings; present exactly for containers.
    pub(crate) layouts: HashMap<ComponentId, LayoutBinding>,
    /// Focus groups and their focused component.
    pub(crate) focus: BTreeMap<ComponentId, Option<ComponentId>>,
    pub(crate) frames: HashMap<ComponentId, FrameState>,
    /// Open frames, bottom to top. The application frame is not in here.
    pub(crate) z_order: Vec<ComponentId>,
    pub(crate) application: ComponentId,
    pub(crate) listeners: Listeners,
    pub(crate) queue: EventQueue,
}

impl ComponentTree {
    pub fn new() -> ComponentTree {
        ComponentTree::with_config(Config::default())
    }

    /// Creates a tree containing only the application frame.
    pub fn with_config(config: Config) -> ComponentTree {
        let mut application = Component::new(config.application_name.clone());
        application.frame = true;
        let application_id = application.id();

        let mut tree = ComponentTree {
            config,
            components: HashMap::new(),
            links: ParentLinks::default(),
            stores: HashMap::new(),
            layouts: HashMap::new(),
            focus: BTreeMap::new(),
            frames: HashMap::new(),
            z_order: Vec::new(),
            application: application_id,
            listeners: Listeners::default(),
            queue: EventQueue::new(),
        };

        tree.create_container(application, FlowLayout::default());
        tree.focus.insert(application_id, None);
        tree.frames.insert(application_id, FrameState::application());
        tree
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The root frame; always open, never closable.
    pub fn application_frame(&self) -> ComponentId {
        self.application
    }

    /// Adds a component without children.
    pub fn create(&mut self, component: Component) -> ComponentId {
        let id = component.id();
        log::trace!("create {} ({:?})", id, component.identifier());
        self.components.insert(id, component);
        let valid = self.determine_valid(id);
        if let Some(component) = self.components.get_mut(&id) {
            component.valid = valid;
        }
        id
    }

    /// Adds a composite that keeps its children in `store`.
    ///
    /// The store must be empty; it is fixed for the life of the component.
    pub fn create_composite<S: ChildStore>(&mut self, component: Component, store: S) -> ComponentId {
        debug_assert!(!store.has_children(), "new stores must be empty");
        let id = self.create(component);
        self.stores.insert(id, Box::new(store));
        id
    }

    /// Adds a container with the given layout.
    pub fn create_container<L: Layout>(&mut self, component: Component, layout: L) -> ComponentId {
        let id = self.create_composite(component, OrderedChildList::new());
        self.layouts.insert(id, LayoutBinding::new(Box::new(layout)));
        id
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.components.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub(crate) fn component_mut(&mut self, id: ComponentId) -> Result<&mut Component, TreeError> {
        self.components
            .get_mut(&id)
            .ok_or(TreeError::UnknownComponent(id))
    }

    fn check_exists(&self, id: ComponentId) -> Result<(), TreeError> {
        if self.components.contains_key(&id) {
            Ok(())
        } else {
            Err(TreeError::UnknownComponent(id))
        }
    }

    pub fn parent(&self, id: ComponentId) -> Option<ComponentId> {
        self.links.parent(id)
    }

    pub fn is_composite(&self, id: ComponentId) -> bool {
        self.stores.contains_key(&id)
    }

    pub fn is_container(&self, id: ComponentId) -> bool {
        self.layouts.contains_key(&id)
    }

    /// A snapshot of the component’s children in store order; empty for leaves.
    pub fn children(&self, id: ComponentId) -> Snapshot {
        match self.stores.get(&id) {
            Some(store) => store.children(),
            None => Snapshot::default(),
        }
    }

    pub fn has_children(&self, id: ComponentId) -> bool {
        self.stores.get(&id).map_or(false, |store| store.has_children())
    }

    /// All descendants in depth-first pre-order, not including `id` itself.
    pub fn descendants(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut descendants = Vec::new();
        let mut stack: Vec<ComponentId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            descendants.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        descendants
    }

    /// Typed read access to a composite’s store.
    pub fn store<S: ChildStore>(&self, owner: ComponentId) -> Result<&S, TreeError> {
        self.check_exists(owner)?;
        let store = self
            .stores
            .get(&owner)
            .ok_or(TreeError::NotComposite(owner))?;
        store
            .as_any()
            .downcast_ref::<S>()
            .ok_or(TreeError::WrongStore {
                owner,
                expected: any::type_name::<S>(),
                actual: store.kind(),
            })
    }

    // ---------------------------------------------------------------------------------------------
    // Containers

    /// Adds a child to a container with default constraints from its layout.
    ///
    /// Returns false if the child is already in this container.
    pub fn add(&mut self, container: ComponentId, child: ComponentId) -> Result<bool, TreeError> {
        self.insert_child(container, None, child, None)
    }

    /// Adds a child to a container with explicit constraints.
    pub fn add_with<C: Constraints>(
        &mut self,
        container: ComponentId,
        child: ComponentId,
        constraints: C,
    ) -> Result<bool, TreeError> {
        self.insert_child(container, None, child, Some(Box::new(constraints)))
    }

    /// Inserts a child at a position in the container (clamped to the end).
    pub fn insert(
        &mut self,
        container: ComponentId,
        index: usize,
        child: ComponentId,
    ) -> Result<bool, TreeError> {
        self.insert_child(container, Some(index), child, None)
    }

    fn insert_child(
        &mut self,
        container: ComponentId,
        index: Option<usize>,
        child: ComponentId,
        constraints: Option<Box<dyn Constraints>>,
    ) -> Result<bool, TreeError> {
        self.check_exists(container)?;
        let binding = self
            .layouts
            .get_mut(&container)
            .ok_or(TreeError::NotAContainer(container))?;
        let store = container_store(&mut self.stores, container);
        if store.contains(child) {
            return Ok(false);
        }

        // everything that can fail happens before the first mutation
        let constraints = binding.resolve(constraints)?;
        {
            let mut cx = Adoption::new(container, &mut self.links, &self.components);
            match index {
                Some(index) => store.insert(&mut cx, index, child)?,
                None => store.add(&mut cx, child)?,
            };
        }
        let index = store.index_of(child).unwrap_or(0);
        binding.insert(child, constraints);

        log::debug!("{}: added {} at {}", container, child, index);
        self.emit(Event::ChildrenChanged {
            parent: container,
            index,
            added: Some(child),
            removed: None,
        });
        self.update_valid(container);
        Ok(true)
    }

    /// Removes a child from a container; the child must be in it.
    pub fn remove(&mut self, container: ComponentId, child: ComponentId) -> Result<(), TreeError> {
        self.check_exists(container)?;
        let binding = self
            .layouts
            .get_mut(&container)
            .ok_or(TreeError::NotAContainer(container))?;
        if self.links.parent(child) != Some(container) {
            return Err(TreeError::NotAMember {
                owner: container,
                child,
            });
        }
        let store = container_store(&mut self.stores, container);
        let index = store.index_of(child).unwrap_or(0);

        binding.remove(child);
        {
            let mut cx = Adoption::new(container, &mut self.links, &self.components);
            store.remove(&mut cx, child)?;
        }

        log::debug!("{}: removed {} from {}", container, child, index);
        self.emit(Event::ChildrenChanged {
            parent: container,
            index,
            added: None,
            removed: Some(child),
        });
        self.clear_focus_within(child);
        self.update_valid(container);
        Ok(())
    }

    /// Installs a new layout and returns the old one.
    ///
    /// Existing children get default constraints from the new layout, unless the configured
    /// [`LayoutReplacement`] policy forbids replacing the layout of a populated container.
    pub fn set_layout<L: Layout>(
        &mut self,
        container: ComponentId,
        layout: L,
    ) -> Result<Box<dyn AnyLayout>, TreeError> {
        self.check_exists(container)?;
        let binding = self
            .layouts
            .get_mut(&container)
            .ok_or(TreeError::NotAContainer(container))?;
        let children = match self.stores.get(&container) {
            Some(store) => store.children(),
            None => Snapshot::default(),
        };
        if self.config.layout_replacement == LayoutReplacement::ForbidWhenPopulated
            && !children.is_empty()
        {
            return Err(TreeError::LayoutInUse(container));
        }

        let old = binding.replace(Box::new(layout), &children)?;
        log::debug!(
            "{}: layout {} replaced by {} ({} children re-constrained)",
            container,
            old.layout_name(),
            binding.layout().layout_name(),
            children.len()
        );
        self.emit(Event::LayoutChanged { container });
        Ok(old)
    }

    pub fn layout(&self, container: ComponentId) -> Option<&dyn AnyLayout> {
        self.layouts.get(&container).map(|binding| binding.layout())
    }

    /// The installed layout, if it is an `L`.
    pub fn layout_as<L: Layout>(&self, container: ComponentId) -> Option<&L> {
        self.layout(container)?.as_any().downcast_ref::<L>()
    }

    /// The constraints of a container’s child.
    pub fn constraints_of(&self, child: ComponentId) -> Option<&dyn Constraints> {
        let parent = self.links.parent(child)?;
        self.layouts.get(&parent)?.get(child)
    }

    pub fn constraints_as<C: Constraints>(&self, child: ComponentId) -> Option<&C> {
        self.constraints_of(child)?.constraints_any().downcast_ref::<C>()
    }

    /// Replaces a child’s constraints; they must fit the installed layout.
    pub fn set_constraints<C: Constraints>(
        &mut self,
        container: ComponentId,
        child: ComponentId,
        constraints: C,
    ) -> Result<(), TreeError> {
        self.check_exists(container)?;
        let binding = self
            .layouts
            .get_mut(&container)
            .ok_or(TreeError::NotAContainer(container))?;
        if self.links.parent(child) != Some(container) {
            return Err(TreeError::NotAMember {
                owner: container,
                child,
            });
        }
        let constraints = binding.resolve(Some(Box::new(constraints)))?;
        binding.insert(child, constraints);
        self.emit(Event::LayoutChanged { container });
        Ok(())
    }

    /// Whether the styling pass has run since the layout was last replaced.
    pub fn layout_theme_applied(&self, container: ComponentId) -> Result<bool, TreeError> {
        self.layouts
            .get(&container)
            .map(|binding| binding.theme_applied())
            .ok_or(TreeError::NotAContainer(container))
    }

    pub fn mark_layout_theme_applied(&mut self, container: ComponentId) -> Result<(), TreeError> {
        let binding = self
            .layouts
            .get_mut(&container)
            .ok_or(TreeError::NotAContainer(container))?;
        binding.set_theme_applied(true);
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------
    // Plain composites

    /// Mutates a composite’s store, whatever kind it is, and queues events for the difference.
    fn mutate_store<R, F>(&mut self, owner: ComponentId, f: F) -> Result<R, TreeError>
    where
        F: FnOnce(&mut dyn ChildStore, &mut Adoption) -> Result<R, TreeError>,
    {
        self.check_exists(owner)?;
        if self.layouts.contains_key(&owner) {
            return Err(TreeError::ContainerManaged(owner));
        }
        let store = self
            .stores
            .get_mut(&owner)
            .ok_or(TreeError::NotComposite(owner))?;

        let before: Vec<(ComponentId, usize)> = store
            .children()
            .iter()
            .map(|child| (*child, store.index_of(*child).unwrap_or(0)))
            .collect();
        let result = {
            let mut cx = Adoption::new(owner, &mut self.links, &self.components);
            f(&mut **store, &mut cx)
        };
        // a failed operation may still have changed something (e.g. a partial clear)
        let after = store.children();
        let added: Vec<(ComponentId, usize)> = after
            .iter()
            .filter(|child| !before.iter().any(|(c, _)| c == *child))
            .map(|child| (*child, store.index_of(*child).unwrap_or(0)))
            .collect();
        let removed: Vec<(ComponentId, usize)> = before
            .into_iter()
            .filter(|(child, _)| !after.contains(child))
            .collect();

        for (child, index) in &removed {
            log::debug!("{}: removed {} from {}", owner, child, index);
            self.emit(Event::ChildrenChanged {
                parent: owner,
                index: *index,
                added: None,
                removed: Some(*child),
            });
            self.clear_focus_within(*child);
        }
        for (child, index) in &added {
            log::debug!("{}: added {} at {}", owner, child, index);
            self.emit(Event::ChildrenChanged {
                parent: owner,
                index: *index,
                added: Some(*child),
                removed: None,
            });
        }
        if !removed.is_empty() || !added.is_empty() {
            self.update_valid(owner);
        }
        result
    }

    /// Typed mutable access to a composite’s store.
    ///
    /// Containers are refused; use the container operations for those.
    pub fn with_store<S, R, F>(&mut self, owner: ComponentId, f: F) -> Result<R, TreeError>
    where
        S: ChildStore,
        F: FnOnce(&mut S, &mut Adoption) -> Result<R, TreeError>,
    {
        self.mutate_store(owner, |store, cx| {
            let actual = store.kind();
            match store.as_any_mut().downcast_mut::<S>() {
                Some(store) => f(store, cx),
                None => Err(TreeError::WrongStore {
                    owner,
                    expected: any::type_name::<S>(),
                    actual,
                }),
            }
        })
    }

    /// Adds a child using the store’s default placement.
    pub fn add_child(&mut self, owner: ComponentId, child: ComponentId) -> Result<bool, TreeError> {
        self.mutate_store(owner, |store, cx| store.add(cx, child))
    }

    pub fn remove_child(&mut self, owner: ComponentId, child: ComponentId) -> Result<bool, TreeError> {
        self.mutate_store(owner, |store, cx| store.remove(cx, child))
    }

    pub fn clear_children(&mut self, owner: ComponentId) -> Result<(), TreeError> {
        self.mutate_store(owner, |store, cx| store.clear(cx))
    }

    /// Sets a slot of a [`FixedPositionalArray`] and returns the previous occupant.
    pub fn set_slot(
        &mut self,
        owner: ComponentId,
        index: usize,
        child: Option<ComponentId>,
    ) -> Result<Option<ComponentId>, TreeError> {
        self.with_store(owner, |store: &mut FixedPositionalArray, cx| {
            store.set(cx, index, child)
        })
    }

    pub fn slot(&self, owner: ComponentId, index: usize) -> Result<Option<ComponentId>, TreeError> {
        Ok(self.store::<FixedPositionalArray>(owner)?.get(index))
    }

    /// Sets a slot of an [`EnumIndexedArray`] and returns the previous occupant.
    pub fn set_key_slot<K: SlotKey>(
        &mut self,
        owner: ComponentId,
        key: K,
        child: Option<ComponentId>,
    ) -> Result<Option<ComponentId>, TreeError> {
        self.with_store(owner, |store: &mut EnumIndexedArray<K>, cx| {
            store.set(cx, key, child)
        })
    }

    pub fn key_slot<K: SlotKey>(&self, owner: ComponentId, key: K) -> Result<Option<ComponentId>, TreeError> {
        Ok(self.store::<EnumIndexedArray<K>>(owner)?.get(key))
    }

    /// Adds a child to a [`KeyedComponentMap`] under its identifier.
    pub fn insert_keyed(&mut self, owner: ComponentId, child: ComponentId) -> Result<bool, TreeError> {
        self.with_store(owner, |store: &mut KeyedComponentMap, cx| store.add(cx, child))
    }

    pub fn keyed(&self, owner: ComponentId, identifier: &str) -> Result<Option<ComponentId>, TreeError> {
        Ok(self.store::<KeyedComponentMap>(owner)?.get(identifier))
    }

    pub fn remove_keyed(
        &mut self,
        owner: ComponentId,
        identifier: &str,
    ) -> Result<Option<ComponentId>, TreeError> {
        self.with_store(owner, |store: &mut KeyedComponentMap, cx| {
            store.remove_identifier(cx, identifier)
        })
    }

    /// Stores a child and its state under `value` in a [`ValueKeyedStateMap`], detaching the
    /// component previously stored there.
    pub fn put_state<V, S>(
        &mut self,
        owner: ComponentId,
        value: V,
        child: ComponentId,
        state: S,
    ) -> Result<Option<ComponentId>, TreeError>
    where
        V: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
        S: fmt::Debug + Send + Sync + 'static,
    {
        self.with_store(owner, |store: &mut ValueKeyedStateMap<V, S>, cx| {
            store.put(cx, value, child, state)
        })
    }

    pub fn state<V, S>(&self, owner: ComponentId, value: &V) -> Result<Option<&ComponentState<S>>, TreeError>
    where
        V: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
        S: fmt::Debug + Send + Sync + 'static,
    {
        Ok(self.store::<ValueKeyedStateMap<V, S>>(owner)?.get(value))
    }

    pub fn remove_state<V, S>(
        &mut self,
        owner: ComponentId,
        value: &V,
    ) -> Result<Option<ComponentState<S>>, TreeError>
    where
        V: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
        S: fmt::Debug + Send + Sync + 'static,
    {
        self.with_store(owner, |store: &mut ValueKeyedStateMap<V, S>, cx| {
            store.remove_value(cx, value)
        })
    }

    pub fn clear_states<V, S>(&mut self, owner: ComponentId) -> Result<(), TreeError>
    where
        V: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
        S: fmt::Debug + Send + Sync + 'static,
    {
        self.with_store(owner, |store: &mut ValueKeyedStateMap<V, S>, cx| {
            store.clear_all(cx)
        })
    }

    // ---------------------------------------------------------------------------------------------
    // Lifecycle

    /// Removes a component from whatever holds it. Returns false if it has no parent.
    pub fn detach(&mut self, child: ComponentId) -> Result<bool, TreeError> {
        self.check_exists(child)?;
        let parent = match self.links.parent(child) {
            Some(parent) => parent,
            None => return Ok(false),
        };
        if self.layouts.contains_key(&parent) {
            self.remove(parent, child)?;
            Ok(true)
        } else {
            self.remove_child(parent, child)
        }
    }

    /// Drops a detached component and its whole subtree.
    pub fn destroy(&mut self, id: ComponentId) -> Result<(), TreeError> {
        self.check_exists(id)?;
        if id == self.application {
            return Err(TreeError::ApplicationFrame("destroyed"));
        }
        if self.links.parent(id).is_some() {
            return Err(TreeError::StillAttached(id));
        }

        let mut doomed = vec![id];
        doomed.extend(self.descendants(id));
        if let Some(open) = doomed.iter().find(|id| self.is_open(**id)) {
            return Err(TreeError::StillAttached(*open));
        }
        for id in &doomed {
            self.components.remove(id);
            self.stores.remove(id);
            self.layouts.remove(id);
            self.focus.remove(id);
            self.frames.remove(id);
            self.links.forget(*id);
            self.listeners.remove_component(*id);
        }
        log::debug!("destroyed {} ({} components)", id, doomed.len());
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------
    // Events

    /// Registers a handler for one kind of event on one component.
    pub fn listen(&mut self, source: ComponentId, kind: EventKind, handler: EventHandler) -> ListenerId {
        self.listeners.add_handler(source, kind, handler)
    }

    /// Registers a handler for one kind of event on any component.
    pub fn listen_all(&mut self, kind: EventKind, handler: EventHandler) -> ListenerId {
        self.listeners.add_global_handler(kind, handler)
    }

    /// Registers a handler that may refuse value changes on `target` (or focus changes, if it’s
    /// a focus group).
    pub fn add_veto_listener(&mut self, target: ComponentId, handler: VetoHandler) -> ListenerId {
        self.listeners.add_veto(target, handler)
    }

    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub(crate) fn emit(&self, event: Event) {
        self.queue.push(event);
    }

    /// Delivers all queued events in the order they were queued. Returns how many there were.
    pub fn dispatch_events(&self) -> usize {
        let mut count = 0;
        while let Some(event) = self.queue.pop() {
            self.listeners.deliver(&event);
            count += 1;
        }
        count
    }

    /// Takes all queued events without delivering them.
    pub fn drain_events(&self) -> Vec<Event> {
        let mut events = Vec::with_capacity(self.queue.len());
        while let Some(event) = self.queue.pop() {
            events.push(event);
        }
        events
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Sets a free-form property, queueing a change event if the value differs.
    pub fn set_property(
        &mut self,
        id: ComponentId,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), TreeError> {
        let name = name.into();
        let value = value.into();
        let component = self.component_mut(id)?;
        let old = component.properties.insert(name.clone(), value.clone());
        if old.as_ref() != Some(&value) {
            self.emit(Event::PropertyChanged {
                component: id,
                property: name,
                old,
                new: value,
            });
        }
        Ok(())
    }

    pub fn property(&self, id: ComponentId, name: &str) -> Option<&Value> {
        self.components.get(&id)?.property(name)
    }
}

impl Default for ComponentTree {
    fn default() -> Self {
        ComponentTree::new()
    }
}

impl fmt::Debug for ComponentTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ComponentTree")
            .field("application", &self.application)
            .field("components", &self.components.len())
            .field("z_order", &self.z_order)
            .field("pending_events", &self.queue.len())
            .finish()
    }
}

/// The ordered list every container stores its children in.
fn container_store(
    stores: &mut HashMap<ComponentId, Box<dyn ChildStore>>,
    container: ComponentId,
) -> &mut OrderedChildList {
    stores
        .get_mut(&container)
        .and_then(|store| store.as_any_mut().downcast_mut::<OrderedChildList>())
        .expect("container has no ordered child list")
}

#[test]
fn test_container_add_remove() {
    let mut tree = ComponentTree::new();
    let panel = tree.create_container(Component::new("panel"), FlowLayout::default());
    let a = tree.create(Component::new("a"));
    let b = tree.create(Component::new("b"));

    assert_eq!(tree.add(panel, a), Ok(true));
    assert_eq!(tree.add(panel, a), Ok(false), "second add is a no-op");
    assert_eq!(tree.insert(panel, 0, b), Ok(true));
    assert_eq!(*tree.children(panel), vec![b, a]);
    assert_eq!(tree.parent(a), Some(panel));
    assert!(tree.constraints_as::<crate::layout::FlowConstraints>(a).is_some());

    let events = tree.drain_events();
    assert_eq!(
        events,
        vec![
            Event::ChildrenChanged {
                parent: panel,
                index: 0,
                added: Some(a),
                removed: None
            },
            Event::ChildrenChanged {
                parent: panel,
                index: 0,
                added: Some(b),
                removed: None
            },
        ]
    );

    tree.remove(panel, a).unwrap();
    assert_eq!(tree.parent(a), None);
    assert!(tree.constraints_of(a).is_none());
    assert_eq!(
        tree.remove(panel, a),
        Err(TreeError::NotAMember {
            owner: panel,
            child: a
        })
    );
    assert_eq!(
        tree.drain_events(),
        vec![Event::ChildrenChanged {
            parent: panel,
            index: 1,
            added: None,
            removed: Some(a)
        }]
    );
}

#[test]
fn test_container_add_checks_before_mutating() {
    use crate::layout::{BorderLayout, Region};

    let mut tree = ComponentTree::new();
    let panel = tree.create_container(Component::new("panel"), BorderLayout);
    let other = tree.create_container(Component::new("other"), FlowLayout::default());
    let a = tree.create(Component::new("a"));

    assert_eq!(
        tree.add(panel, a),
        Err(TreeError::NoDefaultConstraints { layout: "border" })
    );
    assert!(tree.add_with(panel, a, 5_u8).is_err(), "wrong constraint type");
    assert_eq!(tree.parent(a), None, "failed adds must not parent the child");
    assert!(!tree.has_children(panel));

    tree.add_with(panel, a, Region::West).unwrap();
    assert_eq!(tree.constraints_as::<Region>(a), Some(&Region::West));
    assert_eq!(
        tree.add(other, a),
        Err(TreeError::AlreadyParented {
            child: a,
            parent: panel
        })
    );
    assert_eq!(
        tree.add_with(panel, panel, Region::North),
        Err(TreeError::Cycle {
            owner: panel,
            child: panel
        }),
        "a container can’t contain itself"
    );
}

#[test]
fn test_store_operations_refuse_containers() {
    let mut tree = ComponentTree::new();
    let panel = tree.create_container(Component::new("panel"), FlowLayout::default());
    let a = tree.create(Component::new("a"));
    assert_eq!(tree.add_child(panel, a), Err(TreeError::ContainerManaged(panel)));

    let leaf = tree.create(Component::new("leaf"));
    assert_eq!(tree.add_child(leaf, a), Err(TreeError::NotComposite(leaf)));

    let slots = tree.create_composite(Component::new("slots"), FixedPositionalArray::new(2));
    assert!(matches!(
        tree.insert_keyed(slots, a),
        Err(TreeError::WrongStore {
            actual: "positional array",
            ..
        })
    ));
}

#[test]
fn test_store_mutation_events() {
    let mut tree = ComponentTree::new();
    let slots = tree.create_composite(Component::new("slots"), FixedPositionalArray::new(3));
    let a = tree.create(Component::new("a"));
    let b = tree.create(Component::new("b"));

    tree.set_slot(slots, 2, Some(a)).unwrap();
    assert_eq!(tree.set_slot(slots, 2, Some(a)), Ok(Some(a)));
    assert_eq!(tree.drain_events().len(), 1, "setting the same occupant queues nothing");

    assert_eq!(tree.set_slot(slots, 2, Some(b)), Ok(Some(a)));
    assert_eq!(
        tree.drain_events(),
        vec![
            Event::ChildrenChanged {
                parent: slots,
                index: 2,
                added: None,
                removed: Some(a)
            },
            Event::ChildrenChanged {
                parent: slots,
                index: 2,
                added: Some(b),
                removed: None
            },
        ],
        "removal comes first"
    );
    assert_eq!(tree.slot(slots, 2), Ok(Some(b)));
    assert_eq!(tree.parent(a), None);
}

#[test]
fn test_detach_and_destroy() {
    let mut tree = ComponentTree::new();
    let panel = tree.create_container(Component::new("panel"), FlowLayout::default());
    let inner = tree.create_composite(Component::new("inner"), OrderedChildList::new());
    let leaf = tree.create(Component::new("leaf"));
    tree.add(panel, inner).unwrap();
    tree.add_child(inner, leaf).unwrap();

    assert_eq!(tree.descendants(panel), vec![inner, leaf]);
    assert_eq!(tree.destroy(inner), Err(TreeError::StillAttached(inner)));

    assert_eq!(tree.detach(inner), Ok(true));
    assert_eq!(tree.detach(inner), Ok(false));
    tree.destroy(inner).unwrap();
    assert!(!tree.contains(inner));
    assert!(!tree.contains(leaf), "destroy takes the subtree with it");
    assert_eq!(
        tree.destroy(tree.application_frame()),
        Err(TreeError::ApplicationFrame("destroyed"))
    );
}

#[test]
fn test_property_events() {
    let mut tree = ComponentTree::new();
    let a = tree.create(Component::new("a"));
    tree.set_property(a, "title", "Hello").unwrap();
    tree.set_property(a, "title", "Hello").unwrap();
    assert_eq!(tree.property(a, "title"), Some(&Value::from("Hello")));
    assert_eq!(
        tree.drain_events(),
        vec![Event::PropertyChanged {
            component: a,
            property: "title".to_string(),
            old: None,
            new: Value::from("Hello")
        }],
        "unchanged values queue nothing"
    );
}

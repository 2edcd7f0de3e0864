use super::{Adoption, ChildStore, Snapshot};
use crate::component::ComponentId;
use crate::error::TreeError;
use core::any::Any;
use core::fmt;
use core::hash::Hash;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Children keyed by their identifier.
///
/// No two children may share an identifier.
#[derive(Debug, Default, Clone)]
pub struct KeyedComponentMap {
    entries: BTreeMap<String, ComponentId>,
}

impl KeyedComponentMap {
    pub fn new() -> KeyedComponentMap {
        KeyedComponentMap::default()
    }

    pub fn get(&self, identifier: &str) -> Option<ComponentId> {
        self.entries.get(identifier).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes whatever is stored under an identifier.
    pub fn remove_identifier(
        &mut self,
        cx: &mut Adoption,
        identifier: &str,
    ) -> Result<Option<ComponentId>, TreeError> {
        let child = match self.entries.get(identifier) {
            Some(child) => *child,
            None => return Ok(None),
        };
        cx.release(child)?;
        self.entries.remove(identifier);
        Ok(Some(child))
    }
}

impl ChildStore for KeyedComponentMap {
    fn kind(&self) -> &'static str {
        "keyed map"
    }

    fn add(&mut self, cx: &mut Adoption, child: ComponentId) -> Result<bool, TreeError> {
        let identifier = cx.identifier(child)?;
        match self.entries.get(identifier) {
            Some(existing) if *existing == child => return Ok(false),
            Some(existing) => {
                return Err(TreeError::DuplicateIdentifier {
                    identifier: identifier.to_string(),
                    existing: *existing,
                })
            }
            None => (),
        }
        cx.adopt(child)?;
        self.entries.insert(identifier.to_string(), child);
        Ok(true)
    }

    fn remove(&mut self, cx: &mut Adoption, child: ComponentId) -> Result<bool, TreeError> {
        let identifier = cx.identifier(child)?;
        match self.entries.get(identifier) {
            None => Ok(false),
            Some(stored) if *stored != child => Err(TreeError::IdentifierMismatch {
                identifier: identifier.to_string(),
                stored: *stored,
                requested: child,
            }),
            Some(_) => {
                cx.release(child)?;
                self.entries.remove(identifier);
                Ok(true)
            }
        }
    }

    /// Children in identifier order.
    fn children(&self) -> Snapshot {
        Arc::new(self.entries.values().copied().collect())
    }

    fn has_children(&self) -> bool {
        !self.entries.is_empty()
    }

    fn contains(&self, child: ComponentId) -> bool {
        self.entries.values().any(|c| *c == child)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A child component together with the state a [`ValueKeyedStateMap`] keeps for it.
#[derive(Debug, Clone)]
pub struct ComponentState<S> {
    component: ComponentId,
    pub state: S,
}

impl<S> ComponentState<S> {
    pub fn component(&self) -> ComponentId {
        self.component
    }
}

/// Children keyed by a domain value, each wrapped with some per-value state.
///
/// Typical use is one row component per item of a model list, keyed by the item.
pub struct ValueKeyedStateMap<V, S> {
    entries: HashMap<V, ComponentState<S>>,
}

impl<V, S> ValueKeyedStateMap<V, S>
where
    V: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
    S: fmt::Debug + Send + Sync + 'static,
{
    pub fn new() -> Self {
        ValueKeyedStateMap {
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, value: &V) -> Option<&ComponentState<S>> {
        self.entries.get(value)
    }

    pub fn get_mut(&mut self, value: &V) -> Option<&mut ComponentState<S>> {
        self.entries.get_mut(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores `component` and `state` under `value`, returning the component it replaced.
    ///
    /// The replaced component is released before the new one is adopted.
    pub fn put(
        &mut self,
        cx: &mut Adoption,
        value: V,
        component: ComponentId,
        state: S,
    ) -> Result<Option<ComponentId>, TreeError> {
        let previous = self.entries.get(&value).map(|entry| entry.component);
        if previous == Some(component) {
            if let Some(entry) = self.entries.get_mut(&value) {
                entry.state = state;
            }
            return Ok(previous);
        }
        cx.check(component)?;

        if let Some(previous) = previous {
            cx.release(previous)?;
            self.entries.remove(&value);
        }
        cx.adopt(component)?;
        self.entries.insert(value, ComponentState { component, state });
        Ok(previous)
    }

    /// Removes the entry for `value`, returning its component and state.
    pub fn remove_value(
        &mut self,
        cx: &mut Adoption,
        value: &V,
    ) -> Result<Option<ComponentState<S>>, TreeError> {
        let component = match self.entries.get(value) {
            Some(entry) => entry.component,
            None => return Ok(None),
        };
        cx.release(component)?;
        Ok(self.entries.remove(value))
    }

    /// Removes every entry, releasing each component.
    pub fn clear_all(&mut self, cx: &mut Adoption) -> Result<(), TreeError> {
        let values: Vec<V> = self.entries.keys().cloned().collect();
        for value in values {
            self.remove_value(cx, &value)?;
        }
        Ok(())
    }

    fn value_of(&self, component: ComponentId) -> Option<&V> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.component == component)
            .map(|(value, _)| value)
    }
}

impl<V, S> Default for ValueKeyedStateMap<V, S>
where
    V: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
    S: fmt::Debug + Send + Sync + 'static,
{
    fn default() -> Self {
        ValueKeyedStateMap::new()
    }
}

impl<V: fmt::Debug, S: fmt::Debug> fmt::Debug for ValueKeyedStateMap<V, S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<V, S> ChildStore for ValueKeyedStateMap<V, S>
where
    V: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
    S: fmt::Debug + Send + Sync + 'static,
{
    fn kind(&self) -> &'static str {
        "value-keyed map"
    }

    /// Always fails: there’s no value to key the child by. Use [`ValueKeyedStateMap::put`].
    fn add(&mut self, _: &mut Adoption, _: ComponentId) -> Result<bool, TreeError> {
        Err(TreeError::KeyRequired { store: self.kind() })
    }

    fn remove(&mut self, cx: &mut Adoption, child: ComponentId) -> Result<bool, TreeError> {
        let value = match self.value_of(child) {
            Some(value) => value.clone(),
            None => return Ok(false),
        };
        self.remove_value(cx, &value)?;
        Ok(true)
    }

    /// Children in no particular order.
    fn children(&self) -> Snapshot {
        Arc::new(self.entries.values().map(|entry| entry.component).collect())
    }

    fn has_children(&self) -> bool {
        !self.entries.is_empty()
    }

    fn contains(&self, child: ComponentId) -> bool {
        self.value_of(child).is_some()
    }

    fn clear(&mut self, cx: &mut Adoption) -> Result<(), TreeError> {
        self.clear_all(cx)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[test]
fn test_keyed_duplicate_identifier() {
    let mut fx = super::testing::Fixture::new();
    let owner = fx.owner();
    let first = fx.component("x");
    let second = fx.component("x");
    let mut map = KeyedComponentMap::new();

    assert_eq!(map.add(&mut fx.cx(), first), Ok(true));
    assert_eq!(map.add(&mut fx.cx(), first), Ok(false));
    assert_eq!(
        map.add(&mut fx.cx(), second),
        Err(TreeError::DuplicateIdentifier {
            identifier: "x".to_string(),
            existing: first
        })
    );
    assert_eq!(map.get("x"), Some(first), "map should be unchanged");
    assert_eq!(map.len(), 1);
    assert_eq!(fx.parent(second), None);
    assert_eq!(fx.parent(first), Some(owner));
}

#[test]
fn test_keyed_remove_wrong_entity() {
    let mut fx = super::testing::Fixture::new();
    let first = fx.component("x");
    let impostor = fx.component("x");
    let mut map = KeyedComponentMap::new();
    map.add(&mut fx.cx(), first).unwrap();

    assert_eq!(
        map.remove(&mut fx.cx(), impostor),
        Err(TreeError::IdentifierMismatch {
            identifier: "x".to_string(),
            stored: first,
            requested: impostor
        }),
        "must not remove a different component stored under the same identifier"
    );
    assert!(map.contains(first));

    assert_eq!(map.remove_identifier(&mut fx.cx(), "x"), Ok(Some(first)));
    assert_eq!(fx.parent(first), None);
    assert!(!map.has_children());
}

#[test]
fn test_value_keyed_replace() {
    let mut fx = super::testing::Fixture::new();
    let owner = fx.owner();
    let old_row = fx.component("row");
    let new_row = fx.component("row");
    let mut map = ValueKeyedStateMap::<u32, &'static str>::new();

    assert_eq!(map.put(&mut fx.cx(), 7, old_row, "collapsed"), Ok(None));
    assert_eq!(
        map.put(&mut fx.cx(), 7, new_row, "expanded"),
        Ok(Some(old_row))
    );
    assert_eq!(fx.parent(old_row), None, "replaced component must be detached");
    assert_eq!(fx.parent(new_row), Some(owner));
    assert_eq!(map.get(&7).unwrap().state, "expanded");
    assert_eq!(map.len(), 1);

    assert_eq!(
        map.add(&mut fx.cx(), old_row),
        Err(TreeError::KeyRequired {
            store: "value-keyed map"
        })
    );
}

#[test]
fn test_value_keyed_rejects_second_key_for_same_component() {
    let mut fx = super::testing::Fixture::new();
    let owner = fx.owner();
    let row = fx.component("row");
    let mut map = ValueKeyedStateMap::<u32, ()>::new();
    map.put(&mut fx.cx(), 1, row, ()).unwrap();

    assert_eq!(
        map.put(&mut fx.cx(), 2, row, ()),
        Err(TreeError::AlreadyParented {
            child: row,
            parent: owner
        })
    );
    assert_eq!(map.len(), 1);
}

#[test]
fn test_value_keyed_clear_all() {
    let mut fx = super::testing::Fixture::new();
    let rows: Vec<_> = (0..3).map(|i| fx.component(&format!("row{}", i))).collect();
    let mut map = ValueKeyedStateMap::<usize, ()>::new();
    for (i, row) in rows.iter().enumerate() {
        map.put(&mut fx.cx(), i, *row, ()).unwrap();
    }

    map.clear(&mut fx.cx()).unwrap();
    assert!(map.is_empty());
    for row in rows {
        assert_eq!(fx.parent(row), None, "clearing must null every parent link");
    }
}

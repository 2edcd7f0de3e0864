//! Child stores.
//!
//! Every composite component keeps its children in exactly one store, chosen when the composite
//! is created. Stores only hold [`ComponentId`]s; the components themselves live in the tree.
//!
//! Stores never touch parent links directly. They go through [`Adoption`], which checks the
//! ownership rules and sets or clears the parent link; a store must call `adopt` before it records
//! a child and `release` before it forgets one, and must not fail in between, so no one can observe
//! a child that is stored but parentless (or the other way around).

use crate::component::{Component, ComponentId};
use crate::error::TreeError;
use core::any::Any;
use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

mod keyed;
mod ordered;
mod positional;

pub use keyed::{ComponentState, KeyedComponentMap, ValueKeyedStateMap};
pub use ordered::OrderedChildList;
pub use positional::{EnumIndexedArray, FixedPositionalArray, SlotKey};

/// An immutable snapshot of a store’s children, in store order.
///
/// Holding one never blocks writers; later mutations are not visible through it.
pub type Snapshot = Arc<Vec<ComponentId>>;

/// Storage strategy for a composite’s children.
pub trait ChildStore: Any + fmt::Debug + Send + Sync {
    /// Short name used in error messages.
    fn kind(&self) -> &'static str;

    /// Adds a child using the store’s default placement.
    ///
    /// Returns false if the child is already in this store.
    fn add(&mut self, cx: &mut Adoption, child: ComponentId) -> Result<bool, TreeError>;

    /// Removes a child. Returns false if it isn’t in this store.
    fn remove(&mut self, cx: &mut Adoption, child: ComponentId) -> Result<bool, TreeError>;

    fn children(&self) -> Snapshot;

    fn has_children(&self) -> bool;

    fn contains(&self, child: ComponentId) -> bool;

    /// Position of a child, in whatever terms the store uses (list index, slot index).
    fn index_of(&self, child: ComponentId) -> Option<usize> {
        self.children().iter().position(|c| *c == child)
    }

    /// Removes every child, one at a time.
    fn clear(&mut self, cx: &mut Adoption) -> Result<(), TreeError> {
        for child in self.children().iter() {
            self.remove(cx, *child)?;
        }
        Ok(())
    }

    /// For downcasting.
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Parent back-references, keyed by child.
///
/// A parent never owns its children through this map; it only records who holds whom.
#[derive(Debug, Default)]
pub(crate) struct ParentLinks {
    parents: HashMap<ComponentId, ComponentId>,
}

impl ParentLinks {
    pub(crate) fn parent(&self, child: ComponentId) -> Option<ComponentId> {
        self.parents.get(&child).copied()
    }

    /// True if `ancestor` is `id` or one of its ancestors.
    pub(crate) fn is_ancestor_or_self(&self, ancestor: ComponentId, id: ComponentId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Drops the link of a component that no longer exists.
    pub(crate) fn forget(&mut self, id: ComponentId) {
        self.parents.remove(&id);
    }

    /// The topmost ancestor (or `id` itself if it has no parent).
    pub(crate) fn root(&self, id: ComponentId) -> ComponentId {
        let mut id = id;
        while let Some(parent) = self.parent(id) {
            id = parent;
        }
        id
    }
}

/// Ownership bookkeeping handed to a store while it mutates.
pub struct Adoption<'a> {
    owner: ComponentId,
    links: &'a mut ParentLinks,
    components: &'a HashMap<ComponentId, Component>,
}

impl<'a> Adoption<'a> {
    pub(crate) fn new(
        owner: ComponentId,
        links: &'a mut ParentLinks,
        components: &'a HashMap<ComponentId, Component>,
    ) -> Adoption<'a> {
        Adoption {
            owner,
            links,
            components,
        }
    }

    /// The composite whose store is being mutated.
    pub fn owner(&self) -> ComponentId {
        self.owner
    }

    /// Current parent of a component.
    pub fn parent(&self, child: ComponentId) -> Option<ComponentId> {
        self.links.parent(child)
    }

    /// Checks whether `adopt` would succeed, without changing anything.
    pub fn check(&self, child: ComponentId) -> Result<(), TreeError> {
        match self.components.get(&child) {
            None => return Err(TreeError::UnknownComponent(child)),
            Some(component) if component.frame => return Err(TreeError::FrameChild(child)),
            Some(_) => (),
        }
        if let Some(parent) = self.links.parent(child) {
            return Err(TreeError::AlreadyParented { child, parent });
        }
        if self.links.is_ancestor_or_self(child, self.owner) {
            return Err(TreeError::Cycle {
                owner: self.owner,
                child,
            });
        }
        Ok(())
    }

    /// Makes the owner the child’s parent.
    pub fn adopt(&mut self, child: ComponentId) -> Result<(), TreeError> {
        self.check(child)?;
        self.links.parents.insert(child, self.owner);
        Ok(())
    }

    /// Clears the child’s parent link; the owner must be its parent.
    pub fn release(&mut self, child: ComponentId) -> Result<(), TreeError> {
        match self.links.parent(child) {
            Some(parent) if parent == self.owner => {
                self.links.parents.remove(&child);
                Ok(())
            }
            _ => Err(TreeError::NotAMember {
                owner: self.owner,
                child,
            }),
        }
    }

    /// The child’s identifier, for stores that key by it.
    pub fn identifier(&self, child: ComponentId) -> Result<&'a str, TreeError> {
        let components: &'a HashMap<ComponentId, Component> = self.components;
        components
            .get(&child)
            .map(|c| c.identifier.as_str())
            .ok_or(TreeError::UnknownComponent(child))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A bare set of components and links for exercising stores without a tree.
    #[derive(Default)]
    pub(crate) struct Fixture {
        pub(crate) links: ParentLinks,
        pub(crate) components: HashMap<ComponentId, Component>,
        pub(crate) owner: Option<ComponentId>,
    }

    impl Fixture {
        pub(crate) fn new() -> Fixture {
            let mut fixture = Fixture::default();
            fixture.owner = Some(fixture.component("owner"));
            fixture
        }

        pub(crate) fn component(&mut self, identifier: &str) -> ComponentId {
            let component = Component::new(identifier);
            let id = component.id();
            self.components.insert(id, component);
            id
        }

        pub(crate) fn owner(&self) -> ComponentId {
            self.owner.expect("fixture has an owner")
        }

        pub(crate) fn cx(&mut self) -> Adoption<'_> {
            let owner = self.owner();
            Adoption::new(owner, &mut self.links, &self.components)
        }

        pub(crate) fn parent(&self, id: ComponentId) -> Option<ComponentId> {
            self.links.parent(id)
        }
    }
}

#[test]
fn test_adoption_rules() {
    let mut fx = testing::Fixture::new();
    let owner = fx.owner();
    let child = fx.component("child");
    let stranger = ComponentId::new();

    assert_eq!(
        fx.cx().adopt(stranger),
        Err(TreeError::UnknownComponent(stranger))
    );
    assert_eq!(
        fx.cx().adopt(owner),
        Err(TreeError::Cycle {
            owner,
            child: owner
        }),
        "a component can’t be its own child"
    );

    fx.cx().adopt(child).unwrap();
    assert_eq!(fx.parent(child), Some(owner));
    assert_eq!(
        fx.cx().adopt(child),
        Err(TreeError::AlreadyParented {
            child,
            parent: owner
        })
    );

    fx.cx().release(child).unwrap();
    assert_eq!(fx.parent(child), None);
    assert_eq!(
        fx.cx().release(child),
        Err(TreeError::NotAMember { owner, child })
    );
}

#[test]
fn test_adoption_rejects_ancestors() {
    let mut fx = testing::Fixture::new();
    let owner = fx.owner();
    let grandparent = fx.component("grandparent");
    fx.links.parents.insert(owner, grandparent);

    assert_eq!(
        fx.cx().adopt(grandparent),
        Err(TreeError::Cycle {
            owner,
            child: grandparent
        }),
        "adopting an ancestor must fail as a cycle"
    );
    assert_eq!(fx.links.root(owner), grandparent);
}

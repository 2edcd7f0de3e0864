use super::{Adoption, ChildStore, Snapshot};
use crate::component::ComponentId;
use crate::error::TreeError;
use core::any::Any;
use std::sync::Arc;

/// Children in insertion order.
///
/// Mutation copies the list if a snapshot of it is still alive, so readers holding a
/// [`Snapshot`] always see the list as it was when they took it.
#[derive(Debug, Default, Clone)]
pub struct OrderedChildList {
    items: Arc<Vec<ComponentId>>,
}

impl OrderedChildList {
    pub fn new() -> OrderedChildList {
        OrderedChildList::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ComponentId> {
        self.items.get(index).copied()
    }

    /// Inserts a child at `index` (clamped to the end of the list).
    pub fn insert(
        &mut self,
        cx: &mut Adoption,
        index: usize,
        child: ComponentId,
    ) -> Result<bool, TreeError> {
        if self.contains(child) {
            return Ok(false);
        }
        cx.adopt(child)?;
        let items = Arc::make_mut(&mut self.items);
        let index = index.min(items.len());
        items.insert(index, child);
        Ok(true)
    }

    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.items)
    }
}

impl ChildStore for OrderedChildList {
    fn kind(&self) -> &'static str {
        "ordered list"
    }

    fn add(&mut self, cx: &mut Adoption, child: ComponentId) -> Result<bool, TreeError> {
        let end = self.items.len();
        self.insert(cx, end, child)
    }

    fn remove(&mut self, cx: &mut Adoption, child: ComponentId) -> Result<bool, TreeError> {
        let index = match self.items.iter().position(|c| *c == child) {
            Some(index) => index,
            None => return Ok(false),
        };
        cx.release(child)?;
        Arc::make_mut(&mut self.items).remove(index);
        Ok(true)
    }

    fn children(&self) -> Snapshot {
        self.snapshot()
    }

    fn has_children(&self) -> bool {
        !self.items.is_empty()
    }

    fn contains(&self, child: ComponentId) -> bool {
        self.items.contains(&child)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[test]
fn test_ordered_add_remove() {
    let mut fx = super::testing::Fixture::new();
    let owner = fx.owner();
    let a = fx.component("a");
    let b = fx.component("b");
    let mut list = OrderedChildList::new();

    assert_eq!(list.add(&mut fx.cx(), a), Ok(true));
    assert_eq!(list.add(&mut fx.cx(), a), Ok(false), "second add is a no-op");
    assert_eq!(list.insert(&mut fx.cx(), 0, b), Ok(true));
    assert_eq!(*list.children(), vec![b, a]);
    assert_eq!(fx.parent(a), Some(owner));
    assert_eq!(list.index_of(a), Some(1));

    assert_eq!(list.remove(&mut fx.cx(), b), Ok(true));
    assert_eq!(list.remove(&mut fx.cx(), b), Ok(false));
    assert_eq!(fx.parent(b), None, "removal must clear the parent");
    assert_eq!(*list.children(), vec![a]);
}

#[test]
fn test_ordered_snapshot_is_stable() {
    let mut fx = super::testing::Fixture::new();
    let a = fx.component("a");
    let b = fx.component("b");
    let mut list = OrderedChildList::new();
    list.add(&mut fx.cx(), a).unwrap();

    let before = list.children();
    list.add(&mut fx.cx(), b).unwrap();
    list.remove(&mut fx.cx(), a).unwrap();

    assert_eq!(*before, vec![a], "snapshot should not see later mutations");
    assert_eq!(*list.children(), vec![b]);
}

#[test]
fn test_ordered_add_failure_leaves_list_alone() {
    let mut fx = super::testing::Fixture::new();
    let owner = fx.owner();
    let mut list = OrderedChildList::new();
    assert!(list.add(&mut fx.cx(), owner).is_err());
    assert!(!list.has_children(), "failed add must not record the child");
}

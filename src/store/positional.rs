use super::{Adoption, ChildStore, Snapshot};
use crate::component::ComponentId;
use crate::error::TreeError;
use core::any::Any;
use core::fmt;
use core::marker::PhantomData;
use std::sync::Arc;

/// A fixed number of nullable slots.
#[derive(Debug, Clone)]
pub struct FixedPositionalArray {
    slots: Box<[Option<ComponentId>]>,
}

impl FixedPositionalArray {
    pub fn new(capacity: usize) -> FixedPositionalArray {
        FixedPositionalArray {
            slots: vec![None; capacity].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The occupant of a slot; `None` for empty or out-of-range slots.
    pub fn get(&self, index: usize) -> Option<ComponentId> {
        self.slots.get(index).copied().flatten()
    }

    /// Puts `child` (or nothing) into a slot and returns the previous occupant.
    ///
    /// Setting a slot to its current occupant does nothing.
    pub fn set(
        &mut self,
        cx: &mut Adoption,
        index: usize,
        child: Option<ComponentId>,
    ) -> Result<Option<ComponentId>, TreeError> {
        let capacity = self.slots.len();
        let previous = match self.slots.get(index) {
            Some(previous) => *previous,
            None => return Err(TreeError::SlotOutOfRange { index, capacity }),
        };
        if previous == child {
            return Ok(previous);
        }
        if let Some(child) = child {
            cx.check(child)?;
        }

        if let Some(previous) = previous {
            cx.release(previous)?;
            self.slots[index] = None;
        }
        if let Some(child) = child {
            cx.adopt(child)?;
            self.slots[index] = Some(child);
        }
        Ok(previous)
    }
}

impl ChildStore for FixedPositionalArray {
    fn kind(&self) -> &'static str {
        "positional array"
    }

    /// Fills the lowest free slot.
    fn add(&mut self, cx: &mut Adoption, child: ComponentId) -> Result<bool, TreeError> {
        if self.contains(child) {
            return Ok(false);
        }
        let index = match self.slots.iter().position(Option::is_none) {
            Some(index) => index,
            None => {
                return Err(TreeError::NoFreeSlot {
                    capacity: self.slots.len(),
                })
            }
        };
        self.set(cx, index, Some(child))?;
        Ok(true)
    }

    fn remove(&mut self, cx: &mut Adoption, child: ComponentId) -> Result<bool, TreeError> {
        match self.index_of(child) {
            Some(index) => {
                self.set(cx, index, None)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Occupied slots in slot order.
    fn children(&self) -> Snapshot {
        Arc::new(self.slots.iter().filter_map(|slot| *slot).collect())
    }

    fn has_children(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }

    fn contains(&self, child: ComponentId) -> bool {
        self.slots.contains(&Some(child))
    }

    /// The slot index, not the position among occupied slots.
    fn index_of(&self, child: ComponentId) -> Option<usize> {
        self.slots.iter().position(|slot| *slot == Some(child))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A closed set of slot names.
///
/// Use [`impl_slot_key!`](crate::impl_slot_key) for fieldless enums.
pub trait SlotKey: Copy + fmt::Debug + Send + Sync + 'static {
    /// Number of variants.
    const COUNT: usize;

    /// Slot index of this variant, in `0..COUNT`.
    fn index(self) -> usize;
}

/// Implements [`SlotKey`] for a fieldless enum by listing its variants in slot order.
///
/// ```
/// #[derive(Debug, Clone, Copy)]
/// enum Edge { Leading, Trailing }
/// perch::impl_slot_key!(Edge { Leading, Trailing });
/// ```
#[macro_export]
macro_rules! impl_slot_key {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::store::SlotKey for $ty {
            const COUNT: usize = [$($ty::$variant),+].len();

            fn index(self) -> usize {
                [$($ty::$variant),+]
                    .iter()
                    .position(|v| ::core::mem::discriminant(v) == ::core::mem::discriminant(&self))
                    .expect("variant listed in impl_slot_key")
            }
        }
    };
}

/// A positional array addressed by an enum instead of raw indices.
pub struct EnumIndexedArray<K: SlotKey> {
    inner: FixedPositionalArray,
    _key: PhantomData<fn() -> K>,
}

impl<K: SlotKey> EnumIndexedArray<K> {
    pub fn new() -> EnumIndexedArray<K> {
        EnumIndexedArray {
            inner: FixedPositionalArray::new(K::COUNT),
            _key: PhantomData,
        }
    }

    pub fn get(&self, key: K) -> Option<ComponentId> {
        self.inner.get(key.index())
    }

    /// Same as [`FixedPositionalArray::set`].
    pub fn set(
        &mut self,
        cx: &mut Adoption,
        key: K,
        child: Option<ComponentId>,
    ) -> Result<Option<ComponentId>, TreeError> {
        self.inner.set(cx, key.index(), child)
    }
}

impl<K: SlotKey> Default for EnumIndexedArray<K> {
    fn default() -> Self {
        EnumIndexedArray::new()
    }
}

impl<K: SlotKey> fmt::Debug for EnumIndexedArray<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EnumIndexedArray")
            .field("key", &core::any::type_name::<K>())
            .field("slots", &self.inner.slots)
            .finish()
    }
}

impl<K: SlotKey> ChildStore for EnumIndexedArray<K> {
    fn kind(&self) -> &'static str {
        "enum-indexed array"
    }

    fn add(&mut self, cx: &mut Adoption, child: ComponentId) -> Result<bool, TreeError> {
        self.inner.add(cx, child)
    }

    fn remove(&mut self, cx: &mut Adoption, child: ComponentId) -> Result<bool, TreeError> {
        self.inner.remove(cx, child)
    }

    fn children(&self) -> Snapshot {
        self.inner.children()
    }

    fn has_children(&self) -> bool {
        self.inner.has_children()
    }

    fn contains(&self, child: ComponentId) -> bool {
        self.inner.contains(child)
    }

    fn index_of(&self, child: ComponentId) -> Option<usize> {
        self.inner.index_of(child)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[test]
fn test_positional_set() {
    let mut fx = super::testing::Fixture::new();
    let owner = fx.owner();
    let a = fx.component("a");
    let b = fx.component("b");
    let mut slots = FixedPositionalArray::new(2);

    assert_eq!(slots.set(&mut fx.cx(), 1, Some(a)), Ok(None));
    assert_eq!(fx.parent(a), Some(owner));
    assert_eq!(
        slots.set(&mut fx.cx(), 1, Some(a)),
        Ok(Some(a)),
        "same occupant is a no-op"
    );
    assert_eq!(fx.parent(a), Some(owner));

    assert_eq!(slots.set(&mut fx.cx(), 1, Some(b)), Ok(Some(a)));
    assert_eq!(fx.parent(a), None, "replaced occupant loses its parent");
    assert_eq!(fx.parent(b), Some(owner));
    assert_eq!(slots.get(1), Some(b));

    assert_eq!(
        slots.set(&mut fx.cx(), 2, Some(a)),
        Err(TreeError::SlotOutOfRange {
            index: 2,
            capacity: 2
        })
    );
}

#[test]
fn test_positional_set_checks_before_releasing() {
    let mut fx = super::testing::Fixture::new();
    let owner = fx.owner();
    let a = fx.component("a");
    let mut slots = FixedPositionalArray::new(1);
    slots.set(&mut fx.cx(), 0, Some(a)).unwrap();

    // the owner can’t be its own child; the old occupant must stay put
    assert!(slots.set(&mut fx.cx(), 0, Some(owner)).is_err());
    assert_eq!(slots.get(0), Some(a));
    assert_eq!(fx.parent(a), Some(owner));
}

#[test]
fn test_positional_add_fills_lowest_free_slot() {
    let mut fx = super::testing::Fixture::new();
    let a = fx.component("a");
    let b = fx.component("b");
    let c = fx.component("c");
    let mut slots = FixedPositionalArray::new(2);
    slots.set(&mut fx.cx(), 1, Some(a)).unwrap();

    assert_eq!(slots.add(&mut fx.cx(), b), Ok(true));
    assert_eq!(slots.index_of(b), Some(0));
    assert_eq!(slots.add(&mut fx.cx(), b), Ok(false));
    assert_eq!(
        slots.add(&mut fx.cx(), c),
        Err(TreeError::NoFreeSlot { capacity: 2 })
    );
    assert_eq!(fx.parent(c), None);
    assert_eq!(*slots.children(), vec![b, a]);

    assert_eq!(slots.remove(&mut fx.cx(), a), Ok(true));
    assert_eq!(slots.get(1), None);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg(test)]
enum Edge {
    Leading,
    Center,
    Trailing,
}

#[cfg(test)]
impl_slot_key!(Edge {
    Leading,
    Center,
    Trailing
});

#[test]
fn test_enum_indexed_array() {
    assert_eq!(Edge::COUNT, 3);
    assert_eq!(Edge::Trailing.index(), 2);

    let mut fx = super::testing::Fixture::new();
    let a = fx.component("a");
    let mut slots = EnumIndexedArray::<Edge>::new();
    slots.set(&mut fx.cx(), Edge::Center, Some(a)).unwrap();
    assert_eq!(slots.get(Edge::Center), Some(a));
    assert_eq!(slots.get(Edge::Leading), None);
    assert_eq!(slots.index_of(a), Some(1));
    assert_eq!(slots.set(&mut fx.cx(), Edge::Center, None), Ok(Some(a)));
    assert!(!slots.has_children());
}

//! Layouts and per-child constraints.
//!
//! A container owns exactly one layout. The layout decides what kind of placement record
//! ([`Layout::Constraints`]) each child of the container carries, and may provide a default one for
//! children added without explicit constraints. Actually positioning children is up to the
//! rendering layer; this module only keeps the records consistent with the installed layout.

use crate::component::ComponentId;
use crate::error::TreeError;
use crate::rect::Rect;
use core::any::{self, Any};
use core::fmt;
use std::collections::HashMap;

/// A type-erased placement record.
///
/// Implemented for every `Clone + Debug + Send + Sync + 'static` type.
pub trait Constraints: Any + fmt::Debug + Send + Sync {
    /// For downcasting.
    fn constraints_any(&self) -> &dyn Any;

    fn clone_constraints(&self) -> Box<dyn Constraints>;

    /// Name of the concrete type.
    fn constraints_type_name(&self) -> &'static str;
}

impl<T: Any + fmt::Debug + Clone + Send + Sync> Constraints for T {
    fn constraints_any(&self) -> &dyn Any {
        self
    }

    fn clone_constraints(&self) -> Box<dyn Constraints> {
        Box::new(self.clone())
    }

    fn constraints_type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

/// A layout strategy.
pub trait Layout: Any + fmt::Debug + Send + Sync {
    /// The placement record this layout expects on each child.
    type Constraints: Any + fmt::Debug + Clone + Send + Sync;

    /// Short name, for error messages and logs.
    fn name(&self) -> &'static str;

    /// Constraints for a child added without any.
    ///
    /// Layouts that can’t sensibly place a child without explicit constraints return `None`.
    fn default_constraints(&self) -> Option<Self::Constraints>;
}

/// Object-safe view of a [`Layout`], as stored by the tree.
pub trait AnyLayout: Any + fmt::Debug + Send + Sync {
    fn layout_name(&self) -> &'static str;

    fn constraints_type(&self) -> &'static str;

    fn boxed_default_constraints(&self) -> Option<Box<dyn Constraints>>;

    /// True if `constraints` are of this layout’s constraint type.
    fn accepts(&self, constraints: &dyn Constraints) -> bool;

    /// For downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<L: Layout> AnyLayout for L {
    fn layout_name(&self) -> &'static str {
        self.name()
    }

    fn constraints_type(&self) -> &'static str {
        any::type_name::<L::Constraints>()
    }

    fn boxed_default_constraints(&self) -> Option<Box<dyn Constraints>> {
        self.default_constraints()
            .map(|c| Box::new(c) as Box<dyn Constraints>)
    }

    fn accepts(&self, constraints: &dyn Constraints) -> bool {
        constraints.constraints_any().is::<L::Constraints>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A container’s installed layout and the constraints of each of its children.
#[derive(Debug)]
pub(crate) struct LayoutBinding {
    layout: Box<dyn AnyLayout>,
    constraints: HashMap<ComponentId, Box<dyn Constraints>>,
    /// Cleared whenever the layout is replaced; the styling pass sets it again.
    theme_applied: bool,
}

impl LayoutBinding {
    pub(crate) fn new(layout: Box<dyn AnyLayout>) -> LayoutBinding {
        LayoutBinding {
            layout,
            constraints: HashMap::new(),
            theme_applied: false,
        }
    }

    pub(crate) fn layout(&self) -> &dyn AnyLayout {
        &*self.layout
    }

    pub(crate) fn theme_applied(&self) -> bool {
        self.theme_applied
    }

    pub(crate) fn set_theme_applied(&mut self, applied: bool) {
        self.theme_applied = applied;
    }

    pub(crate) fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Type-checks explicit constraints or makes default ones, without recording anything.
    pub(crate) fn resolve(
        &self,
        constraints: Option<Box<dyn Constraints>>,
    ) -> Result<Box<dyn Constraints>, TreeError> {
        match constraints {
            Some(constraints) => {
                if self.layout.accepts(&*constraints) {
                    Ok(constraints)
                } else {
                    Err(TreeError::ConstraintMismatch {
                        layout: self.layout.layout_name(),
                        expected: self.layout.constraints_type(),
                    })
                }
            }
            None => self
                .layout
                .boxed_default_constraints()
                .ok_or(TreeError::NoDefaultConstraints {
                    layout: self.layout.layout_name(),
                }),
        }
    }

    pub(crate) fn get(&self, child: ComponentId) -> Option<&dyn Constraints> {
        self.constraints.get(&child).map(|c| &**c)
    }

    /// Records already-resolved constraints for a child.
    pub(crate) fn insert(&mut self, child: ComponentId, constraints: Box<dyn Constraints>) {
        self.constraints.insert(child, constraints);
    }

    pub(crate) fn remove(&mut self, child: ComponentId) -> Option<Box<dyn Constraints>> {
        self.constraints.remove(&child)
    }

    /// Installs a new layout and gives every listed child its default constraints.
    ///
    /// If the new layout has no defaults and there are children, nothing changes.
    pub(crate) fn replace(
        &mut self,
        layout: Box<dyn AnyLayout>,
        children: &[ComponentId],
    ) -> Result<Box<dyn AnyLayout>, TreeError> {
        let mut constraints = HashMap::with_capacity(children.len());
        for child in children {
            let defaults = layout.boxed_default_constraints().ok_or(TreeError::NoDefaultConstraints {
                layout: layout.layout_name(),
            })?;
            constraints.insert(*child, defaults);
        }
        self.constraints = constraints;
        self.theme_applied = false;
        Ok(std::mem::replace(&mut self.layout, layout))
    }
}

/// Children in a row, wrapping when they run out of space.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowLayout {
    pub gap: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowConstraints {
    /// Share of leftover row space this child takes.
    pub grow: f64,
    /// Start a new row before this child.
    pub break_before: bool,
}

impl Default for FlowConstraints {
    fn default() -> Self {
        FlowConstraints {
            grow: 0.,
            break_before: false,
        }
    }
}

impl Layout for FlowLayout {
    type Constraints = FlowConstraints;

    fn name(&self) -> &'static str {
        "flow"
    }

    fn default_constraints(&self) -> Option<FlowConstraints> {
        Some(FlowConstraints::default())
    }
}

/// Five regions around and in the center.
///
/// Has no default region; every child must be given one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BorderLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    North,
    South,
    East,
    West,
    Center,
}

impl Layout for BorderLayout {
    type Constraints = Region;

    fn name(&self) -> &'static str {
        "border"
    }

    fn default_constraints(&self) -> Option<Region> {
        None
    }
}

/// Children at fixed rectangles.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AbsoluteLayout;

impl Layout for AbsoluteLayout {
    type Constraints = Rect;

    fn name(&self) -> &'static str {
        "absolute"
    }

    fn default_constraints(&self) -> Option<Rect> {
        Some(Rect::zero())
    }
}

#[test]
fn test_resolve_constraints() {
    let binding = LayoutBinding::new(Box::new(BorderLayout));
    assert_eq!(
        binding.resolve(None).unwrap_err(),
        TreeError::NoDefaultConstraints { layout: "border" }
    );
    let resolved = binding.resolve(Some(Box::new(Region::North))).unwrap();
    assert_eq!(resolved.constraints_any().downcast_ref::<Region>(), Some(&Region::North));
    assert!(
        binding.resolve(Some(Box::new(Rect::zero()))).is_err(),
        "a rect is not a border region"
    );

    let binding = LayoutBinding::new(Box::new(FlowLayout::default()));
    let resolved = binding.resolve(None).unwrap();
    assert!(resolved.constraints_any().is::<FlowConstraints>());
}

#[test]
fn test_replace_rederives_constraints() {
    let a = ComponentId::new();
    let b = ComponentId::new();
    let mut binding = LayoutBinding::new(Box::new(FlowLayout::default()));
    for child in &[a, b] {
        let c = binding.resolve(None).unwrap();
        binding.insert(*child, c);
    }
    binding.set_theme_applied(true);

    assert!(binding.replace(Box::new(BorderLayout), &[a, b]).is_err());
    assert!(
        binding.get(a).unwrap().constraints_any().is::<FlowConstraints>(),
        "failed replacement keeps the old constraints"
    );

    let old = binding.replace(Box::new(AbsoluteLayout), &[a, b]).unwrap();
    assert_eq!(old.layout_name(), "flow");
    assert_eq!(binding.len(), 2);
    for child in &[a, b] {
        let c = binding.get(*child).unwrap();
        assert_eq!(c.constraints_any().downcast_ref::<Rect>(), Some(&Rect::zero()));
    }
    assert!(!binding.theme_applied());
}

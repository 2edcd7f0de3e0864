//! Focus groups.
//!
//! A focus group is a composite that tracks which one of its descendants has input focus. The
//! application frame is a focus group too; besides its own descendants it can focus any open frame,
//! which is how “the active frame” is represented.

use crate::component::ComponentId;
use crate::error::{ChangeError, RefusalCause, TreeError};
use crate::events::{Event, ProposedChange};
use crate::tree::ComponentTree;

impl ComponentTree {
    /// Makes a composite track a focused descendant.
    pub fn make_focus_group(&mut self, id: ComponentId) -> Result<(), TreeError> {
        if !self.components.contains_key(&id) {
            return Err(TreeError::UnknownComponent(id));
        }
        if !self.stores.contains_key(&id) {
            return Err(TreeError::NotComposite(id));
        }
        self.focus.entry(id).or_insert(None);
        Ok(())
    }

    pub fn is_focus_group(&self, id: ComponentId) -> bool {
        self.focus.contains_key(&id)
    }

    pub fn focused_component(&self, group: ComponentId) -> Option<ComponentId> {
        self.focus.get(&group).copied().flatten()
    }

    /// Whether `candidate` may receive focus in `group`.
    fn check_focus_candidate(&self, group: ComponentId, candidate: ComponentId) -> Result<(), ChangeError> {
        let component = self
            .components
            .get(&candidate)
            .ok_or(TreeError::UnknownComponent(candidate))?;

        if group == self.application && self.is_open(candidate) {
            return Ok(());
        }
        if candidate == group || !self.links.is_ancestor_or_self(group, candidate) {
            return Err(RefusalCause::OutsideGroup {
                group,
                component: candidate,
            }
            .into());
        }
        if !component.focusable || !component.enabled {
            return Err(RefusalCause::NotFocusable(candidate).into());
        }
        Ok(())
    }

    /// Moves focus within a group, or clears it.
    ///
    /// The new component must be a focusable, enabled descendant of the group. Veto listeners on
    /// the group are asked first; if one refuses, focus stays where it was.
    pub fn set_focused_component(
        &mut self,
        group: ComponentId,
        component: Option<ComponentId>,
    ) -> Result<(), ChangeError> {
        let current = match self.focus.get(&group) {
            Some(current) => *current,
            None if self.components.contains_key(&group) => {
                return Err(TreeError::NotAFocusGroup(group).into())
            }
            None => return Err(TreeError::UnknownComponent(group).into()),
        };
        if current == component {
            return Ok(());
        }
        if let Some(candidate) = component {
            self.check_focus_candidate(group, candidate)?;
        }

        let change = ProposedChange::Focus {
            group,
            current,
            proposed: component,
        };
        if let Err(veto) = self.listeners.check_veto(&change) {
            log::debug!("{}: focus change to {:?} vetoed: {}", group, component, veto);
            return Err(RefusalCause::Vetoed(veto).into());
        }

        self.force_focus(group, component);
        Ok(())
    }

    /// Sets focus without asking anyone.
    pub(crate) fn force_focus(&mut self, group: ComponentId, component: Option<ComponentId>) {
        let slot = match self.focus.get_mut(&group) {
            Some(slot) => slot,
            None => return,
        };
        let old = std::mem::replace(slot, component);
        if old != component {
            log::trace!("{}: focus {:?} -> {:?}", group, old, component);
            self.emit(Event::FocusChanged {
                group,
                old,
                new: component,
            });
        }
    }

    /// Focusable, enabled descendants of a group in depth-first order.
    pub fn focus_candidates(&self, group: ComponentId) -> Vec<ComponentId> {
        self.descendants(group)
            .into_iter()
            .filter(|id| {
                self.components
                    .get(id)
                    .map_or(false, |c| c.focusable && c.enabled)
            })
            .collect()
    }

    /// Moves focus to the next candidate, wrapping around. Returns the newly focused component.
    pub fn focus_next(&mut self, group: ComponentId) -> Result<Option<ComponentId>, ChangeError> {
        self.cycle_focus(group, true)
    }

    /// Moves focus to the previous candidate, wrapping around.
    pub fn focus_previous(&mut self, group: ComponentId) -> Result<Option<ComponentId>, ChangeError> {
        self.cycle_focus(group, false)
    }

    fn cycle_focus(&mut self, group: ComponentId, forward: bool) -> Result<Option<ComponentId>, ChangeError> {
        if !self.focus.contains_key(&group) {
            return Err(TreeError::NotAFocusGroup(group).into());
        }
        let candidates = self.focus_candidates(group);
        if candidates.is_empty() {
            return Ok(None);
        }

        let len = candidates.len();
        let current = self
            .focused_component(group)
            .and_then(|focused| candidates.iter().position(|c| *c == focused));
        let next = match (current, forward) {
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
            (None, true) => 0,
            (None, false) => len - 1,
        };
        let next = candidates[next];
        self.set_focused_component(group, Some(next))?;
        Ok(Some(next))
    }

    /// Clears focus that points into a subtree which was just detached.
    ///
    /// Groups inside the detached subtree keep their focus.
    pub(crate) fn clear_focus_within(&mut self, detached: ComponentId) {
        let stale: Vec<ComponentId> = self
            .focus
            .iter()
            .filter(|(group, focused)| match focused {
                Some(focused) => {
                    self.links.is_ancestor_or_self(detached, *focused)
                        && !self.links.is_ancestor_or_self(detached, **group)
                }
                None => false,
            })
            .map(|(group, _)| *group)
            .collect();
        for group in stale {
            self.force_focus(group, None);
        }
    }
}

#[cfg(test)]
fn form(tree: &mut ComponentTree) -> (ComponentId, Vec<ComponentId>) {
    use crate::component::Component;
    use crate::layout::FlowLayout;

    let group = tree.create_container(Component::new("form"), FlowLayout::default());
    tree.make_focus_group(group).unwrap();
    let row = tree.create_container(Component::new("row"), FlowLayout::default());
    tree.add(group, row).unwrap();
    let a = tree.create(Component::field("a", ""));
    let label = tree.create(Component::new("label"));
    let b = tree.create(Component::field("b", ""));
    let c = tree.create(Component::button("c", "submit"));
    tree.add(row, a).unwrap();
    tree.add(row, label).unwrap();
    tree.add(group, b).unwrap();
    tree.add(group, c).unwrap();
    (group, vec![a, b, c])
}

#[test]
fn test_focus_rules() {
    use crate::component::Component;

    let mut tree = ComponentTree::new();
    let (group, fields) = form(&mut tree);
    let outsider = tree.create(Component::field("x", ""));
    let label = tree.children(tree.children(group)[0])[1];

    tree.set_focused_component(group, Some(fields[1])).unwrap();
    assert_eq!(tree.focused_component(group), Some(fields[1]));
    assert_eq!(
        tree.set_focused_component(group, Some(outsider))
            .unwrap_err()
            .refusal(),
        Some(&RefusalCause::OutsideGroup {
            group,
            component: outsider
        })
    );
    assert_eq!(
        tree.set_focused_component(group, Some(label))
            .unwrap_err()
            .refusal(),
        Some(&RefusalCause::NotFocusable(label))
    );
    assert_eq!(tree.focused_component(group), Some(fields[1]));
    assert_eq!(
        tree.set_focused_component(outsider, None),
        Err(ChangeError::Tree(TreeError::NotAFocusGroup(outsider)))
    );
}

#[test]
fn test_focus_traversal() {
    let mut tree = ComponentTree::new();
    let (group, fields) = form(&mut tree);
    assert_eq!(tree.focus_candidates(group), fields);

    assert_eq!(tree.focus_next(group), Ok(Some(fields[0])));
    assert_eq!(tree.focus_next(group), Ok(Some(fields[1])));
    assert_eq!(tree.focus_next(group), Ok(Some(fields[2])));
    assert_eq!(tree.focus_next(group), Ok(Some(fields[0])), "wraps around");
    assert_eq!(tree.focus_previous(group), Ok(Some(fields[2])));

    tree.set_enabled(fields[1], false).unwrap();
    assert_eq!(tree.focus_previous(group), Ok(Some(fields[0])), "skips disabled");
}

#[test]
fn test_removal_clears_stale_focus() {
    let mut tree = ComponentTree::new();
    let (group, fields) = form(&mut tree);
    let row = tree.children(group)[0];
    tree.set_focused_component(group, Some(fields[0])).unwrap();
    tree.drain_events();

    tree.remove(group, row).unwrap();
    assert_eq!(tree.focused_component(group), None);
    assert!(tree.drain_events().contains(&Event::FocusChanged {
        group,
        old: Some(fields[0]),
        new: None
    }));
}

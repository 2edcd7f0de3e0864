//! Frames and the application frame’s z-order.
//!
//! A frame is a top-level container that is either closed or open. Open frames are kept in a
//! z-order list, bottom to top; opening a frame puts it on top and asks the application frame to
//! focus it. While a modal frame is open, everything below it is blocked.

use crate::component::{Component, ComponentId};
use crate::config::FocusFallback;
use crate::error::{ChangeError, RefusalCause, TreeError};
use crate::events::Event;
use crate::layout::Layout;
use crate::tree::ComponentTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameState {
    pub(crate) open: bool,
    pub(crate) modal: bool,
    pub(crate) closable: bool,
}

impl FrameState {
    fn closed() -> FrameState {
        FrameState {
            open: false,
            modal: false,
            closable: true,
        }
    }

    /// The application frame is open from the start and stays open.
    pub(crate) fn application() -> FrameState {
        FrameState {
            open: true,
            modal: false,
            closable: false,
        }
    }
}

impl ComponentTree {
    /// Adds a closed frame: a container that is also a focus group.
    pub fn create_frame<L: Layout>(&mut self, component: Component, layout: L) -> ComponentId {
        let mut component = component.focusable(true);
        component.frame = true;
        let id = self.create_container(component, layout);
        self.focus.insert(id, None);
        self.frames.insert(id, FrameState::closed());
        id
    }

    pub fn is_frame(&self, id: ComponentId) -> bool {
        self.frames.contains_key(&id)
    }

    pub fn is_open(&self, frame: ComponentId) -> bool {
        self.frames.get(&frame).map_or(false, |state| state.open)
    }

    pub fn is_modal(&self, frame: ComponentId) -> bool {
        self.frames.get(&frame).map_or(false, |state| state.modal)
    }

    fn frame_state(&mut self, frame: ComponentId) -> Result<&mut FrameState, TreeError> {
        if frame == self.application {
            return Err(TreeError::ApplicationFrame("opened or closed"));
        }
        match self.frames.get_mut(&frame) {
            Some(state) => Ok(state),
            None if self.components.contains_key(&frame) => Err(TreeError::NotAFrame(frame)),
            None => Err(TreeError::UnknownComponent(frame)),
        }
    }

    /// Opens a frame on top of the z-order and moves application focus to it.
    ///
    /// Opening a frame that is already open brings it to the top. If focusing the frame is
    /// refused, the frame still opens.
    pub fn open(&mut self, frame: ComponentId, modal: bool) -> Result<(), TreeError> {
        let state = self.frame_state(frame)?;
        let was_open = state.open;
        state.open = true;
        state.modal = modal;

        self.z_order.retain(|id| *id != frame);
        self.z_order.push(frame);
        if !was_open {
            log::debug!("opened {}{}", frame, if modal { " (modal)" } else { "" });
            self.emit(Event::FrameOpened { frame, modal });
        }

        let application = self.application;
        match self.set_focused_component(application, Some(frame)) {
            Ok(()) => Ok(()),
            Err(ChangeError::Refused(refused)) => {
                log::debug!("{} opened without focus: {}", frame, refused);
                Ok(())
            }
            Err(ChangeError::Tree(err)) => Err(err),
        }
    }

    /// Whether a frame may be closed; never true for the application frame.
    pub fn can_close(&self, frame: ComponentId) -> bool {
        frame != self.application && self.frames.get(&frame).map_or(false, |state| state.closable)
    }

    pub fn set_closable(&mut self, frame: ComponentId, closable: bool) -> Result<(), TreeError> {
        self.frame_state(frame)?.closable = closable;
        Ok(())
    }

    /// Closes a frame and removes it from the z-order.
    ///
    /// If the frame had application focus, focus moves to the new top frame. When that frame
    /// refuses, the configured [`FocusFallback`] decides what happens next.
    pub fn close(&mut self, frame: ComponentId) -> Result<(), ChangeError> {
        if frame == self.application {
            return Err(RefusalCause::CloseRefused(frame).into());
        }
        let state = self.frame_state(frame)?;
        if !state.open {
            return Ok(());
        }
        if !state.closable {
            return Err(RefusalCause::CloseRefused(frame).into());
        }
        state.open = false;
        state.modal = false;

        self.z_order.retain(|id| *id != frame);
        log::debug!("closed {}", frame);
        self.emit(Event::FrameClosed { frame });

        if self.focused_frame() == Some(frame) {
            self.transfer_application_focus()?;
        }
        Ok(())
    }

    /// Gives application focus to the topmost open frame that accepts it.
    fn transfer_application_focus(&mut self) -> Result<(), TreeError> {
        let application = self.application;
        let candidates: Vec<ComponentId> = match self.config.focus_fallback {
            FocusFallback::NextInZOrder => self.z_order.iter().rev().copied().collect(),
            FocusFallback::Clear => self.z_order.last().copied().into_iter().collect(),
        };

        for candidate in candidates {
            match self.set_focused_component(application, Some(candidate)) {
                Ok(()) => return Ok(()),
                Err(ChangeError::Refused(refused)) => {
                    log::warn!("{} refused focus after a frame closed: {}", candidate, refused);
                }
                Err(ChangeError::Tree(err)) => return Err(err),
            }
        }
        self.force_focus(application, None);
        Ok(())
    }

    /// Open frames, bottom to top.
    pub fn z_order(&self) -> &[ComponentId] {
        &self.z_order
    }

    pub fn top_frame(&self) -> Option<ComponentId> {
        self.z_order.last().copied()
    }

    /// The frame that has application focus.
    pub fn focused_frame(&self) -> Option<ComponentId> {
        self.focused_component(self.application)
            .filter(|id| self.frames.contains_key(id))
    }

    /// The topmost open modal frame.
    pub fn top_modal(&self) -> Option<ComponentId> {
        self.z_order
            .iter()
            .rev()
            .find(|id| self.is_modal(**id))
            .copied()
    }

    pub fn is_modal_open(&self) -> bool {
        self.top_modal().is_some()
    }

    /// Whether a modal frame above the component’s frame blocks interaction with it.
    ///
    /// Components that aren’t inside an open frame count as below every frame.
    pub fn is_blocked(&self, id: ComponentId) -> bool {
        let modal = match self.top_modal() {
            Some(modal) => modal,
            None => return false,
        };
        let root = self.links.root(id);
        let modal_index = self.z_order.iter().position(|f| *f == modal);
        let root_index = self.z_order.iter().position(|f| *f == root);
        match (root_index, modal_index) {
            (Some(root_index), Some(modal_index)) => root_index < modal_index,
            _ => true,
        }
    }
}

#[test]
fn test_frame_stack() {
    use crate::layout::FlowLayout;

    let mut tree = ComponentTree::new();
    let f1 = tree.create_frame(Component::new("f1"), FlowLayout::default());
    let f2 = tree.create_frame(Component::new("f2"), FlowLayout::default());

    tree.open(f1, false).unwrap();
    tree.open(f2, false).unwrap();
    assert_eq!(tree.z_order(), &[f1, f2]);
    assert_eq!(tree.focused_frame(), Some(f2));

    tree.open(f1, false).unwrap();
    assert_eq!(tree.z_order(), &[f2, f1], "reopening brings to front");
    assert_eq!(tree.focused_frame(), Some(f1));

    tree.close(f1).unwrap();
    assert_eq!(tree.z_order(), &[f2]);
    assert_eq!(tree.focused_frame(), Some(f2));
    tree.close(f2).unwrap();
    assert_eq!(tree.focused_frame(), None);
    assert_eq!(tree.close(f2), Ok(()), "closing a closed frame does nothing");
}

#[test]
fn test_modal_blocking() {
    use crate::layout::FlowLayout;

    let mut tree = ComponentTree::new();
    let main = tree.create_frame(Component::new("main"), FlowLayout::default());
    let dialog = tree.create_frame(Component::new("dialog"), FlowLayout::default());
    let behind = tree.create(Component::button("save", "save"));
    let inside = tree.create(Component::button("ok", "ok"));
    tree.add(main, behind).unwrap();
    tree.add(dialog, inside).unwrap();

    tree.open(main, false).unwrap();
    assert!(!tree.is_modal_open());
    assert!(!tree.is_blocked(behind));

    tree.open(dialog, true).unwrap();
    assert_eq!(tree.top_modal(), Some(dialog));
    assert!(tree.is_blocked(behind));
    assert!(!tree.is_blocked(inside));
    assert_eq!(tree.perform_action(behind), Ok(false));
    assert_eq!(tree.perform_action(inside), Ok(true));

    tree.close(dialog).unwrap();
    assert!(!tree.is_modal_open());
    assert!(!tree.is_blocked(behind));
}

#[test]
fn test_closability() {
    use crate::layout::FlowLayout;

    let mut tree = ComponentTree::new();
    let app = tree.application_frame();
    let f = tree.create_frame(Component::new("f"), FlowLayout::default());
    let leaf = tree.create(Component::new("leaf"));

    assert!(!tree.can_close(app));
    assert_eq!(
        tree.close(app).unwrap_err().refusal(),
        Some(&RefusalCause::CloseRefused(app))
    );
    assert_eq!(tree.open(app, false), Err(TreeError::ApplicationFrame("opened or closed")));
    assert_eq!(tree.open(leaf, false), Err(TreeError::NotAFrame(leaf)));

    tree.open(f, false).unwrap();
    tree.set_closable(f, false).unwrap();
    assert!(!tree.can_close(f));
    assert!(tree.close(f).unwrap_err().is_refused());
    assert!(tree.is_open(f));
    assert_eq!(tree.destroy(f), Err(TreeError::StillAttached(f)));
}

#[test]
fn test_frames_stay_roots() {
    use crate::layout::FlowLayout;
    use crate::store::OrderedChildList;

    let mut tree = ComponentTree::new();
    let app = tree.application_frame();
    let panel = tree.create_container(Component::new("panel"), FlowLayout::default());
    let list = tree.create_composite(Component::new("list"), OrderedChildList::new());
    let dialog = tree.create_frame(Component::new("dialog"), FlowLayout::default());

    assert_eq!(tree.add(panel, dialog), Err(TreeError::FrameChild(dialog)));
    assert_eq!(tree.add_child(list, dialog), Err(TreeError::FrameChild(dialog)));
    assert_eq!(tree.add(panel, app), Err(TreeError::FrameChild(app)));
    assert_eq!(tree.parent(dialog), None);
    assert!(!tree.has_children(panel));

    tree.open(dialog, true).unwrap();
    tree.destroy(panel).unwrap();
    assert!(tree.contains(dialog));
    assert_eq!(tree.z_order(), &[dialog]);
    tree.close(dialog).unwrap();
    assert!(!tree.is_modal_open());
}

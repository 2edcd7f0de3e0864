//! Validity, status and notification propagation, and the value-bearing operations that drive it.
//!
//! A component is valid if it’s disabled, or if its validator (if any) accepts its literal input
//! and all of its children are valid. Validity is only ever recomputed bottom-up: a change on one
//! component re-evaluates that component, and its parent is re-evaluated only if the component’s
//! flag actually flipped.

use crate::component::{ComponentId, Notification, Status, Value};
use crate::error::{ChangeError, ChangeRefused, RefusalCause, TreeError};
use crate::events::{Event, ProposedChange};
use crate::tree::ComponentTree;
use crate::validation::Validator;

impl ComponentTree {
    /// Computes whether a component should be valid, from its own input and its children’s flags.
    pub fn determine_valid(&self, id: ComponentId) -> bool {
        let component = match self.components.get(&id) {
            Some(component) => component,
            None => return true,
        };
        if !component.enabled {
            return true;
        }
        if let Some(state) = &component.value {
            if state.check_input().is_err() {
                return false;
            }
        }
        self.children(id).iter().all(|child| {
            self.components
                .get(child)
                .map_or(true, |child| child.valid)
        })
    }

    /// Re-evaluates validity of a component, then of each ancestor whose child flipped.
    ///
    /// Queues one `ValidChanged` per component that actually flipped.
    pub fn update_valid(&mut self, id: ComponentId) {
        let mut current = Some(id);
        while let Some(id) = current {
            let valid = self.determine_valid(id);
            let component = match self.components.get_mut(&id) {
                Some(component) => component,
                None => return,
            };
            if component.valid == valid {
                return;
            }
            component.valid = valid;
            log::trace!("{} is now {}", id, if valid { "valid" } else { "invalid" });
            self.emit(Event::ValidChanged {
                component: id,
                valid,
            });
            self.update_status(id);
            current = self.links.parent(id);
        }
    }

    /// Re-derives status from the current notification.
    pub fn update_status(&mut self, id: ComponentId) {
        let component = match self.components.get_mut(&id) {
            Some(component) => component,
            None => return,
        };
        let status = Status::of(component.notification.as_ref());
        if component.status != status {
            component.status = status;
            self.emit(Event::StatusChanged {
                component: id,
                status,
            });
        }
    }

    /// Replaces a component’s notification. Does nothing if it’s equal to the current one.
    pub fn set_notification(
        &mut self,
        id: ComponentId,
        notification: Option<Notification>,
    ) -> Result<(), TreeError> {
        self.replace_notification(id, notification, false)
    }

    fn replace_notification(
        &mut self,
        id: ComponentId,
        notification: Option<Notification>,
        from_validation: bool,
    ) -> Result<(), TreeError> {
        let component = self.component_mut(id)?;
        if component.notification == notification {
            component.validation_notice = from_validation && notification.is_some();
            return Ok(());
        }
        component.notification = notification.clone();
        component.validation_notice = from_validation && notification.is_some();
        self.emit(Event::NotificationChanged {
            component: id,
            notification,
        });
        self.update_status(id);
        Ok(())
    }

    /// Clears the notification if input validation put it there.
    fn clear_validation_notice(&mut self, id: ComponentId) -> Result<(), TreeError> {
        let from_validation = self.component_mut(id)?.validation_notice;
        if from_validation {
            self.replace_notification(id, None, false)?;
        }
        Ok(())
    }

    /// Checks the literal input against the validator and updates the inline notice and flag.
    fn revalidate(&mut self, id: ComponentId) -> Result<(), TreeError> {
        let component = self.component_mut(id)?;
        let result = match &component.value {
            Some(state) if component.enabled => state.check_input(),
            _ => Ok(()),
        };
        match result {
            Ok(()) => self.clear_validation_notice(id)?,
            Err(err) => self.replace_notification(id, Some(Notification::error(err.message)), true)?,
        }
        self.update_valid(id);
        Ok(())
    }

    fn check_value_state(&self, id: ComponentId) -> Result<(), TreeError> {
        match self.components.get(&id) {
            Some(component) if component.value.is_some() => Ok(()),
            Some(_) => Err(TreeError::MissingCapability {
                component: id,
                capability: "value",
            }),
            None => Err(TreeError::UnknownComponent(id)),
        }
    }

    /// Records what the user typed.
    ///
    /// The literal input is always kept, and validity follows it. The committed value follows only
    /// if the validator accepts the input and no veto listener refuses it.
    pub fn set_input(&mut self, id: ComponentId, input: impl Into<Value>) -> Result<(), ChangeError> {
        self.check_value_state(id)?;
        let input = input.into();
        let component = self.component_mut(id)?;
        let enabled = component.enabled;
        let previous = match &mut component.value {
            Some(state) => std::mem::replace(&mut state.input, input.clone()),
            None => Value::Empty,
        };

        self.revalidate(id)?;
        let rejected = match &self.component_mut(id)?.value {
            Some(state) if enabled => state.check_input().err(),
            _ => None,
        };
        if let Some(err) = rejected {
            return Err(ChangeRefused::from(err).into());
        }

        match self.commit_value(id, input) {
            Err(ChangeError::Refused(refused)) => {
                // a vetoed input doesn’t stick
                if let Some(state) = &mut self.component_mut(id)?.value {
                    state.input = previous;
                }
                self.revalidate(id)?;
                Err(ChangeError::Refused(refused))
            }
            result => result,
        }
    }

    /// Sets the value programmatically.
    ///
    /// Unlike [`set_input`](Self::set_input), a rejected value leaves both the value and the input
    /// as they were. The rejection is shown as an error notification on the component.
    pub fn set_value(&mut self, id: ComponentId, value: impl Into<Value>) -> Result<(), ChangeError> {
        self.check_value_state(id)?;
        let value = value.into();
        let component = self.component_mut(id)?;
        let rejected = match &component.value {
            Some(state) if component.enabled => state
                .validator
                .as_ref()
                .and_then(|validator| validator.check(&value).err()),
            _ => None,
        };
        if let Some(err) = rejected {
            log::debug!("{}: rejected value {:?}: {}", id, value, err);
            self.replace_notification(id, Some(Notification::error(err.message.clone())), true)?;
            return Err(ChangeRefused::from(err).into());
        }

        self.commit_value(id, value.clone())?;
        if let Some(state) = &mut self.component_mut(id)?.value {
            state.input = value;
        }
        self.revalidate(id)?;
        Ok(())
    }

    /// Asks the veto listeners, then replaces the committed value.
    fn commit_value(&mut self, id: ComponentId, value: Value) -> Result<(), ChangeError> {
        let current = match &self.component_mut(id)?.value {
            Some(state) => state.value.clone(),
            None => return Ok(()),
        };
        if current == value {
            return Ok(());
        }

        let change = ProposedChange::Value {
            component: id,
            current: current.clone(),
            proposed: value.clone(),
        };
        if let Err(veto) = self.listeners.check_veto(&change) {
            log::debug!("{}: value change vetoed: {}", id, veto);
            self.replace_notification(id, Some(Notification::error(veto.reason.clone())), true)?;
            return Err(ChangeError::from(RefusalCause::Vetoed(veto)));
        }

        if let Some(state) = &mut self.component_mut(id)?.value {
            state.value = value.clone();
        }
        self.emit(Event::ValueChanged {
            component: id,
            old: current,
            new: value,
        });
        Ok(())
    }

    /// Replaces the validator and re-validates the current input.
    pub fn set_validator(&mut self, id: ComponentId, validator: Option<Validator>) -> Result<(), TreeError> {
        self.check_value_state(id)?;
        if let Some(state) = &mut self.component_mut(id)?.value {
            state.validator = validator;
        }
        self.revalidate(id)
    }

    /// Enables or disables a component.
    ///
    /// Disabled components are always valid; their input is kept and checked again once they’re
    /// enabled.
    pub fn set_enabled(&mut self, id: ComponentId, enabled: bool) -> Result<(), TreeError> {
        let component = self.component_mut(id)?;
        if component.enabled == enabled {
            return Ok(());
        }
        component.enabled = enabled;
        log::debug!("{}: {}", id, if enabled { "enabled" } else { "disabled" });
        self.revalidate(id)
    }

    /// Queues an `Action` event for the component’s command.
    ///
    /// Returns false (and does nothing) if the component is disabled or blocked by a modal frame.
    pub fn perform_action(&mut self, id: ComponentId) -> Result<bool, TreeError> {
        let component = self.component_mut(id)?;
        let command = match &component.action {
            Some(action) => action.command.clone(),
            None => {
                return Err(TreeError::MissingCapability {
                    component: id,
                    capability: "action",
                })
            }
        };
        if !component.enabled || self.is_blocked(id) {
            log::debug!("{}: ignored action {:?}", id, command);
            return Ok(false);
        }
        self.emit(Event::Action {
            component: id,
            command,
        });
        Ok(true)
    }

    pub fn set_selected(&mut self, id: ComponentId, selected: bool) -> Result<(), TreeError> {
        let component = self.component_mut(id)?;
        let selection = match &mut component.selection {
            Some(selection) => selection,
            None => {
                return Err(TreeError::MissingCapability {
                    component: id,
                    capability: "selection",
                })
            }
        };
        if selection.selected != selected {
            selection.selected = selected;
            self.emit(Event::SelectionChanged {
                component: id,
                selected,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
fn valid_events(events: &[Event]) -> Vec<(ComponentId, bool)> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::ValidChanged { component, valid } => Some((*component, *valid)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_validity_bubbles_once() {
    use crate::component::Component;
    use crate::layout::FlowLayout;

    let mut tree = ComponentTree::new();
    let outer = tree.create_container(Component::new("outer"), FlowLayout::default());
    let inner = tree.create_container(Component::new("inner"), FlowLayout::default());
    let field = tree.create(
        Component::field("age", 30).with_validator(Validator::range(0., 150., "bad age")),
    );
    tree.add(outer, inner).unwrap();
    tree.add(inner, field).unwrap();
    tree.drain_events();

    assert!(tree.set_input(field, 200).unwrap_err().is_refused());
    assert!(!tree.component(outer).unwrap().is_valid());
    assert_eq!(
        valid_events(&tree.drain_events()),
        vec![(field, false), (inner, false), (outer, false)]
    );

    tree.set_input(field, 40).unwrap();
    assert!(tree.component(outer).unwrap().is_valid());
    assert_eq!(
        valid_events(&tree.drain_events()),
        vec![(field, true), (inner, true), (outer, true)]
    );
}

#[test]
fn test_input_and_value() {
    use crate::component::Component;

    let mut tree = ComponentTree::new();
    let field = tree.create(
        Component::field("name", "ada").with_validator(Validator::required("required")),
    );

    let err = tree.set_input(field, "").unwrap_err();
    assert_eq!(
        err.refusal(),
        Some(&RefusalCause::Invalid(
            crate::validation::ValidationError::new("required")
        ))
    );
    let component = tree.component(field).unwrap();
    let state = component.value_state().unwrap();
    assert_eq!(state.input(), &Value::from(""), "literal input is kept");
    assert_eq!(state.value(), &Value::from("ada"), "value stays at the last good one");
    assert_eq!(component.status(), Status::Error);

    tree.set_input(field, "grace").unwrap();
    let component = tree.component(field).unwrap();
    assert_eq!(component.value_state().unwrap().value(), &Value::from("grace"));
    assert_eq!(component.notification(), None, "validation notice is cleared");
    assert_eq!(component.status(), Status::None);

    assert!(tree.set_value(field, "").is_err());
    let component = tree.component(field).unwrap();
    assert_eq!(component.value_state().unwrap().input(), &Value::from("grace"));
    assert!(component.is_valid(), "a refused set_value doesn’t touch the input");
    assert_eq!(component.status(), Status::Error);
}

#[test]
fn test_value_veto() {
    use crate::component::Component;
    use crate::events::{Veto, VetoHandler};

    let mut tree = ComponentTree::new();
    let field = tree.create(Component::field("name", "ada"));
    tree.add_veto_listener(
        field,
        VetoHandler::new(|change| match change {
            ProposedChange::Value { proposed, .. } if proposed == &Value::from("root") => {
                Err(Veto::new("reserved"))
            }
            _ => Ok(()),
        }),
    );

    let err = tree.set_value(field, "root").unwrap_err();
    assert_eq!(err.refusal(), Some(&RefusalCause::Vetoed(Veto::new("reserved"))));
    assert_eq!(
        tree.component(field).unwrap().value_state().unwrap().value(),
        &Value::from("ada")
    );

    tree.set_value(field, "grace").unwrap();
    assert_eq!(tree.component(field).unwrap().notification(), None);
}

#[test]
fn test_vetoed_input_is_dropped() {
    use crate::component::Component;
    use crate::events::{Veto, VetoHandler};

    let mut tree = ComponentTree::new();
    let field = tree.create(
        Component::field("name", "ada").with_validator(Validator::required("required")),
    );
    tree.add_veto_listener(field, VetoHandler::new(|_| Err(Veto::new("locked"))));

    let err = tree.set_input(field, "root").unwrap_err();
    assert_eq!(err.refusal(), Some(&RefusalCause::Vetoed(Veto::new("locked"))));
    let component = tree.component(field).unwrap();
    let state = component.value_state().unwrap();
    assert_eq!(state.value(), &Value::from("ada"));
    assert_eq!(state.input(), &Value::from("ada"), "refused input is not kept");
    assert!(component.is_valid());

    // an invalid input is still kept literally, before any listener is asked
    assert!(tree.set_input(field, "").is_err());
    let component = tree.component(field).unwrap();
    assert_eq!(component.value_state().unwrap().input(), &Value::from(""));
    assert!(!component.is_valid());
}

#[test]
fn test_disabled_is_valid() {
    use crate::component::Component;

    let mut tree = ComponentTree::new();
    let field = tree.create(
        Component::field("name", "").with_validator(Validator::required("required")),
    );
    assert!(!tree.component(field).unwrap().is_valid());

    tree.set_enabled(field, false).unwrap();
    assert!(tree.component(field).unwrap().is_valid());
    assert_eq!(tree.component(field).unwrap().status(), Status::None);

    tree.set_enabled(field, true).unwrap();
    let component = tree.component(field).unwrap();
    assert!(!component.is_valid());
    assert_eq!(component.status(), Status::Error);
}

#[test]
fn test_notification_and_status() {
    use crate::component::Component;

    let mut tree = ComponentTree::new();
    let a = tree.create(Component::new("a"));
    tree.set_notification(a, Some(Notification::warning("careful"))).unwrap();
    tree.set_notification(a, Some(Notification::warning("careful"))).unwrap();
    let events = tree.drain_events();
    assert_eq!(events.len(), 2, "one notification change and one status change");
    assert_eq!(
        events[1],
        Event::StatusChanged {
            component: a,
            status: Status::Warning
        }
    );

    // application notices survive re-validation
    let field = tree.create(Component::field("f", "x"));
    tree.set_notification(field, Some(Notification::warning("note"))).unwrap();
    tree.set_input(field, "y").unwrap();
    assert_eq!(
        tree.component(field).unwrap().notification(),
        Some(&Notification::warning("note"))
    );
}

#[test]
fn test_action_and_selection() {
    use crate::component::Component;

    let mut tree = ComponentTree::new();
    let ok = tree.create(Component::button("ok", "submit"));
    let check = tree.create(Component::toggle("check", false));

    assert_eq!(tree.perform_action(ok), Ok(true));
    tree.set_selected(check, true).unwrap();
    tree.set_selected(check, true).unwrap();
    assert_eq!(
        tree.drain_events(),
        vec![
            Event::Action {
                component: ok,
                command: "submit".to_string()
            },
            Event::SelectionChanged {
                component: check,
                selected: true
            },
        ]
    );

    tree.set_enabled(ok, false).unwrap();
    assert_eq!(tree.perform_action(ok), Ok(false));
    assert!(matches!(
        tree.perform_action(check),
        Err(TreeError::MissingCapability {
            capability: "action",
            ..
        })
    ));
}

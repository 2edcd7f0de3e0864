//! Components and their capability records.

use crate::validation::{ValidationError, Validator};
use core::fmt;
use std::collections::BTreeMap;
use uuid::Uuid;

/// A unique identifier for a component.
///
/// (this is just a UUID)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(u32, u16, u16, [u8; 8]);

impl ComponentId {
    pub(crate) fn new() -> ComponentId {
        let uuid = Uuid::new_v4();
        let (a, b, c, d) = uuid.as_fields();
        ComponentId(a, b, c, *d)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let uuid = Uuid::from_fields(self.0, self.1, self.2, &self.3);
        write!(f, "{}", uuid.hyphenated())
    }
}

/// A property or input value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// True for `Empty` and for empty text.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric view of the value; text is parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Empty
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

/// A message attached to a component, picked up by the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn warning(message: impl Into<String>) -> Self {
        Notification {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Coarse component status, derived from the current notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    None,
    Warning,
    Error,
}

impl Status {
    pub fn of(notification: Option<&Notification>) -> Status {
        match notification.map(|n| n.severity) {
            Some(Severity::Error) => Status::Error,
            Some(Severity::Warning) => Status::Warning,
            None => Status::None,
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::None
    }
}

/// Input capability: a committed value, the literal input, and an optional validator.
#[derive(Debug, Clone)]
pub struct ValueState {
    pub(crate) value: Value,
    pub(crate) input: Value,
    pub(crate) validator: Option<Validator>,
}

impl ValueState {
    /// The last value that passed validation and was not vetoed.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The literal input, which may differ from the value while it’s invalid.
    pub fn input(&self) -> &Value {
        &self.input
    }

    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    pub(crate) fn check_input(&self) -> Result<(), ValidationError> {
        match &self.validator {
            Some(validator) => validator.check(&self.input),
            None => Ok(()),
        }
    }
}

/// Action capability (buttons, menu items).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionState {
    pub command: String,
}

/// Selection capability (check boxes, toggle buttons, list rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionState {
    pub selected: bool,
}

/// A component record.
///
/// Components are built standalone and then handed to a
/// [`ComponentTree`](crate::ComponentTree), which owns them from then on. Structural state (parent,
/// children, layout constraints) lives in the tree, not here.
#[derive(Debug)]
pub struct Component {
    pub(crate) id: ComponentId,
    pub(crate) identifier: String,
    pub(crate) properties: BTreeMap<String, Value>,
    pub(crate) enabled: bool,
    pub(crate) focusable: bool,
    pub(crate) valid: bool,
    pub(crate) notification: Option<Notification>,
    /// Set while `notification` was produced by input validation.
    pub(crate) validation_notice: bool,
    pub(crate) status: Status,
    pub(crate) value: Option<ValueState>,
    pub(crate) action: Option<ActionState>,
    pub(crate) selection: Option<SelectionState>,
    /// Frames are always roots.
    pub(crate) frame: bool,
}

impl Component {
    /// Creates a plain component with the given identifier.
    pub fn new(identifier: impl Into<String>) -> Component {
        Component {
            id: ComponentId::new(),
            identifier: identifier.into(),
            properties: BTreeMap::new(),
            enabled: true,
            focusable: false,
            valid: true,
            notification: None,
            validation_notice: false,
            status: Status::None,
            value: None,
            action: None,
            selection: None,
            frame: false,
        }
    }

    /// A focusable input control with an initial value.
    pub fn field(identifier: impl Into<String>, initial: impl Into<Value>) -> Component {
        Component::new(identifier).with_value(initial).focusable(true)
    }

    /// A focusable control that performs `command`.
    pub fn button(identifier: impl Into<String>, command: impl Into<String>) -> Component {
        Component::new(identifier).with_action(command).focusable(true)
    }

    /// A focusable selectable control.
    pub fn toggle(identifier: impl Into<String>, selected: bool) -> Component {
        Component::new(identifier)
            .with_selection(selected)
            .focusable(true)
    }

    pub fn with_value(mut self, initial: impl Into<Value>) -> Self {
        let initial = initial.into();
        let validator = self.value.take().and_then(|state| state.validator);
        self.value = Some(ValueState {
            value: initial.clone(),
            input: initial,
            validator,
        });
        self
    }

    /// Attaches a validator; adds an empty value state if there is none.
    pub fn with_validator(mut self, validator: Validator) -> Self {
        match &mut self.value {
            Some(state) => state.validator = Some(validator),
            None => {
                self.value = Some(ValueState {
                    value: Value::Empty,
                    input: Value::Empty,
                    validator: Some(validator),
                })
            }
        }
        self
    }

    pub fn with_action(mut self, command: impl Into<String>) -> Self {
        self.action = Some(ActionState {
            command: command.into(),
        });
        self
    }

    pub fn with_selection(mut self, selected: bool) -> Self {
        self.selection = Some(SelectionState { selected });
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn focusable(mut self, focusable: bool) -> Self {
        self.focusable = focusable;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_focusable(&self) -> bool {
        self.focusable
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn value_state(&self) -> Option<&ValueState> {
        self.value.as_ref()
    }

    pub fn action_state(&self) -> Option<&ActionState> {
        self.action.as_ref()
    }

    pub fn selection_state(&self) -> Option<&SelectionState> {
        self.selection.as_ref()
    }
}

#[test]
fn test_component_capabilities() {
    let field = Component::field("name", "ada").with_validator(Validator::required("required"));
    let state = field.value_state().expect("field should have a value state");
    assert_eq!(state.value(), &Value::from("ada"));
    assert!(state.validator().is_some(), "validator should survive");
    assert!(field.action_state().is_none());
    assert!(field.is_focusable());

    // validator first, value second keeps the validator
    let field = Component::new("age")
        .with_validator(Validator::range(0., 150., "out of range"))
        .with_value(200);
    let state = field.value_state().unwrap();
    assert!(state.check_input().is_err(), "200 should be out of range");

    let button = Component::button("ok", "submit");
    assert_eq!(button.action_state().unwrap().command, "submit");
    assert!(button.value_state().is_none());
}

#[test]
fn test_status_from_notification() {
    assert_eq!(Status::of(None), Status::None);
    assert_eq!(Status::of(Some(&Notification::warning("w"))), Status::Warning);
    assert_eq!(Status::of(Some(&Notification::error("e"))), Status::Error);
}

#[test]
fn test_component_id_display() {
    let id = ComponentId::new();
    let text = id.to_string();
    assert_eq!(text.len(), 36, "should be a hyphenated uuid");
    assert_ne!(id, ComponentId::new());
}

//! Core of a UI component toolkit: a tree of components with pluggable child stores, layouts with
//! per-child constraints, validity and status propagation, focus groups, and frames.
//!
//! Rendering and platform input are out of scope; a rendering layer reads the tree (layouts,
//! constraints, properties) and feeds user actions back in through the mutation operations.

pub mod component;
pub mod config;
pub mod error;
pub mod events;
pub mod layout;
pub mod store;
pub mod validation;

mod focus;
mod frame;
mod rect;
mod session;
mod tree;
mod validity;

pub use component::{Component, ComponentId, Notification, Severity, Status, Value};
pub use config::{Config, FocusFallback, LayoutReplacement};
pub use error::{ChangeError, ChangeRefused, RefusalCause, TreeError};
pub use rect::Rect;
pub use session::Session;
pub use tree::ComponentTree;
pub use validation::{ValidationError, Validator};

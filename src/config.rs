//! Tree configuration.

/// What `set_layout` does when the container already has children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutReplacement {
    /// Replace the layout and give every child fresh default constraints from the new one.
    Rederive,
    /// Refuse to replace the layout of a populated container.
    ForbidWhenPopulated,
}

impl Default for LayoutReplacement {
    fn default() -> Self {
        LayoutReplacement::Rederive
    }
}

/// Where application focus goes when the frame that held it closes and the new top frame vetoes
/// the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusFallback {
    /// Try the remaining open frames from the top down; clear focus if all of them refuse.
    NextInZOrder,
    /// Clear focus.
    Clear,
}

impl Default for FocusFallback {
    fn default() -> Self {
        FocusFallback::NextInZOrder
    }
}

/// Per-tree configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Identifier of the application frame.
    pub application_name: String,

    pub layout_replacement: LayoutReplacement,

    pub focus_fallback: FocusFallback,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            application_name: "application".to_string(),
            layout_replacement: LayoutReplacement::default(),
            focus_fallback: FocusFallback::default(),
        }
    }
}

impl Config {
    pub fn new(application_name: impl Into<String>) -> Self {
        Config {
            application_name: application_name.into(),
            ..Default::default()
        }
    }

    pub fn layout_replacement(mut self, policy: LayoutReplacement) -> Self {
        self.layout_replacement = policy;
        self
    }

    pub fn focus_fallback(mut self, policy: FocusFallback) -> Self {
        self.focus_fallback = policy;
        self
    }
}

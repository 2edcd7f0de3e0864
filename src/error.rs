//! Error types.
//!
//! [`TreeError`]s are programmer errors (ownership violations, misuse of the tree API, layout
//! mismatches) and indicate a bug in the caller. [`ChangeRefused`] is an ordinary outcome of a
//! vetoable change: a validator or listener said no and nothing changed.

use crate::component::ComponentId;
use crate::events::Veto;
use crate::validation::ValidationError;

/// Structural and precondition violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("component {0} does not exist")]
    UnknownComponent(ComponentId),

    #[error("component {child} already has parent {parent}")]
    AlreadyParented {
        child: ComponentId,
        parent: ComponentId,
    },

    #[error("component {child} is not a child of {owner}")]
    NotAMember {
        owner: ComponentId,
        child: ComponentId,
    },

    #[error("adding {child} to {owner} would create a cycle")]
    Cycle {
        owner: ComponentId,
        child: ComponentId,
    },

    #[error("identifier {identifier:?} is already taken by {existing}")]
    DuplicateIdentifier {
        identifier: String,
        existing: ComponentId,
    },

    #[error("identifier {identifier:?} is stored as {stored}, not {requested}")]
    IdentifierMismatch {
        identifier: String,
        stored: ComponentId,
        requested: ComponentId,
    },

    #[error("slot {index} is out of range (capacity {capacity})")]
    SlotOutOfRange { index: usize, capacity: usize },

    #[error("no free slot (capacity {capacity})")]
    NoFreeSlot { capacity: usize },

    #[error("{store} needs an explicit key to add a child")]
    KeyRequired { store: &'static str },

    #[error("component {0} has no child store")]
    NotComposite(ComponentId),

    #[error("component {0} is not a container")]
    NotAContainer(ComponentId),

    #[error("children of container {0} must be changed through the container")]
    ContainerManaged(ComponentId),

    #[error("component {owner} stores children in a {actual}, not a {expected}")]
    WrongStore {
        owner: ComponentId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("component {component} has no {capability} state")]
    MissingCapability {
        component: ComponentId,
        capability: &'static str,
    },

    #[error("layout {layout} has no default constraints")]
    NoDefaultConstraints { layout: &'static str },

    #[error("layout {layout} expects {expected} constraints")]
    ConstraintMismatch {
        layout: &'static str,
        expected: &'static str,
    },

    #[error("container {0} has children; its layout can’t be replaced")]
    LayoutInUse(ComponentId),

    #[error("frame {0} can’t be given a parent")]
    FrameChild(ComponentId),

    #[error("component {0} is not a frame")]
    NotAFrame(ComponentId),

    #[error("component {0} is not a focus group")]
    NotAFocusGroup(ComponentId),

    #[error("component {0} is still attached")]
    StillAttached(ComponentId),

    #[error("the application frame can’t be {0}")]
    ApplicationFrame(&'static str),
}

/// Why a vetoable change was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefusalCause {
    #[error("invalid: {0}")]
    Invalid(#[from] ValidationError),

    #[error("vetoed: {0}")]
    Vetoed(#[from] Veto),

    #[error("component {0} can’t receive focus")]
    NotFocusable(ComponentId),

    #[error("component {component} is not inside focus group {group}")]
    OutsideGroup {
        group: ComponentId,
        component: ComponentId,
    },

    #[error("frame {0} refused to close")]
    CloseRefused(ComponentId),
}

/// A refused change; state is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("change refused ({cause})")]
pub struct ChangeRefused {
    pub cause: RefusalCause,
}

impl From<RefusalCause> for ChangeRefused {
    fn from(cause: RefusalCause) -> Self {
        ChangeRefused { cause }
    }
}

impl From<ValidationError> for ChangeRefused {
    fn from(err: ValidationError) -> Self {
        RefusalCause::Invalid(err).into()
    }
}

impl From<Veto> for ChangeRefused {
    fn from(veto: Veto) -> Self {
        RefusalCause::Vetoed(veto).into()
    }
}

/// Returned by vetoable operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChangeError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Refused(#[from] ChangeRefused),
}

impl ChangeError {
    pub fn is_refused(&self) -> bool {
        match self {
            ChangeError::Refused(_) => true,
            ChangeError::Tree(_) => false,
        }
    }

    pub fn refusal(&self) -> Option<&RefusalCause> {
        match self {
            ChangeError::Refused(refused) => Some(&refused.cause),
            ChangeError::Tree(_) => None,
        }
    }
}

impl From<RefusalCause> for ChangeError {
    fn from(cause: RefusalCause) -> Self {
        ChangeError::Refused(cause.into())
    }
}

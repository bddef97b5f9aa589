use crate::canvas::{NodeId, PageId};

/// Failures reported by a canvas host.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CanvasError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("page {0} does not exist")]
    UnknownPage(PageId),

    #[error("host rejected the write: {0}")]
    WriteRejected(String),
}

/// Failures of a user-triggered command. Selection, geometry and numbering
/// failures are
/// raised before the first canvas write; host failures are passed through
/// as they happen and are not rolled back.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    /// Wrong selection shape for the command (count, type, or placement).
    #[error("invalid selection: {0}")]
    SelectionPrecondition(String),

    /// Requested gap or padding leaves no room for the new nodes.
    #[error("cannot place {count} node(s) with gap {gap}: computed size {size} is not positive")]
    GeometricInfeasibility { count: usize, gap: f32, size: f32 },

    /// Sibling numbers on `level` under `parent` would pass `u32::MAX`.
    #[error("no sibling numbers left on level {level} under {parent} for {count} node(s)")]
    NumberingExhausted {
        parent: String,
        level: String,
        count: usize,
    },

    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

/// Text that is not a descriptor in either accepted form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a hierarchy descriptor: {0:?}")]
pub struct InvalidDescriptor(pub String);

pub type CommandResult<T> = Result<T, CommandError>;

#[cfg(feature = "cli")]
pub mod cli;
pub mod canvas;
pub mod commands;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod hierarchy_dump;
pub mod ir;
pub mod layout;
pub mod parser;
pub mod query;
pub mod render;
pub mod sync;
pub mod theme;

pub use canvas::{Canvas, MemoryCanvas, NodeId};
#[cfg(feature = "cli")]
pub use cli::run;
pub use error::{CanvasError, CommandError, CommandResult};
pub use ir::{ChildRef, Descriptor, Direction, Side};
pub use parser::{parse_descriptor, serialize_descriptor};

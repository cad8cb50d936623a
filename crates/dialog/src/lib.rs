//! The dialog engine: per-caller session state plus the dispatcher state
//! machine that interprets free text contextually — continuing a multi-step
//! flow, executing a fixed command, or falling through to search.

pub mod dispatcher;
pub mod parse;
pub mod session;

pub use dispatcher::Dispatcher;
pub use session::{Flow, IndexOp, Menu, SessionState, SessionStore};

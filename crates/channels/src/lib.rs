//! Chat transport implementations for Ordbok.
//!
//! Each transport implements the `Channel` trait from `ordbok-core`: it
//! yields inbound messages and renders reply descriptors (text, keyboard
//! layout, bold markup) the way its platform expects.

pub mod cli;
pub mod telegram;

pub use cli::CliChannel;
pub use telegram::{TelegramChannel, TelegramConfig};

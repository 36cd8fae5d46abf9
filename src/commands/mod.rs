//! Application command handlers for earwitness.
//!
//! One submodule per application command.
//!
//! # Commands
//! - `record`: interactive recording practice session (default)
//! - `quote`: print a random practice quote
//! - `list_devices`: list available audio input devices
//! - `config`: open configuration file in user's preferred editor
//! - `logs`: display recent log entries

pub mod config;
pub mod list_devices;
pub mod logs;
pub mod quote;
pub mod record;

pub use config::handle_config;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use quote::handle_quote;
pub use record::handle_record;

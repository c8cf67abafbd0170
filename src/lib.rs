//! zapcmd library root.

pub mod chat;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod gateway;
pub mod interpreter;
pub mod logging;
pub mod resolver;
pub mod schedule;
pub mod store;
pub mod web;

pub use cli::Commands;
pub use command::{build_command_string, dispatch, parse_command, Operation, ParsedCommand};
pub use config::{load_settings, Settings};
pub use error::{Error, Result};
pub use gateway::{Gateway, HttpGateway};
pub use interpreter::{CommandResult, Interpreter};
pub use store::Store;
pub use web::run_server;

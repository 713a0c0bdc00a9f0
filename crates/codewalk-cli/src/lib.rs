//! Codewalk command-line front-end.
//!
//! Configuration, logging, the shell-command AI capability and the terminal
//! UI live here, separate from main.rs so they can be integration tested.

pub mod command_client;
pub mod config;
pub mod logging;
pub mod selection;
pub mod terminal;

//! Shared types for the Codewalk step-by-step code explainer.

mod ai;
mod conversation;
mod message;
mod selection;
mod walkthrough;

pub use ai::*;
pub use conversation::*;
pub use message::*;
pub use selection::*;
pub use walkthrough::*;

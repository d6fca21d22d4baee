//! `workorder` - Conversational work-order intake for repair shops
//!
//! An assistant collects workshop, customer, vehicle and service details in a
//! web chat. Once the user confirms the summary, the order is rendered as a
//! PDF, kept for a short retention window, and then swept away.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod chat;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod janitor;
pub mod logging;
pub mod logo;
pub mod order;
pub mod server;
pub mod storage;

pub use chat::{ChatMessage, ChatModel, OpenAiChatModel, Reply};
pub use config::Config;
pub use document::Renderer;
pub use error::{Error, Result};
pub use janitor::{Janitor, JanitorHandle, SweepReport};
pub use logging::init_logging;
pub use order::{CollectedOrder, WorkOrder};
pub use storage::{GeneratedFile, Storage, StorageStats};

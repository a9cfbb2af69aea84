pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::mail::SmtpMailer;
pub use adapters::storage::{LocalStateStore, LocalTemplateStore};
pub use config::MonitorConfig;
pub use crate::core::fetch::SlotFetcher;
pub use crate::core::notify::Notifier;
pub use crate::core::worker::SlotMonitorWorker;
pub use utils::error::{MonitorError, Result};

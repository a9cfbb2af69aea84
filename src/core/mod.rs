pub mod evaluator;
pub mod fetch;
pub mod notify;
pub mod parser;
pub mod worker;

pub use crate::domain::model::{CycleReport, DeliverySlot, OutboundMail};
pub use crate::domain::ports::{MailTransport, StateStore, TemplateStore};
pub use crate::utils::error::Result;

//! Spreadsheet-driven WhatsApp Web dispatcher
//!
//! Reads recipients from a CSV sheet, opens each chat in the browser and
//! pushes the message out with simulated keyboard and pointer input. The
//! sheet's status column is rewritten after every successful send, so an
//! interrupted batch can be resumed without messaging anyone twice.

pub mod batch;
pub mod config;
pub mod delivery;
pub mod errors;
pub mod message;
pub mod platforms;
pub mod prompt;
pub mod recipient;
pub mod schedule;
pub mod source;
pub mod validation;

pub use batch::{BatchOutcome, BatchRunner, BatchSummary, Confirm};
pub use config::{BatchConfig, ScreenRatio, SenderConfig, Settings};
pub use delivery::{Deliver, DeliveryEngine, Destination};
pub use errors::{AutomationError, SenderError};
pub use message::{compose, MessageTemplate};
pub use platforms::{InputEngine, Region};
pub use recipient::{DeliveryStatus, Recipient, SkipReason, SkipRecord};
pub use source::{LoadReport, RecipientSource};

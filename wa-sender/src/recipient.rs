//! Recipient records and their dispatch status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::SenderError;

/// Value of the `Estado` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryStatus {
    #[serde(rename = "Not Send")]
    NotSent,
    Sent,
    Error,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::NotSent => "Not Send",
            DeliveryStatus::Sent => "Sent",
            DeliveryStatus::Error => "Error",
        }
    }

    /// Only `NotSent` rows are picked up by a batch.
    pub fn is_dispatchable(&self) -> bool {
        matches!(self, DeliveryStatus::NotSent)
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = SenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Not Send" => Ok(DeliveryStatus::NotSent),
            "Sent" => Ok(DeliveryStatus::Sent),
            "Error" => Ok(DeliveryStatus::Error),
            other => Err(SenderError::Validation(format!(
                "unknown status '{other}' (expected 'Not Send', 'Sent' or 'Error')"
            ))),
        }
    }
}

/// A row eligible for dispatch. Name and phone are trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub name: String,
    pub phone: String,
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    StatusNotNotSent,
    IncompleteData,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::StatusNotNotSent => "status is not NotSent",
            SkipReason::IncompleteData => "incomplete data",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row left out of the batch. `status` is the raw cell text since it may
/// hold something that is not a known status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipRecord {
    pub name: String,
    pub phone: String,
    pub status: String,
    pub reason: SkipReason,
}

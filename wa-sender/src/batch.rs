//! Bulk dispatch over a recipient sheet.

use std::thread;

use tracing::{error, info, instrument, warn};

use crate::config::BatchConfig;
use crate::delivery::{Deliver, Destination};
use crate::errors::SenderError;
use crate::message::MessageTemplate;
use crate::recipient::DeliveryStatus;
use crate::source::{LoadReport, RecipientSource};

/// Asked once, after loading and before anything is sent.
pub trait Confirm {
    fn confirm(&mut self, report: &LoadReport) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&LoadReport) -> bool,
{
    fn confirm(&mut self, report: &LoadReport) -> bool {
        self(report)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The sheet could not be read; treated as having nothing to send.
    SourceUnavailable,
    NothingToSend,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub outcome: BatchOutcome,
    pub total_rows: usize,
    pub skipped: usize,
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn empty(outcome: BatchOutcome) -> Self {
        Self {
            outcome,
            total_rows: 0,
            skipped: 0,
            attempted: 0,
            sent: 0,
            failed: 0,
        }
    }
}

pub struct BatchRunner<D> {
    deliverer: D,
    template: MessageTemplate,
    config: BatchConfig,
}

impl<D: Deliver> BatchRunner<D> {
    pub fn new(deliverer: D, template: MessageTemplate, config: BatchConfig) -> Self {
        Self {
            deliverer,
            template,
            config,
        }
    }

    /// Sends to every eligible row of `source`, in file order.
    ///
    /// A successful attempt is written back as `Sent` before moving on, so
    /// an interrupted run can simply be started again. A failed attempt is
    /// logged and the row stays `Not Send`. The only error returned is a
    /// failure to write the status back.
    #[instrument(skip(self, source, confirm), fields(path = %source.path().display()))]
    pub fn run(
        &self,
        source: &RecipientSource,
        confirm: &mut dyn Confirm,
    ) -> Result<BatchSummary, SenderError> {
        let report = match source.load() {
            Ok(report) => report,
            Err(e) => {
                error!("Could not read recipients: {}", e);
                return Ok(BatchSummary::empty(BatchOutcome::SourceUnavailable));
            }
        };

        let mut summary = BatchSummary::empty(BatchOutcome::Completed);
        summary.total_rows = report.total_rows;
        summary.skipped = report.skipped.len();

        if report.eligible.is_empty() {
            info!("No recipients to send to");
            summary.outcome = BatchOutcome::NothingToSend;
            return Ok(summary);
        }

        if !confirm.confirm(&report) {
            info!("Batch cancelled by user");
            summary.outcome = BatchOutcome::Cancelled;
            return Ok(summary);
        }

        thread::sleep(self.config.startup_grace);

        let total = report.eligible.len();
        for (index, recipient) in report.eligible.iter().enumerate() {
            info!(
                "Processing message {}/{}: {} ({})",
                index + 1,
                total,
                recipient.name,
                recipient.phone
            );
            summary.attempted += 1;

            let message = self.template.render(&recipient.name);
            let destination = Destination::contact(recipient.phone.clone());
            match self.deliverer.attempt(&destination, &message) {
                Ok(()) => {
                    thread::sleep(self.config.post_send_wait);
                    let updated = source.persist_status(&recipient.name, DeliveryStatus::Sent)?;
                    if updated == 0 {
                        warn!("Row for {} disappeared before it could be marked", recipient.name);
                    }
                    summary.sent += 1;
                    info!("Message sent to {}", recipient.name);
                }
                Err(e) => {
                    summary.failed += 1;
                    error!("Error sending message to {}: {}", recipient.name, e);
                }
            }

            if index + 1 < total {
                info!(
                    "Waiting {:?} before the next message",
                    self.config.inter_message_delay
                );
                thread::sleep(self.config.inter_message_delay);
            }
        }

        info!(
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped,
            "Batch finished"
        );
        Ok(summary)
    }
}

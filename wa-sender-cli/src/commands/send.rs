use std::io;
use std::thread;

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use tracing::info;
use wa_sender::platforms::create_engine;
use wa_sender::prompt::Prompter;
use wa_sender::schedule::delay_until_local;
use wa_sender::{Deliver, DeliveryEngine};

/// Sends one message to a contact or group, asking for the details on stdin.
#[derive(Debug, Args, Clone, Default)]
pub struct SendCommand {}

impl SendCommand {
    pub fn execute(&self) -> Result<()> {
        let stdin = io::stdin();
        let mut prompter = Prompter::new(stdin.lock(), io::stdout());
        let request = prompter
            .collect_single_send()
            .context("Could not collect the message details")?;

        let wait = delay_until_local(request.hour, request.minute)?;
        println!(
            "{} Message scheduled for {:02}:{:02} (in {} seconds)",
            "⏰".yellow(),
            request.hour,
            request.minute,
            wait.as_secs()
        );
        info!(destination = %request.destination, ?wait, "Waiting for scheduled time");
        thread::sleep(wait);

        let engine = create_engine().context("Failed to start the desktop input engine")?;
        let delivery = DeliveryEngine::new(engine, request.config);
        delivery.attempt(&request.destination, &request.message)?;

        println!("{} Message sent to {}", "✓".green(), request.destination);
        Ok(())
    }
}

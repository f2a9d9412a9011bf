use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use colored::*;
use tracing::{debug, info};
use wa_sender::platforms::create_engine;
use wa_sender::prompt::Prompter;
use wa_sender::{
    BatchOutcome, BatchRunner, BatchSummary, DeliveryEngine, LoadReport, MessageTemplate,
    RecipientSource, SenderConfig, Settings,
};

/// How many eligible recipients are listed before asking to continue.
const PREVIEW_LEN: usize = 3;

#[derive(Debug, Args, Clone, Default)]
pub struct BulkCommand {
    /// CSV sheet with the columns Nombre, Telefono and Estado
    #[arg(value_name = "SOURCE")]
    pub source: Option<PathBuf>,

    /// Seconds to wait between two messages
    #[arg(long, short = 'd', env = "WA_SENDER_DELAY")]
    pub delay: Option<f64>,

    /// Message template file; `{name}` is replaced by the recipient's name
    #[arg(long, short = 't', env = "WA_SENDER_TEMPLATE")]
    pub template: Option<PathBuf>,

    /// YAML settings file with optional `sender` and `batch` sections
    #[arg(long, short = 'c', env = "WA_SENDER_CONFIG")]
    pub config: Option<PathBuf>,
}

impl BulkCommand {
    pub fn execute(&self) -> Result<()> {
        let source_path = self
            .source
            .as_ref()
            .ok_or_else(|| anyhow!("no recipient sheet given\n\nUsage: wa-sender <SOURCE>"))?;
        if !source_path.is_file() {
            bail!("recipient sheet not found: {}", source_path.display());
        }

        let settings = match &self.config {
            Some(path) => Settings::load(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => Settings::default(),
        };
        let sender_config = settings.sender_config(SenderConfig::bulk())?;
        if let Some(image) = sender_config.send_button_image() {
            if !image.is_file() {
                println!(
                    "{} Send button image {} not found; that step will be skipped.",
                    "⚠".yellow(),
                    image.display()
                );
            }
        }
        let mut batch_config = settings.batch.clone();
        if let Some(delay) = self.delay {
            batch_config.inter_message_delay = Duration::try_from_secs_f64(delay)
                .map_err(|e| anyhow!("invalid --delay {delay}: {e}"))?;
        }

        let template = match &self.template {
            Some(path) => MessageTemplate::from_file(path)
                .with_context(|| format!("Failed to load template {}", path.display()))?,
            None => MessageTemplate::default(),
        };

        let engine = create_engine().context("Failed to start the desktop input engine")?;
        let runner = BatchRunner::new(
            DeliveryEngine::new(engine, sender_config),
            template,
            batch_config.clone(),
        );
        let source = RecipientSource::new(source_path);
        info!(source = %source_path.display(), "Starting bulk send");

        let startup_grace = batch_config.startup_grace;
        let mut confirm = |report: &LoadReport| {
            print_load_report(&source_path.display().to_string(), report);
            let confirmed = ask_to_continue(report.eligible.len());
            if confirmed {
                println!(
                    "\n{} Starting in {} seconds. Keep the WhatsApp Web window in front.",
                    "⏳".yellow(),
                    startup_grace.as_secs()
                );
            }
            confirmed
        };
        let summary = runner.run(&source, &mut confirm)?;
        print_summary(&summary);
        Ok(())
    }
}

fn ask_to_continue(count: usize) -> bool {
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    match prompter.confirm(&format!("\nSend {count} message(s)? (y/n): ")) {
        Ok(answer) => answer,
        Err(e) => {
            debug!("Confirmation prompt failed: {}", e);
            false
        }
    }
}

fn print_load_report(source: &str, report: &LoadReport) {
    println!("\n{}", format!("📋 Recipients from {source}").bold().cyan());
    println!("  Rows read: {}", report.total_rows);
    println!("  To send:   {}", report.eligible.len().to_string().green());
    println!("  Skipped:   {}", report.skipped.len().to_string().yellow());

    println!("\n{}", "First recipients:".bold());
    for (index, recipient) in report.eligible.iter().take(PREVIEW_LEN).enumerate() {
        println!("  {}. {} ({})", index + 1, recipient.name, recipient.phone);
    }
    if report.eligible.len() > PREVIEW_LEN {
        println!(
            "  {}",
            format!("... and {} more", report.eligible.len() - PREVIEW_LEN).dimmed()
        );
    }

    for name in report.duplicate_names() {
        println!(
            "  {} '{}' appears on several pending rows; one successful send marks them all",
            "⚠".yellow(),
            name
        );
    }

    if !report.skipped.is_empty() {
        println!("\n{}", "Skipped rows:".bold());
        for skip in &report.skipped {
            println!(
                "  {} {} ({}) [{}]: {}",
                "⏭".yellow(),
                skip.name,
                skip.phone,
                skip.status,
                skip.reason
            );
        }
    }
}

fn print_summary(summary: &BatchSummary) {
    match summary.outcome {
        BatchOutcome::SourceUnavailable => {
            println!("{} The recipient sheet could not be read.", "⚠".yellow());
        }
        BatchOutcome::NothingToSend => {
            println!("{} No recipients with status 'Not Send'.", "ℹ".blue());
        }
        BatchOutcome::Cancelled => {
            println!("{} Operation cancelled.", "✗".red());
        }
        BatchOutcome::Completed => {
            println!("\n{}", "📊 Batch finished".bold().cyan());
            println!("  {} Sent:    {}", "✓".green(), summary.sent);
            println!("  {} Failed:  {}", "✗".red(), summary.failed);
            println!("  {} Skipped: {}", "⏭".yellow(), summary.skipped);
            if summary.failed > 0 {
                println!(
                    "\n{} Failed rows kept 'Not Send'; run again to retry them.",
                    "⚠".yellow()
                );
            }
        }
    }
}

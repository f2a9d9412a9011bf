//! Line-based prompts on any reader/writer pair.
//!
//! [`Prompter::collect_single_send`] walks the user through a one-off send
//! and returns a fully built, validated request.

use std::io::{BufRead, Write};
use std::time::Duration;

use tracing::{error, info};

use crate::config::SenderConfig;
use crate::delivery::Destination;
use crate::errors::SenderError;
use crate::validation::{validate_phone_number, validate_time};

/// Everything needed for one interactive send.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleSendRequest {
    pub destination: Destination,
    pub message: String,
    pub hour: u32,
    pub minute: u32,
    pub config: SenderConfig,
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `question` and returns the trimmed answer.
    pub fn ask(&mut self, question: &str) -> Result<String, SenderError> {
        write!(self.output, "{question}")
            .and_then(|_| self.output.flush())
            .map_err(|e| SenderError::Prompt(e.to_string()))?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| SenderError::Prompt(e.to_string()))?;
        if read == 0 {
            return Err(SenderError::Prompt("input closed".to_string()));
        }
        Ok(line.trim().to_string())
    }

    fn say(&mut self, text: &str) -> Result<(), SenderError> {
        writeln!(self.output, "{text}").map_err(|e| SenderError::Prompt(e.to_string()))
    }

    /// `y`/`yes` (or `s`/`si`) means yes; anything else is no.
    pub fn confirm(&mut self, question: &str) -> Result<bool, SenderError> {
        let answer = self.ask(question)?.to_lowercase();
        Ok(matches!(answer.as_str(), "y" | "yes" | "s" | "si" | "sí"))
    }

    fn ask_number_or(&mut self, question: &str, default: u64) -> Result<u64, SenderError> {
        loop {
            let answer = self.ask(question)?;
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<u64>() {
                Ok(value) => return Ok(value),
                Err(_) => self.say("Please enter a whole number of seconds.")?,
            }
        }
    }

    pub fn collect_single_send(&mut self) -> Result<SingleSendRequest, SenderError> {
        self.say("\n=== WhatsApp Message Sender ===")?;

        let mode = loop {
            let mode = self
                .ask("Enter mode ('contact' to send to a contact, 'group' to send to a group): ")?
                .to_lowercase();
            if mode == "contact" || mode == "group" {
                info!("Mode selected: {}", mode);
                break mode;
            }
            error!("Invalid mode selected: {}", mode);
            self.say("Invalid mode. Please enter 'contact' or 'group'.")?;
        };

        let destination = if mode == "contact" {
            loop {
                let phone = self.ask("Enter phone number (+1234567890): ")?;
                if validate_phone_number(&phone) {
                    info!("Phone number validated");
                    break Destination::contact(phone);
                }
                self.say("Invalid phone number. Use '+' followed by at least 10 digits.")?;
            }
        } else {
            loop {
                let group_id = self.ask("Enter group ID: ")?;
                if !group_id.is_empty() {
                    info!("Group ID entered: {}", group_id);
                    break Destination::group(group_id);
                }
                self.say("Group ID cannot be empty.")?;
            }
        };

        let message = self.ask("Write the message you want to send: ")?;
        info!("Message entered");

        let (hour, minute) = loop {
            let hour = self.ask("Enter the hour to send (0-23): ")?;
            let minute = self.ask("Enter the minute to send (0-59): ")?;
            match (hour.parse::<i64>(), minute.parse::<i64>()) {
                (Ok(h), Ok(m)) if validate_time(h, m) => {
                    info!("Time set to {:02}:{:02}", h, m);
                    break (h as u32, m as u32);
                }
                (Ok(_), Ok(_)) => self.say("Hour must be 0-23 and minute 0-59.")?,
                _ => {
                    error!("Invalid time format entered");
                    self.say("Please enter valid numbers for the time.")?;
                }
            }
        };

        let page_load_wait = loop {
            let secs = self.ask_number_or("Waiting time before sending (seconds) [15]: ", 15)?;
            if secs > 0 {
                break secs;
            }
            self.say("The waiting time must be at least one second.")?;
        };
        let close_tab = {
            let answer = self
                .ask("Close tab after sending? (True/False) [True]: ")?
                .to_lowercase();
            matches!(answer.as_str(), "true" | "t" | "")
        };
        let close_wait = self.ask_number_or("Time to wait before closing tab (seconds) [2]: ", 2)?;

        let config = SenderConfig::builder()
            .page_load_wait(Duration::from_secs(page_load_wait))
            .close_tab(close_tab)
            .close_wait(Duration::from_secs(close_wait))
            .build()?;

        Ok(SingleSendRequest {
            destination,
            message,
            hour,
            minute,
            config,
        })
    }
}

//! One delivery attempt: open the chat, push the message out, close the tab.
//!
//! WhatsApp Web gives no signal that a message actually left, so the send
//! is triggered by a ladder of independent input actions. Every rung but
//! the last may fail without aborting the attempt.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::config::{ScreenRatio, SenderConfig};
use crate::errors::{AutomationError, SenderError};
use crate::platforms::{ChatOpenOptions, InputEngine};

/// Where a message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Contact { phone: String },
    /// `group_id` is the invite code of the group link.
    Group { group_id: String },
}

impl Destination {
    pub fn contact(phone: impl Into<String>) -> Self {
        Destination::Contact {
            phone: phone.into(),
        }
    }

    pub fn group(group_id: impl Into<String>) -> Self {
        Destination::Group {
            group_id: group_id.into(),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Contact { phone } => write!(f, "contact {phone}"),
            Destination::Group { group_id } => write!(f, "group {group_id}"),
        }
    }
}

/// One rung of the send ladder.
#[derive(Debug, Clone, PartialEq)]
pub enum SendStep {
    /// Glide to a screen-relative point and click.
    ClickAt(ScreenRatio),
    /// Press `key` `times` times, pausing after each press.
    PressKey { key: String, times: u32 },
    PressCombo(Vec<String>),
    /// Click the center of `image` if it can be found on screen.
    ClickImage { image: PathBuf, confidence: f32 },
}

impl fmt::Display for SendStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendStep::ClickAt(ratio) => write!(f, "click at ({:.2}, {:.2})", ratio.x, ratio.y),
            SendStep::PressKey { key, times } => write!(f, "press {key} x{times}"),
            SendStep::PressCombo(keys) => write!(f, "press {}", keys.join("+")),
            SendStep::ClickImage { image, .. } => write!(f, "click image {}", image.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LadderStep {
    pub step: SendStep,
    pub pause_after: Duration,
}

/// Ladder for `config`: primary click, commit key x3, secondary combo,
/// image click (when an image is configured), alternate click, commit key.
pub fn send_ladder(config: &SenderConfig) -> Vec<LadderStep> {
    let mut ladder = vec![
        LadderStep {
            step: SendStep::ClickAt(config.send_position),
            pause_after: config.click_pause,
        },
        LadderStep {
            step: SendStep::PressKey {
                key: config.commit_key.clone(),
                times: 3,
            },
            pause_after: Duration::ZERO,
        },
        LadderStep {
            step: SendStep::PressCombo(config.secondary_combo.clone()),
            pause_after: config.key_pause,
        },
    ];
    if let Some(image) = &config.send_button_image {
        ladder.push(LadderStep {
            step: SendStep::ClickImage {
                image: image.clone(),
                confidence: config.image_confidence,
            },
            pause_after: Duration::ZERO,
        });
    }
    ladder.push(LadderStep {
        step: SendStep::ClickAt(config.alternate_send_position),
        pause_after: config.click_pause,
    });
    ladder.push(LadderStep {
        step: SendStep::PressKey {
            key: config.commit_key.clone(),
            times: 1,
        },
        pause_after: Duration::ZERO,
    });
    ladder
}

/// Anything that can carry a message to a destination.
pub trait Deliver {
    fn attempt(&self, destination: &Destination, message: &str) -> Result<(), SenderError>;
}

pub struct DeliveryEngine {
    engine: Arc<dyn InputEngine>,
    config: SenderConfig,
    ladder: Vec<LadderStep>,
}

impl DeliveryEngine {
    pub fn new(engine: Arc<dyn InputEngine>, config: SenderConfig) -> Self {
        let ladder = send_ladder(&config);
        Self {
            engine,
            config,
            ladder,
        }
    }

    fn open_chat(&self, destination: &Destination, message: &str) -> Result<(), AutomationError> {
        // the tab is closed here after the ladder, not by the opener
        let options = ChatOpenOptions {
            wait: self.config.page_load_wait,
            close_tab: false,
            close_wait: self.config.close_wait,
        };
        match destination {
            Destination::Contact { phone } => {
                self.engine.open_contact_chat(phone, message, options)?;
                thread::sleep(self.config.contact_settle);
            }
            Destination::Group { group_id } => {
                self.engine.open_group_chat(group_id, message, options)?;
                thread::sleep(self.config.group_settle);
            }
        }
        Ok(())
    }

    /// Runs the ladder. Only the last rung's failure is returned.
    pub fn trigger_send(&self) -> Result<(), AutomationError> {
        let last = self.ladder.len().saturating_sub(1);
        for (index, rung) in self.ladder.iter().enumerate() {
            debug!("Send ladder step {}: {}", index + 1, rung.step);
            if let Err(e) = self.run_step(&rung.step) {
                if index == last {
                    return Err(e);
                }
                warn!("Send ladder step '{}' failed, continuing: {}", rung.step, e);
            }
            thread::sleep(rung.pause_after);
        }
        Ok(())
    }

    fn run_step(&self, step: &SendStep) -> Result<(), AutomationError> {
        match step {
            SendStep::ClickAt(ratio) => {
                let (width, height) = self.engine.screen_size()?;
                let (x, y) = ratio.resolve(width, height);
                self.engine.move_pointer(x, y, self.config.pointer_move)?;
                self.engine.click()
            }
            SendStep::PressKey { key, times } => {
                for _ in 0..*times {
                    self.engine.press_key(key)?;
                    thread::sleep(self.config.key_pause);
                }
                Ok(())
            }
            SendStep::PressCombo(keys) => {
                let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
                self.engine.press_combo(&keys)
            }
            SendStep::ClickImage { image, confidence } => {
                match self.engine.locate_on_screen(image, *confidence)? {
                    Some(region) => {
                        let (x, y) = region.center();
                        self.engine.click_at(x, y)
                    }
                    None => {
                        debug!("Send button image not visible");
                        Ok(())
                    }
                }
            }
        }
    }

    fn run_attempt(&self, destination: &Destination, message: &str) -> Result<(), AutomationError> {
        self.open_chat(destination, message)?;
        self.trigger_send()?;
        thread::sleep(self.config.click_pause);

        if let Destination::Group { .. } = destination {
            self.engine.press_key(&self.config.commit_key)?;
            thread::sleep(self.config.click_pause);
            thread::sleep(self.config.group_delivery_wait);
        }

        if self.config.close_tab {
            thread::sleep(self.config.close_wait);
            let combo: Vec<&str> = self.config.close_combo.iter().map(String::as_str).collect();
            self.engine.press_combo(&combo)?;
            thread::sleep(self.config.click_pause);
        }
        Ok(())
    }
}

impl Deliver for DeliveryEngine {
    #[instrument(skip(self, message), fields(destination = %destination))]
    fn attempt(&self, destination: &Destination, message: &str) -> Result<(), SenderError> {
        info!("Sending message to {}", destination);
        match self.run_attempt(destination, message) {
            Ok(()) => {
                info!("Message sent to {}", destination);
                Ok(())
            }
            Err(source) => {
                error!("Failed to send message to {}: {}", destination, source);
                Err(SenderError::Delivery {
                    destination: destination.to_string(),
                    source,
                })
            }
        }
    }
}

#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use wa_sender::platforms::{ChatOpenOptions, InputEngine, Region};
use wa_sender::{AutomationError, SenderConfig};

/// Test helper to setup logging for debugging
pub fn setup_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Every call the engine received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    OpenContact { phone: String, message: String },
    OpenGroup { group_id: String, message: String },
    Move(i32, i32),
    Click,
    ClickAt(i32, i32),
    Key(String),
    Combo(Vec<String>),
    Locate(PathBuf),
    ScreenSize,
}

/// An `InputEngine` that records calls instead of touching the desktop.
#[derive(Default)]
pub struct RecordingEngine {
    pub calls: Mutex<Vec<Call>>,
    /// Phones whose chat fails to open.
    pub failing_phones: HashSet<String>,
    pub fail_screen_size: bool,
    pub fail_keys: bool,
    pub fail_combos: bool,
    pub image_region: Option<Region>,
}

impl RecordingEngine {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn opened_phones(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::OpenContact { phone, .. } => Some(phone),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl InputEngine for RecordingEngine {
    fn open_contact_chat(
        &self,
        phone: &str,
        message: &str,
        options: ChatOpenOptions,
    ) -> Result<(), AutomationError> {
        assert!(!options.close_tab, "delivery engine closes the tab itself");
        self.record(Call::OpenContact {
            phone: phone.to_string(),
            message: message.to_string(),
        });
        if self.failing_phones.contains(phone) {
            return Err(AutomationError::PlatformError(format!(
                "browser refused to open chat for {phone}"
            )));
        }
        Ok(())
    }

    fn open_group_chat(
        &self,
        group_id: &str,
        message: &str,
        _options: ChatOpenOptions,
    ) -> Result<(), AutomationError> {
        self.record(Call::OpenGroup {
            group_id: group_id.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }

    fn move_pointer(&self, x: i32, y: i32, _duration: Duration) -> Result<(), AutomationError> {
        self.record(Call::Move(x, y));
        Ok(())
    }

    fn click(&self) -> Result<(), AutomationError> {
        self.record(Call::Click);
        Ok(())
    }

    fn click_at(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        self.record(Call::ClickAt(x, y));
        Ok(())
    }

    fn press_key(&self, key: &str) -> Result<(), AutomationError> {
        self.record(Call::Key(key.to_string()));
        if self.fail_keys {
            return Err(AutomationError::PlatformError("keyboard unavailable".to_string()));
        }
        Ok(())
    }

    fn press_combo(&self, keys: &[&str]) -> Result<(), AutomationError> {
        self.record(Call::Combo(keys.iter().map(|k| k.to_string()).collect()));
        if self.fail_combos {
            return Err(AutomationError::PlatformError("keyboard unavailable".to_string()));
        }
        Ok(())
    }

    fn locate_on_screen(
        &self,
        image: &Path,
        _confidence: f32,
    ) -> Result<Option<Region>, AutomationError> {
        self.record(Call::Locate(image.to_path_buf()));
        match self.image_region {
            Some(region) => Ok(Some(region)),
            None => Err(AutomationError::InvalidArgument(format!(
                "Failed to load image {}",
                image.display()
            ))),
        }
    }

    fn screen_size(&self) -> Result<(u32, u32), AutomationError> {
        self.record(Call::ScreenSize);
        if self.fail_screen_size {
            return Err(AutomationError::PlatformError("no display".to_string()));
        }
        Ok((1920, 1080))
    }
}

/// Default layout with every wait set to zero.
pub fn instant_config() -> SenderConfig {
    SenderConfig::builder()
        .page_load_wait(Duration::from_millis(1))
        .close_wait(Duration::ZERO)
        .contact_settle(Duration::ZERO)
        .group_timing(Duration::ZERO, Duration::ZERO)
        .pacing(Duration::ZERO, Duration::ZERO, Duration::ZERO)
        .build()
        .unwrap()
}

pub fn write_sheet(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("guests.csv");
    fs::write(&path, contents).unwrap();
    path
}

//! Timing and layout settings for delivery attempts and batch runs.
//!
//! A [`SenderConfig`] is assembled once (defaults, a YAML file, or the
//! builder), validated, and then handed by value to the delivery engine.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::SenderError;
use crate::platforms::keys;

/// A point expressed as fractions of the screen's width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRatio {
    pub x: f64,
    pub y: f64,
}

impl ScreenRatio {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Absolute pixel position on a `width` x `height` screen, truncated.
    pub fn resolve(&self, width: u32, height: u32) -> (i32, i32) {
        (
            (f64::from(width) * self.x) as i32,
            (f64::from(height) * self.y) as i32,
        )
    }

    fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SenderConfig {
    /// Time given to the chat page to load before the send ladder starts.
    #[serde(with = "duration_secs")]
    pub(crate) page_load_wait: Duration,
    pub(crate) close_tab: bool,
    #[serde(with = "duration_secs")]
    pub(crate) close_wait: Duration,
    #[serde(with = "duration_secs")]
    pub(crate) contact_settle: Duration,
    #[serde(with = "duration_secs")]
    pub(crate) group_settle: Duration,
    /// Extra wait after the ladder for group chats, before closing.
    #[serde(with = "duration_secs")]
    pub(crate) group_delivery_wait: Duration,
    #[serde(with = "duration_secs")]
    pub(crate) pointer_move: Duration,
    #[serde(with = "duration_secs")]
    pub(crate) key_pause: Duration,
    #[serde(with = "duration_secs")]
    pub(crate) click_pause: Duration,
    pub(crate) commit_key: String,
    pub(crate) secondary_combo: Vec<String>,
    pub(crate) close_combo: Vec<String>,
    pub(crate) send_button_image: Option<PathBuf>,
    pub(crate) image_confidence: f32,
    pub(crate) send_position: ScreenRatio,
    pub(crate) alternate_send_position: ScreenRatio,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            page_load_wait: Duration::from_secs(15),
            close_tab: true,
            close_wait: Duration::from_secs(2),
            contact_settle: Duration::from_secs(2),
            group_settle: Duration::from_secs(3),
            group_delivery_wait: Duration::from_secs(5),
            pointer_move: Duration::from_millis(500),
            key_pause: Duration::from_millis(500),
            click_pause: Duration::from_secs(1),
            commit_key: "enter".to_string(),
            secondary_combo: vec!["ctrl".to_string(), "enter".to_string()],
            close_combo: vec!["ctrl".to_string(), "w".to_string()],
            send_button_image: Some(PathBuf::from("send_button.png")),
            image_confidence: 0.7,
            send_position: ScreenRatio::new(0.95, 0.95),
            alternate_send_position: ScreenRatio::new(0.98, 0.90),
        }
    }
}

impl SenderConfig {
    pub fn builder() -> SenderConfigBuilder {
        SenderConfigBuilder {
            config: SenderConfig::default(),
        }
    }

    /// Shorter page-load and close waits used when sending a whole sheet.
    pub fn bulk() -> Self {
        Self {
            page_load_wait: Duration::from_secs(10),
            close_wait: Duration::from_secs(1),
            ..Self::default()
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, SenderError> {
        let config: SenderConfig = serde_yaml::from_str(text)
            .map_err(|e| SenderError::InvalidConfig(format!("invalid sender config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn page_load_wait(&self) -> Duration {
        self.page_load_wait
    }

    pub fn close_tab(&self) -> bool {
        self.close_tab
    }

    pub fn close_wait(&self) -> Duration {
        self.close_wait
    }

    pub fn send_button_image(&self) -> Option<&Path> {
        self.send_button_image.as_deref()
    }

    /// A copy of `self` with the keys present in `overrides` replaced.
    ///
    /// Keys missing from `overrides` keep the value they have in `self`.
    pub fn with_overrides(&self, overrides: &serde_yaml::Value) -> Result<Self, SenderError> {
        let invalid =
            |e: serde_yaml::Error| SenderError::InvalidConfig(format!("invalid sender config: {e}"));
        let mut merged = serde_yaml::to_value(self).map_err(invalid)?;
        match (merged.as_mapping_mut(), overrides) {
            (_, serde_yaml::Value::Null) => {}
            (Some(fields), serde_yaml::Value::Mapping(changes)) => {
                for (key, value) in changes {
                    fields.insert(key.clone(), value.clone());
                }
            }
            _ => {
                return Err(SenderError::InvalidConfig(
                    "sender section must be a mapping".to_string(),
                ))
            }
        }
        let config: SenderConfig = serde_yaml::from_value(merged).map_err(invalid)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), SenderError> {
        if self.page_load_wait.is_zero() {
            return Err(SenderError::InvalidConfig(
                "page_load_wait must be greater than zero".to_string(),
            ));
        }
        if !(self.image_confidence > 0.0 && self.image_confidence <= 1.0) {
            return Err(SenderError::InvalidConfig(format!(
                "image_confidence must be in (0, 1], got {}",
                self.image_confidence
            )));
        }
        for (label, ratio) in [
            ("send_position", self.send_position),
            ("alternate_send_position", self.alternate_send_position),
        ] {
            if !ratio.is_valid() {
                return Err(SenderError::InvalidConfig(format!(
                    "{label} must lie within [0, 1] on both axes, got ({}, {})",
                    ratio.x, ratio.y
                )));
            }
        }
        keys::parse_key(&self.commit_key)
            .map_err(|e| SenderError::InvalidConfig(format!("commit_key: {e}")))?;
        for (label, combo) in [
            ("secondary_combo", &self.secondary_combo),
            ("close_combo", &self.close_combo),
        ] {
            if combo.is_empty() {
                return Err(SenderError::InvalidConfig(format!("{label} is empty")));
            }
            for key in combo {
                keys::parse_key(key)
                    .map_err(|e| SenderError::InvalidConfig(format!("{label}: {e}")))?;
            }
        }
        Ok(())
    }
}

/// Collects overrides on top of [`SenderConfig::default`]; `build` validates.
#[derive(Debug, Clone)]
pub struct SenderConfigBuilder {
    config: SenderConfig,
}

impl SenderConfigBuilder {
    pub fn from_config(config: SenderConfig) -> Self {
        Self { config }
    }

    pub fn page_load_wait(mut self, wait: Duration) -> Self {
        self.config.page_load_wait = wait;
        self
    }

    pub fn close_tab(mut self, close: bool) -> Self {
        self.config.close_tab = close;
        self
    }

    pub fn close_wait(mut self, wait: Duration) -> Self {
        self.config.close_wait = wait;
        self
    }

    pub fn contact_settle(mut self, wait: Duration) -> Self {
        self.config.contact_settle = wait;
        self
    }

    pub fn group_timing(mut self, settle: Duration, delivery_wait: Duration) -> Self {
        self.config.group_settle = settle;
        self.config.group_delivery_wait = delivery_wait;
        self
    }

    /// Pointer travel time and the short pauses between ladder steps.
    pub fn pacing(mut self, pointer_move: Duration, key_pause: Duration, click_pause: Duration) -> Self {
        self.config.pointer_move = pointer_move;
        self.config.key_pause = key_pause;
        self.config.click_pause = click_pause;
        self
    }

    pub fn commit_key(mut self, key: impl Into<String>) -> Self {
        self.config.commit_key = key.into();
        self
    }

    pub fn secondary_combo<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.secondary_combo = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn close_combo<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.close_combo = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn send_button_image(mut self, image: Option<PathBuf>) -> Self {
        self.config.send_button_image = image;
        self
    }

    pub fn image_confidence(mut self, confidence: f32) -> Self {
        self.config.image_confidence = confidence;
        self
    }

    pub fn send_positions(mut self, primary: ScreenRatio, alternate: ScreenRatio) -> Self {
        self.config.send_position = primary;
        self.config.alternate_send_position = alternate;
        self
    }

    pub fn build(self) -> Result<SenderConfig, SenderError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Pacing of a bulk run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Pause between two recipients.
    #[serde(with = "duration_secs")]
    pub inter_message_delay: Duration,
    /// Pause after confirmation so the browser session can be checked.
    #[serde(with = "duration_secs")]
    pub startup_grace: Duration,
    /// Pause between a successful attempt and the status rewrite.
    #[serde(with = "duration_secs")]
    pub post_send_wait: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            inter_message_delay: Duration::from_secs(15),
            startup_grace: Duration::from_secs(10),
            post_send_wait: Duration::from_secs(5),
        }
    }
}

/// Contents of a `--config` YAML file. Both sections are optional.
///
/// The `sender` section only lists the keys to change; they are applied
/// on top of whichever base the caller picks (see [`Settings::sender_config`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    sender: Option<serde_yaml::Value>,
    pub batch: BatchConfig,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SenderError> {
        let text = fs::read_to_string(path).map_err(|e| {
            SenderError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, SenderError> {
        let settings: Settings = serde_yaml::from_str(text)
            .map_err(|e| SenderError::InvalidConfig(format!("invalid settings: {e}")))?;
        // reject bad keys or values now rather than when the batch starts
        settings.sender_config(SenderConfig::default())?;
        Ok(settings)
    }

    /// `base` with this file's `sender` overrides applied.
    pub fn sender_config(&self, base: SenderConfig) -> Result<SenderConfig, SenderError> {
        match &self.sender {
            Some(overrides) => base.with_overrides(overrides),
            None => Ok(base),
        }
    }
}

/// Durations as (fractional) seconds in config files.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SenderConfig::default().validate().is_ok());
        assert!(SenderConfig::bulk().validate().is_ok());
        assert_eq!(SenderConfig::bulk().page_load_wait(), Duration::from_secs(10));
    }

    #[test]
    fn ratio_resolves_to_truncated_pixels() {
        let ratio = ScreenRatio::new(0.95, 0.95);
        assert_eq!(ratio.resolve(1920, 1080), (1824, 1026));
        assert_eq!(ScreenRatio::new(0.98, 0.90).resolve(1366, 768), (1338, 691));
    }

    #[test]
    fn builder_rejects_bad_values() {
        assert!(SenderConfig::builder()
            .page_load_wait(Duration::ZERO)
            .build()
            .is_err());
        assert!(SenderConfig::builder().image_confidence(0.0).build().is_err());
        assert!(SenderConfig::builder().image_confidence(1.5).build().is_err());
        assert!(SenderConfig::builder().commit_key("hyperspace").build().is_err());
        assert!(SenderConfig::builder()
            .close_combo(Vec::<String>::new())
            .build()
            .is_err());
        assert!(SenderConfig::builder()
            .send_positions(ScreenRatio::new(1.2, 0.5), ScreenRatio::new(0.5, 0.5))
            .build()
            .is_err());
    }

    #[test]
    fn yaml_overrides_selected_fields() {
        let config = SenderConfig::from_yaml_str(
            "page_load_wait: 20\nclose_tab: false\nimage_confidence: 0.8\nsend_button_image: null\n",
        )
        .unwrap();
        assert_eq!(config.page_load_wait(), Duration::from_secs(20));
        assert!(!config.close_tab());
        assert_eq!(config.send_button_image(), None);
        assert_eq!(config.close_wait(), Duration::from_secs(2));
    }

    #[test]
    fn yaml_rejects_unknown_fields() {
        assert!(SenderConfig::from_yaml_str("wait_to_send: 3\n").is_err());
    }

    #[test]
    fn settings_file_with_batch_section() {
        let settings = Settings::from_yaml_str(
            "batch:\n  inter_message_delay: 30\n  startup_grace: 0.5\nsender:\n  close_wait: 1.5\n",
        )
        .unwrap();
        assert_eq!(settings.batch.inter_message_delay, Duration::from_secs(30));
        assert_eq!(settings.batch.startup_grace, Duration::from_millis(500));
        assert_eq!(settings.batch.post_send_wait, Duration::from_secs(5));
        let sender = settings.sender_config(SenderConfig::default()).unwrap();
        assert_eq!(sender.close_wait(), Duration::from_millis(1500));
    }

    #[test]
    fn partial_sender_section_keeps_the_base_values() {
        let settings = Settings::from_yaml_str("sender:\n  close_tab: false\n").unwrap();
        let sender = settings.sender_config(SenderConfig::bulk()).unwrap();
        assert!(!sender.close_tab());
        assert_eq!(sender.page_load_wait(), Duration::from_secs(10));
        assert_eq!(sender.close_wait(), Duration::from_secs(1));

        let untouched = Settings::default().sender_config(SenderConfig::bulk()).unwrap();
        assert_eq!(untouched, SenderConfig::bulk());
    }

    #[test]
    fn sender_overrides_are_checked_on_load() {
        assert!(Settings::from_yaml_str("sender:\n  wait_to_send: 3\n").is_err());
        assert!(Settings::from_yaml_str("sender:\n  image_confidence: 2.0\n").is_err());
        assert!(Settings::from_yaml_str("sender: 5\n").is_err());
    }

    #[test]
    fn overrides_round_trip_every_field() {
        let base = SenderConfig::builder()
            .send_button_image(None)
            .close_wait(Duration::from_millis(250))
            .build()
            .unwrap();
        let same = base.with_overrides(&serde_yaml::Value::Null).unwrap();
        assert_eq!(same, base);
    }
}

//! Input engine that drives the real desktop.
//!
//! Keyboard and pointer events go through `rdev::simulate`, screenshots
//! come from `xcap`, and chats are opened by handing a WhatsApp Web URL to
//! the platform's default URL opener.

use std::path::Path;
use std::process::Command;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use rdev::{Button, EventType};
use tracing::{debug, info, instrument, warn};

use super::{keys, matcher, ChatOpenOptions, InputEngine, Region};
use crate::AutomationError;

const WEB_BASE_URL: &str = "https://web.whatsapp.com";

/// Some platforms drop events that arrive back to back.
const EVENT_GAP: Duration = Duration::from_millis(20);
const POINTER_STEPS: u32 = 20;

#[cfg(target_os = "macos")]
const PASTE_MODIFIER: &str = "cmd";
#[cfg(not(target_os = "macos"))]
const PASTE_MODIFIER: &str = "ctrl";

pub fn contact_chat_url(phone: &str, message: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    format!(
        "{WEB_BASE_URL}/send?phone=%2B{digits}&text={}",
        urlencoding::encode(message)
    )
}

pub fn group_chat_url(group_id: &str) -> String {
    format!("{WEB_BASE_URL}/accept?code={}", urlencoding::encode(group_id.trim()))
}

pub struct DesktopEngine {
    /// rdev cannot read the pointer position, so the last one we set is kept
    pointer: Mutex<Option<(f64, f64)>>,
}

impl Default for DesktopEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopEngine {
    pub fn new() -> Self {
        Self {
            pointer: Mutex::new(None),
        }
    }

    fn send(&self, event: &EventType) -> Result<(), AutomationError> {
        rdev::simulate(event).map_err(|e| {
            AutomationError::PlatformError(format!("Failed to simulate {event:?}: {e:?}"))
        })?;
        thread::sleep(EVENT_GAP);
        Ok(())
    }

    fn remember_pointer(&self, position: (f64, f64)) {
        if let Ok(mut guard) = self.pointer.lock() {
            *guard = Some(position);
        }
    }

    fn last_pointer(&self) -> Option<(f64, f64)> {
        self.pointer.lock().ok().and_then(|guard| *guard)
    }

    fn open_url(&self, url: &str) -> Result<(), AutomationError> {
        debug!("Opening URL: {}", url);
        let mut command = opener_command(url);
        let status = command.status().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to launch URL opener: {e}"))
        })?;
        if !status.success() {
            return Err(AutomationError::PlatformError(format!(
                "URL opener exited with {status}"
            )));
        }
        Ok(())
    }

    /// Click the middle of the screen so the chat page has keyboard focus.
    fn focus_page(&self) -> Result<(), AutomationError> {
        let (width, height) = self.screen_size()?;
        self.click_at((width / 2) as i32, (height / 2) as i32)
    }

    fn close_tab_after(&self, options: &ChatOpenOptions) -> Result<(), AutomationError> {
        if options.close_tab {
            thread::sleep(options.close_wait);
            self.press_combo(&["ctrl", "w"])?;
        }
        Ok(())
    }
}

impl InputEngine for DesktopEngine {
    #[instrument(skip(self, message))]
    fn open_contact_chat(
        &self,
        phone: &str,
        message: &str,
        options: ChatOpenOptions,
    ) -> Result<(), AutomationError> {
        self.open_url(&contact_chat_url(phone, message))?;
        thread::sleep(options.wait);
        self.focus_page()?;
        self.close_tab_after(&options)
    }

    #[instrument(skip(self, message))]
    fn open_group_chat(
        &self,
        group_id: &str,
        message: &str,
        options: ChatOpenOptions,
    ) -> Result<(), AutomationError> {
        self.open_url(&group_chat_url(group_id))?;
        thread::sleep(options.wait);
        self.focus_page()?;

        // group links cannot carry text, so the message goes in through the clipboard
        let mut clipboard = arboard::Clipboard::new().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to open clipboard: {e}"))
        })?;
        clipboard.set_text(message.to_string()).map_err(|e| {
            AutomationError::PlatformError(format!("Failed to set clipboard text: {e}"))
        })?;
        self.press_combo(&[PASTE_MODIFIER, "v"])?;
        self.close_tab_after(&options)
    }

    fn move_pointer(&self, x: i32, y: i32, duration: Duration) -> Result<(), AutomationError> {
        let target = (f64::from(x), f64::from(y));
        match self.last_pointer() {
            Some((from_x, from_y)) if !duration.is_zero() => {
                let pause = duration / POINTER_STEPS;
                for step in 1..=POINTER_STEPS {
                    let t = f64::from(step) / f64::from(POINTER_STEPS);
                    self.send(&EventType::MouseMove {
                        x: from_x + (target.0 - from_x) * t,
                        y: from_y + (target.1 - from_y) * t,
                    })?;
                    thread::sleep(pause.saturating_sub(EVENT_GAP));
                }
            }
            _ => {
                self.send(&EventType::MouseMove {
                    x: target.0,
                    y: target.1,
                })?;
                thread::sleep(duration);
            }
        }
        self.remember_pointer(target);
        Ok(())
    }

    fn click(&self) -> Result<(), AutomationError> {
        self.send(&EventType::ButtonPress(Button::Left))?;
        self.send(&EventType::ButtonRelease(Button::Left))
    }

    fn click_at(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        self.move_pointer(x, y, Duration::ZERO)?;
        self.click()
    }

    fn press_key(&self, key: &str) -> Result<(), AutomationError> {
        let key = keys::parse_key(key)?;
        self.send(&EventType::KeyPress(key))?;
        self.send(&EventType::KeyRelease(key))
    }

    fn press_combo(&self, combo: &[&str]) -> Result<(), AutomationError> {
        let parsed = combo
            .iter()
            .map(|k| keys::parse_key(k))
            .collect::<Result<Vec<_>, _>>()?;
        for key in &parsed {
            self.send(&EventType::KeyPress(*key))?;
        }
        for key in parsed.iter().rev() {
            self.send(&EventType::KeyRelease(*key))?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    fn locate_on_screen(
        &self,
        image_path: &Path,
        confidence: f32,
    ) -> Result<Option<Region>, AutomationError> {
        let template = image::open(image_path)
            .map_err(|e| {
                AutomationError::InvalidArgument(format!(
                    "Failed to load image {}: {e}",
                    image_path.display()
                ))
            })?
            .to_luma8();

        let monitors = xcap::Monitor::all().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to enumerate monitors: {e}"))
        })?;
        let mut primary = None;
        for monitor in monitors {
            let is_primary = monitor.is_primary().map_err(|e| {
                AutomationError::PlatformError(format!("Failed to check primary status: {e}"))
            })?;
            if is_primary {
                primary = Some(monitor);
                break;
            }
        }
        let monitor = primary.ok_or_else(|| {
            AutomationError::PlatformError("No primary monitor found".to_string())
        })?;

        let origin_x = monitor.x().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to get monitor x: {e}"))
        })?;
        let origin_y = monitor.y().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to get monitor y: {e}"))
        })?;
        let scale = monitor.scale_factor().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to get monitor scale factor: {e}"))
        })?;
        let capture = monitor.capture_image().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to capture monitor: {e}"))
        })?;
        let screen = image::DynamicImage::ImageRgba8(capture).to_luma8();

        let Some(found) = matcher::locate(&screen, &template, confidence) else {
            debug!("{} not found on screen", image_path.display());
            return Ok(None);
        };
        info!(score = found.score, "Located {} on screen", image_path.display());

        // captures are in physical pixels, pointer events in logical ones
        let scale = if scale > 0.0 { f64::from(scale) } else { 1.0 };
        let logical = |v: f64| (v / scale).round() as i32;
        Ok(Some(Region {
            left: origin_x + logical(f64::from(found.region.left)),
            top: origin_y + logical(f64::from(found.region.top)),
            width: logical(f64::from(found.region.width)).max(1) as u32,
            height: logical(f64::from(found.region.height)).max(1) as u32,
        }))
    }

    fn screen_size(&self) -> Result<(u32, u32), AutomationError> {
        let (width, height) = rdev::display_size().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to read display size: {e:?}"))
        })?;
        let width = u32::try_from(width)
            .map_err(|_| AutomationError::Internal(format!("display width {width} out of range")))?;
        let height = u32::try_from(height)
            .map_err(|_| AutomationError::Internal(format!("display height {height} out of range")))?;
        if width == 0 || height == 0 {
            warn!("Display reported a zero size: {}x{}", width, height);
        }
        Ok((width, height))
    }
}

#[cfg(target_os = "windows")]
fn opener_command(url: &str) -> Command {
    // `start` would split the URL at every `&`
    let mut command = Command::new("rundll32");
    command.args(["url.dll,FileProtocolHandler", url]);
    command
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(url);
    command
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(url);
    command
}

use crate::AutomationError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub mod desktop;
pub mod keys;
pub mod matcher;

/// A rectangle on screen, in pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn center(&self) -> (i32, i32) {
        (
            self.left + (self.width / 2) as i32,
            self.top + (self.height / 2) as i32,
        )
    }
}

/// How the browser tab for a chat is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatOpenOptions {
    /// Time the page gets to load before the engine touches it.
    pub wait: Duration,
    /// Close the tab once the engine is done with it.
    pub close_tab: bool,
    pub close_wait: Duration,
}

/// The input and browser primitives a delivery attempt is built from.
///
/// Implementations act on the one visible desktop session, so calls are
/// expected to be made from a single thread, one at a time.
pub trait InputEngine: Send + Sync {
    /// Open a chat with `phone` with `message` prefilled in the compose box
    fn open_contact_chat(
        &self,
        phone: &str,
        message: &str,
        options: ChatOpenOptions,
    ) -> Result<(), AutomationError>;

    /// Open the group behind `group_id` (an invite code) and enter `message`
    fn open_group_chat(
        &self,
        group_id: &str,
        message: &str,
        options: ChatOpenOptions,
    ) -> Result<(), AutomationError>;

    /// Move the pointer to an absolute position, taking roughly `duration`
    fn move_pointer(&self, x: i32, y: i32, duration: Duration) -> Result<(), AutomationError>;

    /// Left click wherever the pointer is
    fn click(&self) -> Result<(), AutomationError>;

    fn click_at(&self, x: i32, y: i32) -> Result<(), AutomationError>;

    /// Press and release a single key by name (see [`keys::parse_key`])
    fn press_key(&self, key: &str) -> Result<(), AutomationError>;

    /// Hold the keys down in order, then release them in reverse
    fn press_combo(&self, keys: &[&str]) -> Result<(), AutomationError>;

    /// Search the screen for `image`; `Ok(None)` when no match reaches `confidence`
    fn locate_on_screen(
        &self,
        image: &Path,
        confidence: f32,
    ) -> Result<Option<Region>, AutomationError>;

    /// Width and height of the main display
    fn screen_size(&self) -> Result<(u32, u32), AutomationError>;
}

/// Create the input engine for the current platform
pub fn create_engine() -> Result<Arc<dyn InputEngine>, AutomationError> {
    #[cfg(any(target_os = "macos", target_os = "windows", target_os = "linux"))]
    {
        Ok(Arc::new(desktop::DesktopEngine::new()))
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        Err(AutomationError::UnsupportedPlatform(
            "Current platform is not supported".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_center() {
        let region = Region {
            left: 100,
            top: 40,
            width: 31,
            height: 20,
        };
        assert_eq!(region.center(), (115, 50));
    }
}

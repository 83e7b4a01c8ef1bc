use enigo::{Key, KeyboardControllable, MouseButton, MouseControllable};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::InputError;
use crate::human_mouse;

/// Keyboard modifier held down for the whole run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Modifier {
    #[default]
    Shift,
    Control,
    Alt,
}

impl Modifier {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "shift" => Some(Modifier::Shift),
            "ctrl" | "control" => Some(Modifier::Control),
            "alt" => Some(Modifier::Alt),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Modifier::Shift => "shift",
            Modifier::Control => "ctrl",
            Modifier::Alt => "alt",
        }
    }

    fn key(self) -> Key {
        match self {
            Modifier::Shift => Key::Shift,
            Modifier::Control => Key::Control,
            Modifier::Alt => Key::Alt,
        }
    }
}

/// The OS-level input primitives a run needs.
pub trait InputSimulator {
    /// Travel to (x, y) over roughly `travel` and left-click there.
    fn move_and_click(&mut self, x: i32, y: i32, travel: Duration) -> Result<(), InputError>;
    fn key_down(&mut self, key: Modifier) -> Result<(), InputError>;
    fn key_up(&mut self, key: Modifier) -> Result<(), InputError>;
    /// Polled between clicks; true aborts the run like an emergency stop.
    fn fail_safe_tripped(&mut self) -> bool { false }
}

// -------------- Fail-safe --------------
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenRect { pub x: i32, pub y: i32, pub width: i32, pub height: i32 }

impl ScreenRect {
    fn corners(&self) -> [(i32, i32); 4] {
        let (right, bottom) = (self.x + self.width - 1, self.y + self.height - 1);
        [(self.x, self.y), (right, self.y), (self.x, bottom), (right, bottom)]
    }
}

/// Trips when the real cursor sits exactly on a corner of any display.
#[derive(Clone, Debug, Default)]
pub struct FailSafe { corners: Vec<(i32, i32)> }

impl FailSafe {
    pub fn new(screens: &[ScreenRect]) -> Self {
        Self { corners: screens.iter().filter(|s| s.width > 0 && s.height > 0).flat_map(|s| s.corners()).collect() }
    }

    pub fn is_tripped(&self, cursor: (i32, i32)) -> bool { self.corners.contains(&cursor) }
}

fn detect_screens(enigo: &enigo::Enigo) -> Vec<ScreenRect> {
    match display_info::DisplayInfo::all() {
        Ok(displays) if !displays.is_empty() => displays
            .iter()
            .map(|d| ScreenRect { x: d.x, y: d.y, width: d.width as i32, height: d.height as i32 })
            .collect(),
        other => {
            if let Err(e) = other {
                warn!("Display detection failed ({e}); using main display for the fail-safe");
            }
            let (w, h) = enigo.main_display_size();
            vec![ScreenRect { x: 0, y: 0, width: w as i32, height: h as i32 }]
        }
    }
}

// -------------- Enigo backend --------------
pub struct EnigoInput {
    enigo: enigo::Enigo,
    fail_safe: FailSafe,
}

impl EnigoInput {
    pub fn new() -> Self {
        let enigo = enigo::Enigo::new();
        let screens = detect_screens(&enigo);
        debug!("Fail-safe armed on {} display(s)", screens.len());
        Self { fail_safe: FailSafe::new(&screens), enigo }
    }
}

impl Default for EnigoInput {
    fn default() -> Self { Self::new() }
}

impl InputSimulator for EnigoInput {
    fn move_and_click(&mut self, x: i32, y: i32, travel: Duration) -> Result<(), InputError> {
        let start = self.enigo.mouse_location();
        if self.fail_safe.is_tripped(start) {
            return Err(InputError::FailSafe);
        }
        human_mouse::move_mouse_human(&mut self.enigo, start, (x, y), travel);
        self.enigo.mouse_click(MouseButton::Left);
        Ok(())
    }

    fn key_down(&mut self, key: Modifier) -> Result<(), InputError> {
        self.enigo.key_down(key.key());
        Ok(())
    }

    fn key_up(&mut self, key: Modifier) -> Result<(), InputError> {
        self.enigo.key_up(key.key());
        Ok(())
    }

    fn fail_safe_tripped(&mut self) -> bool { self.fail_safe.is_tripped(self.enigo.mouse_location()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_safe_corners() {
        let fs = FailSafe::new(&[
            ScreenRect { x: 0, y: 0, width: 1920, height: 1080 },
            ScreenRect { x: 1920, y: 0, width: 1280, height: 1024 },
        ]);
        assert!(fs.is_tripped((0, 0)));
        assert!(fs.is_tripped((1919, 1079)));
        assert!(fs.is_tripped((1920, 0)));
        assert!(fs.is_tripped((3199, 1023)));
        assert!(!fs.is_tripped((1, 0)));
        assert!(!fs.is_tripped((960, 540)));
    }

    #[test]
    fn test_empty_screens_never_trip() {
        let fs = FailSafe::new(&[ScreenRect { x: 0, y: 0, width: 0, height: 0 }]);
        assert!(!fs.is_tripped((0, 0)));
        assert!(!FailSafe::default().is_tripped((0, 0)));
    }

    #[test]
    fn test_modifier_names() {
        assert_eq!(Modifier::from_name("Shift"), Some(Modifier::Shift));
        assert_eq!(Modifier::from_name("control"), Some(Modifier::Control));
        assert_eq!(Modifier::from_name("ctrl"), Some(Modifier::Control));
        assert_eq!(Modifier::from_name("alt"), Some(Modifier::Alt));
        assert_eq!(Modifier::from_name("meta"), None);
        assert_eq!(Modifier::Control.name(), "ctrl");
    }
}

//! Global Ctrl+Alt hotkeys, available with the `hooks` feature.
//!
//! | Chord        | Event                  |
//! |--------------|------------------------|
//! | Ctrl+Alt+1   | capture p00            |
//! | Ctrl+Alt+2   | capture pTR            |
//! | Ctrl+Alt+3   | capture pBL            |
//! | Ctrl+Alt+0   | start                  |
//! | Ctrl+Alt+9   | emergency stop         |
//! | Ctrl+Alt+R   | reload config          |

use enigo::MouseControllable;
use rdev::{EventType, Key};
use std::sync::mpsc::Sender;
use std::thread;
use tracing::{debug, warn};

use crate::calibration::Anchor;
use crate::controller::Event;
use crate::geometry::Point;

pub const HELP: &str = "Ctrl+Alt+1/2/3 capture p00/pTR/pBL · Ctrl+Alt+0 start · Ctrl+Alt+9 stop · Ctrl+Alt+R reload";

/// Turns raw key and mouse events into controller events.
///
/// Left and right modifiers are tracked separately so releasing one side
/// keeps the chord alive while the other is still down.
#[derive(Debug, Default)]
pub struct ChordTracker {
    ctrl_left: bool,
    ctrl_right: bool,
    alt: bool,
    alt_gr: bool,
    cursor: Option<Point>,
}

impl ChordTracker {
    /// Latest known cursor position; captures are refused until one is known.
    pub fn set_cursor(&mut self, cursor: Point) { self.cursor = Some(cursor); }

    fn ctrl_held(&self) -> bool { self.ctrl_left || self.ctrl_right }
    fn alt_held(&self) -> bool { self.alt || self.alt_gr }

    pub fn feed(&mut self, event: &EventType) -> Option<Event> {
        match event {
            EventType::MouseMove { x, y } => {
                self.set_cursor(Point::new(*x, *y));
                None
            }
            EventType::KeyPress(key) => {
                if let Some(flag) = self.modifier_flag(*key) {
                    *flag = true;
                    return None;
                }
                if self.ctrl_held() && self.alt_held() { self.chord(*key) } else { None }
            }
            EventType::KeyRelease(key) => {
                if let Some(flag) = self.modifier_flag(*key) {
                    *flag = false;
                }
                None
            }
            _ => None,
        }
    }

    fn modifier_flag(&mut self, key: Key) -> Option<&mut bool> {
        match key {
            Key::ControlLeft => Some(&mut self.ctrl_left),
            Key::ControlRight => Some(&mut self.ctrl_right),
            Key::Alt => Some(&mut self.alt),
            Key::AltGr => Some(&mut self.alt_gr),
            _ => None,
        }
    }

    fn chord(&self, key: Key) -> Option<Event> {
        let anchor = match key {
            Key::Num1 => Anchor::TopLeft,
            Key::Num2 => Anchor::TopRight,
            Key::Num3 => Anchor::BottomLeft,
            Key::Num0 => return Some(Event::Start),
            Key::Num9 => return Some(Event::Stop),
            Key::KeyR => return Some(Event::Reload),
            _ => return None,
        };
        match self.cursor {
            Some(at) => Some(Event::Capture(anchor, at)),
            None => {
                warn!("Cursor position unknown; {anchor} not captured");
                None
            }
        }
    }
}

/// Listens for hotkeys on a background thread for the rest of the process.
///
/// The cursor is read from the OS on every key press, so a capture made
/// before the mouse has moved still records where it really is.
pub fn spawn(events: Sender<Event>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let enigo = enigo::Enigo::new();
        let mut tracker = ChordTracker::default();
        let result = rdev::listen(move |raw| {
            if let EventType::KeyPress(_) = raw.event_type {
                tracker.set_cursor(enigo.mouse_location().into());
            }
            if let Some(event) = tracker.feed(&raw.event_type) {
                debug!(?event, "hotkey");
                let _ = events.send(event);
            }
        });
        if let Err(e) = result {
            warn!("Global hotkeys unavailable: {e:?}");
        }
    })
}

#![no_std]

//! # Touch Types
//!
//! Value types shared by every layer of the touch stack.
//!
//! ## Philosophy
//!
//! - **Frames, not registers**: the core only ever sees decoded frames
//! - **Chip-agnostic**: nothing in here knows a wire format
//! - **Transient**: events are produced once, consumed once, never retained
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A gesture recognizer
//! - A wire decoder for any particular controller family

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Key code reported for the power key, always declared by the core.
pub const KEY_POWER: u16 = 116;

/// One contact on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Tracking id (slot)
    pub id: u8,
    pub x: u16,
    pub y: u16,
    /// Contact width
    pub w: u16,
    /// Pressure
    pub p: u16,
}

impl TouchPoint {
    /// Creates a touch point with zero width and pressure
    pub fn new(id: u8, x: u16, y: u16) -> Self {
        Self { id, x, y, w: 0, p: 0 }
    }

    /// Sets the contact width and pressure
    pub fn with_contact(mut self, w: u16, p: u16) -> Self {
        self.w = w;
        self.p = p;
        self
    }
}

/// A decoded touch report
///
/// An empty frame means every contact has been released.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TouchFrame {
    /// Active contacts
    pub points: Vec<TouchPoint>,
    /// Key bitmap, bit N set when panel key N is down
    #[serde(default)]
    pub keys: u32,
}

impl TouchFrame {
    /// Creates an empty frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame that releases every contact and key
    pub fn released() -> Self {
        Self::default()
    }

    pub fn with_point(mut self, point: TouchPoint) -> Self {
        self.points.push(point);
        self
    }

    /// Marks panel key `index` as pressed; indices past 31 are ignored
    pub fn with_key(mut self, index: u8) -> Self {
        if index < 32 {
            self.keys |= 1 << index;
        }
        self
    }

    /// Number of active contacts
    pub fn touch_count(&self) -> usize {
        self.points.len()
    }

    /// Returns true if no contact and no key is active
    pub fn is_released(&self) -> bool {
        self.points.is_empty() && self.keys == 0
    }

    pub fn key_pressed(&self, index: u8) -> bool {
        index < 32 && self.keys & (1 << index) != 0
    }
}

/// Event produced by a chip's event decoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchEvent {
    /// A touch report to forward to the input sink
    Touch(TouchFrame),
    /// Anything else the controller signalled (requests, status, noise)
    Other,
}

impl TouchEvent {
    pub fn touch(frame: TouchFrame) -> Self {
        Self::Touch(frame)
    }

    /// Returns true if this is a touch report
    pub fn is_touch(&self) -> bool {
        matches!(self, Self::Touch(_))
    }

    /// Returns the frame if this is a touch report
    pub fn as_touch(&self) -> Option<&TouchFrame> {
        match self {
            Self::Touch(frame) => Some(frame),
            Self::Other => None,
        }
    }

    pub fn into_touch(self) -> Option<TouchFrame> {
        match self {
            Self::Touch(frame) => Some(frame),
            Self::Other => None,
        }
    }
}

/// Firmware/hardware identification read from the controller
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Whether the controller returned a consistent version block
    pub valid: bool,
    /// Product id string
    pub pid: String,
    /// Vendor id / firmware version
    pub vid: u16,
    pub sensor_id: u8,
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PID:{}\nVID:{:04x}\nSensorID:{:02x}",
            self.pid, self.vid, self.sensor_id
        )
    }
}

/// Device identification assembled by the core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipInfo {
    pub name: String,
    /// Present only when the controller reported a valid version
    pub version: Option<VersionInfo>,
}

impl fmt::Display for ChipInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TouchDeviceName:{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, "\n{}", version)?;
        }
        Ok(())
    }
}

/// Panel geometry declared by the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelGeometry {
    pub max_x: u32,
    pub max_y: u32,
    /// Maximum contact width
    #[serde(default)]
    pub max_w: u32,
    /// Maximum pressure
    #[serde(default)]
    pub max_p: u32,
    /// Number of tracking slots
    pub max_id: u8,
}

impl PanelGeometry {
    /// Returns the geometry with the X and Y ranges exchanged
    pub fn swapped(self) -> Self {
        Self {
            max_x: self.max_y,
            max_y: self.max_x,
            ..self
        }
    }
}

/// Capabilities declared to the input consumer at bring-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputCapabilities {
    /// Axis ranges, already swapped if the board asks for it
    pub panel: PanelGeometry,
    /// Key codes the device can emit
    pub keys: Vec<u16>,
    /// Direct-touch device (touchscreen rather than touchpad)
    pub direct: bool,
}

impl InputCapabilities {
    /// Builds capabilities from board geometry and key map
    ///
    /// The power key is always declared, once.
    pub fn from_panel(panel: PanelGeometry, swap_axis: bool, key_map: &[u16]) -> Self {
        let panel = if swap_axis { panel.swapped() } else { panel };
        let mut keys: Vec<u16> = Vec::with_capacity(key_map.len() + 1);
        for key in key_map.iter().chain(core::iter::once(&KEY_POWER)) {
            if !keys.contains(key) {
                keys.push(*key);
            }
        }
        Self {
            panel,
            keys,
            direct: true,
        }
    }

    pub fn declares_key(&self, key: u16) -> bool {
        self.keys.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    fn geometry() -> PanelGeometry {
        PanelGeometry {
            max_x: 1080,
            max_y: 2340,
            max_w: 255,
            max_p: 1024,
            max_id: 10,
        }
    }

    #[test]
    fn test_released_frame() {
        let frame = TouchFrame::released();
        assert!(frame.is_released());
        assert_eq!(frame.touch_count(), 0);
    }

    #[test]
    fn test_frame_with_points_and_keys() {
        let frame = TouchFrame::new()
            .with_point(TouchPoint::new(0, 10, 20))
            .with_point(TouchPoint::new(1, 30, 40).with_contact(5, 60))
            .with_key(2);

        assert_eq!(frame.touch_count(), 2);
        assert!(frame.key_pressed(2));
        assert!(!frame.key_pressed(1));
        assert!(!frame.is_released());
        assert_eq!(frame.points[1].p, 60);
    }

    #[test]
    fn test_key_index_out_of_range_ignored() {
        let frame = TouchFrame::new().with_key(40);
        assert_eq!(frame.keys, 0);
        assert!(!frame.key_pressed(40));
    }

    #[test]
    fn test_touch_event_accessors() {
        let event = TouchEvent::touch(TouchFrame::new().with_point(TouchPoint::new(0, 1, 1)));
        assert!(event.is_touch());
        assert_eq!(event.as_touch().map(|f| f.touch_count()), Some(1));

        assert!(!TouchEvent::Other.is_touch());
        assert_eq!(TouchEvent::Other.into_touch(), None);
    }

    #[test]
    fn test_capabilities_swap_axis() {
        let caps = InputCapabilities::from_panel(geometry(), true, &[]);
        assert_eq!(caps.panel.max_x, 2340);
        assert_eq!(caps.panel.max_y, 1080);
        assert_eq!(caps.panel.max_w, 255);
        assert!(caps.direct);
    }

    #[test]
    fn test_capabilities_declare_power_key_once() {
        let caps = InputCapabilities::from_panel(geometry(), false, &[139, KEY_POWER, 158]);
        assert_eq!(caps.keys, vec![139, KEY_POWER, 158]);

        let caps = InputCapabilities::from_panel(geometry(), false, &[139]);
        assert_eq!(caps.keys, vec![139, KEY_POWER]);
        assert!(caps.declares_key(KEY_POWER));
    }

    #[test]
    fn test_chip_info_display() {
        let info = ChipInfo {
            name: "samp-dev".to_string(),
            version: Some(VersionInfo {
                valid: true,
                pid: "9896".to_string(),
                vid: 0x0102,
                sensor_id: 3,
            }),
        };
        assert_eq!(
            info.to_string(),
            "TouchDeviceName:samp-dev\nPID:9896\nVID:0102\nSensorID:03"
        );

        let bare = ChipInfo {
            name: "samp-dev".to_string(),
            version: None,
        };
        assert_eq!(bare.to_string(), "TouchDeviceName:samp-dev");
    }

    #[test]
    fn test_frame_serialization() {
        let frame = TouchFrame::new()
            .with_point(TouchPoint::new(3, 100, 200).with_contact(8, 90))
            .with_key(0);
        let json = serde_json::to_string(&frame).unwrap();
        let decoded: TouchFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(frame, decoded);
    }

    #[test]
    fn test_geometry_defaults_from_json() {
        let panel: PanelGeometry =
            serde_json::from_str(r#"{"max_x": 720, "max_y": 1280, "max_id": 5}"#).unwrap();
        assert_eq!(panel.max_w, 0);
        assert_eq!(panel.max_p, 0);
        assert_eq!(panel.max_id, 5);
    }
}

//! Board configuration
//!
//! The board description is loaded once, validated, and never changes while
//! a core is running.

use crate::error::ConfigError;
use crate::trigger::TriggerKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use touch_bus::TransferPolicy;
use touch_hal::IrqTrigger;
use touch_types::{InputCapabilities, PanelGeometry};

fn default_pin_control() -> bool {
    true
}

/// Immutable board description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Device name reported in chip info
    pub device_name: String,

    /// Reset GPIO; absent if the board has no reset line
    #[serde(default)]
    pub reset_gpio: Option<u32>,

    /// Interrupt GPIO; bring-up fails without one
    #[serde(default)]
    pub irq_gpio: Option<u32>,

    #[serde(default)]
    pub irq_trigger: IrqTrigger,

    /// Analog supply rail name
    #[serde(default)]
    pub avdd_name: Option<String>,

    /// Bus/IO supply rail name
    #[serde(default)]
    pub vbus_name: Option<String>,

    /// Whether to look up pin-multiplexing states
    #[serde(default = "default_pin_control")]
    pub pin_control: bool,

    pub panel: PanelGeometry,

    #[serde(default)]
    pub swap_axis: bool,

    /// Extra key codes the panel can emit
    #[serde(default)]
    pub key_map: Vec<u16>,

    #[serde(default)]
    pub suspend_trigger: TriggerKind,

    /// Overrides the transfer policy preset of the bus
    #[serde(default)]
    pub transfer: Option<TransferPolicy>,
}

impl BoardConfig {
    /// Minimal configuration: interrupt GPIO and panel geometry only
    pub fn new(device_name: impl Into<String>, irq_gpio: u32, panel: PanelGeometry) -> Self {
        Self {
            device_name: device_name.into(),
            reset_gpio: None,
            irq_gpio: Some(irq_gpio),
            irq_trigger: IrqTrigger::default(),
            avdd_name: None,
            vbus_name: None,
            pin_control: true,
            panel,
            swap_axis: false,
            key_map: Vec::new(),
            suspend_trigger: TriggerKind::default(),
            transfer: None,
        }
    }

    /// Parses and validates a JSON board description
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON board description file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks the configuration describes a usable board
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_name.trim().is_empty() {
            return Err(invalid("device_name is empty"));
        }
        if self.panel.max_x == 0 || self.panel.max_y == 0 {
            return Err(invalid("panel axis range is zero"));
        }
        if self.panel.max_id == 0 {
            return Err(invalid("panel declares no touch slots"));
        }
        for (field, name) in [("avdd_name", &self.avdd_name), ("vbus_name", &self.vbus_name)] {
            if name.as_deref().map_or(false, |n| n.trim().is_empty()) {
                return Err(invalid(&format!("{} is empty", field)));
            }
        }
        if self.reset_gpio.is_some() && self.reset_gpio == self.irq_gpio {
            return Err(invalid("reset_gpio and irq_gpio are the same line"));
        }
        if self.key_map.contains(&0) {
            return Err(invalid("key_map contains key code 0"));
        }
        if let Some(policy) = &self.transfer {
            policy
                .validate()
                .map_err(|err| invalid(&format!("transfer: {}", err)))?;
        }
        Ok(())
    }

    /// Capabilities to declare to the input sink
    pub fn capabilities(&self) -> InputCapabilities {
        InputCapabilities::from_panel(self.panel, self.swap_axis, &self.key_map)
    }

    /// The configured transfer policy, or `preset` if none is set
    pub fn transfer_policy(&self, preset: TransferPolicy) -> TransferPolicy {
        self.transfer.unwrap_or(preset)
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use touch_types::KEY_POWER;

    const BOARD_JSON: &str = r#"{
        "device_name": "samp-ts",
        "reset_gpio": 12,
        "irq_gpio": 13,
        "irq_trigger": "falling_edge",
        "avdd_name": "avdd",
        "vbus_name": "vbus",
        "panel": { "max_x": 1080, "max_y": 2340, "max_w": 255, "max_p": 1024, "max_id": 10 },
        "swap_axis": true,
        "key_map": [139, 172],
        "suspend_trigger": "display_blank"
    }"#;

    fn panel() -> PanelGeometry {
        PanelGeometry {
            max_x: 720,
            max_y: 1280,
            max_w: 0,
            max_p: 0,
            max_id: 5,
        }
    }

    #[test]
    fn test_load_full_config() {
        let config = BoardConfig::from_json_str(BOARD_JSON).unwrap();
        assert_eq!(config.device_name, "samp-ts");
        assert_eq!(config.reset_gpio, Some(12));
        assert_eq!(config.irq_gpio, Some(13));
        assert_eq!(config.avdd_name.as_deref(), Some("avdd"));
        assert_eq!(config.suspend_trigger, TriggerKind::DisplayBlank);
        assert!(config.pin_control);
        assert!(config.transfer.is_none());
    }

    #[test]
    fn test_defaults() {
        let config = BoardConfig::from_json_str(
            r#"{"device_name": "x", "irq_gpio": 2,
                "panel": {"max_x": 10, "max_y": 10, "max_id": 1}}"#,
        )
        .unwrap();
        assert_eq!(config.reset_gpio, None);
        assert_eq!(config.irq_trigger, IrqTrigger::FallingEdge);
        assert_eq!(config.suspend_trigger, TriggerKind::SystemPm);
        assert!(!config.swap_axis);
        assert!(config.key_map.is_empty());
    }

    #[test]
    fn test_capabilities_follow_swap_and_keys() {
        let config = BoardConfig::from_json_str(BOARD_JSON).unwrap();
        let caps = config.capabilities();
        assert_eq!(caps.panel.max_x, 2340);
        assert_eq!(caps.panel.max_y, 1080);
        assert_eq!(caps.keys, vec![139, 172, KEY_POWER]);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            BoardConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            BoardConfig::from_json_str(r#"{"device_name": "x"}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validation_rejects_bad_boards() {
        let mut config = BoardConfig::new("ts", 2, panel());
        assert!(config.validate().is_ok());

        config.reset_gpio = Some(2);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = BoardConfig::new("ts", 2, panel());
        config.panel.max_id = 0;
        assert!(config.validate().is_err());

        let mut config = BoardConfig::new(" ", 2, panel());
        assert!(config.validate().is_err());
        config.device_name = "ts".to_string();
        config.vbus_name = Some(String::new());
        assert!(config.validate().is_err());

        let mut config = BoardConfig::new("ts", 2, panel());
        config.transfer = Some(TransferPolicy {
            retry_times: 0,
            ..TransferPolicy::I2C
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("retry_times"));
    }

    #[test]
    fn test_transfer_policy_override() {
        let mut config = BoardConfig::new("ts", 2, panel());
        assert_eq!(
            config.transfer_policy(TransferPolicy::SPI),
            TransferPolicy::SPI
        );
        let policy = TransferPolicy {
            max_transfer: 32,
            ..TransferPolicy::SPI
        };
        config.transfer = Some(policy);
        assert_eq!(config.transfer_policy(TransferPolicy::SPI), policy);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BOARD_JSON.as_bytes()).unwrap();

        let config = BoardConfig::from_path(file.path()).unwrap();
        assert_eq!(config.key_map, vec![139, 172]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = BoardConfig::from_path(dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let config = BoardConfig::from_json_str(BOARD_JSON).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        std::fs::write(&path, config.to_json().unwrap()).unwrap();
        assert_eq!(BoardConfig::from_path(&path).unwrap(), config);
    }
}

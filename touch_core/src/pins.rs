//! Pin-multiplexing states and GPIO lines

use crate::config::BoardConfig;
use crate::error::CoreError;
use log::{info, warn};
use touch_hal::{GpioLine, HalError, Level, PinControl, PinState, Platform};

/// Pin state selected while the controller runs
pub const PINCTRL_STATE_ACTIVE: &str = "pmx_ts_active";

/// Pin state selected while the controller sleeps
pub const PINCTRL_STATE_SUSPEND: &str = "pmx_ts_suspend";

/// Pin control handle with both named states resolved
pub struct PinStates {
    control: Box<dyn PinControl>,
    active: PinState,
    suspend: PinState,
}

impl PinStates {
    /// Looks up pin control and both states
    ///
    /// Pin control is optional: any failure is logged and yields `None`.
    pub fn acquire(platform: &mut dyn Platform) -> Option<Self> {
        match Self::try_acquire(platform) {
            Ok(states) => Some(states),
            Err(err) => {
                info!("pin control unavailable: {}", err);
                None
            }
        }
    }

    fn try_acquire(platform: &mut dyn Platform) -> Result<Self, HalError> {
        let mut control = platform.pin_control()?;
        let active = control.lookup_state(PINCTRL_STATE_ACTIVE)?;
        let suspend = control.lookup_state(PINCTRL_STATE_SUSPEND)?;
        Ok(Self {
            control,
            active,
            suspend,
        })
    }

    pub fn select_active(&mut self) -> Result<(), HalError> {
        self.control.select_state(&self.active)
    }

    pub fn select_suspend(&mut self) -> Result<(), HalError> {
        self.control.select_state(&self.suspend)
    }
}

/// Reset and interrupt GPIO lines
pub struct GpioPins {
    reset: Option<Box<dyn GpioLine>>,
    irq: Box<dyn GpioLine>,
}

impl GpioPins {
    /// Requests and configures the reset and interrupt lines
    ///
    /// The reset line is driven low and is optional; the interrupt line is
    /// an input and is required.
    pub fn request(platform: &mut dyn Platform, config: &BoardConfig) -> Result<Self, CoreError> {
        let irq_gpio = config.irq_gpio.ok_or_else(|| {
            CoreError::acquisition("irq gpio", HalError::NotFound("irq_gpio not configured".to_string()))
        })?;

        let reset = match config.reset_gpio {
            Some(line) => {
                let mut gpio = platform
                    .request_gpio(line, "ts_reset")
                    .map_err(|err| CoreError::acquisition("reset gpio", err))?;
                gpio.set_output(Level::Low)
                    .map_err(|err| CoreError::acquisition("reset gpio", err))?;
                Some(gpio)
            }
            None => {
                warn!("no reset gpio configured");
                None
            }
        };

        let mut irq = platform
            .request_gpio(irq_gpio, "ts_irq")
            .map_err(|err| CoreError::acquisition("irq gpio", err))?;
        irq.set_input()
            .map_err(|err| CoreError::acquisition("irq gpio", err))?;

        Ok(Self { reset, irq })
    }

    pub fn irq_line(&self) -> u32 {
        self.irq.line()
    }

    pub fn reset_line(&self) -> Option<u32> {
        self.reset.as_ref().map(|gpio| gpio.line())
    }
}

//! Power rail lifecycle
//!
//! Rails are switched on analog first, bus second, and off in reverse. A
//! failure half way through switches the analog rail back off, so a failed
//! power-on never leaves a rail enabled.

use crate::config::BoardConfig;
use crate::error::CoreError;
use log::{debug, error, info};
use touch_hal::{Platform, Regulator};

/// Rails held by a core
pub struct PowerRails {
    avdd: Option<Box<dyn Regulator>>,
    vbus: Option<Box<dyn Regulator>>,
    powered: bool,
}

impl PowerRails {
    /// Acquires every rail named in the configuration
    ///
    /// A rail that is not configured is skipped; a configured rail the
    /// platform cannot supply fails the acquisition.
    pub fn acquire(platform: &mut dyn Platform, config: &BoardConfig) -> Result<Self, CoreError> {
        let avdd = Self::acquire_rail(platform, config.avdd_name.as_deref())?;
        let vbus = Self::acquire_rail(platform, config.vbus_name.as_deref())?;
        Ok(Self {
            avdd,
            vbus,
            powered: false,
        })
    }

    /// Rails with no supplies at all, for boards powered externally
    pub fn none() -> Self {
        Self {
            avdd: None,
            vbus: None,
            powered: false,
        }
    }

    fn acquire_rail(
        platform: &mut dyn Platform,
        name: Option<&str>,
    ) -> Result<Option<Box<dyn Regulator>>, CoreError> {
        let Some(name) = name else {
            return Ok(None);
        };
        let rail = platform
            .regulator(name)
            .map_err(|err| CoreError::acquisition(format!("rail {}", name), err))?;
        debug!("acquired rail {}", name);
        Ok(Some(rail))
    }

    /// Switches the rails on; a no-op if they already are
    pub fn power_on(&mut self) -> Result<(), CoreError> {
        if self.powered {
            return Ok(());
        }

        if let Some(avdd) = self.avdd.as_mut() {
            avdd.enable().map_err(|source| CoreError::Power {
                rail: avdd.name().to_string(),
                source,
            })?;
        }

        if let Some(vbus) = self.vbus.as_mut() {
            if let Err(source) = vbus.enable() {
                let rail = vbus.name().to_string();
                error!("failed to enable rail {}: {}", rail, source);
                if let Some(avdd) = self.avdd.as_mut() {
                    if let Err(err) = avdd.disable() {
                        error!("failed to roll back rail {}: {}", avdd.name(), err);
                    }
                }
                return Err(CoreError::Power { rail, source });
            }
        }

        self.powered = true;
        info!("touch power on");
        Ok(())
    }

    /// Switches the rails off in reverse order; best-effort
    pub fn power_off(&mut self) {
        if !self.powered {
            return;
        }

        for rail in [self.vbus.as_mut(), self.avdd.as_mut()].into_iter().flatten() {
            if let Err(err) = rail.disable() {
                error!("failed to disable rail {}: {}", rail.name(), err);
            }
        }

        self.powered = false;
        info!("touch power off");
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Names of the rails held, analog first
    pub fn rail_names(&self) -> Vec<String> {
        [self.avdd.as_ref(), self.vbus.as_ref()]
            .into_iter()
            .flatten()
            .map(|rail| rail.name().to_string())
            .collect()
    }
}

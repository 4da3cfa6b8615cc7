use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    charge::{ChargeControlEndThreshold, ChargeLimit},
    error::{Error, Result},
    host::{AttributeGroup, BatteryHook, PowerSupply},
    BATTERY_HOOK_NAME, BATTERY_NAME,
};

/// Adds the charge limit attribute to the system battery.
#[derive(Debug)]
pub struct BatteryExtension {
    group: AttributeGroup,
    installed: Mutex<bool>,
}

impl BatteryExtension {
    pub fn new(limit: ChargeLimit) -> Self {
        Self {
            group: AttributeGroup {
                name: "framework_laptop_battery",
                attrs: vec![Arc::new(ChargeControlEndThreshold::new(limit))],
            },
            installed: Mutex::new(false),
        }
    }

    pub fn is_installed(&self) -> bool {
        *self.installed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BatteryHook for BatteryExtension {
    fn name(&self) -> &str {
        BATTERY_HOOK_NAME
    }

    fn add_battery(&self, battery: &dyn PowerSupply) -> Result<()> {
        // The EC only knows about one battery.
        if battery.name() != BATTERY_NAME {
            return Err(Error::UnsupportedBattery(battery.name().to_string()));
        }

        let mut installed = self.installed.lock().unwrap_or_else(PoisonError::into_inner);
        if *installed {
            log::debug!("charge limit already installed on {}", battery.name());
            return Ok(());
        }

        battery.add_group(&self.group).map_err(|e| {
            log::warn!("failed to add charge limit to {}: {e}", battery.name());
            e
        })?;
        *installed = true;
        log::info!("charge limit installed on {}", battery.name());
        Ok(())
    }

    fn remove_battery(&self, battery: &dyn PowerSupply) {
        battery.remove_group(&self.group);
        if battery.name() == BATTERY_NAME {
            *self.installed.lock().unwrap_or_else(PoisonError::into_inner) = false;
        }
    }
}

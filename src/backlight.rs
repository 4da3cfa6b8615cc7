//! Keyboard backlight LED.

use crate::{
    command::{GetKeyboardBacklight, SetKeyboardBacklight},
    ec::Ec,
    error::Result,
    host::LedDevice,
    KBD_LED_NAME,
};

pub const MAX_BRIGHTNESS: u8 = 100;

#[derive(Debug, Clone)]
pub struct KeyboardBacklight {
    ec: Ec,
}

impl KeyboardBacklight {
    pub fn new(ec: Ec) -> Self {
        Self { ec }
    }

    /// Queries the current brightness in percent.
    ///
    /// Returns 0 if the backlight is disabled or the EC could not be queried.
    pub fn get_brightness(&self) -> u8 {
        match self.ec.command(GetKeyboardBacklight) {
            Ok(resp) => resp.brightness(),
            Err(e) => {
                log::debug!("failed to read keyboard backlight: {e}");
                0
            }
        }
    }

    pub fn set_brightness(&self, percent: u8) -> Result<()> {
        self.ec.command(SetKeyboardBacklight { percent })?;
        Ok(())
    }
}

impl LedDevice for KeyboardBacklight {
    fn name(&self) -> &str {
        KBD_LED_NAME
    }

    fn max_brightness(&self) -> u8 {
        MAX_BRIGHTNESS
    }

    fn brightness_get(&self) -> u8 {
        self.get_brightness()
    }

    fn brightness_set(&self, value: u8) -> Result<()> {
        self.set_brightness(value)
    }
}

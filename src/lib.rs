//! Charge limit and keyboard backlight support for the Framework Laptop's embedded controller.
//!
//! The driver talks to the ChromiumOS EC through a host-provided [`Transfer`] primitive and
//! plugs two capabilities into the host's subsystems: a keyboard backlight LED device and a
//! `charge_control_end_threshold` attribute on the system battery.
//!
//! [`driver::attach`] is the entry point. It checks the platform, resolves the EC and registers
//! both capabilities; dropping (or [`detach`]ing) the returned value undoes all of it.
//!
//! [`Transfer`]: ec::Transfer
//! [`detach`]: driver::FrameworkLaptop::detach

pub mod backlight;
pub mod battery;
pub mod charge;
pub mod command;
pub mod cros_ec;
pub mod driver;
pub mod ec;
pub mod error;
pub mod host;

#[cfg(test)]
mod testing;

pub use error::{DecodeError, Error, TransferError};

/// Name of the platform device the EC is bound to.
pub const EC_DEVICE_NAME: &str = "cros_ec_lpcs.0";

/// DMI system vendor the driver binds to.
pub const DMI_SYS_VENDOR: &str = "Framework";
/// DMI product name the driver binds to.
pub const DMI_PRODUCT_NAME: &str = "Laptop";

/// The Framework EC only supports a single battery, and this is its name.
pub const BATTERY_NAME: &str = "BAT1";
pub const BATTERY_HOOK_NAME: &str = "Framework Laptop Battery Extension";

pub const KBD_LED_NAME: &str = "framework_acpi::kbd_backlight";

//! Driver attach and detach.
//!
//! [`attach`] takes the driver from detached to attached and returns a [`FrameworkLaptop`]
//! which owns the EC and both registrations. Detaching consumes that value, so the EC can't be
//! used through it afterwards and nothing can be torn down twice.

use std::{fmt, sync::Arc};

use crate::{
    backlight::KeyboardBacklight,
    battery::BatteryExtension,
    charge::ChargeLimit,
    ec::{Ec, EcDevice},
    error::{Error, Result},
    host::{Dmi, Host},
    BATTERY_HOOK_NAME, DMI_PRODUCT_NAME, DMI_SYS_VENDOR, EC_DEVICE_NAME, KBD_LED_NAME,
};

/// Checks that we are running on a Framework Laptop.
pub fn check_platform<D: Dmi + ?Sized>(dmi: &D) -> Result<()> {
    let vendor = dmi.sys_vendor();
    let product = dmi.product_name();
    if vendor.as_deref() == Some(DMI_SYS_VENDOR) && product.as_deref() == Some(DMI_PRODUCT_NAME) {
        Ok(())
    } else {
        Err(Error::UnsupportedPlatform { vendor, product })
    }
}

/// Attaches the driver to `host`.
///
/// On failure, everything registered so far is unregistered again and the EC is released.
pub fn attach<H: Host + ?Sized>(host: &H) -> Result<FrameworkLaptop<'_, H>> {
    if let Err(e) = check_platform(host) {
        log::error!("{e}");
        return Err(e);
    }

    let transfer = host.find_device_by_name(EC_DEVICE_NAME).ok_or_else(|| {
        log::error!("EC device {EC_DEVICE_NAME} not found");
        Error::DeviceNotFound(EC_DEVICE_NAME.to_string())
    })?;
    let ec = Arc::new(EcDevice::new(EC_DEVICE_NAME, transfer));

    let backlight = KeyboardBacklight::new(Ec::new(&ec));
    if let Err(e) = host.register_led(Arc::new(backlight)) {
        log::error!("failed to register {KBD_LED_NAME}: {e}");
        return Err(e);
    }

    let hook = Arc::new(BatteryExtension::new(ChargeLimit::new(Ec::new(&ec))));
    if let Err(e) = host.register_hook(hook.clone()) {
        log::error!("failed to register battery hook: {e}");
        host.unregister_led(KBD_LED_NAME);
        return Err(e);
    }

    log::info!("attached to {}", ec.name());
    Ok(FrameworkLaptop { host, ec, hook })
}

/// An attached driver instance.
pub struct FrameworkLaptop<'h, H: Host + ?Sized> {
    host: &'h H,
    ec: Arc<EcDevice>,
    hook: Arc<BatteryExtension>,
}

impl<'h, H: Host + ?Sized> FrameworkLaptop<'h, H> {
    pub fn ec(&self) -> Ec {
        Ec::new(&self.ec)
    }

    pub fn charge_limit(&self) -> ChargeLimit {
        ChargeLimit::new(self.ec())
    }

    pub fn keyboard_backlight(&self) -> KeyboardBacklight {
        KeyboardBacklight::new(self.ec())
    }

    pub fn battery_extension(&self) -> &Arc<BatteryExtension> {
        &self.hook
    }

    /// Unregisters the battery hook and the LED and releases the EC.
    pub fn detach(self) {
        drop(self);
    }
}

impl<'h, H: Host + ?Sized> Drop for FrameworkLaptop<'h, H> {
    fn drop(&mut self) {
        self.host.unregister_hook(BATTERY_HOOK_NAME);
        self.host.unregister_led(KBD_LED_NAME);
        // `self.ec` is the only strong reference, dropping it releases the device.
        log::info!("detached from {}", self.ec.name());
    }
}

impl<'h, H: Host + ?Sized> fmt::Debug for FrameworkLaptop<'h, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameworkLaptop")
            .field("ec", &self.ec)
            .field("hook", &self.hook)
            .finish()
    }
}

//! Contracts the driver requires from the host it is loaded into.
//!
//! The host identifies the platform, locates the EC, and owns the LED and battery subsystems. The
//! driver only ever talks to them through the traits in this module.

use std::{fmt, fs, io, path::PathBuf, sync::Arc};

use crate::{ec::Transfer, error::Result};

/// Platform identity as exposed by the firmware's DMI tables.
pub trait Dmi {
    fn sys_vendor(&self) -> Option<String>;
    fn product_name(&self) -> Option<String>;
}

/// Locates platform devices by name.
pub trait EcBus {
    /// Returns a transfer primitive for the named device. Dropping it releases the device.
    fn find_device_by_name(&self, name: &str) -> Option<Box<dyn Transfer>>;
}

/// A dimmable LED, driven by the host's LED subsystem.
pub trait LedDevice: Send + Sync {
    fn name(&self) -> &str;
    fn max_brightness(&self) -> u8;
    /// Current brightness. Cannot fail; the device reports 0 when it cannot tell.
    fn brightness_get(&self) -> u8;
    /// Sets the brightness. May block.
    fn brightness_set(&self, value: u8) -> Result<()>;
}

pub trait LedClass {
    fn register_led(&self, led: Arc<dyn LedDevice>) -> Result<()>;
    fn unregister_led(&self, name: &str);
}

/// A readable and writable property of a device.
pub trait Attribute: Send + Sync {
    fn name(&self) -> &str;
    /// Formats the current value, including the trailing newline.
    fn show(&self) -> Result<String>;
    /// Parses and applies `buf`, returning the number of bytes consumed.
    fn store(&self, buf: &str) -> Result<usize>;
}

/// A named set of attributes that is added to and removed from a device as a unit.
#[derive(Clone)]
pub struct AttributeGroup {
    pub name: &'static str,
    pub attrs: Vec<Arc<dyn Attribute>>,
}

impl AttributeGroup {
    pub fn attr(&self, name: &str) -> Option<&Arc<dyn Attribute>> {
        self.attrs.iter().find(|attr| attr.name() == name)
    }
}

impl fmt::Debug for AttributeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeGroup")
            .field("name", &self.name)
            .field(
                "attrs",
                &self.attrs.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A battery known to the host's power supply subsystem.
pub trait PowerSupply {
    fn name(&self) -> &str;
    fn add_group(&self, group: &AttributeGroup) -> Result<()>;
    /// Removes `group` from the device. Removing a group that isn't there does nothing.
    fn remove_group(&self, group: &AttributeGroup);
}

/// Extension point invoked whenever a battery appears or disappears.
pub trait BatteryHook: Send + Sync {
    fn name(&self) -> &str;
    fn add_battery(&self, battery: &dyn PowerSupply) -> Result<()>;
    fn remove_battery(&self, battery: &dyn PowerSupply);
}

pub trait BatteryHooks {
    /// Registers `hook`. The host calls [`BatteryHook::add_battery`] for batteries already
    /// present.
    fn register_hook(&self, hook: Arc<dyn BatteryHook>) -> Result<()>;
    /// Unregisters the named hook. The host calls [`BatteryHook::remove_battery`] for every
    /// battery the hook was added to before dropping it.
    fn unregister_hook(&self, name: &str);
}

/// Everything the driver needs from its host.
pub trait Host: Dmi + EcBus + LedClass + BatteryHooks {}

impl<T: Dmi + EcBus + LedClass + BatteryHooks + ?Sized> Host for T {}

/// Reads the DMI identity from sysfs.
#[derive(Debug, Clone)]
pub struct SysfsDmi {
    root: PathBuf,
}

impl SysfsDmi {
    pub fn new() -> Self {
        Self::with_root("/sys/class/dmi/id")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, file: &str) -> Option<String> {
        let path = self.root.join(file);
        match fs::read_to_string(&path) {
            Ok(s) => Some(s.trim_end().to_string()),
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    log::warn!("failed to read {}: {e}", path.display());
                }
                None
            }
        }
    }
}

impl Default for SysfsDmi {
    fn default() -> Self {
        Self::new()
    }
}

impl Dmi for SysfsDmi {
    fn sys_vendor(&self) -> Option<String> {
        self.read("sys_vendor")
    }

    fn product_name(&self) -> Option<String> {
        self.read("product_name")
    }
}

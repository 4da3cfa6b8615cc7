//! In-memory stand-ins for the EC and the host subsystems.

use std::{
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use crate::{
    command::{ChargeLimitModes, Cmd, CommandRequest, EcStatus},
    ec::{EcDevice, Received, Transfer},
    error::{Error, Result},
    host::{
        Attribute, AttributeGroup, BatteryHook, BatteryHooks, Dmi, EcBus, LedClass, LedDevice,
        PowerSupply,
    },
};

struct EcState {
    calls: usize,
    fail: bool,
    status: EcStatus,
    truncate_to: Option<usize>,
    last_request: Option<Vec<u8>>,
    limit: (u8, u8),
    clamp: (u8, u8),
    kb_enabled: bool,
    kb_percent: u8,
}

/// A simulated EC that stores the charge limit and backlight state it is given.
#[derive(Clone)]
pub struct FakeEc {
    state: Arc<Mutex<EcState>>,
}

impl Default for FakeEc {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(EcState {
                calls: 0,
                fail: false,
                status: EcStatus::Success,
                truncate_to: None,
                last_request: None,
                limit: (100, 0),
                clamp: (0, 100),
                kb_enabled: true,
                kb_percent: 0,
            })),
        }
    }
}

impl FakeEc {
    pub fn device(&self) -> Arc<EcDevice> {
        Arc::new(EcDevice::new("fake", Box::new(self.clone())))
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn last_request(&self) -> Option<Vec<u8>> {
        self.state.lock().unwrap().last_request.clone()
    }

    pub fn fail_transfers(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    pub fn respond_with_status(&self, status: EcStatus) {
        self.state.lock().unwrap().status = status;
    }

    pub fn truncate_responses(&self, len: usize) {
        self.state.lock().unwrap().truncate_to = Some(len);
    }

    pub fn set_charge_limit(&self, max: u8, min: u8) {
        self.state.lock().unwrap().limit = (max, min);
    }

    pub fn charge_limit(&self) -> (u8, u8) {
        self.state.lock().unwrap().limit
    }

    /// Makes the firmware clamp the maximum charge limit into `lo..=hi`.
    pub fn clamp_charge_limit(&self, lo: u8, hi: u8) {
        self.state.lock().unwrap().clamp = (lo, hi);
    }

    pub fn set_backlight(&self, enabled: bool, percent: u8) {
        let mut state = self.state.lock().unwrap();
        state.kb_enabled = enabled;
        state.kb_percent = percent;
    }
}

impl Transfer for FakeEc {
    fn transfer(&self, request: &CommandRequest, response: &mut [u8]) -> io::Result<Received> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.last_request = Some(request.payload.clone());

        if state.fail {
            return Err(io::Error::from_raw_os_error(nix::libc::EIO));
        }
        if state.status != EcStatus::Success {
            return Ok(Received {
                status: state.status,
                len: 0,
            });
        }

        let reply = match request.command {
            Cmd::ChargeLimitControl => {
                let modes = ChargeLimitModes::from_bits_retain(request.payload[0]);
                if modes.contains(ChargeLimitModes::SET_LIMIT) {
                    let (lo, hi) = state.clamp;
                    state.limit = (request.payload[1].clamp(lo, hi), request.payload[2]);
                }
                vec![state.limit.0, state.limit.1]
            }
            Cmd::PwmGetKeyboardBacklight => {
                vec![state.kb_percent, u8::from(state.kb_enabled)]
            }
            Cmd::PwmSetKeyboardBacklight => {
                state.kb_percent = request.payload[0];
                state.kb_enabled = true;
                Vec::new()
            }
            Cmd::Hello => {
                let in_data = u32::from_ne_bytes(request.payload[..4].try_into().unwrap());
                in_data.wrapping_add(0x01020304).to_ne_bytes().to_vec()
            }
        };

        let len = reply
            .len()
            .min(response.len())
            .min(state.truncate_to.unwrap_or(usize::MAX));
        response[..len].copy_from_slice(&reply[..len]);
        Ok(Received {
            status: EcStatus::Success,
            len,
        })
    }
}

/// A `FakeEc` handed out by [`FakeHost`], counting how many are alive.
struct EcHandle {
    ec: FakeEc,
    live: Arc<AtomicUsize>,
}

impl Transfer for EcHandle {
    fn transfer(&self, request: &CommandRequest, response: &mut [u8]) -> io::Result<Received> {
        self.ec.transfer(request, response)
    }
}

impl Drop for EcHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Host subsystems that record what was registered with them.
pub struct FakeHost {
    identity: Mutex<(String, String)>,
    ec: Mutex<Option<FakeEc>>,
    ec_lookups: AtomicUsize,
    ec_handles: Arc<AtomicUsize>,
    leds: Mutex<Vec<Arc<dyn LedDevice>>>,
    hooks: Mutex<Vec<Arc<dyn BatteryHook>>>,
    batteries: Mutex<Vec<Arc<FakeBattery>>>,
    fail_led: Mutex<bool>,
    fail_hook: Mutex<bool>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            identity: Mutex::new(("Framework".into(), "Laptop".into())),
            ec: Mutex::new(Some(FakeEc::default())),
            ec_lookups: AtomicUsize::new(0),
            ec_handles: Arc::new(AtomicUsize::new(0)),
            leds: Mutex::new(Vec::new()),
            hooks: Mutex::new(Vec::new()),
            batteries: Mutex::new(Vec::new()),
            fail_led: Mutex::new(false),
            fail_hook: Mutex::new(false),
        }
    }

    pub fn set_identity(&self, vendor: &str, product: &str) {
        *self.identity.lock().unwrap() = (vendor.into(), product.into());
    }

    pub fn remove_ec(&self) {
        *self.ec.lock().unwrap() = None;
    }

    pub fn ec(&self) -> FakeEc {
        self.ec.lock().unwrap().clone().unwrap()
    }

    pub fn fail_led_registration(&self, fail: bool) {
        *self.fail_led.lock().unwrap() = fail;
    }

    pub fn fail_hook_registration(&self, fail: bool) {
        *self.fail_hook.lock().unwrap() = fail;
    }

    pub fn ec_lookups(&self) -> usize {
        self.ec_lookups.load(Ordering::SeqCst)
    }

    /// Number of EC handles handed out and not yet released.
    pub fn ec_handles(&self) -> usize {
        self.ec_handles.load(Ordering::SeqCst)
    }

    pub fn leds(&self) -> usize {
        self.leds.lock().unwrap().len()
    }

    pub fn hooks(&self) -> usize {
        self.hooks.lock().unwrap().len()
    }

    /// Plugs in `battery` and offers it to every registered hook, like the power supply
    /// subsystem does when a battery appears.
    pub fn add_battery(&self, battery: Arc<FakeBattery>) {
        self.batteries.lock().unwrap().push(battery.clone());
        let hooks = self.hooks.lock().unwrap().clone();
        for hook in hooks {
            // A hook refusing a battery is not an error for the host.
            let _ = hook.add_battery(&*battery);
        }
    }

    pub fn led(&self, name: &str) -> Option<Arc<dyn LedDevice>> {
        self.leds
            .lock()
            .unwrap()
            .iter()
            .find(|led| led.name() == name)
            .cloned()
    }

    pub fn hook(&self, name: &str) -> Option<Arc<dyn BatteryHook>> {
        self.hooks
            .lock()
            .unwrap()
            .iter()
            .find(|hook| hook.name() == name)
            .cloned()
    }
}

impl Dmi for FakeHost {
    fn sys_vendor(&self) -> Option<String> {
        Some(self.identity.lock().unwrap().0.clone())
    }

    fn product_name(&self) -> Option<String> {
        Some(self.identity.lock().unwrap().1.clone())
    }
}

impl EcBus for FakeHost {
    fn find_device_by_name(&self, name: &str) -> Option<Box<dyn Transfer>> {
        self.ec_lookups.fetch_add(1, Ordering::SeqCst);
        if name != crate::EC_DEVICE_NAME {
            return None;
        }
        let ec = self.ec.lock().unwrap().clone()?;
        self.ec_handles.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(EcHandle {
            ec,
            live: self.ec_handles.clone(),
        }))
    }
}

impl LedClass for FakeHost {
    fn register_led(&self, led: Arc<dyn LedDevice>) -> Result<()> {
        if *self.fail_led.lock().unwrap() {
            return Err(Error::Registration(format!("cannot register {}", led.name())));
        }
        self.leds.lock().unwrap().push(led);
        Ok(())
    }

    fn unregister_led(&self, name: &str) {
        self.leds.lock().unwrap().retain(|led| led.name() != name);
    }
}

impl BatteryHooks for FakeHost {
    fn register_hook(&self, hook: Arc<dyn BatteryHook>) -> Result<()> {
        if *self.fail_hook.lock().unwrap() {
            return Err(Error::Registration(format!("cannot register {}", hook.name())));
        }
        let batteries = self.batteries.lock().unwrap().clone();
        for battery in &batteries {
            let _ = hook.add_battery(&**battery);
        }
        self.hooks.lock().unwrap().push(hook);
        Ok(())
    }

    fn unregister_hook(&self, name: &str) {
        let removed: Vec<_> = {
            let mut hooks = self.hooks.lock().unwrap();
            let (removed, kept): (Vec<_>, Vec<_>) =
                hooks.drain(..).partition(|hook| hook.name() == name);
            *hooks = kept;
            removed
        };
        let batteries = self.batteries.lock().unwrap().clone();
        for hook in removed {
            for battery in &batteries {
                hook.remove_battery(&**battery);
            }
        }
    }
}

/// A battery that records the attribute groups added to it.
pub struct FakeBattery {
    name: String,
    groups: Mutex<Vec<AttributeGroup>>,
    add_calls: AtomicUsize,
    fail_add: Mutex<bool>,
}

impl FakeBattery {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            groups: Mutex::new(Vec::new()),
            add_calls: AtomicUsize::new(0),
            fail_add: Mutex::new(false),
        }
    }

    pub fn fail_add(&self, fail: bool) {
        *self.fail_add.lock().unwrap() = fail;
    }

    pub fn group_count(&self) -> usize {
        self.groups.lock().unwrap().len()
    }

    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    pub fn attr(&self, name: &str) -> Option<Arc<dyn Attribute>> {
        self.groups
            .lock()
            .unwrap()
            .iter()
            .find_map(|group| group.attr(name).cloned())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }
}

impl PowerSupply for FakeBattery {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_group(&self, group: &AttributeGroup) -> Result<()> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_add.lock().unwrap() {
            return Err(Error::Registration(format!("cannot add {}", group.name)));
        }
        self.groups.lock().unwrap().push(group.clone());
        Ok(())
    }

    fn remove_group(&self, group: &AttributeGroup) {
        self.groups.lock().unwrap().retain(|g| g.name != group.name);
    }
}

use std::{
    fmt, io,
    sync::{Arc, Weak},
};

use crate::{
    command::{Command, CommandRequest, CommandResponse, EcStatus},
    error::{Error, Result, TransferError},
};

/// Outcome of a single transfer, as reported by the transfer primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Received {
    /// Result code reported by the EC.
    pub status: EcStatus,
    /// Number of response bytes written.
    pub len: usize,
}

/// The host's primitive for exchanging one command with the EC.
///
/// Implementations are expected to serialize transfers on the physical channel themselves.
/// Dropping the value releases the underlying device.
pub trait Transfer: Send + Sync {
    /// Sends `request` and writes at most `response.len()` bytes of the reply into `response`.
    ///
    /// Returns an error only if the transfer itself failed. A command the EC rejected is reported
    /// through [`Received::status`].
    fn transfer(&self, request: &CommandRequest, response: &mut [u8]) -> io::Result<Received>;
}

/// A resolved EC device.
///
/// Owned by the attached driver. Everything else refers to it through an [`Ec`].
pub struct EcDevice {
    name: String,
    transfer: Box<dyn Transfer>,
}

impl EcDevice {
    pub fn new(name: impl Into<String>, transfer: Box<dyn Transfer>) -> Self {
        Self {
            name: name.into(),
            transfer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for EcDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcDevice").field("name", &self.name).finish()
    }
}

/// Non-owning handle used by the features to talk to the EC.
///
/// Once the owning [`EcDevice`] is dropped, every command fails with
/// [`Error::DeviceNotPresent`].
#[derive(Debug, Clone, Default)]
pub struct Ec {
    device: Weak<EcDevice>,
}

impl Ec {
    pub fn new(device: &Arc<EcDevice>) -> Self {
        Self {
            device: Arc::downgrade(device),
        }
    }

    /// A handle that was never connected to a device.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Performs exactly one transfer.
    ///
    /// The returned response always carries [`EcStatus::Success`]; any other status is turned into
    /// [`Error::TransferFailed`] without looking at the payload.
    pub fn send(&self, request: &CommandRequest) -> Result<CommandResponse> {
        let device = self.device.upgrade().ok_or(Error::DeviceNotPresent)?;
        Ok(transact(&*device.transfer, request)?)
    }

    /// Encodes `cmd`, sends it and decodes the response.
    pub fn command<C: Command>(&self, cmd: C) -> Result<C::Response> {
        let device = self.device.upgrade().ok_or(Error::DeviceNotPresent)?;
        Ok(exchange(&*device.transfer, cmd)?)
    }
}

/// Sends `request` over `transfer` and checks the EC's result code.
///
/// Every command issued by this crate goes through here, whether or not an [`EcDevice`] has been
/// set up yet.
pub fn transact<T: Transfer + ?Sized>(
    transfer: &T,
    request: &CommandRequest,
) -> Result<CommandResponse, TransferError> {
    log::debug!(
        "EC command {:?} (0x{:04x}) v{} outsize={} insize={}",
        request.command,
        request.command as u16,
        request.version,
        request.payload.len(),
        request.response_size,
    );

    let mut payload = vec![0; request.response_size];
    let received = transfer.transfer(request, &mut payload).map_err(|e| {
        log::warn!("EC command {:?} failed: {e}", request.command);
        TransferError::Io(e)
    })?;

    if received.status != EcStatus::Success {
        log::warn!(
            "EC command {:?} returned status {}",
            request.command,
            received.status
        );
        return Err(TransferError::Status(received.status));
    }

    payload.truncate(received.len);
    Ok(CommandResponse {
        status: received.status,
        payload,
    })
}

/// Runs `cmd` over `transfer` and decodes its response.
pub fn exchange<C: Command, T: Transfer + ?Sized>(
    transfer: &T,
    cmd: C,
) -> Result<C::Response, TransferError> {
    let response = transact(transfer, &cmd.encode())?;
    Ok(C::decode(&response)?)
}

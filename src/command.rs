//! Embedded Controller commands and their fixed wire layouts.

use std::{fmt, mem::size_of};

use bitflags::bitflags;
use bytemuck::{NoUninit, Pod, Zeroable};

use crate::error::DecodeError;

/// Trait implemented by Embedded Controller commands.
///
/// The request is the implementing type itself, the response is [`Command::Response`]. Both are
/// plain `#[repr(C)]` structs without padding, so their size is their exact size on the wire.
pub trait Command: NoUninit {
    /// The command ID.
    const CMD: Cmd;

    /// Command version.
    ///
    /// Some commands come in multiple versions (although none of the ones supported here).
    const VERSION: u8 = 0;

    /// The associated response type.
    type Response: Pod;

    /// Builds the request for this command.
    fn encode(&self) -> CommandRequest {
        let mut payload = vec![0; size_of::<Self>()];
        payload.copy_from_slice(bytemuck::bytes_of(self));
        CommandRequest {
            command: Self::CMD,
            version: Self::VERSION,
            payload,
            response_size: size_of::<Self::Response>(),
        }
    }

    /// Interprets the payload of a successful response.
    fn decode(response: &CommandResponse) -> Result<Self::Response, DecodeError> {
        let expected = size_of::<Self::Response>();
        let actual = response.payload.len();
        if actual < expected {
            return Err(DecodeError::SizeMismatch { expected, actual });
        }
        Ok(bytemuck::pod_read_unaligned(&response.payload[..expected]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Cmd {
    Hello = 0x0001,
    // ...
    PwmGetKeyboardBacklight = 0x0022,
    PwmSetKeyboardBacklight = 0x0023,
    // ...
    /// Framework-specific.
    ChargeLimitControl = 0x3E03,
}

/// An encoded request, ready to be handed to the transfer primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub command: Cmd,
    pub version: u8,
    /// Request bytes (`outsize` from the host's point of view).
    pub payload: Vec<u8>,
    /// Number of response bytes the command produces (`insize`).
    pub response_size: usize,
}

/// A response received from the EC.
///
/// `payload` holds the bytes the EC actually returned, which may be fewer than requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub status: EcStatus,
    pub payload: Vec<u8>,
}

/// Result code returned by the EC for every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcStatus {
    Success,
    InvalidCommand,
    Error,
    InvalidParam,
    AccessDenied,
    InvalidResponse,
    InvalidVersion,
    InvalidChecksum,
    InProgress,
    Unavailable,
    Timeout,
    Overflow,
    InvalidHeader,
    RequestTruncated,
    ResponseTooBig,
    BusError,
    Busy,
    Unknown(u32),
}

impl From<u32> for EcStatus {
    fn from(raw: u32) -> Self {
        match raw {
            0 => EcStatus::Success,
            1 => EcStatus::InvalidCommand,
            2 => EcStatus::Error,
            3 => EcStatus::InvalidParam,
            4 => EcStatus::AccessDenied,
            5 => EcStatus::InvalidResponse,
            6 => EcStatus::InvalidVersion,
            7 => EcStatus::InvalidChecksum,
            8 => EcStatus::InProgress,
            9 => EcStatus::Unavailable,
            10 => EcStatus::Timeout,
            11 => EcStatus::Overflow,
            12 => EcStatus::InvalidHeader,
            13 => EcStatus::RequestTruncated,
            14 => EcStatus::ResponseTooBig,
            15 => EcStatus::BusError,
            16 => EcStatus::Busy,
            other => EcStatus::Unknown(other),
        }
    }
}

impl fmt::Display for EcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcStatus::Unknown(raw) => write!(f, "unknown ({raw})"),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

//////////////////////////////////
// Hello
//////////////////////////////////

#[derive(Clone, Copy, NoUninit)]
#[repr(C)]
pub struct Hello {
    pub in_data: u32,
}

#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct HelloResponse {
    pub out_data: u32,
}

impl Command for Hello {
    const CMD: Cmd = Cmd::Hello;
    type Response = HelloResponse;
}

//////////////////////////////////
// GetKeyboardBacklight
//////////////////////////////////

#[derive(Clone, Copy, NoUninit)]
#[repr(C)]
pub struct GetKeyboardBacklight;

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct GetKeyboardBacklightResponse {
    pub percent: u8,
    pub enabled: u8,
}

impl GetKeyboardBacklightResponse {
    /// The brightness the keyboard is actually lit at. A disabled backlight is dark no matter
    /// what `percent` says.
    pub fn brightness(&self) -> u8 {
        if self.enabled != 0 {
            self.percent
        } else {
            0
        }
    }
}

impl Command for GetKeyboardBacklight {
    const CMD: Cmd = Cmd::PwmGetKeyboardBacklight;
    type Response = GetKeyboardBacklightResponse;
}

//////////////////////////////////
// SetKeyboardBacklight
//////////////////////////////////

#[derive(Clone, Copy, NoUninit)]
#[repr(C)]
pub struct SetKeyboardBacklight {
    pub percent: u8,
}

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct SetKeyboardBacklightResponse;

impl Command for SetKeyboardBacklight {
    const CMD: Cmd = Cmd::PwmSetKeyboardBacklight;
    type Response = SetKeyboardBacklightResponse;
}

//////////////////////////////////
// ChargeLimitControl
//////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(transparent)]
pub struct ChargeLimitModes(u8);

bitflags! {
    impl ChargeLimitModes: u8 {
        /// Drop any configured limit and let the EC's charge manager take over again.
        const DISABLE = 1 << 0;
        /// Apply `max_percentage` and `min_percentage`.
        const SET_LIMIT = 1 << 1;
        /// Read the current setting without changing it.
        const GET_LIMIT = 1 << 3;
        /// Allow charging to full once, ignoring the limit.
        const OVERRIDE = 1 << 7;
    }
}

#[derive(Debug, Clone, Copy, NoUninit)]
#[repr(C)]
pub struct ChargeLimitControl {
    pub modes: ChargeLimitModes,
    pub max_percentage: u8,
    pub min_percentage: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct ChargeLimitControlResponse {
    pub max_percentage: u8,
    pub min_percentage: u8,
}

impl Command for ChargeLimitControl {
    const CMD: Cmd = Cmd::ChargeLimitControl;
    type Response = ChargeLimitControlResponse;
}

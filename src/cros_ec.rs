//! [`Transfer`] implementation backed by the kernel's `/dev/cros_ec` character device.

use std::{
    fs::File,
    io,
    mem::size_of,
    os::fd::AsRawFd,
    path::Path,
};

use nix::{errno::Errno, libc::ioctl, request_code_readwrite};

use crate::{
    command::{Command, CommandRequest, EcStatus, Hello},
    ec::{exchange, Received, Transfer},
};

pub const DEFAULT_PATH: &str = "/dev/cros_ec";

/// Largest request or response payload the host command interface carries.
pub const EC_MAX_PARAM_SIZE: usize = 0xfc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IoctlVersion {
    V1,
    V2,
}

/// A handle to the system's ChromiumOS Embedded Controller.
///
/// This uses the ioctl interface of `/dev/cros_ec` to issue commands. The kernel serializes
/// commands on the EC, so a `CrosEc` can be shared between threads.
pub struct CrosEc {
    fd: File,
    version: IoctlVersion,
}

impl CrosEc {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let mut this = Self {
            fd: File::options().read(true).write(true).open(path)?,
            version: IoctlVersion::V1,
        };

        // The framework EC uses ioctl interface version 2, but this mirrors the logic in ectool
        // just to make sure it doesn't do something nonsensical on non-Framework machines.
        let probe = Hello {
            in_data: 0xa0b0c0d0,
        }
        .encode();
        let mut scratch = vec![0; probe.response_size];
        this.version = match this.cmd_v1(&probe, &mut scratch) {
            Err(Errno::ENOTTY) => IoctlVersion::V2,
            _ => IoctlVersion::V1,
        };

        log::debug!("ioctl version {:?}", this.version);

        // Test communication by issuing a `Hello` command and reading back the result.
        let magic = 0xaa55dead;
        let resp = exchange(&this, Hello { in_data: magic })
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let expected = magic + 0x01020304;
        if resp.out_data != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "failed to connect to EC: invalid response to hello command (received {:010x}, expected {:010x})",
                    resp.out_data, expected,
                ),
            ));
        }

        log::info!("connected to embedded controller");

        Ok(this)
    }

    fn cmd_v1(&self, request: &CommandRequest, response: &mut [u8]) -> nix::Result<Received> {
        let mut cmd = CommandV1 {
            version: request.version.into(),
            command: (request.command as u16).into(),
            outdata: request.payload.as_ptr() as *mut _,
            outsize: request.payload.len() as u32,
            indata: response.as_mut_ptr(),
            insize: response.len() as u32,
            result: 0xff,
        };
        unsafe {
            let ret = ioctl(
                self.fd.as_raw_fd(),
                request_code_readwrite!(':', 0, size_of::<CommandV1>()),
                &mut cmd,
            );
            Errno::result(ret)?;
        }
        // The V1 interface does not report how much was received.
        Ok(Received {
            status: EcStatus::from(cmd.result),
            len: response.len(),
        })
    }

    fn cmd_v2(&self, request: &CommandRequest, response: &mut [u8]) -> nix::Result<Received> {
        let mut cmd = CommandV2 {
            header: CommandV2Header {
                version: request.version.into(),
                command: (request.command as u16).into(),
                outsize: request.payload.len() as u32,
                insize: response.len() as u32,
                result: 0xff,
            },
            data: [0; EC_MAX_PARAM_SIZE],
        };
        cmd.data[..request.payload.len()].copy_from_slice(&request.payload);

        let ret = unsafe {
            let ret = ioctl(
                self.fd.as_raw_fd(),
                request_code_readwrite!(0xEC, 0, size_of::<CommandV2Header>()),
                &mut cmd,
            );
            Errno::result(ret)?
        };

        let len = (ret as usize).min(response.len());
        response[..len].copy_from_slice(&cmd.data[..len]);
        Ok(Received {
            status: EcStatus::from(cmd.header.result),
            len,
        })
    }
}

impl Transfer for CrosEc {
    fn transfer(&self, request: &CommandRequest, response: &mut [u8]) -> io::Result<Received> {
        if request.payload.len() > EC_MAX_PARAM_SIZE || response.len() > EC_MAX_PARAM_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "EC command {:?} exceeds the maximum payload size of {EC_MAX_PARAM_SIZE} bytes",
                    request.command
                ),
            ));
        }

        match self.version {
            IoctlVersion::V1 => self.cmd_v1(request, response),
            IoctlVersion::V2 => self.cmd_v2(request, response),
        }
        .map_err(Into::into)
    }
}

#[repr(C)]
struct CommandV1 {
    version: u32,
    command: u32,
    outdata: *mut u8,
    outsize: u32,
    indata: *mut u8,
    insize: u32,
    result: u32,
}

/// The kernel reads the header followed by `max(outsize, insize)` bytes of payload, and writes
/// the response back into the same payload region.
#[repr(C)]
struct CommandV2 {
    header: CommandV2Header,
    data: [u8; EC_MAX_PARAM_SIZE],
}

#[repr(C)]
struct CommandV2Header {
    version: u32,
    command: u32,
    outsize: u32,
    insize: u32,
    result: u32,
}

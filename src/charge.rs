//! Battery charge limit, exposed as `charge_control_end_threshold`.

use crate::{
    command::{ChargeLimitControl, ChargeLimitModes},
    ec::Ec,
    error::{Error, Result},
    host::Attribute,
};

pub const ATTR_NAME: &str = "charge_control_end_threshold";

/// Reads and writes the EC's upper charge limit.
///
/// Nothing is cached: the EC is the only source of truth and every call goes to it.
#[derive(Debug, Clone)]
pub struct ChargeLimit {
    ec: Ec,
}

impl ChargeLimit {
    pub fn new(ec: Ec) -> Self {
        Self { ec }
    }

    /// Returns the current upper charge limit in percent.
    pub fn get_threshold(&self) -> Result<u8> {
        let resp = self.ec.command(ChargeLimitControl {
            modes: ChargeLimitModes::GET_LIMIT,
            max_percentage: 0,
            min_percentage: 0,
        })?;
        Ok(resp.max_percentage)
    }

    /// Sets the upper charge limit to `value` percent.
    ///
    /// The EC may clamp the value; the limit it echoes back is ignored.
    pub fn set_threshold(&self, value: u32) -> Result<()> {
        if value > 100 {
            return Err(Error::InvalidArgument(value));
        }

        self.ec.command(ChargeLimitControl {
            modes: ChargeLimitModes::SET_LIMIT,
            max_percentage: value as u8,
            min_percentage: 0,
        })?;
        log::debug!("charge limit set to {value}%");
        Ok(())
    }
}

/// The `charge_control_end_threshold` battery attribute.
#[derive(Debug, Clone)]
pub struct ChargeControlEndThreshold {
    limit: ChargeLimit,
}

impl ChargeControlEndThreshold {
    pub fn new(limit: ChargeLimit) -> Self {
        Self { limit }
    }
}

impl Attribute for ChargeControlEndThreshold {
    fn name(&self) -> &str {
        ATTR_NAME
    }

    fn show(&self) -> Result<String> {
        Ok(format!("{}\n", self.limit.get_threshold()?))
    }

    fn store(&self, buf: &str) -> Result<usize> {
        // sysfs writes usually come with a trailing newline.
        let value = buf.strip_suffix('\n').unwrap_or(buf).parse::<u32>()?;
        self.limit.set_threshold(value)?;
        Ok(buf.len())
    }
}

//! MDIO register access tunneled over vendor request 0x01.
//!
//! `wValue` carries `(phy << 8) | reg`; the data stage is the 16-bit register
//! value, little-endian. Both addresses are 5-bit clause-22 addresses and are
//! rejected, not masked, when out of range.

use std::str::FromStr;

use crate::device::{DeviceError, NcmDevice};
use crate::error::{MdioctlError, Result};
use crate::parse::parse_ranged;
use crate::protocol::{MDIO_MAX_ADDR, MDIO_PAYLOAD_LEN, VENDOR_CMD_MDIO_RW};
use crate::transfer;

fn check_addr(field: &'static str, value: u8) -> Result<()> {
    if value > MDIO_MAX_ADDR {
        return Err(MdioctlError::OutOfRange {
            field,
            value: value.into(),
        });
    }
    Ok(())
}

/// Pack a PHY address and register offset into the request's `wValue`.
pub fn encode_register_access(phy: u8, reg: u8) -> Result<u16> {
    check_addr("phy address", phy)?;
    check_addr("register", reg)?;
    Ok((u16::from(phy) << 8) | u16::from(reg & MDIO_MAX_ADDR))
}

/// Inverse of [`encode_register_access`]: `(phy, reg)`.
pub fn decode_register_access(value: u16) -> (u8, u8) {
    ((value >> 8) as u8, (value & u16::from(MDIO_MAX_ADDR)) as u8)
}

/// Register accessor bound to one PHY on the adapter's MDIO bus.
pub struct Mdio<'a, D: NcmDevice> {
    device: &'a D,
    phy: u8,
}

impl<'a, D: NcmDevice> Mdio<'a, D> {
    pub fn new(device: &'a D, phy: u8) -> Result<Self> {
        check_addr("phy address", phy)?;
        Ok(Mdio { device, phy })
    }

    pub fn read(&self, reg: u8) -> Result<u16> {
        let value = encode_register_access(self.phy, reg)?;
        let buf = transfer::read_vendor(self.device, VENDOR_CMD_MDIO_RW, value, MDIO_PAYLOAD_LEN)?;
        let bytes: [u8; 2] = buf
            .get(..MDIO_PAYLOAD_LEN)
            .and_then(|b| b.try_into().ok())
            .ok_or(DeviceError::ShortTransfer {
                actual: buf.len(),
                expected: MDIO_PAYLOAD_LEN,
            })?;
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn write(&self, reg: u8, data: u16) -> Result<()> {
        let value = encode_register_access(self.phy, reg)?;
        transfer::write_vendor(self.device, VENDOR_CMD_MDIO_RW, value, &data.to_le_bytes())?;
        Ok(())
    }

    /// Run one register operation. Returns the value read, or the value
    /// written.
    pub fn apply(&self, op: RegisterOp) -> Result<u16> {
        match op {
            RegisterOp::Read(reg) => self.read(reg),
            RegisterOp::Write(reg, data) => self.write(reg, data).map(|()| data),
        }
    }
}

/// A positional `reg[=value]` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOp {
    Read(u8),
    Write(u8, u16),
}

impl RegisterOp {
    pub fn register(&self) -> u8 {
        match *self {
            RegisterOp::Read(reg) | RegisterOp::Write(reg, _) => reg,
        }
    }
}

impl FromStr for RegisterOp {
    type Err = MdioctlError;

    fn from_str(s: &str) -> Result<Self> {
        let (reg_str, value_str) = match s.split_once('=') {
            Some((r, v)) => (r, Some(v)),
            None => (s, None),
        };
        let reg = parse_ranged(reg_str, "register", 0, MDIO_MAX_ADDR.into())? as u8;
        match value_str {
            None => Ok(RegisterOp::Read(reg)),
            Some(v) => {
                let data = parse_ranged(v, "register value", 0, u16::MAX.into())? as u16;
                Ok(RegisterOp::Write(reg, data))
            }
        }
    }
}

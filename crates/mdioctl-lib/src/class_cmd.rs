//! CDC Ethernet class commands: table lookup, argument parsing, dispatch.
//!
//! Each command has a single-character code (the command-line flag letter).
//! [`COMMANDS`] maps codes to request and direction; [`ClassCommand`] holds a
//! parsed command ready to be sent with [`execute`].

use std::fmt;

use crate::device::{DeviceError, Direction, NcmDevice};
use crate::error::{MdioctlError, Result};
use crate::mac::{MacAddr, mac_list_bytes, parse_mac_list};
use crate::parse::parse_single_value;
use crate::protocol::*;
use crate::transfer;

/// One row of the class-command table.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub code: char,
    pub name: &'static str,
    pub request: u8,
    pub direction: Direction,
    /// Minimum reply size for IN commands (0 for OUT).
    pub reply_len: usize,
}

/// Supported class commands. Codes are unique.
pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        code: 'M',
        name: "set-multicast",
        request: USB_CDC_SET_ETHERNET_MULTICAST_FILTERS,
        direction: Direction::Out,
        reply_len: 0,
    },
    CommandSpec {
        code: 'f',
        name: "set-packet-filter",
        request: USB_CDC_SET_ETHERNET_PACKET_FILTER,
        direction: Direction::Out,
        reply_len: 0,
    },
    CommandSpec {
        code: 'S',
        name: "set-mac-address",
        request: USB_CDC_SET_NET_ADDRESS,
        direction: Direction::Out,
        reply_len: 0,
    },
    CommandSpec {
        code: 'G',
        name: "get-mac-address",
        request: USB_CDC_GET_NET_ADDRESS,
        direction: Direction::In,
        reply_len: MacAddr::LEN,
    },
];

/// Find a command by code.
pub fn lookup(code: char) -> Result<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|c| c.code == code)
        .ok_or(MdioctlError::UnknownCommand(code))
}

/// A parsed class command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassCommand {
    SetMulticast(Vec<MacAddr>),
    SetPacketFilter(u8),
    SetMacAddress(MacAddr),
    /// Receive buffer size in bytes.
    GetMacAddress(usize),
}

/// Data stage of a request: bytes to send, or the size of the receive buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Out(Vec<u8>),
    In(usize),
}

impl ClassCommand {
    /// Parse the argument for command `code`.
    ///
    /// IN commands ignore `arg` and allocate a receive buffer of `rx_len`
    /// bytes (default: the command's reply size).
    pub fn parse(code: char, arg: &str, rx_len: Option<usize>) -> Result<Self> {
        let spec = lookup(code)?;
        if spec.direction == Direction::In {
            let len = rx_len.unwrap_or(spec.reply_len);
            if len == 0 || len > MAX_RX_BUFFER {
                return Err(MdioctlError::OutOfRange {
                    field: "receive buffer size",
                    value: len as i64,
                });
            }
            return Ok(ClassCommand::GetMacAddress(len));
        }
        match code {
            'M' => Ok(ClassCommand::SetMulticast(parse_mac_list(arg)?)),
            'f' => {
                let filter = parse_single_value(arg)?;
                if filter & !PACKET_FILTER_MASK != 0 {
                    return Err(MdioctlError::OutOfRange {
                        field: "packet filter",
                        value: filter.into(),
                    });
                }
                Ok(ClassCommand::SetPacketFilter(filter))
            }
            'S' => Ok(ClassCommand::SetMacAddress(arg.parse()?)),
            other => Err(MdioctlError::UnknownCommand(other)),
        }
    }

    pub fn code(&self) -> char {
        match self {
            ClassCommand::SetMulticast(_) => 'M',
            ClassCommand::SetPacketFilter(_) => 'f',
            ClassCommand::SetMacAddress(_) => 'S',
            ClassCommand::GetMacAddress(_) => 'G',
        }
    }

    pub fn spec(&self) -> &'static CommandSpec {
        lookup(self.code()).expect("every ClassCommand code is in COMMANDS")
    }

    /// `wValue` and data stage for this command.
    pub fn frame(&self) -> (u16, Payload) {
        match self {
            ClassCommand::SetMulticast(list) => (list.len() as u16, Payload::Out(mac_list_bytes(list))),
            ClassCommand::SetPacketFilter(filter) => (u16::from(*filter), Payload::Out(Vec::new())),
            ClassCommand::SetMacAddress(mac) => (0, Payload::Out(mac.as_bytes().to_vec())),
            ClassCommand::GetMacAddress(len) => (0, Payload::In(*len)),
        }
    }
}

/// Formatted result of an IN command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassReply {
    MacAddress(MacAddr),
}

impl fmt::Display for ClassReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassReply::MacAddress(mac) => write!(f, "{mac}"),
        }
    }
}

/// Send a class command; IN commands return their decoded reply.
pub fn execute(device: &impl NcmDevice, cmd: &ClassCommand) -> Result<Option<ClassReply>> {
    let spec = cmd.spec();
    let (value, payload) = cmd.frame();
    log::debug!("class command {} (bRequest=0x{:02x})", spec.name, spec.request);

    match payload {
        Payload::Out(data) => {
            transfer::write_class(device, spec.request, value, &data)?;
            Ok(None)
        }
        Payload::In(len) => {
            let buf = transfer::read_class(device, spec.request, value, len, spec.reply_len)?;
            if buf.len() > spec.reply_len {
                log::debug!("{}: ignoring {} trailing bytes", spec.name, buf.len() - spec.reply_len);
            }
            let mac = MacAddr::from_slice(&buf).ok_or(DeviceError::ShortTransfer {
                actual: buf.len(),
                expected: spec.reply_len,
            })?;
            Ok(Some(ClassReply::MacAddress(mac)))
        }
    }
}

//! MAC addresses as they appear on the command line and on the wire.
//!
//! The textual form is 12 hex digits without separators
//! (`"AABBCCDDEEFF"`); the wire form is the 6 octets in transmission order.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{MdioctlError, Result};

/// Polynomial of the firmware's multicast hash (reflected form).
const MCAST_HASH_POLY: u64 = 0x33;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    pub const LEN: usize = 6;

    pub const fn from_raw(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Build from a reply buffer; `None` if fewer than 6 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let octets: [u8; 6] = bytes.get(..Self::LEN)?.try_into().ok()?;
        Some(Self(octets))
    }

    /// Multicast hash bin (0..64) the firmware filter assigns to this address.
    ///
    /// The address is read as a 48-bit little-endian integer and divided
    /// bit-serially by the reflected polynomial 0x33; the remainder is the bin.
    pub fn multicast_hash(&self) -> u8 {
        let mut v = self
            .0
            .iter()
            .rev()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
        for _ in 0..48 {
            let carry = v & 1;
            v >>= 1;
            if carry != 0 {
                v ^= MCAST_HASH_POLY;
            }
        }
        v as u8
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

impl Serialize for MacAddr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for MacAddr {
    type Err = MdioctlError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 2 * Self::LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(MdioctlError::Parse(format!(
                "MAC address '{s}' (expected 12 hex digits)"
            )));
        }
        let mut bytes = [0u8; 6];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[2 * i..2 * i + 2], 16)
                .map_err(|_| MdioctlError::Parse(format!("MAC address '{s}'")))?;
        }
        Ok(Self(bytes))
    }
}

/// Parse a comma-separated MAC list. An empty string is an empty list.
pub fn parse_mac_list(s: &str) -> Result<Vec<MacAddr>> {
    if s.is_empty() {
        return Ok(Vec::new());
    }
    s.split(',').map(MacAddr::from_str).collect()
}

/// Concatenate addresses into the `6 × N` byte wire buffer.
pub fn mac_list_bytes(list: &[MacAddr]) -> Vec<u8> {
    list.iter().flat_map(|m| m.0).collect()
}

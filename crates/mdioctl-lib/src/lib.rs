//! mdioctl: MDIO and CDC Ethernet control for a USB CDC-NCM adapter.

pub mod class_cmd;
pub mod config;
pub mod device;
pub mod error;
pub mod mac;
pub mod mdio;
pub mod parse;
pub mod protocol;
pub mod transfer;
pub mod vendor;

pub use error::MdioctlError;

//! Command-line orchestration: option merging, device session, text/JSON output.

mod class;
mod registers;

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

pub(super) use mdioctl_lib::class_cmd::{self, ClassCommand, ClassReply};
pub(super) use mdioctl_lib::config::Config;
pub(super) use mdioctl_lib::device::{DeviceInfo, NcmDevice, OpenParams, open_device};
pub(super) use mdioctl_lib::error::{MdioctlError, Result};
pub(super) use mdioctl_lib::mac::MacAddr;
pub(super) use mdioctl_lib::mdio::{Mdio, RegisterOp};
pub(super) use mdioctl_lib::parse::parse_c_int;
pub(super) use mdioctl_lib::protocol;
pub(super) use mdioctl_lib::vendor;

use crate::Args;

// ── Option value parsers ──

fn parse_arg_in_range(s: &str, min: i64, max: i64) -> std::result::Result<i64, String> {
    let v = parse_c_int(s).ok_or_else(|| format!("'{s}' is not an integer"))?;
    if v < min || v > max {
        return Err(format!("{v} is out of range ({min}-{max})"));
    }
    Ok(v)
}

pub(crate) fn parse_usb_id(s: &str) -> std::result::Result<u16, String> {
    parse_arg_in_range(s, 0, u16::MAX.into()).map(|v| v as u16)
}

pub(crate) fn parse_phy(s: &str) -> std::result::Result<u8, String> {
    parse_arg_in_range(s, 0, protocol::MDIO_MAX_ADDR.into()).map(|v| v as u8)
}

pub(crate) fn parse_buf_size(s: &str) -> std::result::Result<usize, String> {
    parse_arg_in_range(s, 1, protocol::MAX_RX_BUFFER as i64).map(|v| v as usize)
}

/// Any non-negative length; clamping happens when the test runs.
pub(crate) fn parse_stream_len(s: &str) -> std::result::Result<usize, String> {
    parse_arg_in_range(s, 0, i64::from(u32::MAX)).map(|v| v as usize)
}

pub(crate) fn parse_timeout(s: &str) -> std::result::Result<u64, String> {
    parse_arg_in_range(s, 1, i64::from(u32::MAX)).map(|v| v as u64)
}

// ── Resolved options ──

/// Command-line flags merged over the config file.
#[derive(Debug)]
pub(super) struct Options {
    pub open: OpenParams,
    pub phy: u8,
    pub registers: Vec<String>,
    pub stream_len: usize,
    pub skip_default: bool,
    /// In execution order: packet filter, multicast, set MAC, get MAC.
    pub class_commands: Vec<ClassCommand>,
    pub json: bool,
}

impl Options {
    /// Merge flags over `config`. Class-command arguments are parsed here so a
    /// bad argument fails before the device is opened.
    pub fn resolve(args: &Args, config: &Config) -> Result<Self> {
        let mut class_commands = Vec::new();
        if let Some(filter) = &args.filter {
            class_commands.push(ClassCommand::parse('f', filter, None)?);
        }
        if let Some(list) = &args.multicast {
            class_commands.push(ClassCommand::parse('M', list, None)?);
        }
        if let Some(mac) = &args.set_mac {
            class_commands.push(ClassCommand::parse('S', mac, None)?);
        }
        if args.get_mac {
            class_commands.push(ClassCommand::parse('G', "", args.buf_size)?);
        } else if args.buf_size.is_some() {
            log::warn!("-l has no effect without an IN class command (-G)");
        }

        Ok(Options {
            open: OpenParams {
                vendor_id: args.vendor_id.unwrap_or(config.vendor_id),
                product_id: args.product_id.unwrap_or(config.product_id),
                timeout: Duration::from_millis(args.timeout_ms.unwrap_or(config.timeout_ms)),
            },
            phy: args.phy.unwrap_or(config.phy),
            registers: args.registers.clone(),
            stream_len: args.stream_len.unwrap_or(0),
            skip_default: args.skip_default,
            class_commands,
            json: args.json,
        })
    }

    /// Version + diagnostic register read when nothing else was asked for.
    pub fn runs_default_action(&self) -> bool {
        self.registers.is_empty() && self.stream_len == 0 && !self.skip_default
    }
}

/// Load the config file (`--config` or the platform default) and validate it.
///
/// A `--config` file that can't be read is an error; a missing default file
/// is not.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(p) => {
            let (config, warnings) = Config::read_from(p)
                .map_err(|e| MdioctlError::Config(format!("{}: {e}", p.display())))?;
            for w in &warnings {
                log::warn!("{w}");
            }
            config
        }
        None => Config::load(),
    };
    config.validate().map_err(|errors| {
        let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        MdioctlError::Config(msgs.join("; "))
    })?;
    Ok(config)
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct Report {
    pub version: String,
    pub device: DeviceInfo,
    pub phy: u8,
    /// `0x%08x`, or null if not read or the read failed.
    pub command_set_version: Option<String>,
    pub registers: Vec<RegisterJson>,
    pub skipped: Vec<SkippedJson>,
    pub stream: Option<StreamJson>,
    pub class_commands: Vec<ClassCommandJson>,
}

#[derive(Serialize)]
pub(super) struct RegisterJson {
    pub op: &'static str,
    pub register: u8,
    pub value: u16,
}

#[derive(Serialize)]
pub(super) struct SkippedJson {
    pub token: String,
    pub reason: String,
}

#[derive(Serialize)]
pub(super) struct StreamJson {
    pub requested: usize,
    pub written: usize,
    pub complete: bool,
}

#[derive(Serialize)]
pub(super) struct ClassCommandJson {
    pub command: &'static str,
    pub packet_filter: Option<u8>,
    pub multicast: Option<Vec<MulticastEntryJson>>,
    pub mac_address: Option<MacAddr>,
}

#[derive(Serialize)]
pub(super) struct MulticastEntryJson {
    pub address: MacAddr,
    pub hash_bin: u8,
}

impl Report {
    fn new(info: &DeviceInfo, phy: u8) -> Self {
        Report {
            version: env!("CARGO_PKG_VERSION").to_string(),
            device: info.clone(),
            phy,
            command_set_version: None,
            registers: Vec::new(),
            skipped: Vec::new(),
            stream: None,
            class_commands: Vec::new(),
        }
    }
}

// ── Session ──

/// Run everything `opts` asks for against an open device.
///
/// Text output goes to `out` as each step completes; the returned report
/// carries the same results for `--json`.
pub(super) fn execute(device: &impl NcmDevice, opts: &Options, out: &mut impl Write) -> Result<Report> {
    let info = device.info();
    match info.speed {
        Some(speed) => writeln!(out, "{speed}-speed device.")?,
        None => log::warn!("{}: unknown bus speed", info.path),
    }
    writeln!(out, "CDC NCM has interface number {}", info.interface_number)?;

    let mdio = Mdio::new(device, opts.phy)?;
    let mut report = Report::new(info, opts.phy);

    if opts.runs_default_action() {
        registers::default_action(device, &mdio, out, &mut report)?;
    } else {
        registers::apply_tokens(&mdio, &opts.registers, out, &mut report)?;
        if opts.stream_len > 0 {
            registers::stream(device, opts.stream_len, &mut report)?;
        }
    }

    for cmd in &opts.class_commands {
        class::run(device, cmd, out, &mut report)?;
    }

    Ok(report)
}

pub fn run(args: &Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let opts = Options::resolve(args, &config)?;

    log::info!(
        "opening {:04x}:{:04x} (phy {}, timeout {:?})",
        opts.open.vendor_id,
        opts.open.product_id,
        opts.phy,
        opts.open.timeout
    );
    let device = open_device(&opts.open)?;

    let mut stdout = io::stdout().lock();
    if opts.json {
        let report = execute(&device, &opts, &mut io::sink())?;
        serde_json::to_writer_pretty(&mut stdout, &report).map_err(io::Error::from)?;
        writeln!(stdout)?;
    } else {
        execute(&device, &opts, &mut stdout)?;
    }
    Ok(())
}

//! mdioctl: MDIO and CDC Ethernet control for a USB CDC-NCM adapter.
//!
//! Reads and writes PHY registers through the adapter's vendor requests and
//! drives the CDC Ethernet class requests (packet filter, multicast list,
//! MAC address).

use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser};

mod cli;

#[derive(Parser, Debug)]
#[command(
    name = "mdioctl",
    version,
    about = "MDIO and CDC Ethernet control for a USB CDC-NCM adapter",
    disable_help_flag = true,
    disable_version_flag = true,
    after_help = "Repeat -h (-hh) to list the advanced options."
)]
pub struct Args {
    /// Print help; repeat for advanced options
    #[arg(short = 'h', long = "help", action = ArgAction::Count)]
    pub help: u8,

    /// Print version
    #[arg(long)]
    pub version: bool,

    /// Receive buffer size for IN class commands (1-1024)
    #[arg(short = 'l', value_name = "BUFSZ", value_parser = cli::parse_buf_size)]
    pub buf_size: Option<usize>,

    /// USB product ID [default: 0x0001]
    #[arg(short = 'P', value_name = "ID_PRODUCT", value_parser = cli::parse_usb_id)]
    pub product_id: Option<u16>,

    /// USB vendor ID [default: 0x1209]
    #[arg(short = 'V', value_name = "ID_VENDOR", value_parser = cli::parse_usb_id, hide_short_help = true)]
    pub vendor_id: Option<u16>,

    /// PHY address on the MDIO bus (0-31) [default: 1]
    #[arg(short = 'i', value_name = "PHY", value_parser = cli::parse_phy, hide_short_help = true)]
    pub phy: Option<u8>,

    /// Stream test length in bytes (0 = off, capped at 512)
    #[arg(short = 's', value_name = "STRM_LEN", value_parser = cli::parse_stream_len, hide_short_help = true)]
    pub stream_len: Option<usize>,

    /// Set the Ethernet packet filter bitmap
    #[arg(short = 'f', value_name = "FILTER")]
    pub filter: Option<String>,

    /// Set the multicast filter list (comma-separated, empty clears)
    #[arg(short = 'M', value_name = "MAC,...")]
    pub multicast: Option<String>,

    /// Set the MAC address (12 hex digits)
    #[arg(short = 'S', value_name = "MAC")]
    pub set_mac: Option<String>,

    /// Get the MAC address
    #[arg(short = 'G')]
    pub get_mac: bool,

    /// Skip the default action (command-set version and register 0x10)
    #[arg(short = 'n')]
    pub skip_default: bool,

    /// Control-transfer timeout in milliseconds [default: 1000]
    #[arg(short = 't', long = "timeout", value_name = "MS", value_parser = cli::parse_timeout, hide_short_help = true)]
    pub timeout_ms: Option<u64>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Print a JSON report instead of text
    #[arg(long)]
    pub json: bool,

    /// Read configuration from this file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Register operations: `reg` reads, `reg=value` writes
    #[arg(value_name = "REG[=VAL]")]
    pub registers: Vec<String>,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    if args.help > 0 {
        let mut cmd = Args::command();
        let help = if args.help > 1 {
            cmd.render_long_help()
        } else {
            cmd.render_help()
        };
        print!("{help}");
        return;
    }
    if args.version {
        print!("{}", Args::command().render_version());
        return;
    }

    init_logger(args.verbose);

    if let Err(e) = cli::run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

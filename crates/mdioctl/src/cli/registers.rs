//! Vendor-request actions: default action, register tokens, stream test.

use std::io::Write;

use super::{
    Mdio, NcmDevice, RegisterJson, RegisterOp, Report, Result, SkippedJson, StreamJson, protocol,
    vendor,
};

fn print_read(out: &mut impl Write, report: &mut Report, reg: u8, value: u16) -> Result<()> {
    writeln!(out, "MDIO read of reg 0x{reg:02x}: 0x{value:04x}")?;
    report.registers.push(RegisterJson {
        op: "read",
        register: reg,
        value,
    });
    Ok(())
}

/// Command-set version, then the diagnostic register.
///
/// A failed version read is reported and skipped; the register read decides
/// the outcome.
pub(super) fn default_action<D: NcmDevice>(
    device: &D,
    mdio: &Mdio<'_, D>,
    out: &mut impl Write,
    report: &mut Report,
) -> Result<()> {
    match vendor::command_set_version(device) {
        Ok(version) => {
            writeln!(out, "Vendor request 0x00 (command-set version) reply: 0x{version:08x}")?;
            report.command_set_version = Some(format!("0x{version:08x}"));
        }
        Err(e) => log::error!("Vendor request 0x00 failed: {e}"),
    }

    let reg = protocol::DEFAULT_DIAG_REGISTER;
    let value = mdio.read(reg)?;
    print_read(out, report, reg, value)
}

/// Apply `reg[=value]` tokens in order. Unparsable tokens are skipped with a
/// warning; transfer failures abort.
pub(super) fn apply_tokens<D: NcmDevice>(
    mdio: &Mdio<'_, D>,
    tokens: &[String],
    out: &mut impl Write,
    report: &mut Report,
) -> Result<()> {
    for token in tokens {
        let op = match token.parse::<RegisterOp>() {
            Ok(op) => op,
            Err(e) => {
                log::warn!("skipping register argument '{token}': {e}");
                report.skipped.push(SkippedJson {
                    token: token.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if let RegisterOp::Write(reg, value) = op {
            writeln!(out, "Writing 0x{reg:02x}: 0x{value:04x}")?;
        }
        let value = mdio.apply(op)?;
        let reg = op.register();
        match op {
            RegisterOp::Read(_) => print_read(out, report, reg, value)?,
            RegisterOp::Write(..) => report.registers.push(RegisterJson {
                op: "write",
                register: reg,
                value,
            }),
        }
    }
    Ok(())
}

pub(super) fn stream(device: &impl NcmDevice, len: usize, report: &mut Report) -> Result<()> {
    let outcome = vendor::stream_test(device, len)?;
    if outcome.is_complete() {
        log::info!("stream test: {} bytes written", outcome.written);
    } else {
        log::warn!("Incomplete stream written: {} of {} bytes", outcome.written, outcome.requested);
    }
    report.stream = Some(StreamJson {
        requested: outcome.requested,
        written: outcome.written,
        complete: outcome.is_complete(),
    });
    Ok(())
}

//! CDC Ethernet class commands and their output.

use std::io::Write;

use super::{
    ClassCommand, ClassCommandJson, ClassReply, MulticastEntryJson, NcmDevice, Report, Result,
    class_cmd,
};

pub(super) fn run(
    device: &impl NcmDevice,
    cmd: &ClassCommand,
    out: &mut impl Write,
    report: &mut Report,
) -> Result<()> {
    let mut entry = ClassCommandJson {
        command: cmd.spec().name,
        packet_filter: None,
        multicast: None,
        mac_address: None,
    };

    match cmd {
        ClassCommand::SetMulticast(list) => {
            if list.is_empty() {
                log::info!("clearing multicast filter list");
            }
            let entries = list
                .iter()
                .map(|&address| {
                    let hash_bin = address.multicast_hash();
                    log::info!("multicast {address}: hash bin {hash_bin}");
                    MulticastEntryJson { address, hash_bin }
                })
                .collect();
            entry.multicast = Some(entries);
        }
        ClassCommand::SetPacketFilter(filter) => entry.packet_filter = Some(*filter),
        ClassCommand::SetMacAddress(mac) => entry.mac_address = Some(*mac),
        ClassCommand::GetMacAddress(_) => {}
    }

    if let Some(ClassReply::MacAddress(mac)) = class_cmd::execute(device, cmd)? {
        writeln!(out, "MAC address: {mac}")?;
        entry.mac_address = Some(mac);
    }

    report.class_commands.push(entry);
    Ok(())
}

use anyhow::{Result, bail};
use scry_core::{ChainFailure, OffsetChain, PointerChainResolver};

use super::hex_utils::{parse_hex_address, parse_offset_list};
use crate::cli::Args;
use crate::session::Session;

pub fn run(
    args: &Args,
    name: Option<&str>,
    offsets_list: Option<&str>,
    base: Option<&str>,
) -> Result<()> {
    let session = Session::attach(args)?;
    let reader = session.reader();
    let offsets = session.scry.offsets();

    let chain = match (name, offsets_list) {
        (_, Some(list)) => OffsetChain::new(parse_offset_list(list)?),
        (Some(name), None) if name.eq_ignore_ascii_case("entity_list") => {
            offsets.entity_list.clone()
        }
        (Some(name), None) => match offsets.stats.get(name) {
            Some(chain) => chain.clone(),
            None => bail!("No chain named '{}' in the offsets file", name),
        },
        (None, None) => bail!("Give a chain name or --chain"),
    };

    let base = match base {
        Some(s) => parse_hex_address(s)?,
        None => session.scry.stats_base(&reader),
    };

    let trace = PointerChainResolver::new(&reader).resolve_traced(base, &chain);

    println!("Chain {} from 0x{:X}", chain, trace.base);
    for (i, step) in trace.steps.iter().enumerate() {
        match step.offset {
            Some(offset) => println!(
                "  [{}] {} read 0x{:X} -> 0x{:X}",
                i,
                signed_hex(offset),
                step.read_at,
                step.value
            ),
            None => println!("  [{}] read 0x{:X} -> 0x{:X}", i, step.read_at, step.value),
        }
    }

    match (trace.result, trace.failure) {
        (Some(address), _) => {
            if let Some(last) = chain.offsets().last() {
                println!("  field {}", signed_hex(*last));
            }
            println!("Resolved: 0x{:X}", address)
        }
        (None, Some(ChainFailure::EmptyChain)) => println!("Empty chain"),
        (None, Some(ChainFailure::NullPointer { step })) => {
            println!("Null pointer before step {}", step)
        }
        (None, Some(ChainFailure::ReadFault { address, message })) => {
            println!("Read fault at 0x{:X}: {}", address, message)
        }
        (None, None) => println!("Unresolved"),
    }
    Ok(())
}

fn signed_hex(offset: i64) -> String {
    if offset < 0 {
        format!("-{:#X}", offset.unsigned_abs())
    } else {
        format!("+{:#X}", offset)
    }
}

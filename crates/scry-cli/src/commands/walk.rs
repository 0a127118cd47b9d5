use anyhow::Result;
use scry_core::{AddressValidator, LinkedStructureWalker};

use super::hex_utils::parse_hex_address;
use crate::cli::Args;
use crate::session::Session;

pub struct WalkArgs<'a> {
    pub head: &'a str,
    pub next_offset: Option<&'a str>,
    pub id_offset: Option<&'a str>,
    pub max_nodes: Option<usize>,
    pub permissive: bool,
}

pub fn run(args: &Args, walk: WalkArgs<'_>) -> Result<()> {
    let head = parse_hex_address(walk.head)?;
    let session = Session::attach(args)?;
    let config = session.scry.config();

    let next_offset = match walk.next_offset {
        Some(s) => parse_hex_address(s)?,
        None => config.entity.next_offset,
    };
    let id_offset = match walk.id_offset {
        Some(s) => parse_hex_address(s)?,
        None => config.entity.id_offset,
    };
    let max_nodes = walk.max_nodes.unwrap_or(config.entity.max_nodes);
    let validator = if walk.permissive {
        AddressValidator::permissive()
    } else {
        config.validator
    };

    let reader = session.reader();
    let result = LinkedStructureWalker::new(&reader).walk_with_stats(
        head,
        next_offset,
        id_offset,
        max_nodes,
        &validator,
    );

    for (i, node) in result.nodes.iter().enumerate() {
        println!("{:>5}  0x{:X}  id 0x{:X}", i, node.address, node.id);
    }
    println!(
        "{} node(s), {} visited, stopped on {}",
        result.nodes.len(),
        result.visited,
        result.stop
    );
    Ok(())
}

//! Raw byte dump.
//!
//! ```text
//! 0x1E8000010: 48 65 6C 6C 6F 20 57 6F  72 6C 64 00 00 00 00 00  |Hello World.....|
//! ```

use anyhow::Result;
use scry_core::ReadMemory;

use super::hex_utils::parse_hex_address;
use crate::cli::Args;
use crate::session::Session;

pub fn run(args: &Args, address: &str, size: usize, ascii: bool) -> Result<()> {
    let address = parse_hex_address(address)?;
    let session = Session::attach(args)?;
    let bytes = session.reader().read_bytes(address, size)?;

    println!("Hexdump at 0x{:X} ({} bytes):", address, size);
    println!();
    for (i, chunk) in bytes.chunks(16).enumerate() {
        println!("{}", format_line(address + i as u64 * 16, chunk, ascii));
    }
    Ok(())
}

fn format_line(address: u64, chunk: &[u8], ascii: bool) -> String {
    let mut line = format!("0x{:X}: ", address);

    for j in 0..16 {
        if j == 8 {
            line.push(' ');
        }
        match chunk.get(j) {
            Some(byte) => line.push_str(&format!("{:02X} ", byte)),
            None => line.push_str("   "),
        }
    }

    if ascii {
        line.push_str(" |");
        for j in 0..16 {
            line.push(match chunk.get(j) {
                Some(byte) if (0x20..0x7F).contains(byte) => *byte as char,
                Some(_) => '.',
                None => ' ',
            });
        }
        line.push('|');
    }
    line
}

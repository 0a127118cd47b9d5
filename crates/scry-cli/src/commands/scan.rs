use anyhow::{Result, bail};
use scry_core::{ByteSignature, ModuleProvider, PatternScanner};

use crate::cli::Args;
use crate::session::Session;

pub fn run(args: &Args, pattern: &str, module: Option<&str>) -> Result<()> {
    let signature: ByteSignature = pattern.parse()?;
    let session = Session::attach(args)?;
    let reader = session.reader();

    let module = match module {
        Some(name) => reader.find_module(name)?,
        None => reader.find_module(&session.process.name)?,
    };
    println!(
        "Scanning {} (0x{:X}..0x{:X}) for {}",
        module.name,
        module.base,
        module.end(),
        signature
    );

    match PatternScanner::new(&reader).find(&module, &signature) {
        Some(address) => {
            println!(
                "Found at 0x{:X} ({}+{:#X})",
                address,
                module.name,
                address - module.base
            );
            Ok(())
        }
        None => bail!("Signature not found in {}", module.name),
    }
}

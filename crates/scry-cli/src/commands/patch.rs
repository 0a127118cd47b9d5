use anyhow::Result;

use crate::cli::Args;
use crate::session::Session;

pub fn run(args: &Args, name: &str) -> Result<()> {
    let session = Session::attach(args)?;
    let Some(definition) = session.scry.offsets().patch(name) else {
        let known: Vec<&str> = session
            .scry
            .offsets()
            .patches
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        anyhow::bail!("Unknown patch '{}' (known: {})", name, known.join(", "));
    };

    let address = session.scry.apply_patch(&session.reader(), &definition.name)?;
    let bytes: usize = definition.sites.iter().map(|site| site.bytes.len()).sum();
    println!(
        "Applied '{}' at 0x{:X}: {} byte(s) over {} site(s)",
        definition.name,
        address,
        bytes,
        definition.sites.len()
    );
    Ok(())
}

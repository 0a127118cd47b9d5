use anyhow::Result;
use scry_core::ModuleProvider;

use crate::cli::Args;
use crate::session::Session;

pub fn run(args: &Args) -> Result<()> {
    let session = Session::attach(args)?;
    let mut modules = session.reader().modules()?;
    modules.sort_by_key(|m| m.base);

    println!("{:<18} {:>10}  Name", "Base", "Size");
    for module in &modules {
        println!("0x{:016X} {:>#10x}  {}", module.base, module.size, module.name);
    }
    Ok(())
}

use anyhow::Result;
use scry_core::ProcessHandle;

pub fn run(filter: Option<&str>) -> Result<()> {
    let filter = filter.map(str::to_ascii_lowercase);
    let mut processes = ProcessHandle::list()?;
    processes.retain(|p| {
        filter
            .as_deref()
            .is_none_or(|f| p.name.to_ascii_lowercase().contains(f))
    });
    processes.sort_by_key(|p| p.pid);

    for process in &processes {
        println!("{:>8}  {}", process.pid, process.name);
    }
    println!("{} process(es)", processes.len());
    Ok(())
}

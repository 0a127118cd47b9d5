//! Loading configuration and attaching to the target.

use std::path::Path;

use anyhow::{Result, bail};
use scry_core::{Config, MemoryReader, OffsetsCollection, ProcessHandle, Scry, load_offsets};
use tracing::{info, warn};

use crate::cli::Args;

/// An attached process plus the inspector configured for it.
pub struct Session {
    pub process: ProcessHandle,
    pub scry: Scry,
}

impl Session {
    pub fn attach(args: &Args) -> Result<Self> {
        let config = load_config(&args.config);
        let offsets = load_offsets_or_default(&args.offsets);
        let process = open_process(args.pid, &config)?;
        info!(
            "Attached to {} (PID {}, base {:#x})",
            process.name, process.pid, process.base_address
        );

        Ok(Self {
            process,
            scry: Scry::new(config, offsets),
        })
    }

    pub fn reader(&self) -> MemoryReader<'_> {
        MemoryReader::new(&self.process)
    }
}

/// Load the runtime config, falling back to defaults.
pub fn load_config(path: &Path) -> Config {
    match Config::load(path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
            Config::default()
        }
    }
}

/// Load the offsets file, falling back to an empty collection.
pub fn load_offsets_or_default(path: &Path) -> OffsetsCollection {
    match load_offsets(path) {
        Ok(offsets) => {
            info!(
                "Loaded offsets{} from {}",
                if offsets.version.is_empty() {
                    String::new()
                } else {
                    format!(" version {}", offsets.version)
                },
                path.display()
            );
            offsets
        }
        Err(e) => {
            warn!("Failed to load offsets from {}: {}", path.display(), e);
            OffsetsCollection::default()
        }
    }
}

pub fn open_process(pid: Option<u32>, config: &Config) -> Result<ProcessHandle> {
    if let Some(pid) = pid {
        return Ok(ProcessHandle::open(pid)?);
    }
    if config.process.names.is_empty() {
        bail!("No target given: pass --pid or set process.names in the config file");
    }
    Ok(ProcessHandle::find_and_open(&config.process.names)?)
}

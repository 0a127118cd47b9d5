//! Process attachment and raw memory access.
//!
//! The Windows backend uses `ReadProcessMemory` / `WriteProcessMemory` and
//! Toolhelp snapshots for process and module enumeration. Other platforms
//! compile but can never attach.

use serde::Serialize;

use crate::error::{Error, Result};

/// A module mapped into the target process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub name: String,
    pub base: u64,
    pub size: u64,
}

impl ModuleInfo {
    pub fn new(name: impl Into<String>, base: u64, size: u64) -> Self {
        Self {
            name: name.into(),
            base,
            size,
        }
    }

    pub fn end(&self) -> u64 {
        self.base.saturating_add(self.size)
    }

    pub fn contains(&self, address: u64) -> bool {
        (self.base..self.end()).contains(&address)
    }
}

/// Summary of a running process, as listed by [`ProcessHandle::list`].
#[derive(Debug, Clone, Serialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
}

/// An open handle to the target process.
pub struct ProcessHandle {
    pub pid: u32,
    pub name: String,
    pub base_address: u64,
    pub module_size: u64,
    #[cfg(target_os = "windows")]
    handle: windows::Win32::Foundation::HANDLE,
}

// Win32 process handles used for memory access can be shared across threads.
#[cfg(target_os = "windows")]
unsafe impl Send for ProcessHandle {}
#[cfg(target_os = "windows")]
unsafe impl Sync for ProcessHandle {}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("name", &self.name)
            .field("base_address", &format_args!("{:#x}", self.base_address))
            .field("module_size", &format_args!("{:#x}", self.module_size))
            .finish()
    }
}

impl ProcessHandle {
    /// Find the first running process whose executable matches one of `names`
    /// (case-insensitive) and open it.
    pub fn find_and_open(names: &[String]) -> Result<Self> {
        let processes = Self::list()?;
        let found = names.iter().find_map(|wanted| {
            processes
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case(wanted))
        });

        match found {
            Some(info) => Self::open(info.pid),
            None => Err(Error::ProcessNotFound(names.join(", "))),
        }
    }
}

#[cfg(target_os = "windows")]
mod imp {
    use std::ffi::c_void;

    use windows::Win32::Foundation::{CloseHandle, HANDLE, STILL_ACTIVE};
    use windows::Win32::System::Diagnostics::Debug::{ReadProcessMemory, WriteProcessMemory};
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW, Module32NextW,
        PROCESSENTRY32W, Process32FirstW, Process32NextW, TH32CS_SNAPMODULE,
        TH32CS_SNAPMODULE32, TH32CS_SNAPPROCESS,
    };
    use windows::Win32::System::Threading::{
        GetExitCodeProcess, OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION,
        PROCESS_VM_READ, PROCESS_VM_WRITE,
    };

    use super::{ModuleInfo, ProcessHandle, ProcessInfo};
    use crate::error::{Error, Result};

    fn wide_to_string(wide: &[u16]) -> String {
        let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
        String::from_utf16_lossy(&wide[..len])
    }

    /// Closes the wrapped snapshot handle on drop.
    struct Snapshot(HANDLE);

    impl Drop for Snapshot {
        fn drop(&mut self) {
            unsafe {
                let _ = CloseHandle(self.0);
            }
        }
    }

    fn snapshot_modules(pid: u32) -> Result<Vec<ModuleInfo>> {
        let snapshot = unsafe {
            CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid)
        }
        .map_err(|e| Error::ProcessOpenFailed(format!("module snapshot for PID {}: {}", pid, e)))?;
        let snapshot = Snapshot(snapshot);

        let mut entry = MODULEENTRY32W {
            dwSize: std::mem::size_of::<MODULEENTRY32W>() as u32,
            ..Default::default()
        };

        let mut modules = Vec::new();
        if unsafe { Module32FirstW(snapshot.0, &mut entry) }.is_err() {
            return Ok(modules);
        }

        loop {
            modules.push(ModuleInfo {
                name: wide_to_string(&entry.szModule),
                base: entry.modBaseAddr as u64,
                size: entry.modBaseSize as u64,
            });

            if unsafe { Module32NextW(snapshot.0, &mut entry) }.is_err() {
                break;
            }
        }

        Ok(modules)
    }

    impl ProcessHandle {
        pub fn list() -> Result<Vec<ProcessInfo>> {
            let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
                .map_err(|e| Error::ProcessNotFound(format!("process snapshot failed: {}", e)))?;
            let snapshot = Snapshot(snapshot);

            let mut entry = PROCESSENTRY32W {
                dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
                ..Default::default()
            };

            let mut processes = Vec::new();
            if unsafe { Process32FirstW(snapshot.0, &mut entry) }.is_err() {
                return Ok(processes);
            }

            loop {
                processes.push(ProcessInfo {
                    pid: entry.th32ProcessID,
                    name: wide_to_string(&entry.szExeFile),
                });

                if unsafe { Process32NextW(snapshot.0, &mut entry) }.is_err() {
                    break;
                }
            }

            Ok(processes)
        }

        pub fn open(pid: u32) -> Result<Self> {
            let handle = unsafe {
                OpenProcess(
                    PROCESS_VM_READ
                        | PROCESS_VM_WRITE
                        | PROCESS_VM_OPERATION
                        | PROCESS_QUERY_INFORMATION,
                    false,
                    pid,
                )
            }
            .map_err(|e| Error::ProcessOpenFailed(format!("PID {}: {}", pid, e)))?;

            if handle.is_invalid() {
                return Err(Error::ProcessOpenFailed(format!("invalid handle for PID {}", pid)));
            }

            // The first module of a snapshot is the main executable
            let main = match snapshot_modules(pid) {
                Ok(modules) => modules.into_iter().next(),
                Err(e) => {
                    unsafe {
                        let _ = CloseHandle(handle);
                    }
                    return Err(e);
                }
            };

            let Some(main) = main else {
                unsafe {
                    let _ = CloseHandle(handle);
                }
                return Err(Error::ProcessOpenFailed(format!(
                    "no modules found for PID {}",
                    pid
                )));
            };

            Ok(Self {
                pid,
                name: main.name,
                base_address: main.base,
                module_size: main.size,
                handle,
            })
        }

        pub fn read_memory(&self, address: u64, size: usize) -> Result<Vec<u8>> {
            let mut buffer = vec![0u8; size];
            let mut bytes_read = 0usize;

            let result = unsafe {
                ReadProcessMemory(
                    self.handle,
                    address as *const c_void,
                    buffer.as_mut_ptr() as *mut c_void,
                    size,
                    Some(&mut bytes_read),
                )
            };

            match result {
                Ok(()) if bytes_read == size => Ok(buffer),
                Ok(()) => Err(Error::MemoryReadFailed {
                    address,
                    message: format!("partial read: {} of {} bytes", bytes_read, size),
                }),
                Err(e) => Err(Error::MemoryReadFailed {
                    address,
                    message: e.to_string(),
                }),
            }
        }

        pub fn write_memory(&self, address: u64, bytes: &[u8]) -> Result<()> {
            let mut written = 0usize;

            let result = unsafe {
                WriteProcessMemory(
                    self.handle,
                    address as *const c_void,
                    bytes.as_ptr() as *const c_void,
                    bytes.len(),
                    Some(&mut written),
                )
            };

            match result {
                Ok(()) if written == bytes.len() => Ok(()),
                Ok(()) => Err(Error::MemoryWriteFailed {
                    address,
                    message: format!("partial write: {} of {} bytes", written, bytes.len()),
                }),
                Err(e) => Err(Error::MemoryWriteFailed {
                    address,
                    message: e.to_string(),
                }),
            }
        }

        pub fn modules(&self) -> Result<Vec<ModuleInfo>> {
            snapshot_modules(self.pid)
        }

        pub fn is_alive(&self) -> bool {
            let mut code = 0u32;
            unsafe { GetExitCodeProcess(self.handle, &mut code) }.is_ok()
                && code == STILL_ACTIVE.0 as u32
        }
    }

    impl Drop for ProcessHandle {
        fn drop(&mut self) {
            if !self.handle.is_invalid() {
                unsafe {
                    let _ = CloseHandle(self.handle);
                }
            }
        }
    }
}

#[cfg(not(target_os = "windows"))]
mod imp {
    use super::{ModuleInfo, ProcessHandle, ProcessInfo};
    use crate::error::{Error, Result};

    impl ProcessHandle {
        pub fn list() -> Result<Vec<ProcessInfo>> {
            Ok(Vec::new())
        }

        pub fn open(pid: u32) -> Result<Self> {
            Err(Error::ProcessOpenFailed(format!(
                "PID {}: process attachment is only supported on Windows",
                pid
            )))
        }

        pub fn read_memory(&self, _address: u64, _size: usize) -> Result<Vec<u8>> {
            Err(Error::NotAttached)
        }

        pub fn write_memory(&self, _address: u64, _bytes: &[u8]) -> Result<()> {
            Err(Error::NotAttached)
        }

        pub fn modules(&self) -> Result<Vec<ModuleInfo>> {
            Err(Error::NotAttached)
        }

        pub fn is_alive(&self) -> bool {
            false
        }
    }
}

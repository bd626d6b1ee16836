//! Windows process attachment and memory reads.
//!
//! This is the external side of the resolver: opening the target by
//! executable name, snapshotting its loaded modules, and performing the
//! bounded 4-byte reads everything else is built on.

use tracing::debug;
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW, Module32NextW, PROCESSENTRY32W,
    Process32FirstW, Process32NextW, TH32CS_SNAPMODULE, TH32CS_SNAPMODULE32, TH32CS_SNAPPROCESS,
};
use windows::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ};

use super::{Address, ModuleInfo, ModuleSnapshot, ReadMemory};
use crate::error::{Error, Result};

/// An attached target process.
pub struct ProcessHandle {
    handle: HANDLE,
    pid: u32,
    name: String,
}

impl ProcessHandle {
    /// Find a process by executable name (case-insensitive) and open it for
    /// reading.
    pub fn open_by_name(name: &str) -> Result<Self> {
        let pid = find_pid(name)?.ok_or_else(|| Error::ProcessNotFound(name.to_string()))?;
        let handle =
            unsafe { OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, false, pid) }
                .map_err(|e| Error::ProcessOpenFailed(e.to_string()))?;
        debug!(pid, name, "opened target process");
        Ok(Self {
            handle,
            pid,
            name: name.to_string(),
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot the target's currently loaded modules.
    ///
    /// Fails once the process is gone, which doubles as the liveness probe
    /// for reattach loops.
    pub fn modules(&self) -> Result<ModuleSnapshot> {
        let snapshot = unsafe {
            CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, self.pid)
        }
        .map_err(|e| Error::ModuleSnapshotFailed(e.to_string()))?;

        let mut modules = Vec::new();
        let mut entry = MODULEENTRY32W {
            dwSize: std::mem::size_of::<MODULEENTRY32W>() as u32,
            ..Default::default()
        };
        if unsafe { Module32FirstW(snapshot, &mut entry) }.is_ok() {
            loop {
                let base = entry.modBaseAddr as usize;
                if let Ok(base) = Address::try_from(base) {
                    modules.push(ModuleInfo {
                        name: utf16_to_string(&entry.szModule),
                        base,
                    });
                } else {
                    // above the 32-bit address space, cannot belong to the target runtime
                    debug!(base, "skipping module outside 32-bit range");
                }
                if unsafe { Module32NextW(snapshot, &mut entry) }.is_err() {
                    break;
                }
            }
        }
        unsafe {
            let _ = CloseHandle(snapshot);
        }
        Ok(ModuleSnapshot::new(modules))
    }
}

impl ReadMemory for ProcessHandle {
    fn read_u32(&self, addr: Address) -> Option<u32> {
        if addr == 0 {
            return None;
        }
        let mut value: u32 = 0;
        // SAFETY: addr is checked non-zero above; ReadProcessMemory reads from
        // the target's process memory into a stack-local variable of the
        // correct size.
        unsafe {
            ReadProcessMemory(
                self.handle,
                addr as usize as _,
                &mut value as *mut _ as _,
                std::mem::size_of::<u32>(),
                None,
            )
            .ok()
            .map(|_| value)
        }
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

fn find_pid(name: &str) -> Result<Option<u32>> {
    let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
        .map_err(|e| Error::ProcessOpenFailed(e.to_string()))?;

    let mut found = None;
    let mut entry = PROCESSENTRY32W {
        dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };
    if unsafe { Process32FirstW(snapshot, &mut entry) }.is_ok() {
        loop {
            if utf16_to_string(&entry.szExeFile).eq_ignore_ascii_case(name) {
                found = Some(entry.th32ProcessID);
                break;
            }
            if unsafe { Process32NextW(snapshot, &mut entry) }.is_err() {
                break;
            }
        }
    }
    unsafe {
        let _ = CloseHandle(snapshot);
    }
    Ok(found)
}

fn utf16_to_string(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

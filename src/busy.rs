//! Advisory port-exclusivity checking.
//!
//! Before an acquisition opens a serial endpoint, the host process table
//! is scanned for a process that already holds the endpoint open, so the
//! user gets "port busy, held by screen (PID 4242)" instead of a cryptic
//! open failure. The scan is best-effort and purely advisory: it takes no
//! lock, so a race between the check and the subsequent open is possible
//! and accepted.
//!
//! Processes that vanish mid-scan and processes whose handle tables cannot
//! be inspected (permissions) are expected races, not failures: they are
//! treated as non-matching and the scan continues. The scan never errors.

use std::path::Path;

/// Identity of the process holding an endpoint open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortHolder {
    /// Name of the holding process.
    pub process_name: String,
    /// Process identifier of the holder.
    pub pid: u32,
}

/// Scan the live process list for a process with `endpoint` in its open
/// file table. Returns the first holder found, or `None` when no holder
/// can be identified — including on hosts where handle tables cannot be
/// inspected at all.
pub fn find_port_holder(endpoint: &Path) -> Option<PortHolder> {
    #[cfg(target_os = "linux")]
    {
        linux::find_port_holder(endpoint)
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = endpoint;
        None
    }
}

#[cfg(target_os = "linux")]
mod linux {
    use super::PortHolder;
    use log::debug;
    use std::fs;
    use std::path::{Path, PathBuf};
    use sysinfo::System;

    pub(super) fn find_port_holder(endpoint: &Path) -> Option<PortHolder> {
        // Compare against the resolved device path so a symlinked endpoint
        // (e.g. /dev/serial/by-id/...) still matches the holder's fd.
        let target = endpoint
            .canonicalize()
            .unwrap_or_else(|_| endpoint.to_path_buf());

        let sys = System::new_all();
        for (pid, process) in sys.processes() {
            let fd_dir = PathBuf::from(format!("/proc/{}/fd", pid.as_u32()));
            let entries = match fs::read_dir(&fd_dir) {
                Ok(entries) => entries,
                // Vanished mid-scan, or fd table not inspectable: skip.
                Err(_) => continue,
            };

            for entry in entries.flatten() {
                match fs::read_link(entry.path()) {
                    Ok(resolved) if resolved == target => {
                        let holder = PortHolder {
                            process_name: process.name().to_string_lossy().into_owned(),
                            pid: pid.as_u32(),
                        };
                        debug!(
                            "Port {} held by {} (PID {})",
                            target.display(),
                            holder.process_name,
                            holder.pid
                        );
                        return Some(holder);
                    }
                    _ => continue,
                }
            }
        }
        None
    }
}

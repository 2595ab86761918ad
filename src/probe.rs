//! Endpoint-existence probing.
//!
//! Whether a serial endpoint "exists" is platform-dependent: on POSIX-like
//! systems an endpoint is a device file and a path test answers the
//! question, while COM identifiers on Windows are not filesystem paths and
//! the only probe available is to open and immediately close the endpoint.
//! The two strategies are expressed as implementations of
//! [`EndpointProber`], selected once at startup by [`platform_prober`]
//! instead of branching inline at every call site.

use std::path::Path;
use std::time::Duration;

use log::debug;

/// Baud rate used by the open/close probe. The value is irrelevant to the
/// probe's outcome; the open either succeeds or it does not.
const PROBE_BAUD: u32 = 9600;

/// Read timeout for the open/close probe.
const PROBE_TIMEOUT: Duration = Duration::from_millis(100);

/// Capability for answering "does this endpoint exist on this host?".
pub trait EndpointProber {
    /// Returns `true` if the endpoint is present on the host.
    fn exists(&self, endpoint: &str) -> bool;
}

/// Path-existence probe for hosts where serial endpoints are device files.
pub struct PathProber;

impl EndpointProber for PathProber {
    fn exists(&self, endpoint: &str) -> bool {
        Path::new(endpoint).exists()
    }
}

/// Open/close probe for hosts where serial endpoints are not paths.
///
/// A port that exists but cannot be opened (e.g. held by another process)
/// probes as absent; on such hosts there is no cheaper existence test.
pub struct OpenProber;

impl EndpointProber for OpenProber {
    fn exists(&self, endpoint: &str) -> bool {
        match serialport::new(endpoint, PROBE_BAUD)
            .timeout(PROBE_TIMEOUT)
            .open()
        {
            Ok(port) => {
                drop(port);
                true
            }
            Err(e) => {
                debug!("Open probe of '{}' failed: {}", endpoint, e);
                false
            }
        }
    }
}

/// Select the prober for the current host platform.
pub fn platform_prober() -> Box<dyn EndpointProber> {
    if cfg!(windows) {
        Box::new(OpenProber)
    } else {
        Box::new(PathProber)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_prober_missing_endpoint() {
        assert!(!PathProber.exists("/dev/definitely-not-a-port"));
    }

    #[test]
    fn test_path_prober_existing_path() {
        // Any existing path satisfies the probe; the prober only answers
        // existence, not whether the path is a serial device.
        assert!(PathProber.exists("/"));
    }
}

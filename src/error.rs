//! Custom error types for the application.
//!
//! This module defines the primary error type, `McaError`, for the entire
//! application. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the different kinds of errors that can occur,
//! from port discovery and protocol failures to persistence issues.
//!
//! ## Error Hierarchy
//!
//! `McaError` consolidates the error sources of the acquisition pipeline:
//!
//! - **`PortNotFound` / `PortBusy`**: Pre-flight validation failures. A busy
//!   port carries the identity of the process holding it open.
//! - **`AcquisitionTimeout` / `Acquisition`**: Protocol-level failures. Both
//!   carry the last state the acquisition state machine reached, so callers
//!   can report *where* an exchange broke down, not just that it did.
//! - **`Configuration`**: Semantic errors in settings, such as a zero baud
//!   rate or a negative timeout. These are caught during validation.
//! - **`FileNotFound` / `Io` / `Csv`**: Persistence-layer failures.
//!
//! The acquisition handler surfaces these errors to its caller unchanged; it
//! performs no internal retries. The binaries catch at the boundary and
//! present a human-readable status message.

use std::path::PathBuf;

use thiserror::Error;

use crate::acquisition::AcquisitionState;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, McaError>;

/// The primary error type for the acquisition pipeline.
#[derive(Error, Debug)]
pub enum McaError {
    #[error("Serial port '{port}' not found")]
    PortNotFound {
        /// The endpoint that failed the existence probe.
        port: String,
    },

    #[error("Serial port '{port}' is already in use by process {process} (PID {pid})")]
    PortBusy {
        /// The endpoint that is held open elsewhere.
        port: String,
        /// Name of the process holding the endpoint.
        process: String,
        /// Process identifier of the holder.
        pid: u32,
    },

    #[error("Acquisition timed out while {state}")]
    AcquisitionTimeout {
        /// Last state the protocol handler reached before the deadline.
        state: AcquisitionState,
    },

    #[error("Acquisition failed while {state}: {source}")]
    Acquisition {
        /// Last state the protocol handler reached before the transport error.
        state: AcquisitionState,
        /// The underlying transport error.
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Spectrum file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("No spectrum data available")]
    NoSpectrum,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

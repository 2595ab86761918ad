//! Acquisition protocol handler for the multichannel analyzer.
//!
//! The device speaks a framed, line-oriented protocol: the host writes a
//! single `S` command, then the device emits a start marker, one header
//! line, exactly [`CHANNEL_COUNT`] data lines of `<channel>,<count>`, and
//! an end marker. Everything outside the markers is noise and discarded.
//!
//! ```text
//! host   -> S\n
//! device -> ---Spectrum Log Start
//! device -> Channel,Count            (header, contents ignored)
//! device -> 0,10
//! device -> 1,20
//! device -> ...                      (4096 lines total)
//! device -> ---Spectrum Log End
//! ```
//!
//! The exchange is driven as a state machine ([`AcquisitionState`]) so that
//! timeouts and transport errors can report exactly where they occurred.
//! Malformed data lines never abort the exchange: each of the 4096
//! iterations appends exactly one value, coercing anything unparsable to
//! zero, which keeps the spectrum length invariant intact.
//!
//! The protocol loop is written against the [`Transport`] seam so the
//! serial implementation and test transports share the state machine.

use std::fmt;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serialport::SerialPort;

use crate::busy;
use crate::config::Settings;
use crate::error::{AppResult, McaError};
use crate::probe;

/// Number of channels in one spectrum. The length invariant of every
/// acquired or loaded spectrum.
pub const CHANNEL_COUNT: usize = 4096;

/// Sentinel line delimiting the start of the data block.
pub const START_MARKER: &str = "---Spectrum Log Start";

/// Sentinel line delimiting the end of the data block.
pub const END_MARKER: &str = "---Spectrum Log End";

/// Command byte (plus terminator) that triggers one acquisition cycle.
const START_COMMAND: &[u8] = b"S\n";

/// Consecutive empty reads tolerated while waiting for a marker line.
const MAX_EMPTY_READS: u32 = 8;

/// Total wait per marker phase, as a multiple of the per-read timeout.
/// Bounds the discard loop even against a device that trickles
/// non-matching lines forever.
const MARKER_WAIT_FACTOR: u32 = 6;

/// States of the acquisition exchange.
///
/// Errors carry the last state reached, so `Display` renders each state as
/// a progressive clause ("awaiting start marker") that reads naturally in
/// an error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    /// No exchange in progress.
    Idle,
    /// Endpoint existence and exclusivity checks passed.
    PortValidated,
    /// Transport is open at the configured baud rate.
    Connected,
    /// Start command sent; discarding lines until the start marker.
    AwaitingStartMarker,
    /// Inside the data block, reading channel lines.
    ReadingLines,
    /// Data block complete; discarding lines until the end marker.
    AwaitingEndMarker,
    /// Exchange finished and the transport released.
    Complete,
}

impl fmt::Display for AcquisitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AcquisitionState::Idle => "idle",
            AcquisitionState::PortValidated => "validating the port",
            AcquisitionState::Connected => "connecting",
            AcquisitionState::AwaitingStartMarker => "awaiting start marker",
            AcquisitionState::ReadingLines => "reading channel data",
            AcquisitionState::AwaitingEndMarker => "awaiting end marker",
            AcquisitionState::Complete => "complete",
        };
        write!(f, "{}", text)
    }
}

/// Line-oriented transport seam between the state machine and the wire.
///
/// A real serial port and the scripted transports used in tests both
/// implement this. Reads are blocking, bounded by the transport's
/// configured timeout.
pub trait Transport {
    /// Write raw bytes to the device.
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read one terminated line, decoded as text and whitespace-trimmed.
    ///
    /// Returns `Ok(None)` when the read timeout elapsed before any data
    /// arrived. A partial line cut off by the timeout is returned as-is.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Blocking serial transport over the `serialport` crate.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    port_name: String,
}

impl SerialTransport {
    /// Open `port_name` at `baud_rate` with the given read timeout.
    ///
    /// An open failure maps to an acquisition error in the
    /// [`AcquisitionState::PortValidated`] state, since the port passed
    /// validation but could not be connected.
    pub fn open(port_name: &str, baud_rate: u32, timeout: Duration) -> AppResult<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| McaError::Acquisition {
                state: AcquisitionState::PortValidated,
                source: e.into(),
            })?;
        debug!("Serial port '{}' opened at {} baud", port_name, baud_rate);
        Ok(Self {
            port,
            port_name: port_name.to_string(),
        })
    }
}

impl Transport for SerialTransport {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line: Vec<u8> = Vec::new();
        let mut buf = [0u8; 1];

        loop {
            match self.port.read(&mut buf) {
                Ok(1) => {
                    if buf[0] == b'\n' {
                        break;
                    }
                    line.push(buf[0]);
                }
                // Serial ports do not signal EOF in normal operation.
                Ok(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("unexpected EOF on serial port '{}'", self.port_name),
                    ));
                }
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    if line.is_empty() {
                        return Ok(None);
                    }
                    // Timeout mid-line: surface what arrived.
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Some(String::from_utf8_lossy(&line).trim().to_string()))
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        debug!("Serial port '{}' released", self.port_name);
    }
}

/// One acquisition exchange over an exclusively-owned transport.
///
/// The session consumes itself on [`acquire`](Self::acquire); the
/// transport is dropped on every exit path, success or failure, so the
/// port handle is never leaked into a later exchange.
pub struct AcquisitionSession<T: Transport> {
    transport: T,
    timeout: Duration,
    state: AcquisitionState,
}

impl<T: Transport> AcquisitionSession<T> {
    /// Wrap an open transport. `timeout` is the per-read bound the
    /// transport was configured with; the marker phases derive their
    /// total-elapsed caps from it.
    pub fn new(transport: T, timeout: Duration) -> Self {
        Self {
            transport,
            timeout,
            state: AcquisitionState::Connected,
        }
    }

    /// Drive the full exchange and return the raw spectrum.
    ///
    /// Partial spectra are never returned: any transport error or timeout
    /// discards everything read so far and surfaces an error carrying the
    /// state that was active at the time.
    pub fn acquire(mut self) -> AppResult<Vec<u32>> {
        self.send_start()?;
        self.await_marker(START_MARKER, AcquisitionState::AwaitingStartMarker)?;
        let spectrum = self.read_channels()?;
        self.await_marker(END_MARKER, AcquisitionState::AwaitingEndMarker)?;
        self.state = AcquisitionState::Complete;
        debug!("Acquisition complete: {} channels", spectrum.len());
        Ok(spectrum)
    }

    fn send_start(&mut self) -> AppResult<()> {
        debug!("Sending start command");
        self.transport
            .send(START_COMMAND)
            .map_err(|e| self.fail(e))
    }

    /// Discard lines until one equals `marker`.
    ///
    /// Double-bounded: at most [`MAX_EMPTY_READS`] consecutive empty reads,
    /// and a total-elapsed deadline of `timeout * MARKER_WAIT_FACTOR`. The
    /// deadline also covers a device that keeps sending non-matching lines,
    /// which the empty-read budget alone would not.
    fn await_marker(&mut self, marker: &str, state: AcquisitionState) -> AppResult<()> {
        self.state = state;
        let deadline = Instant::now() + self.timeout * MARKER_WAIT_FACTOR;
        let mut empty_reads = 0u32;

        loop {
            match self.transport.read_line().map_err(|e| self.fail(e))? {
                Some(line) if line == marker => {
                    debug!("Marker '{}' received", marker);
                    return Ok(());
                }
                Some(line) => {
                    empty_reads = 0;
                    debug!("Discarding line while {}: {:?}", self.state, line);
                }
                None => {
                    empty_reads += 1;
                    if empty_reads >= MAX_EMPTY_READS {
                        warn!("No data after {} empty reads while {}", empty_reads, self.state);
                        return Err(McaError::AcquisitionTimeout { state: self.state });
                    }
                }
            }

            if Instant::now() >= deadline {
                warn!("Deadline elapsed while {}", self.state);
                return Err(McaError::AcquisitionTimeout { state: self.state });
            }
        }
    }

    /// Read the data block: one ignored header line, then exactly
    /// [`CHANNEL_COUNT`] channel lines.
    ///
    /// Each iteration appends exactly one value. A line that does not
    /// split into two comma-separated fields, or whose count field does
    /// not parse, contributes a zero; so does a read that times out. The
    /// length invariant always holds over value fidelity.
    fn read_channels(&mut self) -> AppResult<Vec<u32>> {
        self.state = AcquisitionState::ReadingLines;

        // Header row, contents ignored. A timeout here is treated the same
        // as an unusable header line.
        let header = self.transport.read_line().map_err(|e| self.fail(e))?;
        debug!("Skipping header line: {:?}", header);

        let mut spectrum = Vec::with_capacity(CHANNEL_COUNT);
        let mut malformed = 0usize;

        for _ in 0..CHANNEL_COUNT {
            let value = match self.transport.read_line().map_err(|e| self.fail(e))? {
                Some(line) => parse_channel_value(&line).unwrap_or_else(|| {
                    malformed += 1;
                    0
                }),
                None => {
                    malformed += 1;
                    0
                }
            };
            spectrum.push(value);
        }

        if malformed > 0 {
            warn!("{} of {} channel lines were malformed and zero-filled", malformed, CHANNEL_COUNT);
        }
        Ok(spectrum)
    }

    fn fail(&self, source: io::Error) -> McaError {
        McaError::Acquisition {
            state: self.state,
            source,
        }
    }
}

/// Parse a `<channel>,<count>` line into a count value.
///
/// Returns `None` unless the line splits into exactly two fields and the
/// second parses as a non-negative integer.
fn parse_channel_value(line: &str) -> Option<u32> {
    let mut fields = line.split(',');
    let _channel = fields.next()?;
    let count = fields.next()?;
    if fields.next().is_some() {
        return None;
    }
    count.trim().parse::<u32>().ok()
}

/// Validate an endpoint before opening it: existence probe, then the
/// advisory exclusivity check.
///
/// The check is best-effort: it takes no lock, so a race between the scan
/// and the subsequent open is possible and accepted.
pub fn validate_port(port: &str) -> AppResult<()> {
    let prober = probe::platform_prober();
    if !prober.exists(port) {
        return Err(McaError::PortNotFound {
            port: port.to_string(),
        });
    }

    if let Some(holder) = busy::find_port_holder(Path::new(port)) {
        return Err(McaError::PortBusy {
            port: port.to_string(),
            process: holder.process_name,
            pid: holder.pid,
        });
    }

    debug!("Port '{}' validated", port);
    Ok(())
}

/// Run one full acquisition against the configured port: validate, open,
/// exchange, release. The transport handle lives only for the duration of
/// this call.
pub fn acquire_spectrum(settings: &Settings) -> AppResult<Vec<u32>> {
    validate_port(&settings.port)?;
    let timeout = settings.timeout();
    let transport = SerialTransport::open(&settings.port, settings.baud_rate, timeout)?;
    AcquisitionSession::new(transport, timeout).acquire()
}

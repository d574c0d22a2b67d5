//! Request/response exchange with the control board.
//!
//! The protocol carries no request ids, so a [`Link`] serializes exchanges by
//! taking `&mut self` for the whole send/poll/drain cycle.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::{BoardError, Result};
use crate::frame::{self, DataFlow, HEADER_LEN, MAX_COMMAND_LEN, Message};
use crate::port::{PortConfig, Transport};
use crate::stats::Stats;

/// Longest response logged in full: 13-byte base plus 12 five-byte read groups.
pub const MAX_LOGGED_RESPONSE: usize = 73;
/// Marker the board puts at the start of an error report.
const DEVICE_ERROR_MARKER: &[u8] = b"Rx";

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub alias: String,
    pub read_timeout: Duration,
    /// Sleep between checks while waiting for the first byte.
    pub poll_interval: Duration,
    /// Sleep before each drain; the board pauses mid-transmission.
    pub drain_interval: Duration,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            alias: "ctrl-brd".into(),
            read_timeout: PortConfig::default().read_timeout,
            poll_interval: Duration::from_millis(10),
            drain_interval: Duration::from_millis(100),
        }
    }
}

impl ExchangeConfig {
    pub fn from_port(cfg: &PortConfig, alias: &str) -> Self {
        Self {
            alias: alias.to_string(),
            read_timeout: cfg.read_timeout,
            ..Self::default()
        }
    }
}

/// Integrity findings on a response. Reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityWarning {
    /// Board answered with its error marker; carries the decoded text.
    DeviceError(String),
    EchoMismatch { sent: u8, got: Option<u8> },
    SuffixMismatch,
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityWarning::DeviceError(text) => write!(f, "device error: {}", text),
            IntegrityWarning::EchoMismatch { sent, got } => match got {
                Some(g) => write!(
                    f,
                    "response does not start with message byte {:02x} vs {:02x}",
                    sent, g
                ),
                None => write!(f, "empty response to message byte {:02x}", sent),
            },
            IntegrityWarning::SuffixMismatch => f.write_str("response does not end with b'JBD'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub bytes: Vec<u8>,
    pub warnings: Vec<IntegrityWarning>,
}

impl Response {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn data_flow(&self) -> DataFlow {
        frame::parse_data_flow(&self.bytes)
    }
}

/// Compare a raw response against the message that provoked it.
pub fn validate(sent: &[u8], resp: &[u8]) -> Vec<IntegrityWarning> {
    let mut warnings = Vec::new();
    if resp.starts_with(DEVICE_ERROR_MARKER) {
        let end = resp.len().min(HEADER_LEN);
        let text = String::from_utf8_lossy(&resp[..end]).trim().to_string();
        warnings.push(IntegrityWarning::DeviceError(text));
    }
    if resp.first() != sent.first() {
        warnings.push(IntegrityWarning::EchoMismatch {
            sent: sent.first().copied().unwrap_or_default(),
            got: resp.first().copied(),
        });
    }
    if resp.get(MAX_COMMAND_LEN..HEADER_LEN) != sent.get(MAX_COMMAND_LEN..HEADER_LEN) {
        warnings.push(IntegrityWarning::SuffixMismatch);
    }
    warnings
}

pub struct Link<T: Transport> {
    transport: T,
    cfg: ExchangeConfig,
    stats: Stats,
}

impl<T: Transport> Link<T> {
    pub fn new(transport: T, cfg: ExchangeConfig) -> Self {
        Self {
            transport,
            cfg,
            stats: Stats::new(),
        }
    }

    pub fn alias(&self) -> &str {
        &self.cfg.alias
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Send `msg` and collect the board's answer.
    ///
    /// Fails only on I/O errors or when nothing arrives within the read
    /// timeout; integrity problems ride along on the returned [`Response`].
    pub fn query(&mut self, msg: &Message, response_delay: Duration) -> Result<Response> {
        let name = msg.control().name();
        frame::send(&mut self.transport, msg)?;
        self.stats.add_tx(msg.as_bytes().len());
        if !response_delay.is_zero() {
            thread::sleep(response_delay);
        }

        let deadline = Instant::now() + self.cfg.read_timeout;
        while self.transport.bytes_available()? == 0 {
            if Instant::now() > deadline {
                self.stats.inc_timeout();
                return Err(BoardError::Timeout(name));
            }
            thread::sleep(self.cfg.poll_interval);
        }

        let mut buffer = Vec::new();
        while self.transport.bytes_available()? > 0 {
            thread::sleep(self.cfg.drain_interval);
            buffer.extend(self.transport.read_available()?);
        }
        self.stats.add_rx(buffer.len());

        let warnings = validate(msg.as_bytes(), &buffer);
        for w in &warnings {
            warn!("[{}] {} - {}", self.cfg.alias, w, name);
        }
        self.stats.add_warnings(warnings.len());
        self.log_rx(&buffer, name);

        Ok(Response {
            bytes: buffer,
            warnings,
        })
    }

    fn log_rx(&self, buffer: &[u8], name: &str) {
        if buffer.len() <= MAX_LOGGED_RESPONSE {
            debug!("rx: {} - {}", hex::encode(buffer), name);
            return;
        }
        let tail = &buffer[buffer.len().saturating_sub(150)..];
        warn!(
            "Truncated message.  rx len: {}, info?: {}",
            buffer.len(),
            String::from_utf8_lossy(tail).trim()
        );
        debug!(
            "rx: {} ... {} - {}",
            hex::encode(&buffer[..HEADER_LEN]),
            hex::encode(&buffer[buffer.len() - 10..]),
            name
        );
    }
}

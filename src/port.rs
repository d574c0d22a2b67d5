use std::io::{self, Read, Write};
use std::time::Duration;

use log::debug;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};

use crate::error::{BoardError, Result};

/// USB-UART bridge fitted on the control board.
pub const PORT_DESCRIPTION_FILTER: &str = "CP210x";

/// Byte-stream capability the exchange engine drives.
pub trait Transport {
    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()>;
    /// Number of received bytes waiting to be read.
    fn bytes_available(&mut self) -> io::Result<usize>;
    /// Read everything currently waiting, without blocking for more.
    fn read_available(&mut self) -> io::Result<Vec<u8>>;
    fn clear_input(&mut self) -> io::Result<()>;
    fn clear_output(&mut self) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Serial device path; `None` auto-detects the control board.
    pub dev: Option<String>,
    pub baud: u32,
    pub write_timeout: Duration,
    pub inter_byte_timeout: Duration,
    /// How long a query waits for the first response byte.
    pub read_timeout: Duration,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            dev: None,
            baud: 921_600,
            write_timeout: Duration::from_secs(15),
            inter_byte_timeout: Duration::from_secs(3),
            read_timeout: Duration::from_secs(5),
        }
    }
}

/// Locate the first port whose USB product string names the board's bridge.
pub fn find_port() -> Result<String> {
    let ports = serialport::available_ports().map_err(io::Error::from)?;
    ports
        .into_iter()
        .find(|p| match &p.port_type {
            SerialPortType::UsbPort(usb) => usb
                .product
                .as_deref()
                .is_some_and(|s| s.contains(PORT_DESCRIPTION_FILTER)),
            _ => false,
        })
        .map(|p| p.port_name)
        .ok_or_else(|| {
            BoardError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "unable to locate matching device",
            ))
        })
}

pub fn open_port(cfg: &PortConfig) -> Result<Box<dyn SerialPort>> {
    let dev = match &cfg.dev {
        Some(d) => d.clone(),
        None => find_port()?,
    };
    // Reads only ever consume bytes already pending, so the port timeout
    // effectively bounds writes.
    let builder = serialport::new(&dev, cfg.baud)
        .timeout(cfg.write_timeout.max(cfg.inter_byte_timeout))
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None);

    debug!("opening {} at {} baud", dev, cfg.baud);
    builder.open().map_err(|e| {
        BoardError::Io(io::Error::other(format!("open {}: {}", dev, e)))
    })
}

impl Transport for Box<dyn SerialPort> {
    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_all(buf)?;
        self.flush()
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.bytes_to_read()? as usize)
    }

    fn read_available(&mut self) -> io::Result<Vec<u8>> {
        let n = self.bytes_available()?;
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(k) => filled += k,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e),
            }
        }
        buf.truncate(filled);
        Ok(buf)
    }

    fn clear_input(&mut self) -> io::Result<()> {
        Ok(self.clear(ClearBuffer::Input)?)
    }

    fn clear_output(&mut self) -> io::Result<()> {
        Ok(self.clear(ClearBuffer::Output)?)
    }
}

/// Scripted in-memory transport for unit tests.
#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;
    use std::io;

    use super::Transport;

    #[derive(Debug, Default)]
    pub struct MockTransport {
        /// Every write call in order, including empty ones.
        pub writes: Vec<Vec<u8>>,
        pub input_clears: usize,
        pub output_clears: usize,
        /// One entry per expected query; each reply may arrive in pieces.
        replies: VecDeque<Vec<Vec<u8>>>,
        inflight: VecDeque<Vec<u8>>,
        armed: bool,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(&mut self, bytes: &[u8]) -> &mut Self {
            self.replies.push_back(vec![bytes.to_vec()]);
            self
        }

        pub fn reply_in_pieces(&mut self, pieces: &[&[u8]]) -> &mut Self {
            self.replies
                .push_back(pieces.iter().map(|p| p.to_vec()).collect());
            self
        }

        /// Queue a silent query (no bytes ever arrive).
        pub fn silence(&mut self) -> &mut Self {
            self.replies.push_back(Vec::new());
            self
        }

        /// Header blocks sent so far (non-empty writes of exactly 12 bytes).
        pub fn headers(&self) -> Vec<Vec<u8>> {
            self.writes
                .iter()
                .filter(|w| w.len() == 12)
                .cloned()
                .collect()
        }

        pub fn pending_replies(&self) -> usize {
            self.replies.len()
        }
    }

    impl Transport for MockTransport {
        fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
            self.writes.push(buf.to_vec());
            if !buf.is_empty() {
                self.armed = true;
            }
            Ok(())
        }

        fn bytes_available(&mut self) -> io::Result<usize> {
            if self.armed {
                self.armed = false;
                self.inflight = self.replies.pop_front().unwrap_or_default().into();
            }
            Ok(self.inflight.front().map_or(0, |p| p.len()))
        }

        fn read_available(&mut self) -> io::Result<Vec<u8>> {
            Ok(self.inflight.pop_front().unwrap_or_default())
        }

        fn clear_input(&mut self) -> io::Result<()> {
            self.input_clears += 1;
            self.inflight.clear();
            Ok(())
        }

        fn clear_output(&mut self) -> io::Result<()> {
            self.output_clears += 1;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;

    #[test]
    fn defaults_match_board_link() {
        let cfg = PortConfig::default();
        assert_eq!(cfg.baud, 921_600);
        assert_eq!(cfg.read_timeout, Duration::from_secs(5));
        assert_eq!(cfg.write_timeout, Duration::from_secs(15));
        assert_eq!(cfg.inter_byte_timeout, Duration::from_secs(3));
    }

    #[test]
    fn mock_replays_pieces_after_write() {
        let mut t = MockTransport::new();
        t.reply_in_pieces(&[b"ab", b"cde"]);
        assert_eq!(t.bytes_available().unwrap(), 0);
        t.write_bytes(b"x").unwrap();
        assert_eq!(t.bytes_available().unwrap(), 2);
        assert_eq!(t.read_available().unwrap(), b"ab");
        assert_eq!(t.bytes_available().unwrap(), 3);
        assert_eq!(t.read_available().unwrap(), b"cde");
        assert_eq!(t.bytes_available().unwrap(), 0);
    }
}

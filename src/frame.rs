use std::io;

use log::{debug, warn};

use crate::error::{BoardError, Result};
use crate::port::Transport;
use crate::proto::command::ControlMsg;

/// b"JBD" closes every command header.
pub const CMD_SUFFIX: [u8; 3] = [0x4A, 0x42, 0x44];
pub const HEADER_LEN: usize = 12;
/// Room left for opcode + params once the suffix is placed.
pub const MAX_COMMAND_LEN: usize = HEADER_LEN - CMD_SUFFIX.len();
/// Payload block size the board accepts between sync writes.
pub const DATA_FLOW_CHUNK: usize = 3000;

/// A complete outgoing message: 12-byte header plus optional data flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    msg: ControlMsg,
    bytes: Vec<u8>,
}

impl Message {
    pub fn command(msg: ControlMsg, params: &[u8]) -> Result<Self> {
        Ok(Self {
            msg,
            bytes: build_message(msg.opcode(), params)?.to_vec(),
        })
    }

    /// Header followed by `payload` and its XOR checksum trailer.
    ///
    /// The caller embeds the payload length in `params` where the opcode
    /// expects it (see [`flow_len`]).
    pub fn with_data_flow(msg: ControlMsg, params: &[u8], payload: &[u8]) -> Result<Self> {
        let header = build_message(msg.opcode(), params)?;
        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len() + 1);
        bytes.extend_from_slice(&header);
        bytes.extend_from_slice(payload);
        bytes.push(xor_checksum(payload));
        Ok(Self { msg, bytes })
    }

    pub fn control(&self) -> ControlMsg {
        self.msg
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn header(&self) -> &[u8] {
        &self.bytes[..HEADER_LEN]
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_LEN..]
    }
}

/// Opcode + params, zero padding, then the suffix: always 12 bytes.
pub fn build_message(opcode: &[u8], params: &[u8]) -> Result<[u8; HEADER_LEN]> {
    let used = opcode.len() + params.len();
    if used > MAX_COMMAND_LEN {
        return Err(BoardError::HeaderOverflow(used));
    }
    let mut header = [0u8; HEADER_LEN];
    header[..opcode.len()].copy_from_slice(opcode);
    header[opcode.len()..used].copy_from_slice(params);
    header[MAX_COMMAND_LEN..].copy_from_slice(&CMD_SUFFIX);
    Ok(header)
}

pub fn xor_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0, |acc, b| acc ^ b)
}

/// 4-byte big-endian data-flow length field.
pub fn flow_len(len: usize) -> [u8; 4] {
    (len as u32).to_be_bytes()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumStatus {
    /// Bare 12-byte response, nothing to check.
    NotPresent,
    Valid,
    Mismatch { computed: u8, received: u8 },
}

/// Payload carried by a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFlow {
    pub bytes: Vec<u8>,
    pub checksum: ChecksumStatus,
}

/// Extract the data flow from a raw response.
///
/// A bare 12-byte response yields its inner bytes 1..9. Otherwise the length
/// sits at bytes 1..5 and the last byte is the XOR of everything after the
/// header. A mismatch is logged, never raised.
pub fn parse_data_flow(data: &[u8]) -> DataFlow {
    if data.len() <= HEADER_LEN {
        let end = data.len().min(MAX_COMMAND_LEN);
        return DataFlow {
            bytes: data.get(1..end).unwrap_or_default().to_vec(),
            checksum: ChecksumStatus::NotPresent,
        };
    }
    let mut len = [0u8; 4];
    len.copy_from_slice(&data[1..5]);
    let flow_len = u32::from_be_bytes(len) as usize;
    let end = HEADER_LEN.saturating_add(flow_len).min(data.len());
    let bytes = data[HEADER_LEN..end].to_vec();

    let received = data[data.len() - 1];
    let computed = xor_checksum(&data[HEADER_LEN..data.len() - 1]);
    let checksum = if computed == received {
        ChecksumStatus::Valid
    } else {
        warn!(
            "data_flow checksum does not match. {:02x} <> {:02x}",
            computed, received
        );
        ChecksumStatus::Mismatch { computed, received }
    };
    DataFlow { bytes, checksum }
}

/// Write `msg` to the transport.
///
/// Stale bytes are discarded first, then the header goes out as one block and
/// the data flow follows in [`DATA_FLOW_CHUNK`] blocks, each chased by an
/// empty write the board needs to keep the transfer going.
pub fn send<T: Transport + ?Sized>(transport: &mut T, msg: &Message) -> io::Result<()> {
    let bytes = msg.as_bytes();
    if bytes.len() == HEADER_LEN {
        debug!("tx: {} - {}", hex::encode(bytes), msg.control().name());
    } else {
        debug!(
            "tx: {} ... {} - {}",
            hex::encode(&bytes[..HEADER_LEN]),
            hex::encode(&bytes[bytes.len().saturating_sub(6)..]),
            msg.control().name()
        );
    }
    transport.clear_input()?;
    transport.clear_output()?;
    transport.write_bytes(msg.header())?;
    for block in msg.payload().chunks(DATA_FLOW_CHUNK) {
        transport.write_bytes(block)?;
        transport.write_bytes(&[])?;
    }
    Ok(())
}

use std::path::PathBuf;

use thiserror::Error;

use crate::proto::command::Panel;

pub type Result<T, E = BoardError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("serial i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("no response from device - {0}")]
    Timeout(&'static str),
    #[error("command header overflow: {0} bytes of opcode+params, at most 9 fit")]
    HeaderOverflow(usize),
    #[error("{op} is not supported for the {panel} panel selection")]
    Unsupported { op: &'static str, panel: Panel },
    #[error("{op} not supported by control board FW {version}, please update to a newer version")]
    FirmwareTooOld {
        op: &'static str,
        version: String,
    },
    #[error("{0} is not implemented in the control board firmware")]
    NotImplemented(&'static str),
    #[error("invalid hex value {0:?}, expected \"0xXXXXXXXX\"")]
    InvalidHex(String),
    #[error("read response carries unknown field tag {0}")]
    UnknownReadTag(u8),
    #[error("read response truncated: {0} trailing bytes")]
    TruncatedRead(usize),
    #[error("no readback from the {panel} panel: {what}")]
    NoReadback { panel: Panel, what: String },
    #[error("file not found: {}", .0.display())]
    MissingResource(PathBuf),
    #[error("image is {got_w}x{got_h}, panel expects {want_w}x{want_h}")]
    DimensionMismatch {
        got_w: u32,
        got_h: u32,
        want_w: u32,
        want_h: u32,
    },
    #[error("image decode: {0}")]
    Image(#[from] image::ImageError),
    #[error("no power supply channels defined")]
    PowerRailsMissing,
    #[error("power channel {rail}: {source}")]
    PowerChannel {
        rail: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("gamma table {path} line {line}: {reason}")]
    GammaTable {
        path: String,
        line: usize,
        reason: String,
    },
}

impl From<std::convert::Infallible> for BoardError {
    fn from(e: std::convert::Infallible) -> Self {
        match e {}
    }
}

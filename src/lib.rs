//! Host side driver for the JBD micro-LED control board.
//!
//! Commands are 12-byte headers (opcode, params, zero padding, `JBD`),
//! optionally followed by a checksummed data flow. The board answers every
//! command with an echoed header and, for reads, a data flow of its own.

pub mod board;
pub mod error;
pub mod exchange;
pub mod firmware;
pub mod frame;
pub mod gamma;
pub mod init_table;
pub mod mirror;
pub mod port;
pub mod proto;
pub mod register;
pub mod rle;
pub mod sequencer;
pub mod stats;

pub use board::{BoardTiming, ControlBoard};
pub use error::{BoardError, Result};
pub use exchange::{ExchangeConfig, Response};
pub use firmware::{Capability, FirmwareVersion};
pub use port::{PortConfig, Transport};
pub use proto::command::{GammaSetting, MipiRefresh, Panel, RefreshRate, Resolution};
pub use register::{MultiPanelRead, RegisterAddress, RegisterData, RegisterRead};
pub use sequencer::{PanelState, PowerChannel, PowerRails, Sequencer, SequencerConfig};

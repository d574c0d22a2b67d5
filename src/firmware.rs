//! Control board firmware versions and the operations each one supports.

use std::fmt;

/// Known firmware labels in release order; the rank is the position + 1.
pub const CB_FW_VERSIONS: [&str; 9] = [
    "V1.12.06", "V1.13.08", "V1.14.08", "V1.14.15", "V1.14.21", "V1.14.G0", "V1.14.G3",
    "V1.14.G4", "V1.14.G7",
];

pub const UNKNOWN_RANK: i8 = -1;

/// Operations that only newer firmware implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Register writes addressed to a single color (opcodes 0xB0..0xB2).
    PerPanelRegisterWrite,
    /// Built-in gamma on/off with preset selection (opcode 0x5F).
    GammaControl,
}

impl Capability {
    pub const ALL: [Capability; 2] = [Capability::PerPanelRegisterWrite, Capability::GammaControl];

    /// Lowest firmware rank implementing the capability.
    pub fn min_rank(self) -> i8 {
        match self {
            Capability::PerPanelRegisterWrite => 5,
            Capability::GammaControl => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Capability::PerPanelRegisterWrite => "per color register writes",
            Capability::GammaControl => "gamma setting/on/off",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareVersion {
    label: String,
    rank: i8,
}

impl FirmwareVersion {
    pub fn parse(label: &str) -> Self {
        let label = label.trim_matches(|c: char| c == '\0' || c.is_whitespace());
        let rank = CB_FW_VERSIONS
            .iter()
            .position(|v| *v == label)
            .map_or(UNKNOWN_RANK, |i| i as i8 + 1);
        Self {
            label: label.to_string(),
            rank,
        }
    }

    /// Decode the label carried in bytes 1..9 of a firmware query response.
    pub fn from_response(resp: &[u8]) -> Self {
        let end = resp.len().min(9);
        let raw = resp.get(1..end).unwrap_or_default();
        let label: String = String::from_utf8_lossy(raw)
            .chars()
            .filter(|c| *c != char::REPLACEMENT_CHARACTER)
            .collect();
        Self::parse(&label)
    }

    pub fn latest() -> Self {
        Self::parse(CB_FW_VERSIONS[CB_FW_VERSIONS.len() - 1])
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn rank(&self) -> i8 {
        self.rank
    }

    pub fn is_known(&self) -> bool {
        self.rank != UNKNOWN_RANK
    }

    pub fn is_latest(&self) -> bool {
        self.rank == CB_FW_VERSIONS.len() as i8
    }

    pub fn supports(&self, cap: Capability) -> bool {
        self.rank >= cap.min_rank()
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.supports(*c))
            .collect()
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

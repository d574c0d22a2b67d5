//! Register address/data values and multi-panel read responses.

use std::fmt;
use std::str::FromStr;

use crate::error::{BoardError, Result};
use crate::proto::command::Panel;

fn parse_hex_word(s: &str) -> Result<[u8; 4]> {
    let t = s.trim();
    let digits = t
        .strip_prefix("0x")
        .or_else(|| t.strip_prefix("0X"))
        .unwrap_or(t);
    let mut out = [0u8; 4];
    hex::decode_to_slice(digits, &mut out).map_err(|_| BoardError::InvalidHex(s.to_string()))?;
    Ok(out)
}

macro_rules! register_word {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub [u8; 4]);

        impl $name {
            pub fn from_hex(s: &str) -> Result<Self> {
                parse_hex_word(s).map(Self)
            }

            /// `"0x"` followed by eight lowercase hex digits.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }

            pub fn bytes(&self) -> [u8; 4] {
                self.0
            }

            pub fn value(&self) -> u32 {
                u32::from_be_bytes(self.0)
            }
        }

        impl From<[u8; 4]> for $name {
            fn from(b: [u8; 4]) -> Self {
                Self(b)
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                Self(v.to_be_bytes())
            }
        }

        impl TryFrom<&str> for $name {
            type Error = BoardError;
            fn try_from(s: &str) -> Result<Self> {
                Self::from_hex(s)
            }
        }

        impl TryFrom<&String> for $name {
            type Error = BoardError;
            fn try_from(s: &String) -> Result<Self> {
                Self::from_hex(s)
            }
        }

        impl FromStr for $name {
            type Err = BoardError;
            fn from_str(s: &str) -> Result<Self> {
                Self::from_hex(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }
    };
}

register_word!(
    /// 4-byte big-endian register address.
    RegisterAddress
);
register_word!(
    /// 4-byte big-endian register data word.
    RegisterData
);

/// Board-to-board connector a panel is wired through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum B2b {
    Red,
    Green,
    Blue,
}

/// I2C address a panel answers on behind a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cSlot {
    /// 0x58
    Default,
    /// 0x59
    Red,
    /// 0x5A
    Green,
    /// 0x5B
    Blue,
}

impl I2cSlot {
    pub fn address(self) -> u8 {
        match self {
            I2cSlot::Default => 0x58,
            I2cSlot::Red => 0x59,
            I2cSlot::Green => 0x5A,
            I2cSlot::Blue => 0x5B,
        }
    }

    /// Slot selected by the 2-bit I2C address strap in eFuse.
    pub fn from_strap(bits: u8) -> Self {
        SLOT_ORDER[(bits & 0x03) as usize]
    }

    /// Slot a correctly strapped panel of `color` uses.
    pub fn for_color(color: Panel) -> Option<Self> {
        match color {
            Panel::Red => Some(I2cSlot::Red),
            Panel::Green => Some(I2cSlot::Green),
            Panel::Blue => Some(I2cSlot::Blue),
            Panel::All => None,
        }
    }
}

pub const READ_FIELD_COUNT: usize = 12;
const READ_GROUP_LEN: usize = 5;
const B2B_ORDER: [B2b; 3] = [B2b::Red, B2b::Green, B2b::Blue];
const SLOT_ORDER: [I2cSlot; 4] = [I2cSlot::Default, I2cSlot::Red, I2cSlot::Green, I2cSlot::Blue];

/// Connectors tried in order when resolving a color, first hit wins.
///
/// Assumes the projector wiring where red and blue panels reach the board
/// through the green flex. Other topologies need [`MultiPanelRead`] directly.
pub const CONNECTOR_PRIORITY: [B2b; 3] = [B2b::Green, B2b::Red, B2b::Blue];

/// One of the 12 (connector, slot) fields a read response may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadField {
    pub connector: B2b,
    pub slot: I2cSlot,
}

impl ReadField {
    pub fn from_tag(tag: u8) -> Option<Self> {
        let tag = tag as usize;
        if tag >= READ_FIELD_COUNT {
            return None;
        }
        Some(Self {
            connector: B2B_ORDER[tag / SLOT_ORDER.len()],
            slot: SLOT_ORDER[tag % SLOT_ORDER.len()],
        })
    }

    pub fn tag(self) -> u8 {
        let c = B2B_ORDER.iter().position(|b| *b == self.connector).unwrap_or(0);
        let s = SLOT_ORDER.iter().position(|x| *x == self.slot).unwrap_or(0);
        (c * SLOT_ORDER.len() + s) as u8
    }

    pub fn name(self) -> String {
        let c = match self.connector {
            B2b::Red => 'r',
            B2b::Green => 'g',
            B2b::Blue => 'b',
        };
        match self.slot {
            I2cSlot::Default => format!("{}_b2b_default", c),
            I2cSlot::Red => format!("{}_b2b_r_0x59", c),
            I2cSlot::Green => format!("{}_b2b_g_0x5A", c),
            I2cSlot::Blue => format!("{}_b2b_b_0x5B", c),
        }
    }

    pub fn all() -> impl Iterator<Item = ReadField> {
        (0..READ_FIELD_COUNT as u8).filter_map(ReadField::from_tag)
    }
}

/// Register read response keyed by field tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MultiPanelRead {
    values: [Option<RegisterData>; READ_FIELD_COUNT],
}

impl MultiPanelRead {
    /// Walk a read data flow in 5-byte groups: tag, then 4 data bytes.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut read = Self::default();
        let mut groups = payload.chunks_exact(READ_GROUP_LEN);
        for group in &mut groups {
            let tag = group[0];
            if ReadField::from_tag(tag).is_none() {
                return Err(BoardError::UnknownReadTag(tag));
            }
            let mut word = [0u8; 4];
            word.copy_from_slice(&group[1..]);
            read.values[tag as usize] = Some(RegisterData(word));
        }
        let rest = groups.remainder();
        if !rest.is_empty() {
            return Err(BoardError::TruncatedRead(rest.len()));
        }
        Ok(read)
    }

    pub fn get(&self, field: ReadField) -> Option<RegisterData> {
        self.values[field.tag() as usize]
    }

    pub fn populated(&self) -> impl Iterator<Item = (ReadField, RegisterData)> + '_ {
        ReadField::all().filter_map(|f| self.get(f).map(|v| (f, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Best value for one color, trying [`CONNECTOR_PRIORITY`] in order.
    pub fn resolve(&self, color: Panel) -> Option<RegisterData> {
        let slot = I2cSlot::for_color(color)?;
        CONNECTOR_PRIORITY
            .iter()
            .find_map(|&connector| self.get(ReadField { connector, slot }))
    }
}

fn fmt_opt(v: Option<RegisterData>) -> String {
    v.map_or_else(|| "None".to_string(), |d| d.to_hex())
}

impl fmt::Display for MultiPanelRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = ReadField::all()
            .map(|field| format!("{} = {}", field.name(), fmt_opt(self.get(field))))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Resolved answer to a register read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterRead {
    Single(Option<RegisterData>),
    All {
        red: Option<RegisterData>,
        green: Option<RegisterData>,
        blue: Option<RegisterData>,
    },
}

impl RegisterRead {
    pub fn resolve(panel: Panel, read: &MultiPanelRead) -> Self {
        match panel {
            Panel::All => RegisterRead::All {
                red: read.resolve(Panel::Red),
                green: read.resolve(Panel::Green),
                blue: read.resolve(Panel::Blue),
            },
            color => RegisterRead::Single(read.resolve(color)),
        }
    }

    /// Value for one color; `Single` answers for whichever color was asked.
    pub fn value(&self, color: Panel) -> Option<RegisterData> {
        match (self, color) {
            (RegisterRead::Single(v), _) => *v,
            (RegisterRead::All { red, .. }, Panel::Red) => *red,
            (RegisterRead::All { green, .. }, Panel::Green) => *green,
            (RegisterRead::All { blue, .. }, Panel::Blue) => *blue,
            (RegisterRead::All { .. }, Panel::All) => None,
        }
    }

    /// Keep only the bits of each value covered by `mask`.
    pub fn masked(&self, mask: u32) -> Self {
        let m = |v: &Option<RegisterData>| v.map(|d| RegisterData::from(d.value() & mask));
        match self {
            RegisterRead::Single(v) => RegisterRead::Single(m(v)),
            RegisterRead::All { red, green, blue } => RegisterRead::All {
                red: m(red),
                green: m(green),
                blue: m(blue),
            },
        }
    }
}

impl fmt::Display for RegisterRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterRead::Single(v) => f.write_str(&fmt_opt(*v)),
            RegisterRead::All { red, green, blue } => write!(
                f,
                "red = {}, green = {}, blue = {}",
                fmt_opt(*red),
                fmt_opt(*green),
                fmt_opt(*blue)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn group(tag: u8, v: u32) -> Vec<u8> {
        let mut g = vec![tag];
        g.extend_from_slice(&v.to_be_bytes());
        g
    }

    #[test]
    fn hex_forms_agree() {
        let a = RegisterAddress::from_hex("0x0302AE90").unwrap();
        assert_eq!(a.bytes(), [0x03, 0x02, 0xAE, 0x90]);
        assert_eq!(a, RegisterAddress::from([0x03, 0x02, 0xAE, 0x90]));
        assert_eq!(a, RegisterAddress::from(0x0302_AE90));
        assert_eq!(a.to_hex(), "0x0302ae90");
        assert_eq!("2002003f".parse::<RegisterData>().unwrap().value(), 0x2002_003F);
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(matches!(RegisterData::from_hex("0x123"), Err(BoardError::InvalidHex(_))));
        assert!(matches!(RegisterData::from_hex("0x0000000G"), Err(BoardError::InvalidHex(_))));
        assert!(RegisterAddress::from_hex("0x000000001").is_err());
    }

    #[test]
    fn field_tags_follow_connector_then_slot() {
        let f = ReadField::from_tag(6).unwrap();
        assert_eq!(f.connector, B2b::Green);
        assert_eq!(f.slot, I2cSlot::Green);
        assert_eq!(f.name(), "g_b2b_g_0x5A");
        assert_eq!(f.tag(), 6);
        assert!(ReadField::from_tag(12).is_none());
        assert_eq!(ReadField::all().count(), 12);
    }

    #[test]
    fn green_connector_wins() {
        // red slot populated on the red and green connectors
        let mut payload = group(1, 0x1111_1111);
        payload.extend(group(5, 0x5555_5555));
        // blue slot only on the blue connector
        payload.extend(group(11, 0xBBBB_BBBB));
        let read = MultiPanelRead::parse(&payload).unwrap();

        assert_eq!(read.resolve(Panel::Red), Some(RegisterData::from(0x5555_5555)));
        assert_eq!(read.resolve(Panel::Green), None);
        assert_eq!(read.resolve(Panel::Blue), Some(RegisterData::from(0xBBBB_BBBB)));
        assert_eq!(read.resolve(Panel::All), None);
    }

    #[test]
    fn red_connector_beats_blue() {
        let mut payload = group(10, 0x0000_00AA);
        payload.extend(group(2, 0x0000_00BB));
        let read = MultiPanelRead::parse(&payload).unwrap();
        assert_eq!(read.resolve(Panel::Green), Some(RegisterData::from(0xBB)));
    }

    #[test]
    fn composite_display() {
        let mut payload = group(5, 0x0000_1FFF);
        payload.extend(group(6, 0x0000_0800));
        let read = MultiPanelRead::parse(&payload).unwrap();
        let all = RegisterRead::resolve(Panel::All, &read);
        assert_eq!(
            all.to_string(),
            "red = 0x00001fff, green = 0x00000800, blue = None"
        );
        assert_eq!(RegisterRead::resolve(Panel::Green, &read).to_string(), "0x00000800");
        assert_eq!(all.value(Panel::Green), Some(RegisterData::from(0x800)));
    }

    #[test]
    fn mask_applies_to_every_color() {
        let read = RegisterRead::All {
            red: Some(RegisterData::from(0x0001_005A)),
            green: None,
            blue: Some(RegisterData::from(0xFFFF_FFFF)),
        };
        assert_eq!(
            read.masked(0xFF).to_string(),
            "red = 0x0000005a, green = None, blue = 0x000000ff"
        );
        assert_eq!(I2cSlot::from_strap(2).address(), 0x5A);
    }

    #[test]
    fn debug_view_lists_every_field() {
        let read = MultiPanelRead::parse(&group(0, 0xDEAD_BEEF)).unwrap();
        let text = read.to_string();
        assert!(text.starts_with("r_b2b_default = 0xdeadbeef, r_b2b_r_0x59 = None"));
        assert!(text.ends_with("b_b2b_b_0x5B = None"));
        assert_eq!(read.populated().count(), 1);
    }

    #[test]
    fn unknown_tag_and_truncation_are_protocol_errors() {
        assert!(matches!(
            MultiPanelRead::parse(&group(12, 0)),
            Err(BoardError::UnknownReadTag(12))
        ));
        let mut payload = group(0, 1);
        payload.extend_from_slice(&[4, 0, 0]);
        assert!(matches!(
            MultiPanelRead::parse(&payload),
            Err(BoardError::TruncatedRead(3))
        ));
        assert!(MultiPanelRead::parse(&[]).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn hex_roundtrip(b in any::<[u8; 4]>()) {
            let a = RegisterAddress(b);
            prop_assert_eq!(RegisterAddress::from_hex(&a.to_hex()).unwrap(), a);
            let d = RegisterData(b);
            prop_assert_eq!(d.to_hex().parse::<RegisterData>().unwrap(), d);
        }
    }
}

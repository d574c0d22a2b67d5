//! Mirror (flip) and X/Y offset configuration held in the SRAM and VO
//! registers. Both copies must agree for the panel to display correctly.

use log::warn;

use crate::register::RegisterAddress;

pub const SRAM_MIRROR_FLIP: RegisterAddress = RegisterAddress([0x03, 0x03, 0x00, 0x04]);
pub const SRAM_OFFSET: RegisterAddress = RegisterAddress([0x03, 0x03, 0x00, 0x08]);
pub const VO_CONFIG: RegisterAddress = RegisterAddress([0x03, 0x00, 0x01, 0x5C]);

/// Largest offset in pixels the SRAM offset field accepts.
pub const MAX_OFFSET: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MirrorOffset {
    pub lr_mirror: bool,
    pub ud_mirror: bool,
    pub offset_en: bool,
    pub x: u32,
    pub y: u32,
}

/// Raw register words plus both decoded views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorOffsetConfig {
    pub sram_mirror_flip: u32,
    pub sram_offset: u32,
    pub vo: u32,
    pub sram: MirrorOffset,
    pub vo_view: MirrorOffset,
}

impl MirrorOffsetConfig {
    pub fn decode(sram_mirror_flip: u32, sram_offset: u32, vo: u32) -> Self {
        let sram = MirrorOffset {
            lr_mirror: sram_mirror_flip & 0x1 != 0,
            ud_mirror: sram_mirror_flip & 0x2 != 0,
            offset_en: sram_offset & 0x1 != 0,
            x: (sram_offset & 0x1F0) >> 4,
            y: (sram_offset & 0x1_F000) >> 12,
        };
        let vo_view = MirrorOffset {
            ud_mirror: vo & 0x8000_0000 != 0,
            lr_mirror: vo & 0x4000_0000 != 0,
            offset_en: vo & 0x2000_0000 != 0,
            y: (vo & 0x0FFF_0000) >> 16,
            x: vo & 0x0000_0FFF,
        };
        Self {
            sram_mirror_flip,
            sram_offset,
            vo,
            sram,
            vo_view,
        }
    }

    /// Human readable list of fields where SRAM and VO disagree.
    pub fn mismatches(&self) -> Vec<String> {
        let (s, v) = (&self.sram, &self.vo_view);
        let mut out = Vec::new();
        let mut check = |name: &str, a: String, b: String| {
            if a != b {
                out.push(format!("SRAM {name} = {a} & VO {name} = {b} do not match"));
            }
        };
        check("offset enable", s.offset_en.to_string(), v.offset_en.to_string());
        check("LR mirror enable", s.lr_mirror.to_string(), v.lr_mirror.to_string());
        check("UD mirror enable", s.ud_mirror.to_string(), v.ud_mirror.to_string());
        check("offset x", s.x.to_string(), v.x.to_string());
        check("offset y", s.y.to_string(), v.y.to_string());
        out
    }

    pub fn warn_mismatches(&self) {
        for m in self.mismatches() {
            warn!("{}", m);
        }
    }
}

/// Requested changes; `None` keeps the value currently in the SRAM view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MirrorOffsetUpdate {
    pub x_offset: Option<i32>,
    pub y_offset: Option<i32>,
    pub lr_mirror: Option<bool>,
    pub ud_mirror: Option<bool>,
}

/// Register words to write: (SRAM mirror/flip, SRAM offset, VO).
pub fn encode(update: &MirrorOffsetUpdate, current: &MirrorOffset) -> (u32, u32, u32) {
    let clamp = |v: Option<i32>, old: u32| match v {
        Some(v) => v.clamp(0, MAX_OFFSET as i32) as u32,
        None => old.min(MAX_OFFSET),
    };
    let x = clamp(update.x_offset, current.x);
    let y = clamp(update.y_offset, current.y);
    let lr = update.lr_mirror.unwrap_or(current.lr_mirror) as u32;
    let ud = update.ud_mirror.unwrap_or(current.ud_mirror) as u32;
    let en = (x > 0 || y > 0) as u32;

    let mirror_flip = (ud << 1) | lr;
    let sram_offset = (y << 12) | (x << 4) | en;
    let vo = (ud << 31) | (lr << 30) | (en << 29) | (y << 16) | x;
    (mirror_flip, sram_offset, vo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_green_defaults() {
        // pass-through init values for the green panel
        let cfg = MirrorOffsetConfig::decode(0x1, 0x8081, 0x6008_0008);
        assert_eq!(
            cfg.sram,
            MirrorOffset {
                lr_mirror: true,
                ud_mirror: false,
                offset_en: true,
                x: 8,
                y: 8
            }
        );
        assert_eq!(cfg.vo_view, cfg.sram);
        assert!(cfg.mismatches().is_empty());
    }

    #[test]
    fn flags_disagreement() {
        // VO x one pixel off
        let cfg = MirrorOffsetConfig::decode(0x0, 0x8081, 0x2008_0009);
        let m = cfg.mismatches();
        assert_eq!(m, vec!["SRAM offset x = 8 & VO offset x = 9 do not match"]);
    }

    #[test]
    fn encode_clamps_and_derives_enable() {
        let current = MirrorOffset::default();
        let up = MirrorOffsetUpdate {
            x_offset: Some(30),
            y_offset: Some(-4),
            lr_mirror: Some(true),
            ud_mirror: None,
        };
        let (mf, so, vo) = encode(&up, &current);
        assert_eq!(mf, 0x1);
        assert_eq!(so, (24 << 4) | 1);
        assert_eq!(vo, 0x4000_0000 | 0x2000_0000 | 24);
    }

    #[test]
    fn zero_offsets_disable() {
        let current = MirrorOffset {
            lr_mirror: false,
            ud_mirror: true,
            offset_en: true,
            x: 3,
            y: 0,
        };
        let up = MirrorOffsetUpdate {
            x_offset: Some(0),
            ..Default::default()
        };
        assert_eq!(encode(&up, &current), (0x2, 0x0, 0x8000_0000));
    }
}

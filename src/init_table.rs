//! Pass-through panel initialization: the known-good init code written as
//! individual register writes instead of the firmware's built-in 0x86.
//!
//! Assumes no flash is fitted, so LTC and the flash transfer interrupt stay
//! off.

use crate::proto::command::Panel;

/// Pause lengths used between init steps; resolved through the board timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// 20 ms after enabling the display port.
    Short,
    /// 1 s after clearing MIPI interrupts.
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    /// Write to whatever panel selection is being initialized.
    Write { address: u32, data: u32 },
    /// Write to `color` only, and only when the selection covers it.
    Color { color: Panel, address: u32, data: u32 },
    /// Write to `color` whatever the selection is.
    AlwaysColor { color: Panel, address: u32, data: u32 },
    Pause(Settle),
}

const fn w(address: u32, data: u32) -> InitStep {
    InitStep::Write { address, data }
}

const fn c(color: Panel, address: u32, data: u32) -> InitStep {
    InitStep::Color {
        color,
        address,
        data,
    }
}

const fn a(color: Panel, address: u32, data: u32) -> InitStep {
    InitStep::AlwaysColor {
        color,
        address,
        data,
    }
}

/// MIPI video config register; b9 selects video/cmd mode, b14..15 the color.
pub const MIPI_VIDEO_CONFIG: u32 = 0x0304_0000;

pub const PASS_THRU_INIT: &[InitStep] = &[
    // SRAM: PWM clock off
    w(0x0303_0300, 0x0000_0010),
    w(0x0303_0144, 0x4000_0000),
    // mute at max resolution, background gray 0
    w(0x0300_01C8, 0x0029_F1FF),
    w(0x0300_01B8, 0x0000_0000),
    w(0x0300_01C4, 0x0000_0001),
    w(0x0300_0180, 0x2003_D01B),
    // display port enable
    w(0x0303_0100, 0x8000_0011),
    w(0x0304_0008, 0x0000_0001),
    InitStep::Pause(Settle::Short),
    // XDP reset, then release
    w(0x0100_003C, 0x2002_1F3F),
    w(0x0100_003C, 0x2002_003F),
    // clear MIPI interrupts and error counts
    w(0x0200_6720, 0xFFFF_FFFF),
    w(0x0200_6724, 0xFFFF_FFFF),
    w(0x0200_6728, 0xFFFF_FFFF),
    w(0x0200_6740, 0xFFFF_FFFF),
    InitStep::Pause(Settle::Long),
    // MIPI PCS
    w(0x0200_7228, 0x000C_33FF),
    w(0x0200_72C0, 0x0000_0001),
    w(0x0200_72C0, 0x0000_0000),
    // MIPI CTRL
    w(0x0200_600C, 0x0000_0001),
    w(0x0200_60A8, 0x0000_2263),
    w(0x0200_6014, 0x0000_0200),
    w(0x0200_6200, 0x0000_0001),
    // video mode
    w(0x0200_6230, 0x0000_0000),
    w(0x0200_6700, 0x001F_FFFF),
    w(0x0200_6704, 0x003F_FFFF),
    w(0x0200_6708, 0x0018_1BFF),
    w(0x0200_6160, 0x0001_FFFF),
    // MIPI detection
    w(0x0200_6788, 0x0200_001F),
    w(0x0200_6000, 0x0002_0002),
    w(0x0100_0090, 0x0060_0F86),
    w(0x0200_6000, 0x0000_0002),
    c(Panel::Red, MIPI_VIDEO_CONFIG, 0x0000_0103),
    c(Panel::Green, MIPI_VIDEO_CONFIG, 0x0000_4103),
    c(Panel::Blue, MIPI_VIDEO_CONFIG, 0x0000_8103),
    // 640x480
    w(0x0300_00D0, 0x01DF_027F),
    w(0x0300_0080, 0x0000_0100),
    w(0x0303_0300, 0x0000_0000),
    w(0x0304_1004, 0x0000_0001),
    // 54 MHz (60 Hz)
    w(0x0100_003C, 0x2244_003F),
    w(0x0302_AE90, 0x0001_005A),
    w(0x0303_0100, 0x8000_0011),
    // random scan off
    w(0x0303_031C, 0x0000_0000),
    w(0x0303_0320, 0x0000_0000),
    w(0x0303_0324, 0x0000_0000),
    w(0x0303_0328, 0x0000_0000),
    w(0x0303_032C, 0x0000_0000),
    w(0x0303_0100, 0x8000_0011),
    // CRG: DLL output clock
    w(0x0100_00AC, 0x0008_0005),
    w(0x0100_00AC, 0x0008_0001),
    w(0x0100_00E4, 0x0008_0005),
    w(0x0100_00E4, 0x0008_0001),
    w(0x0100_00EC, 0x0008_0005),
    w(0x0100_00EC, 0x0008_0001),
    w(0x0100_00AC, 0x0008_0003),
    w(0x0100_00E4, 0x0008_0003),
    w(0x0100_00EC, 0x0008_0003),
    w(0x0100_0002, 0x0000_0000),
    w(0x0100_002C, 0x0000_0000),
    // core: VDD, MVDD, OSCVDD selection
    w(0x0200_0040, 0x0020_C208),
    w(0x0200_0044, 0x0000_448A),
    w(0x0200_0048, 0x0000_2088),
    // DCS/MCS unlock
    w(0x0200_1020, 0x5A5A_5A5A),
    // LTC off
    w(0x0302_AE68, 0x0000_0000),
    // PMC defaults, then temperature window
    w(0x0200_3004, 0x0003_635B),
    w(0x0200_3004, 0x05B1_DBA5),
    w(0x0200_0004, 0x0000_0202),
    // interrupt bits 12 and 16 can only be configured once
    a(Panel::Red, MIPI_VIDEO_CONFIG, 0x0001_1103),
    a(Panel::Green, MIPI_VIDEO_CONFIG, 0x0001_5103),
    a(Panel::Blue, MIPI_VIDEO_CONFIG, 0x0001_9103),
    // ESD
    w(0x0200_0004, 0x0000_0200),
    // error flag IO mux
    w(0x0100_1038, 0x0000_0001),
    // flip/mirror/offset defaults
    c(Panel::Red, 0x0303_0004, 0x0000_0000),
    c(Panel::Red, 0x0303_0008, 0x0000_8081),
    c(Panel::Red, 0x0300_015C, 0x2008_0008),
    c(Panel::Green, 0x0303_0004, 0x0000_0001),
    c(Panel::Green, 0x0303_0008, 0x0000_8081),
    c(Panel::Green, 0x0300_015C, 0x6008_0008),
    c(Panel::Blue, 0x0303_0004, 0x0000_0000),
    c(Panel::Blue, 0x0303_0008, 0x0000_8081),
    c(Panel::Blue, 0x0300_015C, 0x2008_0008),
];

/// A resolved register write: (target panel, address, data).
pub type InitWrite = (Panel, u32, u32);

impl InitStep {
    /// Where this step writes when initializing `selection`; `None` for
    /// pauses and for color steps the selection does not cover.
    pub fn resolve(&self, selection: Panel) -> Option<InitWrite> {
        match *self {
            InitStep::Write { address, data } => Some((selection, address, data)),
            InitStep::Color {
                color,
                address,
                data,
            } => selection.covers(color).then_some((color, address, data)),
            InitStep::AlwaysColor {
                color,
                address,
                data,
            } => Some((color, address, data)),
            InitStep::Pause(_) => None,
        }
    }
}

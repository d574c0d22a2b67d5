use std::fmt;

/// Command opcodes understood by the 4020 control board.
///
/// This is the board's whole command table. `DisplayColorImage`,
/// `ImageOffset` and the eFuse/die id writes are listed for completeness;
/// the driver uses register access or the RLE path instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMsg {
    // ---- Board / panel lifecycle ----
    InitializePanel,
    GetFirmware,
    SystemReset,
    ControlPanelReset,
    DisplayEnable,
    I2cInterfaceEnable,
    ReadTempSensor,

    // ---- Display ----
    DisplayMonoImage,
    DisplayColorImage,
    WriteColorImageRle,
    SetHdmi,
    DrawRectangle,
    ClearDisplay,
    WriteCreg,
    WriteLreg,

    // ---- Orientation / pipeline ----
    ImageOffset,
    SetHMirror,
    SetVMirror,
    LoadGammaData,
    GammaOnOff,
    SetDisplayResolution,
    DitherEnable,
    RandomScanControl,

    // ---- Low level ----
    WriteRegisterAll,
    WriteRegisterRed,
    WriteRegisterGreen,
    WriteRegisterBlue,
    ReadRegister,
    WriteEfuse,
    ReadEfuse,
    WriteDieId,
    ReadDieId,
}

impl ControlMsg {
    /// Opcode bytes as they lead the 12-byte header.
    pub fn opcode(self) -> &'static [u8] {
        use ControlMsg::*;
        match self {
            InitializePanel => &[0x86],
            GetFirmware => &[0xC0],
            SystemReset => &[0x84],
            ControlPanelReset => &[0x55],
            DisplayEnable => &[0x68],
            I2cInterfaceEnable => &[0x51],
            ReadTempSensor => &[0x3F],
            DisplayMonoImage => &[0x34],
            DisplayColorImage => &[0x35],
            WriteColorImageRle => &[0xC2, 0x01],
            SetHdmi => &[0xC4],
            DrawRectangle => &[0x80],
            ClearDisplay => &[0x81],
            WriteCreg => &[0x24],
            WriteLreg => &[0x23],
            ImageOffset => &[0x5B],
            SetHMirror => &[0x58],
            SetVMirror => &[0x59],
            LoadGammaData => &[0x65],
            GammaOnOff => &[0x5F],
            SetDisplayResolution => &[0x67],
            DitherEnable => &[0x69],
            RandomScanControl => &[0x6A],
            WriteRegisterAll => &[0x01],
            WriteRegisterRed => &[0xB0],
            WriteRegisterGreen => &[0xB1],
            WriteRegisterBlue => &[0xB2],
            ReadRegister => &[0x03],
            WriteEfuse => &[0x04],
            ReadEfuse => &[0x05],
            WriteDieId => &[0x06],
            ReadDieId => &[0x07],
        }
    }

    /// Short name used in log lines and timeout errors.
    pub fn name(self) -> &'static str {
        use ControlMsg::*;
        match self {
            InitializePanel => "initialize_panel",
            GetFirmware => "get_firmware",
            SystemReset => "system_reset",
            ControlPanelReset => "control_panel_reset",
            DisplayEnable => "display_enable",
            I2cInterfaceEnable => "i2c_interface_enable",
            ReadTempSensor => "read_temp_sensor",
            DisplayMonoImage => "display_mono_image",
            DisplayColorImage => "display_color_image",
            WriteColorImageRle => "write_color_image_rle",
            SetHdmi => "set_hdmi",
            DrawRectangle => "draw_rectangle",
            ClearDisplay => "clear_display",
            WriteCreg => "write_creg",
            WriteLreg => "write_lreg",
            ImageOffset => "image_offset",
            SetHMirror => "set_h_mirror",
            SetVMirror => "set_v_mirror",
            LoadGammaData => "load_gamma_data",
            GammaOnOff => "gamma_on_off",
            SetDisplayResolution => "set_display_resolution",
            DitherEnable => "dither_enable",
            RandomScanControl => "random_scan_control",
            WriteRegisterAll => "write_register_all",
            WriteRegisterRed => "write_register_red",
            WriteRegisterGreen => "write_register_green",
            WriteRegisterBlue => "write_register_blue",
            ReadRegister => "read_register",
            WriteEfuse => "write_efuse",
            ReadEfuse => "read_efuse",
            WriteDieId => "write_die_id",
            ReadDieId => "read_die_id",
        }
    }
}

/// Panel selection byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    All,
    Red,
    Green,
    Blue,
}

impl Panel {
    pub const COLORS: [Panel; 3] = [Panel::Red, Panel::Green, Panel::Blue];

    pub fn selector(self) -> u8 {
        match self {
            Panel::All => 0x07,
            Panel::Red => 0x01,
            Panel::Green => 0x02,
            Panel::Blue => 0x04,
        }
    }

    /// Register write opcode addressing this selection.
    pub fn write_register_msg(self) -> ControlMsg {
        match self {
            Panel::All => ControlMsg::WriteRegisterAll,
            Panel::Red => ControlMsg::WriteRegisterRed,
            Panel::Green => ControlMsg::WriteRegisterGreen,
            Panel::Blue => ControlMsg::WriteRegisterBlue,
        }
    }

    /// True when a write to `self` should also touch `color`.
    pub fn covers(self, color: Panel) -> bool {
        self == Panel::All || self == color
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Panel::All => "all",
            Panel::Red => "red",
            Panel::Green => "green",
            Panel::Blue => "blue",
        })
    }
}

/// Built-in greyscale / DBV gamma presets for [`ControlMsg::GammaOnOff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GammaSetting {
    Gs22Lreg10,
    Gs10Lreg10,
    Gs22Lreg22,
    DefaultFlash,
}

impl GammaSetting {
    pub fn byte(self) -> u8 {
        match self {
            GammaSetting::Gs22Lreg10 => 0x00,
            GammaSetting::Gs10Lreg10 => 0x01,
            GammaSetting::Gs22Lreg22 => 0x02,
            GammaSetting::DefaultFlash => 0x03,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Res640x480,
    Res660x504,
}

impl Resolution {
    pub fn index(self) -> u8 {
        match self {
            Resolution::Res640x480 => 0x00,
            Resolution::Res660x504 => 0x01,
        }
    }

    /// (width, height) in pixels.
    pub fn size(self) -> (u32, u32) {
        match self {
            Resolution::Res640x480 => (640, 480),
            Resolution::Res660x504 => (660, 504),
        }
    }
}

/// TCON refresh configuration words for register 0x0100003C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshRate {
    Hz30,
    Hz37_5,
    Hz50,
    Hz60,
    Hz75,
}

impl RefreshRate {
    pub fn register_word(self) -> [u8; 4] {
        match self {
            RefreshRate::Hz30 => [0x20, 0x49, 0x00, 0x3F],
            RefreshRate::Hz37_5 => [0x20, 0x47, 0x00, 0x3F],
            RefreshRate::Hz50 => [0x20, 0x45, 0x00, 0x3F],
            RefreshRate::Hz60 => [0x20, 0x44, 0x00, 0x3F],
            RefreshRate::Hz75 => [0x22, 0x43, 0x00, 0x3F],
        }
    }
}

/// MIPI receiver configuration words for register 0x01000090.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MipiRefresh {
    Hz75,
    /// Vendor's alternate word, kept for reference. The board is always
    /// configured with `Hz75`.
    Other,
}

impl MipiRefresh {
    pub fn register_word(self) -> [u8; 4] {
        match self {
            MipiRefresh::Hz75 => [0x00, 60, 0x0F, 0x86],
            MipiRefresh::Other => [0x00, 0x60, 0x0F, 80],
        }
    }
}

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use uled_ctrl::{GammaSetting, Panel, PortConfig, RefreshRate, Resolution};

#[derive(Parser, Debug, Clone)]
#[command(name = "uled-ctrl", about = "JBD micro-LED control board utility")]
pub struct Cli {
    /// Debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// Firmware version and supported features
    Info(BasicOpts),
    /// Soft reset of board and panels
    Reset(BasicOpts),
    /// Pulse the panel reset pin and wait for the board
    PanelReset(BasicOpts),
    /// Initialize the panels
    Init(InitOpts),
    /// Write a register
    SetReg(SetRegOpts),
    /// Read a register, or a list of them
    GetReg(GetRegOpts),
    /// Set or read the luminance register
    Luminance(LevelOpts),
    /// Set or read the current register
    Current(LevelOpts),
    /// Panel temperature in degrees C
    Temperature(PanelOpts),
    /// Display an image file
    Image(ImageOpts),
    /// Gamma tables and gamma mode
    Gamma(GammaOpts),
    /// TCON (and optionally MIPI) refresh rate
    RefreshRate(RefreshOpts),
    /// Mirror and offset through direct register access
    Mirror(MirrorOpts),
    /// Die id, IC version and I2C strap from eFuse
    DieId(PanelOpts),
}

impl Cmd {
    pub fn serial(&self) -> &SerialOpts {
        match self {
            Cmd::Info(o) | Cmd::Reset(o) | Cmd::PanelReset(o) => &o.ser,
            Cmd::Init(o) => &o.ser,
            Cmd::SetReg(o) => &o.ser,
            Cmd::GetReg(o) => &o.ser,
            Cmd::Luminance(o) | Cmd::Current(o) => &o.ser,
            Cmd::Temperature(o) | Cmd::DieId(o) => &o.ser,
            Cmd::Image(o) => &o.ser,
            Cmd::Gamma(o) => &o.ser,
            Cmd::RefreshRate(o) => &o.ser,
            Cmd::Mirror(o) => &o.ser,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SerialOpts {
    /// Serial device path (default: first CP210x port)
    #[arg(long)]
    pub dev: Option<String>,
    /// Baud rate
    #[arg(long, default_value_t = 921_600)]
    pub baud: u32,
    /// Wait for the first response byte, ms
    #[arg(long, default_value_t = 5000)]
    pub read_timeout: u64,
    /// Write timeout, ms
    #[arg(long, default_value_t = 15_000)]
    pub write_timeout: u64,
    /// Inter-byte timeout, ms
    #[arg(long, default_value_t = 3000)]
    pub inter_byte_timeout: u64,
    /// Name used in log lines
    #[arg(long, default_value = "ctrl-brd")]
    pub alias: String,
}

impl SerialOpts {
    pub fn port_config(&self) -> PortConfig {
        PortConfig {
            dev: self.dev.clone(),
            baud: self.baud,
            write_timeout: Duration::from_millis(self.write_timeout),
            inter_byte_timeout: Duration::from_millis(self.inter_byte_timeout),
            read_timeout: Duration::from_millis(self.read_timeout),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct BasicOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
}

#[derive(Args, Debug, Clone)]
pub struct PanelOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
    /// red, green or blue
    #[arg(long)]
    pub panel: Panel,
}

#[derive(Args, Debug, Clone)]
pub struct InitOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
    /// Write the init code register by register
    #[arg(long, default_value_t = false)]
    pub pass_thru: bool,
    /// 640x480 or 660x504
    #[arg(long)]
    pub resolution: Option<Resolution>,
    #[arg(long, default_value = "all")]
    pub panel: Panel,
    /// Gamma table CSV to load after init
    #[arg(long)]
    pub gamma: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SetRegOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
    /// Register address, hex
    pub address: String,
    /// Register data, hex
    pub data: String,
    #[arg(long, default_value = "all")]
    pub panel: Panel,
    /// On old firmware, write all panels instead of failing
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct GetRegOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
    /// Register address, hex
    #[arg(required_unless_present = "list")]
    pub address: Option<String>,
    #[arg(long, default_value = "all")]
    pub panel: Panel,
    /// Show every connector/slot field of the answer
    #[arg(long, default_value_t = false)]
    pub debug: bool,
    /// CSV of addresses to read (single panel)
    #[arg(long, requires = "out")]
    pub list: Option<PathBuf>,
    /// Where to write the values read from --list
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct LevelOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
    /// New value; omit to read back
    pub value: Option<i32>,
    #[arg(long, default_value = "all")]
    pub panel: Panel,
}

#[derive(Args, Debug, Clone)]
pub struct ImageOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
    pub path: PathBuf,
    /// Send as one greyscale frame to every color
    #[arg(long, default_value_t = false)]
    pub mono: bool,
    /// Clip pixel values to this maximum
    #[arg(long)]
    pub clip: Option<u8>,
    /// Set the panel resolution first
    #[arg(long)]
    pub resolution: Option<Resolution>,
}

#[derive(Args, Debug, Clone)]
pub struct GammaOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
    /// Gamma table CSV to write, then enable luminance and gamma
    #[arg(long, conflicts_with = "off")]
    pub table: Option<PathBuf>,
    /// Disable luminance and gamma registers
    #[arg(long, default_value_t = false)]
    pub off: bool,
    /// Gamma mode via the firmware: gs2.2-lreg1.0, gs1.0-lreg1.0, gs2.2-lreg2.2, flash
    #[arg(long)]
    pub setting: Option<GammaSetting>,
    /// CSV of gamma LUT addresses to read back (single panel)
    #[arg(long, requires = "out", conflicts_with_all = ["table", "off", "setting"])]
    pub dump: Option<PathBuf>,
    /// Where to write the values read from --dump
    #[arg(long)]
    pub out: Option<PathBuf>,
    #[arg(long, default_value = "all")]
    pub panel: Panel,
}

#[derive(Args, Debug, Clone)]
pub struct RefreshOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
    /// 30, 37.5, 50, 60 or 75
    pub rate: RefreshRate,
    /// Also write the MIPI receiver config
    #[arg(long, default_value_t = false)]
    pub mipi: bool,
    #[arg(long, default_value = "all")]
    pub panel: Panel,
}

#[derive(Args, Debug, Clone)]
pub struct MirrorOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
    #[arg(long)]
    pub panel: Panel,
    /// X offset in pixels (0..=24)
    #[arg(long, allow_hyphen_values = true)]
    pub x: Option<i32>,
    /// Y offset in pixels (0..=24)
    #[arg(long, allow_hyphen_values = true)]
    pub y: Option<i32>,
    /// Left/right mirror
    #[arg(long)]
    pub lr: Option<bool>,
    /// Up/down mirror
    #[arg(long)]
    pub ud: Option<bool>,
}

impl MirrorOpts {
    pub fn is_query(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.lr.is_none() && self.ud.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_defaults_match_port_config() {
        let cli = Cli::parse_from(["uled-ctrl", "info"]);
        let cfg = cli.cmd.serial().port_config();
        let def = PortConfig::default();
        assert_eq!(cfg.baud, def.baud);
        assert_eq!(cfg.read_timeout, def.read_timeout);
        assert_eq!(cfg.write_timeout, def.write_timeout);
        assert_eq!(cfg.inter_byte_timeout, def.inter_byte_timeout);
        assert!(cfg.dev.is_none());
    }

    #[test]
    fn init_flags() {
        let cli = Cli::parse_from([
            "uled-ctrl",
            "init",
            "--pass-thru",
            "--panel",
            "green",
            "--resolution",
            "660x504",
            "--dev",
            "/dev/ttyUSB1",
        ]);
        match cli.cmd {
            Cmd::Init(o) => {
                assert!(o.pass_thru);
                assert_eq!(o.panel, Panel::Green);
                assert_eq!(o.resolution, Some(Resolution::Res660x504));
                assert_eq!(o.ser.dev.as_deref(), Some("/dev/ttyUSB1"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn mirror_query_without_changes() {
        let cli = Cli::parse_from(["uled-ctrl", "mirror", "--panel", "red"]);
        let Cmd::Mirror(o) = cli.cmd else {
            panic!("expected mirror");
        };
        assert!(o.is_query());
        let cli = Cli::parse_from(["uled-ctrl", "mirror", "--panel", "red", "--x", "-3"]);
        let Cmd::Mirror(o) = cli.cmd else {
            panic!("expected mirror");
        };
        assert_eq!(o.x, Some(-3));
    }

    #[test]
    fn get_reg_needs_address_or_list() {
        assert!(Cli::try_parse_from(["uled-ctrl", "get-reg"]).is_err());
        assert!(Cli::try_parse_from(["uled-ctrl", "get-reg", "0x0302AE38"]).is_ok());
        assert!(Cli::try_parse_from(["uled-ctrl", "get-reg", "--list", "a.csv"]).is_err());
        assert!(
            Cli::try_parse_from(["uled-ctrl", "get-reg", "--list", "a.csv", "--out", "b.csv"])
                .is_ok()
        );
    }

    #[test]
    fn gamma_dump_needs_out() {
        assert!(Cli::try_parse_from(["uled-ctrl", "gamma", "--dump", "a.csv"]).is_err());
        let cli = Cli::try_parse_from([
            "uled-ctrl", "gamma", "--dump", "a.csv", "--out", "b.csv", "--panel", "blue",
        ])
        .unwrap();
        let Cmd::Gamma(o) = cli.cmd else {
            panic!("expected gamma");
        };
        assert_eq!(o.dump, Some(PathBuf::from("a.csv")));
        assert_eq!(o.panel, Panel::Blue);
        assert!(
            Cli::try_parse_from(["uled-ctrl", "gamma", "--dump", "a", "--out", "b", "--off"])
                .is_err()
        );
    }
}

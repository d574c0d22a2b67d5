//! Control board API: every operation the board firmware offers, plus the
//! register-level routines built on top of them.

use std::fs::File;
use std::path::Path;
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};
use serialport::SerialPort;

use crate::error::{BoardError, Result};
use crate::exchange::{ExchangeConfig, Link, Response};
use crate::firmware::{Capability, FirmwareVersion};
use crate::frame::{Message, flow_len};
use crate::gamma;
use crate::init_table::{InitStep, PASS_THRU_INIT, Settle};
use crate::mirror::{self, MirrorOffsetConfig, MirrorOffsetUpdate};
use crate::port::{PortConfig, Transport, open_port};
use crate::proto::command::{
    ControlMsg, GammaSetting, MipiRefresh, Panel, RefreshRate, Resolution,
};
use crate::register::{I2cSlot, MultiPanelRead, RegisterAddress, RegisterData, RegisterRead};
use crate::rle;

pub const LUMINANCE_MAX: i32 = 8191;
pub const CURRENT_MAX: i32 = 255;

const LREG: RegisterAddress = RegisterAddress([0x03, 0x02, 0xAE, 0x38]);
const CREG: RegisterAddress = RegisterAddress([0x03, 0x02, 0xAE, 0x90]);
const GAMMA_CTRL: RegisterAddress = RegisterAddress([0x03, 0x02, 0xAE, 0x00]);
const GAMMA_CFG: RegisterAddress = RegisterAddress([0x03, 0x02, 0xAE, 0x04]);
const TCON_CONFIG: RegisterAddress = RegisterAddress([0x01, 0x00, 0x00, 0x3C]);
const MIPI_CONFIG: RegisterAddress = RegisterAddress([0x01, 0x00, 0x00, 0x90]);

const EFUSE_SELECT: RegisterAddress = RegisterAddress([0x02, 0x00, 0x90, 0x0C]);
const EFUSE_ENABLE: RegisterAddress = RegisterAddress([0x02, 0x00, 0x90, 0x08]);
const EFUSE_DATA: RegisterAddress = RegisterAddress([0x02, 0x00, 0x90, 0x14]);
const EFUSE_DIE_ID: std::ops::RangeInclusive<u8> = 115..=127;
const EFUSE_IC_VERSION: std::ops::RangeInclusive<u8> = 0x35..=0x37;
const EFUSE_I2C: u8 = 0x15;
/// Die id positions holding ASCII characters; the rest print as hex.
const DIE_ID_ASCII: [usize; 4] = [0, 3, 5, 11];

const FLASH_READ_SETUP: [(u32, u32); 5] = [
    (0x0200_5020, 0x0000_00FF),
    (0x0200_5024, 0x0000_009F),
    (0x0200_5030, 0x0000_0030),
    (0x0200_5038, 0x0000_0003),
    (0x0200_503C, 0x0000_0085),
];
const FLASH_DATA: RegisterAddress = RegisterAddress([0x04, 0x00, 0x00, 0x00]);

/// AA current source, AA PWM clock, MIPI LDO, OSC LDO off.
const DEEP_POWER_DOWN: [(u32, u32); 4] = [
    (0x0200_0030, 0x0000_0000),
    (0x0303_0300, 0x0000_FF11),
    (0x0200_0044, 0x0004_0000),
    (0x0200_0048, 0x0004_0000),
];

/// Settle delays around board operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardTiming {
    pub system_reset: Duration,
    pub reset_pulse: Duration,
    /// Board reboot time after a control panel reset.
    pub reset_recovery: Duration,
    pub image_transfer: Duration,
    pub efuse_strobe: Duration,
    pub init_short: Duration,
    pub init_long: Duration,
    pub vdd_to_avdd: Duration,
    pub avdd_settle: Duration,
    pub clear_settle: Duration,
    pub avee_delay: Duration,
    pub rail_off_step: Duration,
}

impl Default for BoardTiming {
    fn default() -> Self {
        Self {
            system_reset: Duration::from_secs(4),
            reset_pulse: Duration::from_millis(200),
            reset_recovery: Duration::from_secs(15),
            image_transfer: Duration::from_secs(2),
            efuse_strobe: Duration::from_millis(40),
            init_short: Duration::from_millis(20),
            init_long: Duration::from_secs(1),
            vdd_to_avdd: Duration::from_millis(200),
            avdd_settle: Duration::from_secs(1),
            clear_settle: Duration::from_secs(1),
            avee_delay: Duration::from_millis(500),
            rail_off_step: Duration::from_millis(100),
        }
    }
}

impl BoardTiming {
    /// No settle time at all; for scripted transports.
    pub fn immediate() -> Self {
        Self {
            system_reset: Duration::ZERO,
            reset_pulse: Duration::ZERO,
            reset_recovery: Duration::ZERO,
            image_transfer: Duration::ZERO,
            efuse_strobe: Duration::ZERO,
            init_short: Duration::ZERO,
            init_long: Duration::ZERO,
            vdd_to_avdd: Duration::ZERO,
            avdd_settle: Duration::ZERO,
            clear_settle: Duration::ZERO,
            avee_delay: Duration::ZERO,
            rail_off_step: Duration::ZERO,
        }
    }

    fn settle(&self, s: Settle) -> Duration {
        match s {
            Settle::Short => self.init_short,
            Settle::Long => self.init_long,
        }
    }
}

pub(crate) fn pause(d: Duration) {
    if !d.is_zero() {
        thread::sleep(d);
    }
}

/// Decoded I2C strap from eFuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cEfuse {
    pub enabled: bool,
    pub slot: I2cSlot,
}

impl I2cEfuse {
    pub fn decode(b: u8) -> Self {
        Self {
            enabled: (b & 0x04) >> 2 != 0,
            slot: I2cSlot::from_strap((b & 0x60) >> 5),
        }
    }
}

/// Die id text: ASCII at fixed positions, two hex digits elsewhere.
pub fn format_die_id(raw: &[u8]) -> String {
    raw.iter()
        .enumerate()
        .map(|(i, b)| {
            if DIE_ID_ASCII.contains(&i) {
                char::from(*b).to_string()
            } else {
                format!("{:02X}", b)
            }
        })
        .collect()
}

/// ADC reading to degrees Celsius, rounded to 4 places.
pub fn temperature_from_adc(value: u64) -> f64 {
    let t = value as f64 * 0.2028 - 64.052;
    (t * 10_000.0).round() / 10_000.0
}

/// Column/row corners packed as 12-bit fields across six bytes.
pub fn pack_rectangle(start_col: u16, start_row: u16, end_col: u16, end_row: u16) -> [u8; 6] {
    let pack = |row: u16, col: u16| {
        [
            ((row >> 4) & 0xFF) as u8,
            (((row & 0x0F) << 4) | ((col >> 8) & 0x0F)) as u8,
            (col & 0xFF) as u8,
        ]
    };
    let [a, b, c] = pack(start_row, start_col);
    let [d, e, f] = pack(end_row, end_col);
    [a, b, c, d, e, f]
}

fn require_single(panel: Panel, op: &'static str) -> Result<()> {
    if panel == Panel::All {
        return Err(BoardError::Unsupported { op, panel });
    }
    Ok(())
}

fn require_all(panel: Panel, op: &'static str) -> Result<()> {
    if panel != Panel::All {
        return Err(BoardError::Unsupported { op, panel });
    }
    Ok(())
}

pub struct ControlBoard<T: Transport> {
    link: Link<T>,
    firmware: FirmwareVersion,
    resolution: Option<Resolution>,
    timing: BoardTiming,
}

impl ControlBoard<Box<dyn SerialPort>> {
    /// Open the serial port and connect.
    pub fn open(cfg: &PortConfig, alias: &str, timing: BoardTiming) -> Result<Self> {
        let port = open_port(cfg)?;
        Self::connect(port, ExchangeConfig::from_port(cfg, alias), timing)
    }
}

impl<T: Transport> ControlBoard<T> {
    /// Wrap a transport and query the firmware version, which gates later
    /// operations for the rest of the session.
    pub fn connect(transport: T, cfg: ExchangeConfig, timing: BoardTiming) -> Result<Self> {
        let mut board = Self {
            link: Link::new(transport, cfg),
            firmware: FirmwareVersion::parse(""),
            resolution: None,
            timing,
        };
        board.firmware = board.check_control_board_fw_version()?;
        Ok(board)
    }

    pub fn firmware(&self) -> &FirmwareVersion {
        &self.firmware
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    pub fn timing(&self) -> &BoardTiming {
        &self.timing
    }

    pub fn link(&self) -> &Link<T> {
        &self.link
    }

    pub fn into_transport(self) -> T {
        self.link.into_transport()
    }

    fn command(&mut self, msg: ControlMsg, params: &[u8]) -> Result<Response> {
        let m = Message::command(msg, params)?;
        self.link.query(&m, Duration::ZERO)
    }

    fn require(&self, cap: Capability) -> Result<()> {
        if self.firmware.supports(cap) {
            return Ok(());
        }
        error!(
            "{} not supported in FW {}. Please update to a newer version.",
            cap.name(),
            self.firmware
        );
        Err(BoardError::FirmwareTooOld {
            op: cap.name(),
            version: self.firmware.label().to_string(),
        })
    }

    // ---- Board lifecycle ----

    pub fn get_control_board_firmware(&mut self) -> Result<Response> {
        self.command(ControlMsg::GetFirmware, &[])
    }

    /// Query and classify the firmware label against the known releases.
    pub fn check_control_board_fw_version(&mut self) -> Result<FirmwareVersion> {
        let resp = self.get_control_board_firmware()?;
        let fw = FirmwareVersion::from_response(&resp.bytes);
        let latest = FirmwareVersion::latest();
        if !fw.is_known() {
            warn!(
                "Control Board FW version is {}. This version is unknown. The latest known version is {}",
                fw, latest
            );
        } else if !fw.is_latest() {
            warn!(
                "Control Board FW version is {}. The latest known version is {}",
                fw, latest
            );
        } else {
            info!("Control Board FW version is {}. This is the latest known version.", fw);
        }
        self.firmware = fw.clone();
        Ok(fw)
    }

    /// Soft reset of the board and panels.
    pub fn system_reset(&mut self) -> Result<Response> {
        let m = Message::command(ControlMsg::SystemReset, &[])?;
        self.link.query(&m, self.timing.system_reset)
    }

    pub fn set_reset_pin(&mut self, high: bool) -> Result<Response> {
        self.command(ControlMsg::ControlPanelReset, &[high as u8])
    }

    /// Pulse the reset pin and wait for the board to come back.
    pub fn control_panel_reset(&mut self) -> Result<()> {
        self.set_reset_pin(true)?;
        pause(self.timing.reset_pulse);
        self.set_reset_pin(false)?;
        info!(
            "Control Board reset started, wait {:?} for board to come back up.",
            self.timing.reset_recovery
        );
        pause(self.timing.reset_recovery);
        Ok(())
    }

    pub fn set_hdmi(&mut self, enable: bool) -> Result<Response> {
        self.command(ControlMsg::SetHdmi, &[enable as u8])
    }

    pub fn i2c_interface_enable(&mut self) -> Result<Response> {
        debug!("i2c interface enable");
        self.command(ControlMsg::I2cInterfaceEnable, &[])
    }

    /// Built-in firmware init, optionally setting the resolution first.
    pub fn initialize_panel(&mut self, resolution: Option<Resolution>) -> Result<Response> {
        if let Some(res) = resolution {
            self.set_panel_resolution(res, Panel::All)?;
        }
        debug!("Initialize the panel");
        self.command(ControlMsg::InitializePanel, &[])
    }

    pub fn set_panel_resolution(&mut self, res: Resolution, panel: Panel) -> Result<Response> {
        let (w, h) = res.size();
        info!("Set panel resolution to {}x{}", w, h);
        self.resolution = Some(res);
        self.command(
            ControlMsg::SetDisplayResolution,
            &[panel.selector(), res.index()],
        )
    }

    pub fn set_display_enable(&mut self, enable: bool, panel: Panel) -> Result<Response> {
        info!("Set {} display enable = {}", panel, enable);
        self.command(ControlMsg::DisplayEnable, &[panel.selector(), enable as u8])
    }

    pub fn deep_power_down(&mut self) -> Result<()> {
        for (address, data) in DEEP_POWER_DOWN {
            self.set_register(address, data, Panel::All, false)?;
        }
        Ok(())
    }

    /// Bring every panel out of deep power down.
    pub fn wake(&mut self) -> Result<()> {
        self.set_reset_pin(false)?;
        self.initialize_panel(None)?;
        Ok(())
    }

    /// Init through direct register writes instead of the firmware's 0x86.
    pub fn initialize_panel_pass_thru(&mut self, panel: Panel) -> Result<()> {
        info!("Initializing panel: {}, with pass thru method", panel);
        for step in PASS_THRU_INIT {
            if let InitStep::Pause(s) = step {
                pause(self.timing.settle(*s));
                continue;
            }
            if let Some((target, address, data)) = step.resolve(panel) {
                self.set_register(address, data, target, false)?;
            }
        }
        Ok(())
    }

    // ---- Registers ----

    /// Write one register on `panel`.
    ///
    /// Firmware without per-color writes rejects a single-color `panel`
    /// unless `force_old_fw`, which widens the write to every panel.
    pub fn set_register<A, D>(
        &mut self,
        address: A,
        data: D,
        panel: Panel,
        force_old_fw: bool,
    ) -> Result<Response>
    where
        A: TryInto<RegisterAddress>,
        D: TryInto<RegisterData>,
        BoardError: From<A::Error> + From<D::Error>,
    {
        let address = address.try_into()?;
        let data = data.try_into()?;
        let mut panel = panel;
        if panel != Panel::All && !self.firmware.supports(Capability::PerPanelRegisterWrite) {
            if force_old_fw {
                warn!(
                    "Per color register writes not supported in FW {}, overriding to write all panels.",
                    self.firmware
                );
                panel = Panel::All;
            } else {
                self.require(Capability::PerPanelRegisterWrite)?;
            }
        }
        let mut params = [0u8; 8];
        params[..4].copy_from_slice(&address.bytes());
        params[4..].copy_from_slice(&data.bytes());
        self.command(panel.write_register_msg(), &params)
    }

    /// Raw read data flow. A bare header answer carries no fields.
    fn read_register_flow(&mut self, panel: Panel, address: RegisterAddress) -> Result<Vec<u8>> {
        let mut params = [0u8; 5];
        params[0] = panel.selector();
        params[1..].copy_from_slice(&address.bytes());
        let resp = self.command(ControlMsg::ReadRegister, &params)?;
        if resp.bytes.len() <= crate::frame::HEADER_LEN {
            return Ok(Vec::new());
        }
        Ok(resp.data_flow().bytes)
    }

    /// Read a register and resolve one value per requested color.
    pub fn get_register<A>(&mut self, panel: Panel, address: A) -> Result<RegisterRead>
    where
        A: TryInto<RegisterAddress>,
        BoardError: From<A::Error>,
    {
        let address = address.try_into()?;
        let flow = self.read_register_flow(panel, address)?;
        let read = MultiPanelRead::parse(&flow)?;
        Ok(RegisterRead::resolve(panel, &read))
    }

    /// Every (connector, slot) field the board answered with, for setups
    /// where several panels share an I2C address.
    pub fn get_register_debug<A>(&mut self, panel: Panel, address: A) -> Result<MultiPanelRead>
    where
        A: TryInto<RegisterAddress>,
        BoardError: From<A::Error>,
    {
        let address = address.try_into()?;
        let flow = self.read_register_flow(panel, address)?;
        let read = MultiPanelRead::parse(&flow)?;
        info!("{}: {}", address, read);
        Ok(read)
    }

    /// Read payload minus its leading field tag.
    pub fn get_register_raw<A>(&mut self, panel: Panel, address: A) -> Result<Vec<u8>>
    where
        A: TryInto<RegisterAddress>,
        BoardError: From<A::Error>,
    {
        let address = address.try_into()?;
        let flow = self.read_register_flow(panel, address)?;
        Ok(flow.get(1..).unwrap_or_default().to_vec())
    }

    fn read_single(&mut self, panel: Panel, address: RegisterAddress) -> Result<u32> {
        self.get_register(panel, address)?
            .value(panel)
            .map(|d| d.value())
            .ok_or_else(|| BoardError::NoReadback {
                panel,
                what: address.to_hex(),
            })
    }

    /// Write each address/data row of `path` to `panel`.
    pub fn write_gamma_tables(&mut self, path: &Path, panel: Panel) -> Result<usize> {
        let table = gamma::load_gamma_table(path)?;
        info!("writing {} gamma table entries from {}", table.len(), path.display());
        for e in &table {
            self.set_register(e.address, e.data, panel, false)?;
        }
        Ok(table.len())
    }

    pub fn enable_lreg_and_gamma(&mut self, panel: Panel) -> Result<()> {
        self.set_register(GAMMA_CTRL, 0x0000_0380u32, panel, false)?;
        self.set_register(GAMMA_CFG, 0x0104_101Eu32, panel, false)?;
        Ok(())
    }

    pub fn disable_lreg_and_gamma(&mut self, panel: Panel) -> Result<()> {
        self.set_register(GAMMA_CTRL, 0x0000_0300u32, panel, false)?;
        Ok(())
    }

    /// `None` disables luminance and gamma; a table path loads it and enables both.
    pub fn set_gamma_tables(&mut self, table: Option<&Path>, panel: Panel) -> Result<()> {
        match table {
            None => self.disable_lreg_and_gamma(panel),
            Some(path) => {
                self.write_gamma_tables(path, panel)?;
                self.enable_lreg_and_gamma(panel)
            }
        }
    }

    /// Read every address listed in `address_csv` and save the values.
    pub fn read_registers(
        &mut self,
        panel: Panel,
        address_csv: &Path,
        output_csv: &Path,
    ) -> Result<usize> {
        require_single(panel, "read_registers")?;
        let addresses = gamma::load_address_list(address_csv)?;
        let mut rows = Vec::with_capacity(addresses.len());
        for (text, address) in addresses {
            let value = self.get_register_raw(panel, address)?;
            rows.push((text, value));
        }
        gamma::write_register_dump(File::create(output_csv)?, &rows)?;
        Ok(rows.len())
    }

    /// Dump the gamma LUT registers listed in `address_csv` for one color.
    pub fn read_gamma_tables(
        &mut self,
        panel: Panel,
        address_csv: &Path,
        output_csv: &Path,
    ) -> Result<usize> {
        info!("reading {} gamma tables", panel);
        self.read_registers(panel, address_csv, output_csv)
    }

    pub fn set_panel_refresh_rate(&mut self, rate: RefreshRate, panel: Panel) -> Result<Response> {
        self.set_register(TCON_CONFIG, rate.register_word(), panel, false)
    }

    /// The board drives 60 Hz MIPI DSI video; the receiver is always set up
    /// with the 75 Hz word.
    pub fn set_mipi_refresh_rate(&mut self, cfg: MipiRefresh, panel: Panel) -> Result<Response> {
        if cfg != MipiRefresh::Hz75 {
            debug!("mipi refresh {:?} requested, writing the 75 Hz config", cfg);
        }
        self.set_register(MIPI_CONFIG, MipiRefresh::Hz75.register_word(), panel, false)
    }

    // ---- Panel readbacks ----

    pub fn get_panel_temperature(&mut self, panel: Panel) -> Result<f64> {
        require_single(panel, "read_temp_sensor")?;
        let resp = self.command(ControlMsg::ReadTempSensor, &[panel.selector()])?;
        let flow = resp.data_flow();
        let raw = flow.bytes.get(1..).unwrap_or_default();
        if raw.is_empty() {
            return Err(BoardError::NoReadback {
                panel,
                what: "temperature sensor".into(),
            });
        }
        let value = raw.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        Ok(temperature_from_adc(value))
    }

    pub fn set_luminance(&mut self, value: i32, panel: Panel) -> Result<Response> {
        let v = value.clamp(0, LUMINANCE_MAX) as u16;
        let [hi, lo] = v.to_be_bytes();
        self.command(ControlMsg::WriteLreg, &[panel.selector(), hi, lo])
    }

    pub fn get_luminance(&mut self, panel: Panel) -> Result<RegisterRead> {
        Ok(self.get_register(panel, LREG)?.masked(0x1FFF))
    }

    pub fn set_current(&mut self, value: i32, panel: Panel) -> Result<Response> {
        let v = value.clamp(0, CURRENT_MAX) as u8;
        self.command(ControlMsg::WriteCreg, &[panel.selector(), v])
    }

    pub fn get_current(&mut self, panel: Panel) -> Result<RegisterRead> {
        Ok(self.get_register(panel, CREG)?.masked(0xFF))
    }

    pub fn read_die_id(&mut self, panel: Panel) -> Result<Vec<u8>> {
        let resp = self.command(ControlMsg::ReadDieId, &[panel.selector()])?;
        Ok(resp.data_flow().bytes)
    }

    /// Select eFuse byte `index`, strobe the read, and fetch it.
    pub fn read_efuse_byte(&mut self, panel: Panel, index: u8) -> Result<Option<u8>> {
        require_single(panel, "read_efuse")?;
        self.set_register(EFUSE_SELECT, [0, 0, 0, index], panel, false)?;
        self.set_register(EFUSE_ENABLE, [0, 0, 0, 1], panel, false)?;
        pause(self.timing.efuse_strobe);
        Ok(self.get_register_raw(panel, EFUSE_DATA)?.last().copied())
    }

    fn read_efuse_range(
        &mut self,
        panel: Panel,
        range: std::ops::RangeInclusive<u8>,
    ) -> Result<Option<Vec<u8>>> {
        let mut out = Vec::new();
        for i in range {
            match self.read_efuse_byte(panel, i)? {
                Some(b) => out.push(b),
                None => {
                    warn!("No eFuse readback at byte {}. Check {} panel is connected.", i, panel);
                    return Ok(None);
                }
            }
        }
        Ok(Some(out))
    }

    /// Die id from eFuse, e.g. `A040X04C0422123103B30`.
    pub fn read_die_id_raw(&mut self, panel: Panel) -> Result<Option<String>> {
        Ok(self
            .read_efuse_range(panel, EFUSE_DIE_ID)?
            .map(|raw| format_die_id(&raw)))
    }

    /// IC version bytes, most significant first.
    pub fn read_ic_version(&mut self, panel: Panel) -> Result<Option<String>> {
        Ok(self
            .read_efuse_range(panel, EFUSE_IC_VERSION)?
            .map(|ic| format!("{:02X}{:02X}{:02X}", ic[2], ic[1], ic[0])))
    }

    pub fn read_i2c_efuse(&mut self, panel: Panel) -> Result<Option<I2cEfuse>> {
        Ok(self
            .read_efuse_byte(panel, EFUSE_I2C)?
            .map(I2cEfuse::decode))
    }

    pub fn read_flash_id(&mut self, panel: Panel) -> Result<RegisterRead> {
        for (address, data) in FLASH_READ_SETUP {
            self.set_register(address, data, panel, false)?;
        }
        self.get_register(panel, FLASH_DATA)
    }

    // ---- Display ----

    pub fn clear_screen(&mut self, panel: Panel) -> Result<Response> {
        require_all(panel, "clear_screen")?;
        self.command(ControlMsg::ClearDisplay, &[])
    }

    /// Reload gamma tables from the panel flash.
    pub fn load_gamma_tables(&mut self) -> Result<Response> {
        debug!("Load gamma tables");
        self.command(ControlMsg::LoadGammaData, &[])
    }

    pub fn gamma_on_off(
        &mut self,
        enable: bool,
        setting: GammaSetting,
        panel: Panel,
    ) -> Result<Response> {
        require_all(panel, "gamma_on_off")?;
        self.require(Capability::GammaControl)?;
        self.command(ControlMsg::GammaOnOff, &[enable as u8, setting.byte()])
    }

    pub fn set_lr_mirror(&mut self, value: u8, panel: Panel) -> Result<Response> {
        if value > 1 {
            return Err(BoardError::InvalidArgument(
                "mirror function expects 0 or 1".into(),
            ));
        }
        self.command(ControlMsg::SetHMirror, &[panel.selector(), value])
    }

    pub fn set_ud_mirror(&mut self, value: u8, panel: Panel) -> Result<Response> {
        if value > 1 {
            return Err(BoardError::InvalidArgument(
                "mirror function expects 0 or 1".into(),
            ));
        }
        self.command(ControlMsg::SetVMirror, &[panel.selector(), value])
    }

    pub fn set_random_scan(&mut self, value: i32, panel: Panel) -> Result<Response> {
        self.command(
            ControlMsg::RandomScanControl,
            &[panel.selector(), (value >= 1) as u8],
        )
    }

    /// Enabling dither selects the spatial only mode.
    pub fn set_dither(&mut self, value: i32, panel: Panel) -> Result<Response> {
        self.command(
            ControlMsg::DitherEnable,
            &[panel.selector(), (value >= 1) as u8],
        )
    }

    /// Wire frame box between two corners.
    pub fn draw_rectangle(
        &mut self,
        start_col: u16,
        start_row: u16,
        end_col: u16,
        end_row: u16,
        gray: u8,
    ) -> Result<Response> {
        let mut params = [0u8; 7];
        params[..6].copy_from_slice(&pack_rectangle(start_col, start_row, end_col, end_row));
        params[6] = gray;
        self.command(ControlMsg::DrawRectangle, &params)
    }

    /// Same greyscale frame to every color.
    pub fn write_monochrome_image(&mut self, path: &Path, clip: Option<u8>) -> Result<Response> {
        let img = rle::load_luma(path, clip)?;
        debug!("image shape: {}x{}", img.width(), img.height());
        rle::check_geometry(img.width(), img.height(), self.resolution)?;
        let data = img.into_raw();
        // rows and cols are ignored by the firmware
        let mut params = [0u8; 8];
        params[4..].copy_from_slice(&flow_len(data.len()));
        let m = Message::with_data_flow(ControlMsg::DisplayMonoImage, &params, &data)?;
        self.link.query(&m, self.timing.image_transfer)
    }

    pub fn write_color_image(&mut self, _path: &Path, _clip: Option<u8>) -> Result<Response> {
        Err(BoardError::NotImplemented(
            "display_color_image (use the mono or RLE image writes)",
        ))
    }

    pub fn write_color_image_with_rle(
        &mut self,
        path: &Path,
        clip: Option<u8>,
    ) -> Result<Response> {
        let img = rle::load_rgb(path, clip)?;
        rle::check_geometry(img.width(), img.height(), self.resolution)?;
        let data = rle::color_image_to_rle_bytes(&img);
        let mut params = [0u8; 7];
        params[..4].copy_from_slice(&flow_len(data.len()));
        let m = Message::with_data_flow(ControlMsg::WriteColorImageRle, &params, &data)?;
        debug!("msg number of bytes = {}", m.as_bytes().len());
        self.link.query(&m, self.timing.image_transfer)
    }

    // ---- Mirror / offset ----

    pub fn get_mirror_offset_pass_thru(&mut self, panel: Panel) -> Result<MirrorOffsetConfig> {
        require_single(panel, "get_mirror_offset")?;
        let mf = self.read_single(panel, mirror::SRAM_MIRROR_FLIP)?;
        let so = self.read_single(panel, mirror::SRAM_OFFSET)?;
        let vo = self.read_single(panel, mirror::VO_CONFIG)?;
        let cfg = MirrorOffsetConfig::decode(mf, so, vo);
        cfg.warn_mismatches();
        Ok(cfg)
    }

    /// Read the current state, apply `update`, and write all three registers.
    pub fn set_mirror_offset_pass_thru(
        &mut self,
        panel: Panel,
        update: &MirrorOffsetUpdate,
    ) -> Result<()> {
        require_single(panel, "set_mirror_offset")?;
        let old = self.get_mirror_offset_pass_thru(panel)?;
        let (mf, so, vo) = mirror::encode(update, &old.sram);
        self.set_register(mirror::SRAM_MIRROR_FLIP, mf, panel, false)?;
        self.set_register(mirror::SRAM_OFFSET, so, panel, false)?;
        self.set_register(mirror::VO_CONFIG, vo, panel, false)?;
        Ok(())
    }
}

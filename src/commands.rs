use anyhow::{Context, Result, bail};
use log::info;

use uled_ctrl::board::ControlBoard;
use uled_ctrl::mirror::MirrorOffsetUpdate;
use uled_ctrl::port::Transport;
use uled_ctrl::proto::parser::gamma_setting_to_str;
use uled_ctrl::{MipiRefresh, Panel, Sequencer, SequencerConfig};

use crate::cli::{Cmd, GammaOpts, GetRegOpts, ImageOpts, InitOpts, LevelOpts, MirrorOpts};

pub fn run<T: Transport>(board: &mut ControlBoard<T>, cmd: Cmd) -> Result<()> {
    match cmd {
        Cmd::Info(_) => show_info(board),
        Cmd::Reset(_) => {
            board.system_reset()?;
            Ok(())
        }
        Cmd::PanelReset(_) => Ok(board.control_panel_reset()?),
        Cmd::Init(o) => init(board, o),
        Cmd::SetReg(o) => {
            board.set_register(&o.address, &o.data, o.panel, o.force)?;
            Ok(())
        }
        Cmd::GetReg(o) => get_reg(board, o),
        Cmd::Luminance(LevelOpts { value, panel, .. }) => {
            match value {
                Some(v) => {
                    board.set_luminance(v, panel)?;
                }
                None => println!("luminance: {}", board.get_luminance(panel)?),
            }
            Ok(())
        }
        Cmd::Current(LevelOpts { value, panel, .. }) => {
            match value {
                Some(v) => {
                    board.set_current(v, panel)?;
                }
                None => println!("current: {}", board.get_current(panel)?),
            }
            Ok(())
        }
        Cmd::Temperature(o) => {
            let t = board.get_panel_temperature(o.panel)?;
            println!("{} panel temperature: {} C", o.panel, t);
            Ok(())
        }
        Cmd::Image(o) => image(board, o),
        Cmd::Gamma(o) => gamma(board, o),
        Cmd::RefreshRate(o) => {
            board.set_panel_refresh_rate(o.rate, o.panel)?;
            if o.mipi {
                board.set_mipi_refresh_rate(MipiRefresh::Hz75, o.panel)?;
            }
            Ok(())
        }
        Cmd::Mirror(o) => mirror(board, o),
        Cmd::DieId(o) => die_id(board, o.panel),
    }
}

fn show_info<T: Transport>(board: &ControlBoard<T>) -> Result<()> {
    let fw = board.firmware().clone();
    println!("firmware: {}", fw);
    let caps: Vec<&str> = fw.capabilities().iter().map(|c| c.name()).collect();
    if caps.is_empty() {
        println!("features: none");
    } else {
        println!("features: {}", caps.join(", "));
    }
    Ok(())
}

fn init<T: Transport>(board: &mut ControlBoard<T>, o: InitOpts) -> Result<()> {
    // rails are owned by the bench supply, never by this tool
    let cfg = SequencerConfig {
        init_only: true,
        use_pass_thru: o.pass_thru,
        resolution: o.resolution,
        gamma_table: o.gamma,
        panel: o.panel,
    };
    let mut seq = Sequencer::new(cfg, None);
    seq.power_on_sequence(board)?;
    info!("panel state: {:?}", seq.state());
    Ok(())
}

fn get_reg<T: Transport>(board: &mut ControlBoard<T>, o: GetRegOpts) -> Result<()> {
    if let (Some(list), Some(out)) = (&o.list, &o.out) {
        let n = board.read_registers(o.panel, list, out)?;
        println!("{} registers written to {}", n, out.display());
        return Ok(());
    }
    let Some(address) = o.address.as_ref() else {
        bail!("no register address given");
    };
    if o.debug {
        let read = board.get_register_debug(o.panel, address)?;
        if read.is_empty() {
            println!("{}: no fields", address);
        }
        for (field, value) in read.populated() {
            println!("{}: {}", field.name(), value);
        }
    } else {
        let read = board.get_register(o.panel, address)?;
        println!("{}: {}", address, read);
    }
    Ok(())
}

fn image<T: Transport>(board: &mut ControlBoard<T>, o: ImageOpts) -> Result<()> {
    if let Some(res) = o.resolution {
        board.set_panel_resolution(res, Panel::All)?;
    }
    let resp = if o.mono {
        board.write_monochrome_image(&o.path, o.clip)
    } else {
        board.write_color_image_with_rle(&o.path, o.clip)
    }
    .with_context(|| format!("writing {}", o.path.display()))?;
    if !resp.is_clean() {
        bail!("board reported problems with the image transfer");
    }
    Ok(())
}

fn gamma<T: Transport>(board: &mut ControlBoard<T>, o: GammaOpts) -> Result<()> {
    if let (Some(list), Some(out)) = (&o.dump, &o.out) {
        let n = board.read_gamma_tables(o.panel, list, out)?;
        println!("{} gamma registers written to {}", n, out.display());
        return Ok(());
    }
    if let Some(setting) = o.setting {
        info!("gamma {} ({})", if o.off { "off" } else { "on" }, gamma_setting_to_str(setting));
        board.gamma_on_off(!o.off, setting, o.panel)?;
        return Ok(());
    }
    match (&o.table, o.off) {
        (Some(path), _) => board.set_gamma_tables(Some(path), o.panel)?,
        (None, true) => board.set_gamma_tables(None, o.panel)?,
        (None, false) => {
            board.load_gamma_tables()?;
        }
    }
    Ok(())
}

fn mirror<T: Transport>(board: &mut ControlBoard<T>, o: MirrorOpts) -> Result<()> {
    if !o.is_query() {
        let update = MirrorOffsetUpdate {
            x_offset: o.x,
            y_offset: o.y,
            lr_mirror: o.lr,
            ud_mirror: o.ud,
        };
        board.set_mirror_offset_pass_thru(o.panel, &update)?;
    }
    let cfg = board.get_mirror_offset_pass_thru(o.panel)?;
    let s = cfg.sram;
    println!(
        "{}: lr_mirror={} ud_mirror={} offset_en={} x={} y={}",
        o.panel, s.lr_mirror, s.ud_mirror, s.offset_en, s.x, s.y
    );
    Ok(())
}

fn die_id<T: Transport>(board: &mut ControlBoard<T>, panel: Panel) -> Result<()> {
    match board.read_die_id_raw(panel)? {
        Some(id) => println!("die id: {}", id),
        None => println!("die id: no readback"),
    }
    if let Some(ic) = board.read_ic_version(panel)? {
        println!("ic version: {}", ic);
    }
    if let Some(i2c) = board.read_i2c_efuse(panel)? {
        println!(
            "i2c: enabled={} address=0x{:02X}",
            i2c.enabled,
            i2c.slot.address()
        );
    }
    Ok(())
}

//! Panel power and configuration sequencing.
//!
//! The panel wants VDD, then AVDD, then its init code, and only then AVEE.
//! Power off runs the rails down in reverse.

use std::path::PathBuf;

use log::{debug, info};

use crate::board::{ControlBoard, pause};
use crate::error::{BoardError, Result};
use crate::port::Transport;
use crate::proto::command::{Panel, Resolution};

/// A switchable supply rail, provided by the station's power supply driver.
pub trait PowerChannel {
    fn enable(&mut self) -> anyhow::Result<()>;
    fn disable(&mut self) -> anyhow::Result<()>;
}

pub struct PowerRails {
    pub vdd: Box<dyn PowerChannel>,
    pub avdd: Box<dyn PowerChannel>,
    pub avee: Box<dyn PowerChannel>,
}

fn switch(rail: &'static str, ch: &mut dyn PowerChannel, on: bool) -> Result<()> {
    debug!("{} {}", rail, if on { "enable" } else { "disable" });
    let r = if on { ch.enable() } else { ch.disable() };
    r.map_err(|source| BoardError::PowerChannel { rail, source })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PanelState {
    Uninitialized,
    PoweredOn,
    PanelInitialized,
    DisplayEnabled,
    GammaLoaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerConfig {
    /// Rails are already up; skip switching them.
    pub init_only: bool,
    /// Write the init code register by register instead of using 0x86.
    pub use_pass_thru: bool,
    pub resolution: Option<Resolution>,
    /// Gamma LUT to load right after init.
    pub gamma_table: Option<PathBuf>,
    pub panel: Panel,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            init_only: false,
            use_pass_thru: false,
            resolution: None,
            gamma_table: None,
            panel: Panel::All,
        }
    }
}

pub struct Sequencer {
    cfg: SequencerConfig,
    rails: Option<PowerRails>,
    state: PanelState,
}

impl Sequencer {
    pub fn new(cfg: SequencerConfig, rails: Option<PowerRails>) -> Self {
        Self {
            cfg,
            rails,
            state: PanelState::Uninitialized,
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.cfg
    }

    fn advance(&mut self, next: PanelState) -> Result<()> {
        if next <= self.state {
            return Err(BoardError::InvalidArgument(format!(
                "panel state cannot go from {:?} to {:?}",
                self.state, next
            )));
        }
        debug!("panel state {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }

    fn rails(&mut self) -> Result<&mut PowerRails> {
        self.rails.as_mut().ok_or(BoardError::PowerRailsMissing)
    }

    /// Bring the panel up: rails (unless init only), init, clear, optional
    /// gamma table, then AVEE.
    pub fn power_on_sequence<T: Transport>(&mut self, board: &mut ControlBoard<T>) -> Result<()> {
        if !self.cfg.init_only && self.rails.is_none() {
            return Err(BoardError::PowerRailsMissing);
        }
        if self.state != PanelState::Uninitialized {
            info!("restarting power on from {:?}", self.state);
            self.state = PanelState::Uninitialized;
        }
        let t = *board.timing();

        if !self.cfg.init_only {
            let rails = self.rails()?;
            switch("vdd", rails.vdd.as_mut(), true)?;
            pause(t.vdd_to_avdd);
            switch("avdd", rails.avdd.as_mut(), true)?;
            pause(t.avdd_settle);
            self.advance(PanelState::PoweredOn)?;
        }

        if self.cfg.use_pass_thru {
            board.initialize_panel_pass_thru(self.cfg.panel)?;
            self.advance(PanelState::PanelInitialized)?;
            board.set_display_enable(false, Panel::All)?;
            board.set_display_enable(true, self.cfg.panel)?;
        } else {
            board.initialize_panel(self.cfg.resolution)?;
            self.advance(PanelState::PanelInitialized)?;
        }
        board.clear_screen(Panel::All)?;
        pause(t.clear_settle);
        self.advance(PanelState::DisplayEnabled)?;

        if let Some(path) = self.cfg.gamma_table.clone() {
            info!("writing gamma tables");
            board.write_gamma_tables(&path, Panel::All)?;
            info!("writing gamma tables completed");
            self.advance(PanelState::GammaLoaded)?;
        }

        if !self.cfg.init_only {
            pause(t.avee_delay);
            let rails = self.rails()?;
            switch("avee", rails.avee.as_mut(), true)?;
        }
        Ok(())
    }

    pub fn power_off_sequence<T: Transport>(&mut self, board: &ControlBoard<T>) -> Result<()> {
        let t = *board.timing();
        let rails = self.rails()?;
        switch("avee", rails.avee.as_mut(), false)?;
        pause(t.rail_off_step);
        switch("avdd", rails.avdd.as_mut(), false)?;
        pause(t.rail_off_step);
        switch("vdd", rails.vdd.as_mut(), false)?;
        self.state = PanelState::Uninitialized;
        Ok(())
    }

    /// Init alone, as configured, without touching the rails.
    pub fn initialize_panel<T: Transport>(&mut self, board: &mut ControlBoard<T>) -> Result<()> {
        if self.cfg.use_pass_thru {
            board.initialize_panel_pass_thru(self.cfg.panel)?;
        } else {
            board.initialize_panel(self.cfg.resolution)?;
        }
        if self.state < PanelState::PanelInitialized {
            self.advance(PanelState::PanelInitialized)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::{ack, board_with};
    use crate::init_table::PASS_THRU_INIT;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Journal = Rc<RefCell<Vec<String>>>;

    struct FakeRail {
        name: &'static str,
        log: Journal,
        fail: bool,
    }

    impl PowerChannel for FakeRail {
        fn enable(&mut self) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("{} tripped", self.name);
            }
            self.log.borrow_mut().push(format!("{}+", self.name));
            Ok(())
        }
        fn disable(&mut self) -> anyhow::Result<()> {
            self.log.borrow_mut().push(format!("{}-", self.name));
            Ok(())
        }
    }

    fn rails(log: &Journal, failing: Option<&str>) -> PowerRails {
        let mk = |name: &'static str| -> Box<dyn PowerChannel> {
            Box::new(FakeRail {
                name,
                log: log.clone(),
                fail: failing == Some(name),
            })
        };
        PowerRails {
            vdd: mk("vdd"),
            avdd: mk("avdd"),
            avee: mk("avee"),
        }
    }

    #[test]
    fn missing_rails_fail_before_io() {
        let mut board = board_with("V1.14.G7", &[]);
        let mut seq = Sequencer::new(SequencerConfig::default(), None);
        assert!(matches!(
            seq.power_on_sequence(&mut board),
            Err(BoardError::PowerRailsMissing)
        ));
        assert!(matches!(
            seq.power_off_sequence(&board),
            Err(BoardError::PowerRailsMissing)
        ));
        assert_eq!(board.into_transport().headers().len(), 1);
    }

    #[test]
    fn builtin_init_with_rails() {
        let log = Journal::default();
        let mut board = board_with("V1.14.G7", &[ack(0x67), ack(0x86), ack(0x81)]);
        let cfg = SequencerConfig {
            resolution: Some(Resolution::Res640x480),
            ..Default::default()
        };
        let mut seq = Sequencer::new(cfg, Some(rails(&log, None)));
        seq.power_on_sequence(&mut board).unwrap();
        assert_eq!(*log.borrow(), vec!["vdd+", "avdd+", "avee+"]);
        assert_eq!(seq.state(), PanelState::DisplayEnabled);

        let opcodes: Vec<u8> = board
            .into_transport()
            .headers()
            .iter()
            .skip(1)
            .map(|h| h[0])
            .collect();
        assert_eq!(opcodes, vec![0x67, 0x86, 0x81]);

        let board = board_with("V1.14.G7", &[]);
        seq.power_off_sequence(&board).unwrap();
        assert_eq!(log.borrow()[3..], ["avee-", "avdd-", "vdd-"]);
        assert_eq!(seq.state(), PanelState::Uninitialized);
    }

    #[test]
    fn pass_thru_init_only_with_gamma() {
        let dir = tempfile::TempDir::new().unwrap();
        let csv = dir.path().join("g.csv");
        std::fs::write(&csv, "Address,Data\n0x03028000,0x00000001\n").unwrap();

        let writes = PASS_THRU_INIT
            .iter()
            .filter(|s| s.resolve(Panel::Blue).is_some())
            .count();
        let mut replies: Vec<Vec<u8>> = (0..writes).map(|_| ack(0xB2)).collect();
        replies.extend([ack(0x68), ack(0x68), ack(0x81), ack(0x01)]);
        let mut board = board_with("V1.14.G7", &replies);

        let cfg = SequencerConfig {
            init_only: true,
            use_pass_thru: true,
            gamma_table: Some(csv),
            panel: Panel::Blue,
            ..Default::default()
        };
        let mut seq = Sequencer::new(cfg, None);
        seq.power_on_sequence(&mut board).unwrap();
        assert_eq!(seq.state(), PanelState::GammaLoaded);

        let t = board.into_transport();
        assert_eq!(t.pending_replies(), 0);
        let headers = t.headers();
        let tail: Vec<&[u8]> = headers[headers.len() - 4..].iter().map(|h| &h[..3]).collect();
        assert_eq!(
            tail,
            vec![&[0x68, 0x07, 0x00][..], &[0x68, 0x04, 0x01], &[0x81, 0, 0], &[0x01, 0x03, 0x02]]
        );
    }

    #[test]
    fn rail_failure_carries_its_name() {
        let log = Journal::default();
        let mut board = board_with("V1.14.G7", &[]);
        let mut seq = Sequencer::new(SequencerConfig::default(), Some(rails(&log, Some("avdd"))));
        match seq.power_on_sequence(&mut board) {
            Err(BoardError::PowerChannel { rail, .. }) => assert_eq!(rail, "avdd"),
            other => panic!("unexpected {:?}", other.err()),
        }
        assert_eq!(*log.borrow(), vec!["vdd+"]);
        assert_eq!(seq.state(), PanelState::Uninitialized);
    }

    #[test]
    fn states_only_move_forward() {
        let mut seq = Sequencer::new(SequencerConfig::default(), None);
        seq.advance(PanelState::PanelInitialized).unwrap();
        assert!(seq.advance(PanelState::PoweredOn).is_err());
        assert!(seq.advance(PanelState::PanelInitialized).is_err());
        seq.advance(PanelState::GammaLoaded).unwrap();
    }

    #[test]
    fn repeated_init_keeps_state() {
        let mut board = board_with("V1.14.G7", &[ack(0x86), ack(0x86)]);
        let mut seq = Sequencer::new(SequencerConfig::default(), None);
        seq.initialize_panel(&mut board).unwrap();
        seq.initialize_panel(&mut board).unwrap();
        assert_eq!(seq.state(), PanelState::PanelInitialized);
    }
}

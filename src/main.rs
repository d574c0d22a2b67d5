use anyhow::Result;
use clap::Parser;
use env_logger::Env;

use uled_ctrl::{BoardTiming, ControlBoard};

mod cli;
mod commands;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let ser = args.cmd.serial();
    let mut board = ControlBoard::open(&ser.port_config(), &ser.alias, BoardTiming::default())?;
    let res = commands::run(&mut board, args.cmd);
    board.link().stats().log_summary(board.link().alias());
    res
}

use super::args::*;

pub mod check;
pub mod list;
pub mod render;
pub mod show;

use anyhow::Context;
use implindex_core::{Loader, LoaderConfig};

use crate::exit_codes::SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let loader = build_loader(cli.lenient)?;
    match cli.cmd {
        Command::Show(args) => show::run(args, &loader).await,
        Command::List(args) => list::run(args, &loader).await,
        Command::Check(args) => check::run(args, &loader).await,
        Command::Render(args) => render::run(args).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}

fn build_loader(lenient: bool) -> anyhow::Result<Loader> {
    let mut config = LoaderConfig::from_env();
    if lenient {
        config = config.with_strict(false);
    }
    Loader::new(config).context("invalid loader configuration")
}

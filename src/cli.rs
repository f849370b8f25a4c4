use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::Config;
use crate::core::lobby;
use crate::core::menu::{LobbyManager, LobbyResult};
use crate::sim::Role;

#[derive(Parser, Debug)]
#[command(name = "goliath")]
#[command(about = "David vs Goliath: a two-peer terminal duel over a direct P2P link")]
#[command(version)]
pub struct Cli {
    /// Frames per second (overrides GOLIATH_FPS)
    #[arg(long, global = true)]
    pub fps: Option<u32>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Host a match; prints an endpoint id for the guest
    Host,
    /// Join a match hosted at the given endpoint id
    Join {
        /// Endpoint id shared by the host
        peer: String,
    },
}

pub async fn run_cli(cli: Cli, mut config: Config) -> Result<()> {
    if let Some(fps) = cli.fps {
        config.fps = fps.clamp(1, 240);
    }

    let mut terminal = ratatui::init();
    let choice = match cli.command {
        Some(Commands::Host) => LobbyResult::Host,
        Some(Commands::Join { peer }) => LobbyResult::Join(peer),
        None => match LobbyManager::new().run(&mut terminal) {
            Ok(choice) => choice,
            Err(e) => {
                ratatui::restore();
                return Err(e);
            }
        },
    };

    let result = match choice {
        LobbyResult::Host => play(Role::Host, None, &config, terminal).await,
        LobbyResult::Join(peer) => play(Role::Guest, Some(&peer), &config, terminal).await,
        LobbyResult::Quit => Ok(()),
    };

    ratatui::restore();
    result
}

async fn play(role: Role, peer: Option<&str>, config: &Config, terminal: ratatui::DefaultTerminal) -> Result<()> {
    info!(%role, "starting session");
    let engine = lobby::launch(role, peer, config).await?;
    engine.run(terminal).await
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;

use learn_game::board::{Outcome, Symbol};
use learn_game::config::{AgentConfig, AppConfig};
use learn_game::players::{HumanPlayer, LearningAgent, Player};
use learn_game::value_table::{PolicyFormat, PolicyStore};
use learn_game::{train_rl_agents, Game, FIRST_AGENT, SECOND_AGENT};

/// Tic-tac-toe agents trained by self-play.
#[derive(Parser)]
#[command(name = "ttt", about = "Train tic-tac-toe agents and play against them")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, global = true, default_value = "ttt.toml")]
    config: PathBuf,

    /// Directory holding the policy files (overrides the config)
    #[arg(long, global = true)]
    policy_dir: Option<PathBuf>,

    /// Policy file format: pickle or json (overrides the config)
    #[arg(long, global = true)]
    format: Option<PolicyFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train two agents against each other and save both policies
    Train {
        /// Override number of training episodes
        #[arg(long)]
        episodes: Option<usize>,

        /// Seed both agents for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Play against a trained agent on the terminal
    Play {
        /// Policy to load; defaults to the agent trained for the computer's seat
        #[arg(long)]
        agent: Option<String>,

        /// Make the first move yourself (you play x)
        #[arg(long)]
        human_first: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(dir) = cli.policy_dir {
        config.training.policy_dir = dir;
    }
    if let Some(format) = cli.format {
        config.training.format = format;
    }
    let store = PolicyStore::new(&config.training.policy_dir, config.training.format);

    match cli.command {
        Command::Train { episodes, seed } => {
            if let Some(episodes) = episodes {
                config.training.episodes = episodes;
            }
            config.validate()?;
            train(&config, seed, &store)
        }
        Command::Play { agent, human_first } => {
            let default_agent = if human_first { SECOND_AGENT } else { FIRST_AGENT };
            play(&store, agent.as_deref().unwrap_or(default_agent), human_first)
        }
    }
}

fn train(config: &AppConfig, seed: Option<u64>, store: &PolicyStore) -> Result<()> {
    let (first, second, summary) = train_rl_agents(config, seed).context("self-play training")?;
    info!("{summary}");
    for agent in [&first, &second] {
        store
            .save(agent.name(), agent.value_table())
            .with_context(|| format!("saving policy of {}", agent.name()))?;
    }
    Ok(())
}

fn play(store: &PolicyStore, agent_name: &str, human_first: bool) -> Result<()> {
    let values = store
        .load(agent_name)
        .with_context(|| format!("loading policy {}", store.path_for(agent_name).display()))?;
    let mut computer = LearningAgent::new("computer", AgentConfig::frozen()).with_values(values);
    let mut human = HumanPlayer::stdio("human");

    let mut game = Game::new();
    let show = |board: &learn_game::board::Board| println!("{board}");
    let outcome = if human_first {
        game.play_against_opponent(&mut human, &mut computer, show)
    } else {
        game.play_against_opponent(&mut computer, &mut human, show)
    }
    .context("playing against the computer")?;

    let computer_symbol = if human_first { Symbol::Nought } else { Symbol::Cross };
    match outcome {
        Outcome::Win(symbol) if symbol == computer_symbol => {
            println!("{} wins!", computer.name())
        }
        Outcome::Win(_) => println!("{} wins!", human.name()),
        Outcome::Draw | Outcome::InProgress => println!("Game has tied!"),
    }
    Ok(())
}

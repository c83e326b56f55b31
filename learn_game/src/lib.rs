//! Tic-tac-toe agents that learn state values by self-play.
//!
//! - [`board`]: the 3x3 grid, turn alternation, board keys, outcome detection
//! - [`players`]: the [`players::Player`] trait, the epsilon-greedy
//!   [`players::LearningAgent`] and the stdin-backed [`players::HumanPlayer`]
//! - [`value_table`]: per-agent state values and their persistence
//! - [`config`]: TOML configuration
//! - [`error`]: error types

use crate::board::{Board, Outcome, Symbol};
use crate::config::AppConfig;
use crate::error::PlayError;
use crate::players::{LearningAgent, Player};
use log::{debug, info};
use std::fmt;

pub mod board;
pub mod config;
pub mod error;
pub mod players;
pub mod value_table;

/// Name of the agent that plays cross during training.
pub const FIRST_AGENT: &str = "p1";
/// Name of the agent that plays nought during training.
pub const SECOND_AGENT: &str = "p2";

pub const WIN_REWARD: f64 = 1.0;
pub const LOSS_REWARD: f64 = 0.0;
pub const FIRST_DRAW_REWARD: f64 = 0.4;
pub const SECOND_DRAW_REWARD: f64 = 0.8;

/// Terminal rewards as `(first player, second player)`. The draw reward is
/// deliberately asymmetric.
pub fn rewards(outcome: Outcome) -> Option<(f64, f64)> {
    match outcome {
        Outcome::Win(Symbol::Cross) => Some((WIN_REWARD, LOSS_REWARD)),
        Outcome::Win(Symbol::Nought) => Some((LOSS_REWARD, WIN_REWARD)),
        Outcome::Draw => Some((FIRST_DRAW_REWARD, SECOND_DRAW_REWARD)),
        Outcome::InProgress => None,
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TrainingSummary {
    pub episodes: usize,
    pub cross_wins: usize,
    pub nought_wins: usize,
    pub draws: usize,
}

impl TrainingSummary {
    fn record(&mut self, outcome: Outcome) {
        self.episodes += 1;
        match outcome {
            Outcome::Win(Symbol::Cross) => self.cross_wins += 1,
            Outcome::Win(Symbol::Nought) => self.nought_wins += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::InProgress => {}
        }
    }
}

impl fmt::Display for TrainingSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} episodes: X won {}, O won {}, {} draws",
            self.episodes, self.cross_wins, self.nought_wins, self.draws
        )
    }
}

/// Drives turns on one board. The first player always places crosses.
pub struct Game {
    pub board: Board,
    episode: usize,
    log_every: usize,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Game {
            board: Board::new(),
            episode: 0,
            log_every: config::LOG_EVERY,
        }
    }

    pub fn with_log_every(mut self, log_every: usize) -> Self {
        self.log_every = log_every.max(1);
        self
    }

    /// Episodes completed so far.
    pub fn episode(&self) -> usize {
        self.episode
    }

    fn take_turn(&mut self, player: &mut dyn Player, learn: bool) -> Result<Outcome, PlayError> {
        let positions = self.board.available_positions();
        let symbol = self.board.active_symbol();
        let position = player.choose_action(&positions, &self.board, symbol)?;
        self.board.apply_move(position)?;
        if learn {
            player.record_state(self.board.key());
        }
        Ok(self.board.evaluate_outcome())
    }

    fn play_to_end(
        &mut self,
        first: &mut dyn Player,
        second: &mut dyn Player,
    ) -> Result<Outcome, PlayError> {
        loop {
            let mover: &mut dyn Player = match self.board.active_symbol() {
                Symbol::Cross => &mut *first,
                Symbol::Nought => &mut *second,
            };
            let outcome = self.take_turn(mover, true)?;
            if outcome.is_terminal() {
                return Ok(outcome);
            }
        }
    }

    /// Plays one training episode. The outcome is checked after every ply,
    /// so the first player can win before the second one answers.
    ///
    /// The board and both histories are reset even when a move fails, so a
    /// failed episode leaves nothing behind for the next one.
    pub fn play_episode(
        &mut self,
        first: &mut dyn Player,
        second: &mut dyn Player,
    ) -> Result<Outcome, PlayError> {
        let result = self.play_to_end(first, second);
        if let Ok(outcome) = result {
            if let Some((first_reward, second_reward)) = rewards(outcome) {
                first.apply_reward(first_reward);
                second.apply_reward(second_reward);
            }
        }
        first.reset_episode();
        second.reset_episode();
        self.board.reset();
        result
    }

    pub fn train_self_play(
        &mut self,
        first: &mut dyn Player,
        second: &mut dyn Player,
        episodes: usize,
    ) -> Result<TrainingSummary, PlayError> {
        let mut summary = TrainingSummary::default();
        for _ in 0..episodes {
            if self.episode % self.log_every == 0 {
                info!("Episode {}", self.episode);
            }
            let outcome = self.play_episode(first, second)?;
            debug!("Episode {} finished: {:?}", self.episode, outcome);
            summary.record(outcome);
            self.episode += 1;
        }
        info!("Training finished after {summary}");
        Ok(summary)
    }

    /// Plays a single game without recording states or feeding rewards.
    /// `observer` sees the board after every ply.
    pub fn play_against_opponent(
        &mut self,
        first: &mut dyn Player,
        second: &mut dyn Player,
        mut observer: impl FnMut(&Board),
    ) -> Result<Outcome, PlayError> {
        self.board.reset();
        loop {
            let mover: &mut dyn Player = match self.board.active_symbol() {
                Symbol::Cross => &mut *first,
                Symbol::Nought => &mut *second,
            };
            let outcome = self.take_turn(mover, false)?;
            observer(&self.board);
            if outcome.is_terminal() {
                return Ok(outcome);
            }
        }
    }
}

/// Trains a cross agent and a nought agent against each other.
pub fn train_rl_agents(
    config: &AppConfig,
    seed: Option<u64>,
) -> Result<(LearningAgent, LearningAgent, TrainingSummary), PlayError> {
    let mut first = LearningAgent::new(FIRST_AGENT, config.agent);
    let mut second = LearningAgent::new(SECOND_AGENT, config.agent);
    if let Some(seed) = seed {
        first = first.with_seed(seed);
        second = second.with_seed(seed.wrapping_add(1));
    }
    let mut game = Game::new().with_log_every(config.training.log_every);
    info!(
        "Training {} episodes (exploration {}, learning rate {}, discount {})",
        config.training.episodes,
        config.agent.exploration_rate,
        config.agent.learning_rate,
        config.agent.discount_factor
    );
    let summary = game.train_self_play(&mut first, &mut second, config.training.episodes)?;
    Ok((first, second, summary))
}

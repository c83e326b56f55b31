use crate::board::{Board, BoardKey, Position, Symbol};
use crate::config::AgentConfig;
use crate::error::{PlayError, PolicyLoadError, PolicySaveError};
use crate::value_table::{PolicyFormat, ValueTable};
use itertools::Itertools;
use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// A participant in a game: either a learning agent or a human move source.
pub trait Player {
    fn name(&self) -> &str;

    /// Picks one of `positions` for `symbol` on `board`.
    fn choose_action(
        &mut self,
        positions: &[Position],
        board: &Board,
        symbol: Symbol,
    ) -> Result<Position, PlayError>;

    /// Remembers the board reached by this player's own move.
    fn record_state(&mut self, key: BoardKey);

    /// Feeds the terminal reward of the finished episode.
    fn apply_reward(&mut self, reward: f64);

    fn reset_episode(&mut self);
}

/// Epsilon-greedy agent learning state values from its own episode history.
#[derive(Debug)]
pub struct LearningAgent {
    name: String,
    values: ValueTable,
    history: Vec<BoardKey>,
    config: AgentConfig,
    rng: StdRng,
}

/// Reads moves as `row col` lines (1-based) and re-prompts until it gets an
/// empty square.
pub struct HumanPlayer<R, W> {
    name: String,
    input: R,
    output: W,
}

impl LearningAgent {
    pub fn new(name: impl Into<String>, config: AgentConfig) -> Self {
        LearningAgent {
            name: name.into(),
            values: ValueTable::new(),
            history: Vec::new(),
            config,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_values(mut self, values: ValueTable) -> Self {
        self.values = values;
        self
    }

    pub fn value_table(&self) -> &ValueTable {
        &self.values
    }

    pub fn history(&self) -> &[BoardKey] {
        &self.history
    }

    pub fn export_value_table(&self, format: PolicyFormat) -> Result<Vec<u8>, PolicySaveError> {
        self.values.to_bytes(format)
    }

    /// Replaces the value table. On error the current table is kept.
    pub fn import_value_table(
        &mut self,
        format: PolicyFormat,
        bytes: &[u8],
    ) -> Result<(), PolicyLoadError> {
        self.values = ValueTable::from_bytes(format, bytes)?;
        Ok(())
    }

    /// Highest-valued successor. Ties go to the later candidate.
    fn greedy_action(&self, positions: &[Position], board: &Board, symbol: Symbol) -> Option<Position> {
        let mut best = None;
        let mut max_value = f64::NEG_INFINITY;
        for &position in positions {
            let value = self.values.value(&board.key_after(position, symbol));
            if value >= max_value {
                max_value = value;
                best = Some(position);
            }
        }
        best
    }
}

impl Player for LearningAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_action(
        &mut self,
        positions: &[Position],
        board: &Board,
        symbol: Symbol,
    ) -> Result<Position, PlayError> {
        let explore = self.rng.gen::<f64>() < self.config.exploration_rate;
        let action = if explore {
            positions.choose(&mut self.rng).copied()
        } else {
            self.greedy_action(positions, board, symbol)
        };
        action.ok_or(PlayError::NoCandidates)
    }

    fn record_state(&mut self, key: BoardKey) {
        self.history.push(key);
    }

    fn apply_reward(&mut self, reward: f64) {
        let AgentConfig {
            learning_rate,
            discount_factor,
            ..
        } = self.config;
        let mut target = reward;
        for key in self.history.iter().rev() {
            target = self
                .values
                .update(key, target, learning_rate, discount_factor);
        }
    }

    fn reset_episode(&mut self) {
        self.history.clear();
    }
}

impl HumanPlayer<StdinLock<'static>, Stdout> {
    pub fn stdio(name: impl Into<String>) -> Self {
        HumanPlayer::new(name, io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> HumanPlayer<R, W> {
    pub fn new(name: impl Into<String>, input: R, output: W) -> Self {
        HumanPlayer {
            name: name.into(),
            input,
            output,
        }
    }

    fn parse_position(line: &str) -> Option<Position> {
        let (row, col) = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<usize>().ok())
            .collect_tuple()?;
        match (row?, col?) {
            (r @ 1..=3, c @ 1..=3) => Some((r - 1, c - 1)),
            _ => None,
        }
    }
}

impl<R: BufRead, W: Write> Player for HumanPlayer<R, W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_action(
        &mut self,
        positions: &[Position],
        _board: &Board,
        symbol: Symbol,
    ) -> Result<Position, PlayError> {
        if positions.is_empty() {
            return Err(PlayError::NoCandidates);
        }
        loop {
            write!(
                self.output,
                "{} ({symbol}), enter your move as 'row col' (1-3): ",
                self.name
            )?;
            self.output.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(PlayError::InputClosed);
            }
            match Self::parse_position(&line) {
                Some(position) if positions.contains(&position) => return Ok(position),
                Some((row, col)) => writeln!(
                    self.output,
                    "The square {} {} is taken, please choose another one.",
                    row + 1,
                    col + 1
                )?,
                None => writeln!(
                    self.output,
                    "Please enter a row and a column between 1 and 3, e.g. '2 3'."
                )?,
            }
        }
    }

    // Humans keep no value table, so there is nothing to record or learn.
    fn record_state(&mut self, _key: BoardKey) {}

    fn apply_reward(&mut self, _reward: f64) {}

    fn reset_episode(&mut self) {}
}

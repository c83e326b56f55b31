use std::collections::VecDeque;
use std::io::{self, Cursor};

use learn_game::board::{Board, BoardKey, Outcome, Position, Symbol};
use learn_game::config::{AgentConfig, AppConfig};
use learn_game::error::{MoveError, PlayError, PolicyLoadError};
use learn_game::players::{HumanPlayer, LearningAgent, Player};
use learn_game::value_table::{PolicyFormat, PolicyStore};
use learn_game::{train_rl_agents, Game, FIRST_AGENT, SECOND_AGENT};

/// Plays a fixed list of moves and keeps the learning bookkeeping of a
/// regular agent.
struct ScriptedPlayer {
    moves: VecDeque<Position>,
    rewards: Vec<f64>,
    agent: LearningAgent,
}

impl ScriptedPlayer {
    fn new(name: &str, moves: &[Position]) -> Self {
        ScriptedPlayer {
            moves: moves.iter().copied().collect(),
            rewards: Vec::new(),
            agent: LearningAgent::new(name, AgentConfig::default()).with_seed(0),
        }
    }
}

impl Player for ScriptedPlayer {
    fn name(&self) -> &str {
        self.agent.name()
    }

    fn choose_action(
        &mut self,
        positions: &[Position],
        _board: &Board,
        _symbol: Symbol,
    ) -> Result<Position, PlayError> {
        if positions.is_empty() {
            return Err(PlayError::NoCandidates);
        }
        self.moves.pop_front().ok_or(PlayError::NoCandidates)
    }

    fn record_state(&mut self, key: BoardKey) {
        self.agent.record_state(key);
    }

    fn apply_reward(&mut self, reward: f64) {
        self.rewards.push(reward);
        self.agent.apply_reward(reward);
    }

    fn reset_episode(&mut self) {
        self.agent.reset_episode();
    }
}

fn key(s: &str) -> BoardKey {
    s.parse().unwrap()
}

#[test]
fn top_row_win_rewards_cross_and_updates_its_last_state() {
    let mut a = ScriptedPlayer::new(FIRST_AGENT, &[(0, 0), (0, 1), (0, 2)]);
    let mut b = ScriptedPlayer::new(SECOND_AGENT, &[(1, 0), (1, 1), (2, 2)]);
    let mut game = Game::new();

    let summary = game.train_self_play(&mut a, &mut b, 1).unwrap();
    assert_eq!(summary.cross_wins, 1);
    assert_eq!(a.rewards, vec![1.0]);
    assert_eq!(b.rewards, vec![0.0]);
    // B's last scripted move is never requested.
    assert_eq!(b.moves.len(), 1);

    let values = a.agent.value_table();
    assert_eq!(values.len(), 3);
    let last = values.value(&key("XXXOO----"));
    assert!((last - 0.18).abs() < 1e-12);
    let middle = values.value(&key("XX-O-----"));
    assert!((middle - 0.2 * 0.9 * last).abs() < 1e-12);
    let first = values.value(&key("X--------"));
    assert!((first - 0.2 * 0.9 * middle).abs() < 1e-12);

    let values = b.agent.value_table();
    assert_eq!(values.len(), 2);
    assert_eq!(values.get(&key("XX-OO----")), Some(&0.0));
    assert_eq!(values.get(&key("X--O-----")), Some(&0.0));

    assert!(a.agent.history().is_empty());
    assert!(b.agent.history().is_empty());
    assert_eq!(game.board, Board::new());
    assert_eq!(game.episode(), 1);
}

#[test]
fn full_board_draw_uses_asymmetric_rewards() {
    let mut a = ScriptedPlayer::new(FIRST_AGENT, &[(0, 0), (2, 2), (2, 1), (0, 2), (1, 0)]);
    let mut b = ScriptedPlayer::new(SECOND_AGENT, &[(1, 1), (0, 1), (2, 0), (1, 2)]);
    let mut game = Game::new();

    let outcome = game.play_episode(&mut a, &mut b).unwrap();
    assert_eq!(outcome, Outcome::Draw);
    assert_eq!(a.rewards, vec![0.4]);
    assert_eq!(b.rewards, vec![0.8]);
    assert_eq!(a.agent.value_table().len(), 5);
    assert_eq!(b.agent.value_table().len(), 4);
    let last = a.agent.value_table().value(&key("XOXXOOOXX"));
    assert!((last - 0.2 * 0.9 * 0.4).abs() < 1e-12);
}

#[test]
fn occupied_square_aborts_the_episode() {
    let mut a = ScriptedPlayer::new(FIRST_AGENT, &[(0, 0), (1, 1)]);
    let mut b = ScriptedPlayer::new(SECOND_AGENT, &[(1, 1)]);
    let mut game = Game::new();
    let err = game.play_episode(&mut a, &mut b).unwrap_err();
    assert!(matches!(err, PlayError::Move(MoveError::Occupied((1, 1)))));
    assert!(a.rewards.is_empty());
    assert!(b.rewards.is_empty());
    assert!(a.agent.history().is_empty());
    assert!(b.agent.history().is_empty());
    assert_eq!(game.board, Board::new());

    // The next episode on the same game starts from an empty board.
    let mut a = ScriptedPlayer::new(FIRST_AGENT, &[(0, 0), (0, 1), (0, 2)]);
    let mut b = ScriptedPlayer::new(SECOND_AGENT, &[(1, 0), (1, 1)]);
    let outcome = game.play_episode(&mut a, &mut b).unwrap();
    assert_eq!(outcome, Outcome::Win(Symbol::Cross));
    assert!(a.agent.value_table().contains_key(&key("XXXOO----")));
    assert!(b.agent.value_table().contains_key(&key("X--O-----")));
}

#[test]
fn frozen_agent_beats_a_careless_human() {
    let mut agent = LearningAgent::new("computer", AgentConfig::frozen());
    let mut human = HumanPlayer::new("human", Cursor::new("1 1\n1 2\n"), io::sink());
    let mut game = Game::new();
    let mut boards = Vec::new();

    let outcome = game
        .play_against_opponent(&mut agent, &mut human, |board| boards.push(board.key()))
        .unwrap();

    // With an empty table every successor is worth 0, so the agent keeps
    // taking the last free square.
    assert_eq!(outcome, Outcome::Win(Symbol::Cross));
    assert_eq!(boards.len(), 5);
    assert_eq!(boards.last(), Some(&key("OO----XXX")));
    assert!(agent.value_table().is_empty());
    assert!(agent.history().is_empty());
}

#[test]
fn human_moving_first_plays_cross() {
    let mut human = HumanPlayer::new("human", Cursor::new("1 1\n1 2\n1 3\n"), io::sink());
    let mut agent = LearningAgent::new("computer", AgentConfig::frozen());
    let mut game = Game::new();

    let outcome = game
        .play_against_opponent(&mut human, &mut agent, |_| {})
        .unwrap();
    assert_eq!(outcome, Outcome::Win(Symbol::Cross));
    assert_eq!(game.board.key(), key("XXX----OO"));
}

#[test]
fn human_running_out_of_input_ends_the_game() {
    let mut agent = LearningAgent::new("computer", AgentConfig::frozen());
    let mut human = HumanPlayer::new("human", Cursor::new("2 2\n"), io::sink());
    let result = Game::new().play_against_opponent(&mut agent, &mut human, |_| {});
    assert!(matches!(result, Err(PlayError::InputClosed)));
}

#[test]
fn trained_policies_survive_the_store() {
    let mut config = AppConfig::default();
    config.training.episodes = 300;
    let (first, second, _) = train_rl_agents(&config, Some(5)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    for format in [PolicyFormat::Pickle, PolicyFormat::Json] {
        let store = PolicyStore::new(dir.path(), format);
        store.save(first.name(), first.value_table()).unwrap();
        store.save(second.name(), second.value_table()).unwrap();

        let computer = LearningAgent::new(FIRST_AGENT, AgentConfig::frozen())
            .with_values(store.load(FIRST_AGENT).unwrap());
        assert_eq!(computer.value_table(), first.value_table());
        assert_eq!(&store.load(SECOND_AGENT).unwrap(), second.value_table());
    }

    std::fs::write(
        PolicyStore::new(dir.path(), PolicyFormat::Json).path_for(FIRST_AGENT),
        b"{\"agent\": \"p1\"",
    )
    .unwrap();
    assert!(matches!(
        PolicyStore::new(dir.path(), PolicyFormat::Json).load(FIRST_AGENT),
        Err(PolicyLoadError::Json(_))
    ));
}

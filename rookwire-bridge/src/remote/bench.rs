//! In-process opponent
//!
//! [`BenchRemote`] plays the server side of a [`RemoteSession`] locally. The
//! opponent replays a fixed script: coordinate moves, `draw` to offer a draw
//! and `resign`. When the script runs out the opponent resigns. Moves are not
//! checked for legality; a sentinel that reaches `make_move` is refused as an
//! invalid move so the board's error path can be exercised.
//!
//! Every finished game leaves a fresh challenge from the opponent on the
//! account stream, so the accept-challenge sentinel always has something to
//! accept.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use rookwire_core::config::{ChallengeColor, ChallengeOptions, SeekConfig};
use rookwire_core::game::{
    Color, GameEvent, GameFull, GameId, GameState, GameStatus, IncomingEvent, Player,
};
use rookwire_core::traits::{EventStream, RemoteError, RemoteSession};
use rookwire_protocol::Move;
use tracing::{debug, info, warn};

/// Id of the standing challenge from the bench opponent
pub const CHALLENGE_ID: &str = "bench-challenge";

const INCOMING_QUEUE_SIZE: usize = 4;
const GAME_QUEUE_SIZE: usize = 16;

type Queue<T, const N: usize> = Arc<Channel<CriticalSectionRawMutex, T, N>>;

/// Bench script errors
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("unknown script step {0:?}")]
    Step(String),
}

/// One opponent action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchStep {
    Move(Move),
    OfferDraw,
    Resign,
}

impl FromStr for BenchStep {
    type Err = BenchError;

    fn from_str(step: &str) -> Result<Self, Self::Err> {
        match step.trim() {
            "draw" => Ok(BenchStep::OfferDraw),
            "resign" => Ok(BenchStep::Resign),
            token => Move::parse(token)
                .map(BenchStep::Move)
                .ok_or_else(|| BenchError::Step(token.to_string())),
        }
    }
}

/// Event stream over a bench queue; never reports a gap
pub struct ChannelStream<T, const N: usize> {
    queue: Queue<T, N>,
}

impl<T, const N: usize> EventStream for ChannelStream<T, N> {
    type Item = T;

    async fn next(&mut self) -> Option<T> {
        Some(self.queue.receive().await)
    }
}

struct BenchGame {
    id: GameId,
    local: Color,
    white: Player,
    black: Player,
    state: GameState,
    script: VecDeque<BenchStep>,
    events: Queue<GameEvent, GAME_QUEUE_SIZE>,
}

impl BenchGame {
    fn opponent(&self) -> Color {
        self.local.opposite()
    }

    fn emit(&self, event: GameEvent) {
        if self.events.try_send(event).is_err() {
            warn!(game = %self.id, "bench event queue full, dropping event");
        }
    }

    fn emit_state(&self) {
        self.emit(GameEvent::State(self.state.clone()));
    }

    fn set_draw_flag(&mut self, color: Color, offered: bool) {
        match color {
            Color::White => self.state.wdraw = offered,
            Color::Black => self.state.bdraw = offered,
        }
    }

    fn local_move(&mut self, mv: &Move) -> Result<(), RemoteError> {
        if self.state.moves.side_to_move() != self.local {
            return Err(RemoteError::Rejected);
        }
        if mv.is_sentinel() {
            return Err(RemoteError::InvalidMove);
        }
        self.state.moves = self.state.moves.with_move(mv);
        self.emit_state();
        self.opponent_turn();
        Ok(())
    }

    fn opponent_turn(&mut self) {
        // Moving answers any offer we had pending
        self.set_draw_flag(self.local, false);

        match self.script.pop_front().unwrap_or(BenchStep::Resign) {
            BenchStep::Move(mv) => {
                debug!(game = %self.id, %mv, "bench opponent moves");
                self.state.moves = self.state.moves.with_move(&mv);
                self.emit_state();
            }
            BenchStep::OfferDraw => {
                debug!(game = %self.id, "bench opponent offers a draw");
                self.set_draw_flag(self.opponent(), true);
                self.emit_state();
            }
            BenchStep::Resign => {
                debug!(game = %self.id, "bench opponent resigns");
                self.finish(GameStatus::Resign, Some(self.local));
            }
        }
    }

    fn finish(&mut self, status: GameStatus, winner: Option<Color>) {
        self.state.status = status;
        self.state.winner = winner;
        self.state.wdraw = false;
        self.state.bdraw = false;
        self.emit_state();
    }

    fn pgn(&self) -> String {
        let result = match (self.state.is_terminal(), self.state.winner) {
            (false, _) => "*",
            (true, Some(Color::White)) => "1-0",
            (true, Some(Color::Black)) => "0-1",
            (true, None) => "1/2-1/2",
        };

        let mut pgn = String::new();
        pgn.push_str("[Event \"Rookwire bench game\"]\n");
        pgn.push_str(&format!("[Site \"{}\"]\n", self.id));
        pgn.push_str(&format!("[White \"{}\"]\n", self.white.label()));
        pgn.push_str(&format!("[Black \"{}\"]\n", self.black.label()));
        pgn.push_str(&format!("[Result \"{}\"]\n", result));
        pgn.push_str(&format!("[Termination \"{}\"]\n\n", self.state.status));

        let tokens: Vec<&str> = self.state.moves.tokens().collect();
        for (number, pair) in tokens.chunks(2).enumerate() {
            pgn.push_str(&format!("{}. {} ", number + 1, pair.join(" ")));
        }
        pgn.push_str(result);
        pgn.push('\n');
        pgn
    }
}

/// Local stand-in for a chess server
pub struct BenchRemote {
    account: String,
    opponent: String,
    script: Vec<BenchStep>,
    incoming: Queue<IncomingEvent, INCOMING_QUEUE_SIZE>,
    game: RefCell<Option<BenchGame>>,
    games_started: Cell<u32>,
}

impl BenchRemote {
    pub fn new(account: &str, opponent: &str, script: &[String]) -> Result<Self, BenchError> {
        let script = script
            .iter()
            .map(|step| step.parse())
            .collect::<Result<Vec<BenchStep>, _>>()?;

        let remote = Self {
            account: account.to_string(),
            opponent: opponent.to_string(),
            script,
            incoming: Arc::new(Channel::new()),
            game: RefCell::new(None),
            games_started: Cell::new(0),
        };
        remote.offer_challenge();
        Ok(remote)
    }

    fn offer_challenge(&self) {
        let challenge = IncomingEvent::challenge(CHALLENGE_ID, &self.opponent);
        if self.incoming.try_send(challenge).is_err() {
            debug!("account queue full, challenge not re-offered");
        }
    }

    fn start_game(&self, local: Color, clock_ms: u64) -> Result<(), RemoteError> {
        let number = self.games_started.get() + 1;
        self.games_started.set(number);
        let id = GameId::new(format!("bench{}", number));

        let me = Player::new(&self.account);
        let them = Player::new(&self.opponent);
        let (white, black) = match local {
            Color::White => (me, them),
            Color::Black => (them, me),
        };
        let state = GameState {
            wtime: clock_ms,
            btime: clock_ms,
            ..GameState::started("")
        };

        let mut game = BenchGame {
            id: id.clone(),
            local,
            white,
            black,
            state,
            script: self.script.iter().copied().collect(),
            events: Arc::new(Channel::new()),
        };
        game.emit(GameEvent::Full(GameFull {
            id: id.clone(),
            white: game.white.clone(),
            black: game.black.clone(),
            state: game.state.clone(),
        }));
        if local == Color::Black {
            game.opponent_turn();
        }
        *self.game.borrow_mut() = Some(game);

        info!(game = %id, color = %local, opponent = %self.opponent, "bench game started");
        self.incoming
            .try_send(IncomingEvent::game_start(id.as_str()))
            .map_err(|_| {
                warn!(game = %id, "account queue full, game start lost");
                RemoteError::Transport
            })
    }

    /// Run `action` against the live game
    fn with_game<F>(&self, game_id: &GameId, action: F) -> Result<(), RemoteError>
    where
        F: FnOnce(&mut BenchGame) -> Result<(), RemoteError>,
    {
        let mut slot = self.game.borrow_mut();
        let game = slot
            .as_mut()
            .filter(|game| game.id == *game_id)
            .ok_or(RemoteError::NotFound)?;
        if game.state.is_terminal() {
            return Err(RemoteError::Rejected);
        }

        action(game)?;

        if game.state.is_terminal() {
            info!(game = %game.id, status = %game.state.status, "bench game over");
            self.offer_challenge();
        }
        Ok(())
    }
}

impl RemoteSession for BenchRemote {
    type IncomingStream = ChannelStream<IncomingEvent, INCOMING_QUEUE_SIZE>;
    type GameStream = ChannelStream<GameEvent, GAME_QUEUE_SIZE>;

    async fn stream_incoming_events(&self) -> Result<Self::IncomingStream, RemoteError> {
        Ok(ChannelStream {
            queue: self.incoming.clone(),
        })
    }

    async fn stream_game_state(&self, game_id: &GameId) -> Result<Self::GameStream, RemoteError> {
        self.game
            .borrow()
            .as_ref()
            .filter(|game| game.id == *game_id)
            .map(|game| ChannelStream {
                queue: game.events.clone(),
            })
            .ok_or(RemoteError::NotFound)
    }

    async fn make_move(&self, game_id: &GameId, mv: &Move) -> Result<(), RemoteError> {
        self.with_game(game_id, |game| game.local_move(mv))
    }

    async fn resign(&self, game_id: &GameId) -> Result<(), RemoteError> {
        self.with_game(game_id, |game| {
            let winner = game.opponent();
            game.finish(GameStatus::Resign, Some(winner));
            Ok(())
        })
    }

    async fn offer_draw(&self, game_id: &GameId) -> Result<(), RemoteError> {
        self.with_game(game_id, |game| {
            game.set_draw_flag(game.local, true);
            game.emit_state();
            Ok(())
        })
    }

    async fn accept_draw(&self, game_id: &GameId) -> Result<(), RemoteError> {
        self.with_game(game_id, |game| {
            if !game.state.draw_offered_by(game.opponent()) {
                return Err(RemoteError::Rejected);
            }
            game.finish(GameStatus::Draw, None);
            Ok(())
        })
    }

    async fn decline_draw(&self, game_id: &GameId) -> Result<(), RemoteError> {
        self.with_game(game_id, |game| {
            let opponent = game.opponent();
            if !game.state.draw_offered_by(opponent) {
                return Err(RemoteError::Rejected);
            }
            game.set_draw_flag(opponent, false);
            game.opponent_turn();
            Ok(())
        })
    }

    async fn seek(&self, seek: &SeekConfig) -> Result<(), RemoteError> {
        self.start_game(Color::White, u64::from(seek.minutes) * 60_000)
    }

    async fn create_challenge(
        &self,
        user: &str,
        options: &ChallengeOptions,
    ) -> Result<(), RemoteError> {
        if user != self.opponent {
            debug!(user, opponent = %self.opponent, "challenge redirected to the bench opponent");
        }
        let local = match options.color {
            ChallengeColor::Black => Color::Black,
            ChallengeColor::White | ChallengeColor::Random => Color::White,
        };
        self.start_game(local, u64::from(options.clock_limit) * 1000)
    }

    async fn accept_challenge(&self, challenge_id: &str) -> Result<(), RemoteError> {
        if challenge_id != CHALLENGE_ID {
            return Err(RemoteError::NotFound);
        }
        let clock = ChallengeOptions::default().clock_limit;
        self.start_game(Color::Black, u64::from(clock) * 1000)
    }

    async fn export_game(&self, game_id: &GameId) -> Result<String, RemoteError> {
        self.game
            .borrow()
            .as_ref()
            .filter(|game| game.id == *game_id)
            .map(BenchGame::pgn)
            .ok_or(RemoteError::NotFound)
    }
}

//! GameStateReconciler
//!
//! Merges two independently paced sources into one view of the game: moves
//! entered on the board and the server's authoritative state stream. The
//! reconciler owns the expected move list and only treats a server state as
//! new when the admission rules in [`crate::state::admission`] say so.
//!
//! Per turn:
//! - user to move: race board input against the stream (a terminal state
//!   ends the game), classify the input, submit it, wait for the echo
//! - opponent to move: pull states until one advances, ends, or is a draw
//!   offer
//! - draw offer: blink, read the board's answer, accept or decline

use embassy_futures::select::{select, Either};
use rookwire_protocol::{Move, Square};
use tracing::{debug, info, warn};

use crate::config::{GameInput, SessionConfig};
use crate::game::{ClockReading, GameEvent, GameState, MoveList, Outcome};
use crate::patterns;
use crate::session::SessionContext;
use crate::state::{
    admit_opponent_state, admit_post_move_state, OpponentVerdict, PostMoveVerdict, TurnEvent,
    TurnState,
};
use crate::traits::{BoardIndicator, BoardInput, EventStream, RemoteSession};

/// Reconciler failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReconcileError {
    /// Too many refused moves in one turn; calling `run` again resumes it
    RetryLimit,
    /// The game stream stayed empty past the configured gap limit
    StreamExhausted,
    /// Board input source is gone
    InputClosed,
}

impl core::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ReconcileError::RetryLimit => write!(f, "too many refused moves"),
            ReconcileError::StreamExhausted => write!(f, "game stream exhausted"),
            ReconcileError::InputClosed => write!(f, "board input closed"),
        }
    }
}

enum UserWait {
    Input(Move),
    Ended(GameState),
}

/// Drives one game from its first snapshot to game over
pub struct GameStateReconciler<'r, R: RemoteSession, I, D> {
    remote: &'r R,
    stream: R::GameStream,
    input: &'r mut I,
    indicator: &'r mut D,
    ctx: &'r SessionContext,
    config: &'r SessionConfig,
    turn: TurnState,
    expected: MoveList,
    latest: GameState,
    /// A state read ahead of where the reconciler was looking
    pending: Option<GameState>,
    outcome: Option<Outcome>,
    gaps: u8,
    /// Draw answered; an unflagged repeat of the list is its echo
    draw_answered: bool,
}

impl<'r, R, I, D> GameStateReconciler<'r, R, I, D>
where
    R: RemoteSession,
    I: BoardInput,
    D: BoardIndicator,
{
    /// Create a reconciler from the game's first snapshot
    pub fn new(
        remote: &'r R,
        stream: R::GameStream,
        input: &'r mut I,
        indicator: &'r mut D,
        ctx: &'r SessionContext,
        config: &'r SessionConfig,
        initial: GameState,
    ) -> Self {
        Self {
            remote,
            stream,
            input,
            indicator,
            ctx,
            config,
            turn: TurnState::initial(ctx.local, &initial.moves),
            expected: initial.moves.clone(),
            latest: initial,
            pending: None,
            outcome: None,
            gaps: 0,
            draw_answered: false,
        }
    }

    pub fn turn(&self) -> TurnState {
        self.turn
    }

    /// Move list the reconciler is waiting on
    pub fn expected(&self) -> &MoveList {
        &self.expected
    }

    /// Last state accepted from the server
    pub fn latest(&self) -> &GameState {
        &self.latest
    }

    /// Run until game over
    ///
    /// After [`ReconcileError::RetryLimit`] the turn is left as it was, so
    /// calling `run` again re-enters it.
    pub async fn run(&mut self) -> Result<Outcome, ReconcileError> {
        if self.outcome.is_none() && self.latest.is_terminal() {
            let state = self.latest.clone();
            self.finish(state).await;
        }

        loop {
            match self.turn {
                TurnState::AwaitingUserMove => self.user_turn().await?,
                TurnState::AwaitingOpponentMove => self.opponent_turn().await?,
                TurnState::ResolvingDrawOffer => self.resolve_draw().await?,
                TurnState::GameOver => {
                    return Ok(self.outcome.unwrap_or_else(Outcome::unfinished));
                }
            }
        }
    }

    fn advance(&mut self, event: TurnEvent) {
        let next = self.turn.transition(event);
        if next != self.turn {
            debug!(from = ?self.turn, to = ?next, ?event, "turn transition");
        }
        self.turn = next;
    }

    async fn user_turn(&mut self) -> Result<(), ReconcileError> {
        let mut offer_draw = false;
        let mut refused = 0u8;

        loop {
            if self.ctx.is_ended() {
                info!("game flagged as ended, leaving turn");
                self.advance(TurnEvent::GameEnded);
                return Ok(());
            }

            let entered = match self.await_user_input(false).await? {
                UserWait::Input(mv) => mv,
                UserWait::Ended(state) => {
                    self.finish(state).await;
                    return Ok(());
                }
            };

            // Once an offer is armed the next input is the move, taken as entered
            let mv = if offer_draw {
                entered
            } else {
                match self.config.sentinels.classify_in_game(&entered) {
                    GameInput::Resign => {
                        if self.resign().await? {
                            return Ok(());
                        }
                        continue;
                    }
                    GameInput::Draw => {
                        info!("draw offer armed, enter the move to send with it");
                        offer_draw = true;
                        continue;
                    }
                    GameInput::Move(mv) => mv,
                }
            };

            match self.remote.make_move(&self.ctx.game_id, &mv).await {
                Ok(()) => {
                    info!(%mv, "move sent");
                    self.expected = self.expected.with_move(&mv);
                    let offered = offer_draw && self.send_draw_offer().await;
                    return self.await_move_echo(offered).await;
                }
                Err(e) => {
                    refused += 1;
                    warn!(%mv, error = %e, attempt = refused, "move refused");
                    self.indicate_invalid().await;
                    if refused >= self.config.limits.max_invalid_moves {
                        return Err(ReconcileError::RetryLimit);
                    }
                }
            }
        }
    }

    async fn send_draw_offer(&mut self) -> bool {
        match self.remote.offer_draw(&self.ctx.game_id).await {
            Ok(()) => {
                info!("draw offered");
                true
            }
            Err(e) => {
                warn!(error = %e, "draw offer failed");
                false
            }
        }
    }

    /// Wait for the server to confirm the move just sent
    async fn await_move_echo(&mut self, offered: bool) -> Result<(), ReconcileError> {
        loop {
            let state = self.next_game_state().await?;
            match admit_post_move_state(&self.expected, &state) {
                PostMoveVerdict::Accepted => {
                    self.accept(state).await;
                    break;
                }
                PostMoveVerdict::Ahead => {
                    debug!(moves = %state.moves, "echo skipped, keeping later state");
                    if let Some(mv) = self.expected.last_move() {
                        self.show(mv.from, mv.to).await;
                    }
                    self.pending = Some(state);
                    break;
                }
                PostMoveVerdict::Ended => {
                    self.finish(state).await;
                    return Ok(());
                }
                PostMoveVerdict::Discard => {
                    debug!(moves = %state.moves, "discarding state during own move");
                }
            }
        }

        self.advance(TurnEvent::UserMoveAccepted);
        if offered && self.pending.is_none() {
            self.discard_offer_echo().await?;
        }
        Ok(())
    }

    /// Consume the state that only reflects our own draw offer
    async fn discard_offer_echo(&mut self) -> Result<(), ReconcileError> {
        loop {
            let state = self.next_game_state().await?;
            match admit_post_move_state(&self.expected, &state) {
                PostMoveVerdict::Accepted => {
                    debug!("draw offer echo consumed");
                    return Ok(());
                }
                PostMoveVerdict::Ahead => {
                    debug!(moves = %state.moves, "opponent moved before the offer echo");
                    self.pending = Some(state);
                    return Ok(());
                }
                PostMoveVerdict::Ended => {
                    self.finish(state).await;
                    return Ok(());
                }
                PostMoveVerdict::Discard => {
                    debug!(moves = %state.moves, "discarding state while waiting for offer echo");
                }
            }
        }
    }

    /// Resign and wait for the terminal state
    ///
    /// Returns `false` if the server refused the resignation.
    async fn resign(&mut self) -> Result<bool, ReconcileError> {
        if let Err(e) = self.remote.resign(&self.ctx.game_id).await {
            warn!(error = %e, "resign refused");
            self.indicate_invalid().await;
            return Ok(false);
        }
        info!("resigned");
        self.expected = self.expected.with_forfeit();

        loop {
            let state = self.next_game_state().await?;
            if admit_post_move_state(&self.expected, &state) == PostMoveVerdict::Ended {
                self.finish(state).await;
                return Ok(true);
            }
            debug!(moves = %state.moves, "waiting for resignation to land");
        }
    }

    async fn opponent_turn(&mut self) -> Result<(), ReconcileError> {
        loop {
            let state = self.next_game_state().await?;
            match admit_opponent_state(&self.expected, &state, self.ctx.local) {
                OpponentVerdict::Advance { plies } => {
                    if plies > 1 {
                        warn!(plies, moves = %state.moves, "move list advanced by more than one ply");
                    }
                    self.expected = state.moves.clone();
                    self.draw_answered = false;
                    let ours = state.moves.side_to_move() == self.ctx.local;
                    self.accept(state).await;
                    if ours {
                        self.advance(TurnEvent::OpponentMoved);
                    }
                    return Ok(());
                }
                OpponentVerdict::DrawOffer
                    if self.draw_answered && !state.draw_offered_by(self.ctx.opponent) =>
                {
                    debug!(moves = %state.moves, "discarding echo of the draw answer");
                }
                OpponentVerdict::DrawOffer => {
                    info!("opponent offers a draw");
                    self.advance(TurnEvent::DrawOffered);
                    return Ok(());
                }
                OpponentVerdict::Ended => {
                    self.finish(state).await;
                    return Ok(());
                }
                OpponentVerdict::Discard => {
                    debug!(moves = %state.moves, "discarding state while opponent to move");
                }
            }
        }
    }

    async fn resolve_draw(&mut self) -> Result<(), ReconcileError> {
        if let Err(e) = self.indicator.draw_offered().await {
            warn!(error = ?e, "failed to signal draw offer");
        }

        let answer = match self.await_user_input(true).await? {
            UserWait::Input(mv) => mv,
            UserWait::Ended(state) => {
                self.finish(state).await;
                return Ok(());
            }
        };

        let game_id = &self.ctx.game_id;
        let result = if self.config.sentinels.is_draw(&answer) {
            info!("accepting draw");
            self.remote.accept_draw(game_id).await
        } else {
            info!("declining draw");
            self.remote.decline_draw(game_id).await
        };
        if let Err(e) = result {
            warn!(error = %e, "draw response failed");
        }

        self.draw_answered = true;
        self.advance(TurnEvent::DrawResolved);
        Ok(())
    }

    /// Wait for board input while watching the stream for the game ending
    ///
    /// With `keep_ahead`, a state that advances the move list is kept for the
    /// opponent wait instead of being dropped.
    async fn await_user_input(&mut self, keep_ahead: bool) -> Result<UserWait, ReconcileError> {
        loop {
            let event = select(self.input.next_move(), self.stream.next()).await;
            match event {
                Either::First(Some(mv)) => return Ok(UserWait::Input(mv)),
                Either::First(None) => return Err(ReconcileError::InputClosed),
                Either::Second(Some(GameEvent::State(state))) => {
                    self.gaps = 0;
                    if state.is_terminal() {
                        return Ok(UserWait::Ended(state));
                    }
                    let ahead = state
                        .moves
                        .plies_beyond(&self.expected)
                        .is_some_and(|plies| plies > 0);
                    if keep_ahead && ahead {
                        debug!(moves = %state.moves, "keeping state for after the board answers");
                        self.pending = Some(state);
                    } else {
                        debug!(moves = %state.moves, "discarding state while waiting for board input");
                    }
                }
                Either::Second(Some(_)) => {
                    self.gaps = 0;
                    debug!("discarding non-state event while waiting for board input");
                }
                Either::Second(None) => self.count_gap()?,
            }
        }
    }

    /// Next `gameState`, skipping everything else
    async fn next_game_state(&mut self) -> Result<GameState, ReconcileError> {
        if let Some(state) = self.pending.take() {
            return Ok(state);
        }

        loop {
            match self.stream.next().await {
                Some(GameEvent::State(state)) => {
                    self.gaps = 0;
                    return Ok(state);
                }
                Some(GameEvent::Full(_)) => {
                    self.gaps = 0;
                    debug!("discarding repeated full snapshot");
                }
                Some(GameEvent::Chat(chat)) => {
                    self.gaps = 0;
                    debug!(user = %chat.username, "discarding chat line");
                }
                Some(GameEvent::Unknown) => {
                    self.gaps = 0;
                    debug!("discarding unclassified event");
                }
                None => self.count_gap()?,
            }
        }
    }

    /// Count an empty read; too many in a row exhaust the stream
    fn count_gap(&mut self) -> Result<(), ReconcileError> {
        self.gaps = self.gaps.saturating_add(1);
        if self.gaps > self.config.limits.max_stream_gaps {
            warn!(gaps = self.gaps, "game stream exhausted");
            return Err(ReconcileError::StreamExhausted);
        }
        warn!(gaps = self.gaps, "game stream returned nothing");
        Ok(())
    }

    /// Display an accepted state: last move lit, clock of the side to move logged
    async fn accept(&mut self, state: GameState) {
        if let Some(mv) = state.moves.last_move() {
            self.show(mv.from, mv.to).await;
        }
        let side = state.moves.side_to_move();
        info!(
            side = %side,
            clock = %ClockReading(state.clock(side)),
            ply = state.moves.ply_count(),
            "position updated"
        );
        self.latest = state;
    }

    async fn finish(&mut self, state: GameState) {
        let outcome = state.outcome();
        self.ctx.mark_ended();

        let (from, to) = patterns::outcome_pattern(&outcome);
        self.show(from, to).await;
        info!(
            status = %outcome.status,
            winner = ?outcome.winner,
            result = outcome.result_for(self.ctx.local),
            "game over"
        );

        self.outcome = Some(outcome);
        self.latest = state;
        self.advance(TurnEvent::GameEnded);
    }

    async fn show(&mut self, from: Square, to: Square) {
        if let Err(e) = self.indicator.show(from, to).await {
            warn!(error = ?e, %from, %to, "failed to light squares");
        }
    }

    async fn indicate_invalid(&mut self) {
        if let Err(e) = self.indicator.invalid_move().await {
            warn!(error = ?e, "failed to signal invalid move");
        }
    }
}

//! Game sessions
//!
//! [`GameSession`] owns the idle loop: it reads board input until a sentinel
//! picks a menu action (seek, accept a challenge, challenge a friend) or a
//! plain move asks to power down. Each started game is announced on the
//! board, handed to a [`GameStateReconciler`] and archived when it ends.
//!
//! No per-game failure is fatal to the session. A game whose stream dies is
//! abandoned and the board returns to the idle loop.

use alloc::string::String;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use rookwire_protocol::Square;
use tracing::{debug, info, warn};

use crate::config::{IdleInput, MenuAction, SessionConfig};
use crate::game::{Challenge, Color, GameEvent, GameFull, GameId, IncomingEvent};
use crate::patterns;
use crate::reconciler::{GameStateReconciler, ReconcileError};
use crate::traits::{
    BoardIndicator, BoardInput, EventStream, GameArchive, GameRecord, RemoteError, RemoteSession,
};

/// Set-once flag shared between the tasks of one game
#[derive(Debug, Default)]
pub struct GameFlag(AtomicBool);

impl GameFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Who is playing what in the current game
#[derive(Debug)]
pub struct SessionContext {
    pub game_id: GameId,
    pub local: Color,
    pub opponent: Color,
    pub opponent_name: String,
    ended: GameFlag,
}

impl SessionContext {
    pub fn new(game_id: GameId, local: Color, opponent_name: String) -> Self {
        Self {
            game_id,
            local,
            opponent: local.opposite(),
            opponent_name,
            ended: GameFlag::new(),
        }
    }

    pub fn is_ended(&self) -> bool {
        self.ended.is_set()
    }

    pub fn mark_ended(&self) {
        self.ended.set();
    }
}

/// Session failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError {
    Remote(RemoteError),
    /// Board input source is gone
    InputClosed,
    /// An event stream stayed empty past the gap limit
    StreamExhausted,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Remote(e) => write!(f, "remote: {}", e),
            SessionError::InputClosed => write!(f, "board input closed"),
            SessionError::StreamExhausted => write!(f, "event stream exhausted"),
        }
    }
}

impl From<RemoteError> for SessionError {
    fn from(e: RemoteError) -> Self {
        SessionError::Remote(e)
    }
}

/// Idle loop plus one game at a time
pub struct GameSession<'a, R, I, D, A> {
    remote: &'a R,
    input: &'a mut I,
    indicator: &'a mut D,
    archive: &'a mut A,
    config: &'a SessionConfig,
}

impl<'a, R, I, D, A> GameSession<'a, R, I, D, A>
where
    R: RemoteSession,
    I: BoardInput,
    D: BoardIndicator,
    A: GameArchive,
{
    pub fn new(
        remote: &'a R,
        input: &'a mut I,
        indicator: &'a mut D,
        archive: &'a mut A,
        config: &'a SessionConfig,
    ) -> Self {
        Self {
            remote,
            input,
            indicator,
            archive,
            config,
        }
    }

    /// Run until the board asks to power down
    ///
    /// Only a failure to open the account stream or a closed board input
    /// ends the session with an error.
    pub async fn run(&mut self) -> Result<(), SessionError> {
        let mut incoming = self.remote.stream_incoming_events().await?;
        info!("idle, enter a sentinel to start a game");

        loop {
            let Some(entered) = self.input.next_move().await else {
                return Err(SessionError::InputClosed);
            };

            let action = match self.config.sentinels.classify_idle(&entered) {
                IdleInput::Quit => {
                    info!(mv = %entered, "power down requested");
                    if let Err(e) = self.indicator.power_down().await {
                        warn!(error = ?e, "failed to power down board");
                    }
                    return Ok(());
                }
                IdleInput::Menu(action) => action,
            };

            let game_id = match self.start_game(action, &mut incoming).await {
                Ok(Some(game_id)) => game_id,
                Ok(None) => continue,
                Err(SessionError::InputClosed) => return Err(SessionError::InputClosed),
                Err(e) => {
                    warn!(error = %e, ?action, "could not start a game");
                    continue;
                }
            };

            match self.play(game_id).await {
                Ok(()) => info!("back to idle"),
                Err(SessionError::InputClosed) => return Err(SessionError::InputClosed),
                Err(e) => warn!(error = %e, "game abandoned"),
            }
        }
    }

    /// Carry out a menu action and wait for the resulting game
    async fn start_game(
        &mut self,
        action: MenuAction,
        incoming: &mut R::IncomingStream,
    ) -> Result<Option<GameId>, SessionError> {
        let config = self.config;
        match action {
            MenuAction::Seek => {
                let (from, to) = patterns::SEEKING;
                self.show(from, to).await;
                info!(
                    minutes = config.seek.minutes,
                    increment = config.seek.increment,
                    rated = config.seek.rated,
                    "seeking a game"
                );
                self.remote.seek(&config.seek).await?;
            }
            MenuAction::AcceptChallenge => {
                info!("waiting for a challenge");
                let challenge = self.wait_for_challenge(incoming).await?;
                info!(id = %challenge.id, from = challenge.challenger.label(), "accepting challenge");
                self.remote.accept_challenge(&challenge.id).await?;
            }
            MenuAction::Challenge => {
                let Some(challenge) = &config.challenge else {
                    warn!("no opponent configured to challenge");
                    return Ok(None);
                };
                info!(opponent = %challenge.opponent, "issuing challenge");
                self.remote
                    .create_challenge(&challenge.opponent, &challenge.options)
                    .await?;
            }
        }

        self.wait_for_game_start(incoming).await.map(Some)
    }

    async fn wait_for_challenge(
        &self,
        incoming: &mut R::IncomingStream,
    ) -> Result<Challenge, SessionError> {
        let mut gaps = 0u8;
        loop {
            match incoming.next().await {
                Some(IncomingEvent::Challenge { challenge }) => return Ok(challenge),
                Some(event) => {
                    gaps = 0;
                    debug!(?event, "ignoring event while waiting for a challenge");
                }
                None => self.count_gap(&mut gaps)?,
            }
        }
    }

    async fn wait_for_game_start(
        &self,
        incoming: &mut R::IncomingStream,
    ) -> Result<GameId, SessionError> {
        let mut gaps = 0u8;
        loop {
            match incoming.next().await {
                Some(IncomingEvent::GameStart { game }) => {
                    info!(game = %game.id, "game started");
                    return Ok(game.id);
                }
                Some(event) => {
                    gaps = 0;
                    debug!(?event, "ignoring event while waiting for a game");
                }
                None => self.count_gap(&mut gaps)?,
            }
        }
    }

    fn count_gap(&self, gaps: &mut u8) -> Result<(), SessionError> {
        *gaps = gaps.saturating_add(1);
        if *gaps > self.config.limits.max_stream_gaps {
            return Err(SessionError::StreamExhausted);
        }
        warn!(gaps = *gaps, "stream returned nothing");
        Ok(())
    }

    /// Play one game from snapshot to archive
    async fn play(&mut self, game_id: GameId) -> Result<(), SessionError> {
        let config = self.config;
        let mut stream = self.remote.stream_game_state(&game_id).await?;
        let full = self.wait_for_snapshot(&mut stream).await?;

        let local = full.color_of(&config.account_id).unwrap_or_else(|| {
            warn!(
                account = %config.account_id,
                white = %full.white.id,
                black = %full.black.id,
                "account not seated, assuming black"
            );
            Color::Black
        });
        let opponent = String::from(full.player(local.opposite()).label());

        let (from, to) = patterns::color_announcement(local);
        self.show(from, to).await;
        info!(game = %game_id, color = %local, opponent = %opponent, "playing");

        let ctx = SessionContext::new(game_id, local, opponent);
        let (outcome, moves) = {
            let mut reconciler = GameStateReconciler::new(
                self.remote,
                stream,
                &mut *self.input,
                &mut *self.indicator,
                &ctx,
                config,
                full.state,
            );
            let outcome = loop {
                match reconciler.run().await {
                    Ok(outcome) => break outcome,
                    Err(ReconcileError::RetryLimit) => {
                        warn!("too many refused moves, re-entering turn");
                    }
                    Err(ReconcileError::StreamExhausted) => {
                        return Err(SessionError::StreamExhausted);
                    }
                    Err(ReconcileError::InputClosed) => return Err(SessionError::InputClosed),
                }
            };
            (outcome, reconciler.latest().moves.clone())
        };

        let record = GameRecord {
            game_id: ctx.game_id.clone(),
            local,
            opponent: ctx.opponent_name.clone(),
            outcome,
            moves,
        };
        self.archive_game(&record).await;
        Ok(())
    }

    async fn wait_for_snapshot(
        &self,
        stream: &mut R::GameStream,
    ) -> Result<GameFull, SessionError> {
        let mut gaps = 0u8;
        loop {
            match stream.next().await {
                Some(GameEvent::Full(full)) => return Ok(full),
                Some(_) => {
                    gaps = 0;
                    debug!("ignoring event before the game snapshot");
                }
                None => self.count_gap(&mut gaps)?,
            }
        }
    }

    async fn archive_game(&mut self, record: &GameRecord) {
        let pgn = match self.remote.export_game(&record.game_id).await {
            Ok(pgn) => pgn,
            Err(e) => {
                warn!(game = %record.game_id, error = %e, "game export failed");
                return;
            }
        };
        match self.archive.store(record, &pgn).await {
            Ok(()) => info!(game = %record.game_id, "game archived"),
            Err(e) => warn!(game = %record.game_id, error = ?e, "failed to archive game"),
        }
    }

    async fn show(&mut self, from: Square, to: Square) {
        if let Err(e) = self.indicator.show(from, to).await {
            warn!(error = ?e, %from, %to, "failed to light squares");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChallengeConfig;
    use crate::game::{GameState, GameStatus, Player};
    use crate::test_utils::{
        block_on_bounded, sq, Indication, RecordingArchive, RecordingIndicator, RemoteCall,
        ScriptedInput, ScriptedRemote,
    };
    use alloc::vec;

    fn full(white: &str, black: &str, moves: &str) -> Option<GameEvent> {
        Some(GameEvent::Full(GameFull {
            id: "g1".into(),
            white: Player::new(white),
            black: Player::new(black),
            state: GameState::started(moves),
        }))
    }

    fn ended(moves: &str, status: GameStatus, winner: Option<Color>) -> Option<GameEvent> {
        Some(GameEvent::State(GameState::finished(moves, status, winner)))
    }

    fn config() -> SessionConfig {
        SessionConfig {
            account_id: "me".into(),
            ..SessionConfig::default()
        }
    }

    fn run(
        remote: &ScriptedRemote,
        inputs: &[&str],
        config: &SessionConfig,
    ) -> (Result<(), SessionError>, RecordingIndicator, RecordingArchive) {
        let mut input = ScriptedInput::new(inputs);
        let mut indicator = RecordingIndicator::default();
        let mut archive = RecordingArchive::default();
        let result = block_on_bounded(
            GameSession::new(remote, &mut input, &mut indicator, &mut archive, config).run(),
        );
        (result, indicator, archive)
    }

    #[test]
    fn test_game_flag() {
        let flag = GameFlag::new();
        assert!(!flag.is_set());
        flag.set();
        assert!(flag.is_set());
    }

    #[test]
    fn test_context_opponent_color() {
        let ctx = SessionContext::new("g".into(), Color::Black, "them".into());
        assert_eq!(ctx.opponent, Color::White);
        assert!(!ctx.is_ended());
        ctx.mark_ended();
        assert!(ctx.is_ended());
    }

    #[test]
    fn test_plain_move_powers_down() {
        let remote = ScriptedRemote::default();
        let (result, indicator, _) = run(&remote, &["e2e4"], &config());
        assert_eq!(result, Ok(()));
        assert_eq!(indicator.events, vec![Indication::PowerDown]);
        assert!(remote.calls().is_empty());
    }

    fn run_closing(
        remote: &ScriptedRemote,
        inputs: &[&str],
    ) -> (Result<(), SessionError>, RecordingIndicator, RecordingArchive) {
        let mut input = ScriptedInput::closing(inputs);
        let mut indicator = RecordingIndicator::default();
        let mut archive = RecordingArchive::default();
        let config = config();
        let result = block_on_bounded(
            GameSession::new(remote, &mut input, &mut indicator, &mut archive, &config).run(),
        );
        (result, indicator, archive)
    }

    #[test]
    fn test_input_closed_while_idle() {
        let remote = ScriptedRemote::default();
        let (result, indicator, _) = run_closing(&remote, &[]);
        assert_eq!(result, Err(SessionError::InputClosed));
        assert!(indicator.events.is_empty());
        assert!(remote.calls().is_empty());
    }

    #[test]
    fn test_input_closed_during_game() {
        let remote = ScriptedRemote::with_incoming(vec![Some(IncomingEvent::game_start("g1"))]);
        remote.push_game(vec![full("me", "them", "")]);
        let (result, indicator, archive) = run_closing(&remote, &["h1h1"]);

        assert_eq!(result, Err(SessionError::InputClosed));
        assert_eq!(
            remote.calls(),
            vec![
                RemoteCall::Seek(config().seek),
                RemoteCall::StreamGame("g1".into()),
            ]
        );
        assert!(!indicator.events.contains(&Indication::PowerDown));
        assert!(archive.stored.is_empty());
    }

    #[test]
    fn test_seek_plays_and_archives() {
        let remote = ScriptedRemote::with_incoming(vec![Some(IncomingEvent::game_start("g1"))]);
        remote.push_game(vec![
            full("me", "them", ""),
            Some(GameEvent::State(GameState::started("e2e4"))),
            ended("e2e4", GameStatus::Resign, Some(Color::White)),
        ]);
        let config = config();
        let (result, indicator, archive) = run(&remote, &["h1h1", "e2e4", "a2a3"], &config);

        assert_eq!(result, Ok(()));
        assert_eq!(
            remote.calls(),
            vec![
                RemoteCall::Seek(config.seek),
                RemoteCall::StreamGame("g1".into()),
                RemoteCall::MakeMove("e2e4".into()),
                RemoteCall::Export("g1".into()),
            ]
        );
        assert_eq!(
            indicator.events,
            vec![
                Indication::Show(patterns::SEEKING.0, patterns::SEEKING.1),
                Indication::Show(patterns::WHITE.0, patterns::WHITE.1),
                Indication::Show(sq("e2"), sq("e4")),
                Indication::Show(patterns::WHITE.0, patterns::WHITE.1),
                Indication::PowerDown,
            ]
        );

        assert_eq!(archive.stored.len(), 1);
        let (record, pgn) = &archive.stored[0];
        assert_eq!(record.local, Color::White);
        assert_eq!(record.opponent, "them");
        assert_eq!(record.outcome.winner, Some(Color::White));
        assert_eq!(record.moves.as_str(), "e2e4");
        assert!(pgn.contains("g1"));
    }

    #[test]
    fn test_accept_challenge() {
        let remote = ScriptedRemote::with_incoming(vec![
            Some(IncomingEvent::game_start("stale")),
            Some(IncomingEvent::challenge("c1", "friend")),
            None,
            Some(IncomingEvent::game_start("g2")),
        ]);
        remote.push_game(vec![
            full("friend", "me", ""),
            ended("", GameStatus::Aborted, None),
        ]);
        let (result, indicator, archive) = run(&remote, &["h2h2", "a2a3"], &config());

        assert_eq!(result, Ok(()));
        assert_eq!(
            remote.calls(),
            vec![
                RemoteCall::AcceptChallenge("c1".into()),
                RemoteCall::StreamGame("g2".into()),
                RemoteCall::Export("g2".into()),
            ]
        );
        assert_eq!(
            indicator.events,
            vec![
                Indication::Show(patterns::BLACK.0, patterns::BLACK.1),
                Indication::Show(patterns::NO_WINNER.0, patterns::NO_WINNER.1),
                Indication::PowerDown,
            ]
        );
        assert_eq!(archive.stored[0].0.local, Color::Black);
    }

    #[test]
    fn test_challenge_without_opponent() {
        let remote = ScriptedRemote::default();
        let (result, indicator, _) = run(&remote, &["h3h3", "a2a3"], &config());
        assert_eq!(result, Ok(()));
        assert!(remote.calls().is_empty());
        assert_eq!(indicator.events, vec![Indication::PowerDown]);
    }

    #[test]
    fn test_challenge_configured_opponent() {
        let remote = ScriptedRemote::with_incoming(vec![Some(IncomingEvent::game_start("g3"))]);
        remote.push_game(vec![full("them", "me", ""), ended("", GameStatus::Aborted, None)]);
        let mut config = config();
        config.challenge = Some(ChallengeConfig {
            opponent: "friend".into(),
            ..ChallengeConfig::default()
        });
        let (result, _, _) = run(&remote, &["h3h3", "a2a3"], &config);

        assert_eq!(result, Ok(()));
        assert_eq!(remote.calls()[0], RemoteCall::CreateChallenge("friend".into()));
    }

    #[test]
    fn test_dead_game_stream_returns_to_idle() {
        let remote = ScriptedRemote::with_incoming(vec![Some(IncomingEvent::game_start("g4"))]);
        remote.push_game(vec![full("them", "me", ""), None, None, None, None]);
        let (result, indicator, archive) = run(&remote, &["a1a1", "a2a3"], &config());

        // a1 is unbound, so the default menu action (seek) applies
        assert_eq!(result, Ok(()));
        assert!(archive.stored.is_empty());
        assert_eq!(
            remote.calls(),
            vec![
                RemoteCall::Seek(config().seek),
                RemoteCall::StreamGame("g4".into()),
            ]
        );
        assert_eq!(indicator.events.last(), Some(&Indication::PowerDown));
    }

    #[test]
    fn test_seek_refused_returns_to_idle() {
        let remote = ScriptedRemote::default();
        remote.fail_seek();
        let (result, _, _) = run(&remote, &["h1h1", "a2a3"], &config());
        assert_eq!(result, Ok(()));
        assert_eq!(remote.calls(), vec![RemoteCall::Seek(config().seek)]);
    }

    #[test]
    fn test_unseated_account_plays_black() {
        let remote = ScriptedRemote::with_incoming(vec![Some(IncomingEvent::game_start("g5"))]);
        remote.push_game(vec![full("a", "b", ""), ended("", GameStatus::Aborted, None)]);
        let (_, indicator, archive) = run(&remote, &["h1h1", "a2a3"], &config());

        assert_eq!(indicator.events[1], Indication::Show(patterns::BLACK.0, patterns::BLACK.1));
        assert_eq!(archive.stored[0].0.local, Color::Black);
        assert_eq!(archive.stored[0].0.opponent, "a");
    }
}

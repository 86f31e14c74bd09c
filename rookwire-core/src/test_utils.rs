//! In-memory fakes for unit tests

use alloc::collections::VecDeque;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use core::future::{pending, Future};
use core::pin::Pin;
use core::task::{Context, Poll};

use embassy_futures::block_on;
use embassy_futures::select::{select, Either};

use rookwire_hal::{UartRx, UartTx};
use rookwire_protocol::{BoardPeer, Move, Square};

use crate::config::{ChallengeOptions, SeekConfig};
use crate::game::{GameEvent, GameId, IncomingEvent};
use crate::traits::{
    BoardIndicator, BoardInput, EventStream, GameArchive, GameRecord, RemoteError, RemoteSession,
};

pub fn sq(coord: &str) -> Square {
    Square::parse(coord).unwrap()
}

pub fn mv(token: &str) -> Move {
    Move::parse(token).unwrap()
}

/// Polls allowed before [`block_on_bounded`] gives up
const POLL_BUDGET: u32 = 100_000;

/// Resolves after being polled `n` times
struct PollBudget(u32);

impl Future for PollBudget {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 == 0 {
            return Poll::Ready(());
        }
        self.0 -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// `block_on` that panics instead of spinning forever on a stalled future
///
/// Every fake here is either ready or pending for good, so running out of
/// polls means nothing will ever wake the future.
pub fn block_on_bounded<F: Future>(fut: F) -> F::Output {
    match block_on(select(fut, PollBudget(POLL_BUDGET))) {
        Either::First(output) => output,
        Either::Second(()) => panic!("future stalled"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestUartError;

/// Receive half replaying a script; `None` entries are read timeouts
pub struct ScriptedRx {
    script: VecDeque<Option<u8>>,
    fail: bool,
}

impl ScriptedRx {
    pub fn new(script: Vec<Option<u8>>) -> Self {
        Self {
            script: script.into(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            script: VecDeque::new(),
            fail: true,
        }
    }
}

impl UartRx for ScriptedRx {
    type Error = TestUartError;

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.fail {
            return Err(TestUartError);
        }
        match self.script.pop_front() {
            Some(Some(byte)) if !buf.is_empty() => {
                buf[0] = byte;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

/// Transmit half recording everything written
#[derive(Debug, Default)]
pub struct RecordingTx {
    pub written: Vec<u8>,
    /// One entry per `write_all`
    pub writes: Vec<Vec<u8>>,
}

impl UartTx for RecordingTx {
    type Error = TestUartError;

    async fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.written.extend_from_slice(data);
        self.writes.push(data.to_vec());
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// UART halves wired to a simulated board
pub struct PeerUart;

impl PeerUart {
    pub fn split(peer: BoardPeer) -> (PeerRx, PeerTx) {
        let peer = Rc::new(RefCell::new(peer));
        (PeerRx { peer: peer.clone() }, PeerTx { peer })
    }
}

pub struct PeerRx {
    peer: Rc<RefCell<BoardPeer>>,
}

impl PeerRx {
    pub fn peer(&self) -> Rc<RefCell<BoardPeer>> {
        self.peer.clone()
    }
}

impl UartRx for PeerRx {
    type Error = TestUartError;

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let next = self.peer.borrow_mut().next_tx();
        match next {
            Some(byte) if !buf.is_empty() => {
                buf[0] = byte;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

pub struct PeerTx {
    peer: Rc<RefCell<BoardPeer>>,
}

impl UartTx for PeerTx {
    type Error = TestUartError;

    async fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        let mut peer = self.peer.borrow_mut();
        for &byte in data {
            peer.receive(byte);
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Event stream replaying a script; `None` entries are empty reads
///
/// Once the script runs out the stream never yields again.
pub struct ScriptedStream<T> {
    items: VecDeque<Option<T>>,
}

impl<T> ScriptedStream<T> {
    pub fn new(items: Vec<Option<T>>) -> Self {
        Self {
            items: items.into(),
        }
    }
}

impl<T> EventStream for ScriptedStream<T> {
    type Item = T;

    async fn next(&mut self) -> Option<T> {
        match self.items.pop_front() {
            Some(item) => item,
            None => pending().await,
        }
    }
}

/// Board input replaying moves
///
/// When empty it either waits forever or reports the input as closed.
pub struct ScriptedInput {
    moves: VecDeque<Move>,
    close_when_empty: bool,
}

impl ScriptedInput {
    pub fn new(tokens: &[&str]) -> Self {
        Self {
            moves: tokens.iter().map(|token| mv(token)).collect(),
            close_when_empty: false,
        }
    }

    pub fn closing(tokens: &[&str]) -> Self {
        Self {
            close_when_empty: true,
            ..Self::new(tokens)
        }
    }
}

impl BoardInput for ScriptedInput {
    async fn next_move(&mut self) -> Option<Move> {
        match self.moves.pop_front() {
            Some(mv) => Some(mv),
            None if self.close_when_empty => None,
            None => pending().await,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indication {
    Show(Square, Square),
    InvalidMove,
    DrawOffered,
    PowerDown,
}

#[derive(Debug, Default)]
pub struct RecordingIndicator {
    pub events: Vec<Indication>,
}

impl BoardIndicator for RecordingIndicator {
    type Error = Infallible;

    async fn show(&mut self, from: Square, to: Square) -> Result<(), Self::Error> {
        self.events.push(Indication::Show(from, to));
        Ok(())
    }

    async fn invalid_move(&mut self) -> Result<(), Self::Error> {
        self.events.push(Indication::InvalidMove);
        Ok(())
    }

    async fn draw_offered(&mut self) -> Result<(), Self::Error> {
        self.events.push(Indication::DrawOffered);
        Ok(())
    }

    async fn power_down(&mut self) -> Result<(), Self::Error> {
        self.events.push(Indication::PowerDown);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingArchive {
    pub stored: Vec<(GameRecord, String)>,
}

impl GameArchive for RecordingArchive {
    type Error = Infallible;

    async fn store(&mut self, record: &GameRecord, pgn: &str) -> Result<(), Self::Error> {
        self.stored.push((record.clone(), pgn.to_string()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    StreamGame(String),
    MakeMove(String),
    Resign,
    OfferDraw,
    AcceptDraw,
    DeclineDraw,
    Seek(SeekConfig),
    CreateChallenge(String),
    AcceptChallenge(String),
    Export(String),
}

/// Remote session answering from queues and recording every call
#[derive(Default)]
pub struct ScriptedRemote {
    calls: RefCell<Vec<RemoteCall>>,
    move_results: RefCell<VecDeque<Result<(), RemoteError>>>,
    incoming: RefCell<Option<ScriptedStream<IncomingEvent>>>,
    games: RefCell<VecDeque<ScriptedStream<GameEvent>>>,
    seek_fails: Cell<bool>,
}

impl ScriptedRemote {
    pub fn with_incoming(events: Vec<Option<IncomingEvent>>) -> Self {
        let remote = Self::default();
        *remote.incoming.borrow_mut() = Some(ScriptedStream::new(events));
        remote
    }

    pub fn push_game(&self, events: Vec<Option<GameEvent>>) {
        self.games.borrow_mut().push_back(ScriptedStream::new(events));
    }

    /// Queue a `make_move` result; calls past the queue succeed
    pub fn push_move_result(&self, result: Result<(), RemoteError>) {
        self.move_results.borrow_mut().push_back(result);
    }

    pub fn fail_seek(&self) {
        self.seek_fails.set(true);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: RemoteCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl RemoteSession for ScriptedRemote {
    type IncomingStream = ScriptedStream<IncomingEvent>;
    type GameStream = ScriptedStream<GameEvent>;

    async fn stream_incoming_events(&self) -> Result<Self::IncomingStream, RemoteError> {
        Ok(self
            .incoming
            .borrow_mut()
            .take()
            .unwrap_or_else(|| ScriptedStream::new(Vec::new())))
    }

    async fn stream_game_state(&self, game_id: &GameId) -> Result<Self::GameStream, RemoteError> {
        self.record(RemoteCall::StreamGame(game_id.to_string()));
        self.games
            .borrow_mut()
            .pop_front()
            .ok_or(RemoteError::NotFound)
    }

    async fn make_move(&self, _game_id: &GameId, mv: &Move) -> Result<(), RemoteError> {
        self.record(RemoteCall::MakeMove(mv.to_token().as_str().to_string()));
        self.move_results.borrow_mut().pop_front().unwrap_or(Ok(()))
    }

    async fn resign(&self, _game_id: &GameId) -> Result<(), RemoteError> {
        self.record(RemoteCall::Resign);
        Ok(())
    }

    async fn offer_draw(&self, _game_id: &GameId) -> Result<(), RemoteError> {
        self.record(RemoteCall::OfferDraw);
        Ok(())
    }

    async fn accept_draw(&self, _game_id: &GameId) -> Result<(), RemoteError> {
        self.record(RemoteCall::AcceptDraw);
        Ok(())
    }

    async fn decline_draw(&self, _game_id: &GameId) -> Result<(), RemoteError> {
        self.record(RemoteCall::DeclineDraw);
        Ok(())
    }

    async fn seek(&self, seek: &SeekConfig) -> Result<(), RemoteError> {
        self.record(RemoteCall::Seek(*seek));
        if self.seek_fails.get() {
            Err(RemoteError::Rejected)
        } else {
            Ok(())
        }
    }

    async fn create_challenge(
        &self,
        user: &str,
        _options: &ChallengeOptions,
    ) -> Result<(), RemoteError> {
        self.record(RemoteCall::CreateChallenge(user.to_string()));
        Ok(())
    }

    async fn accept_challenge(&self, challenge_id: &str) -> Result<(), RemoteError> {
        self.record(RemoteCall::AcceptChallenge(challenge_id.to_string()));
        Ok(())
    }

    async fn export_game(&self, game_id: &GameId) -> Result<String, RemoteError> {
        self.record(RemoteCall::Export(game_id.to_string()));
        Ok(format!("[Site \"{}\"]\n\n*\n", game_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_run_completes() {
        assert_eq!(block_on_bounded(async { 7 }), 7);
    }

    #[test]
    #[should_panic(expected = "future stalled")]
    fn test_bounded_run_fails_on_stall() {
        let mut input = ScriptedInput::new(&[]);
        block_on_bounded(input.next_move());
    }
}

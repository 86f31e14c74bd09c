//! Board side of the protocol.
//!
//! [`BoardPeer`] models the controller firmware: button presses latch a
//! square pair and start the START stream, host commands drive the LEDs.
//! The host never runs this in production; it exists so the link can be
//! exercised end to end without hardware.

use crate::messages::Opcode;
use crate::square::Square;

/// LED pair lit after power-on (e1, d8)
pub const POWER_ON_PAIR: (Square, Square) = (Square::at(4, 0), Square::at(3, 7));

/// How the lit pair alternates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Blink {
    /// Normal rapid alternation, both squares appear lit
    Steady,
    /// Once per second
    DrawOffered,
    /// Four times per second
    InvalidMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Quiet,
    /// Sending START until acknowledged
    Announcing,
    /// Sending payload byte `n`
    Sending(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LedRx {
    Off,
    First,
    Second(u8),
}

/// Behavioral model of the board controller
#[derive(Debug, Clone)]
pub struct BoardPeer {
    latched: [u8; 2],
    second_press: bool,
    tx: TxState,
    led_rx: LedRx,
    lit: (Square, Square),
    blink: Blink,
    powered: bool,
}

impl Default for BoardPeer {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardPeer {
    pub fn new() -> Self {
        Self {
            latched: [0; 2],
            second_press: false,
            tx: TxState::Quiet,
            led_rx: LedRx::Off,
            lit: POWER_ON_PAIR,
            blink: Blink::Steady,
            powered: true,
        }
    }

    /// Press a square button
    ///
    /// The second press latches the pair and starts announcing.
    pub fn press(&mut self, square: Square) {
        self.powered = true;
        self.blink = Blink::Steady;

        if self.second_press {
            self.latched[1] = square.encode();
            self.second_press = false;
            self.tx = TxState::Announcing;
        } else {
            self.latched[0] = square.encode();
            self.second_press = true;
        }
    }

    /// Press `from` then `to`
    pub fn enter(&mut self, from: Square, to: Square) {
        self.press(from);
        self.press(to);
    }

    /// Next byte the board transmits, if any
    pub fn next_tx(&mut self) -> Option<u8> {
        match self.tx {
            TxState::Quiet => None,
            TxState::Announcing => Some(Opcode::Start.to_byte()),
            TxState::Sending(index) => {
                let byte = self.latched[index];
                self.tx = if index + 1 < self.latched.len() {
                    TxState::Sending(index + 1)
                } else {
                    TxState::Quiet
                };
                Some(byte)
            }
        }
    }

    /// Handle one byte from the host
    pub fn receive(&mut self, byte: u8) {
        let byte = byte & 0x7F;
        match Opcode::from_byte(byte) {
            Some(Opcode::Repeat) => {
                self.second_press = false;
                self.tx = TxState::Sending(0);
            }
            Some(Opcode::Ack) => {
                if self.tx == TxState::Announcing {
                    self.tx = TxState::Sending(0);
                }
            }
            Some(Opcode::Show) => {
                self.powered = true;
                self.led_rx = LedRx::First;
            }
            Some(Opcode::PowerDown) => {
                self.powered = false;
                self.second_press = false;
            }
            Some(Opcode::DrawOffered) => self.blink = Blink::DrawOffered,
            Some(Opcode::InvalidMove) => self.blink = Blink::InvalidMove,
            Some(Opcode::Start) | None => self.receive_led(byte),
        }
    }

    fn receive_led(&mut self, byte: u8) {
        match self.led_rx {
            LedRx::Off => {}
            LedRx::First => self.led_rx = LedRx::Second(byte),
            LedRx::Second(first) => {
                self.led_rx = LedRx::Off;
                if let (Some(a), Some(b)) = (Square::decode(first), Square::decode(byte)) {
                    self.lit = (a, b);
                }
            }
        }
    }

    /// Currently lit square pair
    pub fn lit(&self) -> (Square, Square) {
        self.lit
    }

    pub fn blink(&self) -> Blink {
        self.blink
    }

    /// False after a power-down command, until the next press or show
    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// True while START is being repeated
    pub fn is_announcing(&self) -> bool {
        self.tx == TxState::Announcing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameReceiver, ReceiveAction, RxInput};
    use crate::messages::BoardCommand;
    use crate::square::Move;

    fn sq(coord: &str) -> Square {
        Square::parse(coord).unwrap()
    }

    #[test]
    fn test_power_on_state() {
        let peer = BoardPeer::new();
        assert_eq!(peer.lit(), (sq("e1"), sq("d8")));
        assert_eq!(peer.blink(), Blink::Steady);
        assert!(peer.is_powered());
    }

    #[test]
    fn test_single_press_is_silent() {
        let mut peer = BoardPeer::new();
        peer.press(sq("e2"));
        assert_eq!(peer.next_tx(), None);
    }

    #[test]
    fn test_announce_until_ack() {
        let mut peer = BoardPeer::new();
        peer.enter(sq("e2"), sq("e4"));
        assert_eq!(peer.next_tx(), Some(b's'));
        assert_eq!(peer.next_tx(), Some(b's'));
        peer.receive(b'a');
        assert_eq!(peer.next_tx(), Some(sq("e2").encode()));
        assert_eq!(peer.next_tx(), Some(sq("e4").encode()));
        assert_eq!(peer.next_tx(), None);
    }

    #[test]
    fn test_repeat_resends_both_bytes() {
        let mut peer = BoardPeer::new();
        peer.enter(sq("a1"), sq("h8"));
        peer.receive(b'a');
        assert_eq!(peer.next_tx(), Some(sq("a1").encode()));
        peer.receive(b'r');
        assert_eq!(peer.next_tx(), Some(sq("a1").encode()));
        assert_eq!(peer.next_tx(), Some(sq("h8").encode()));
        assert_eq!(peer.next_tx(), None);
    }

    #[test]
    fn test_show_sets_lit_pair() {
        let mut peer = BoardPeer::new();
        for byte in BoardCommand::Show(sq("c2"), sq("f1")).to_bytes() {
            peer.receive(byte);
        }
        assert_eq!(peer.lit(), (sq("c2"), sq("f1")));
    }

    #[test]
    fn test_high_bit_is_masked() {
        let mut peer = BoardPeer::new();
        peer.receive(b'd' | 0x80);
        assert_eq!(peer.blink(), Blink::DrawOffered);
    }

    #[test]
    fn test_blink_and_power() {
        let mut peer = BoardPeer::new();
        peer.receive(b'i');
        assert_eq!(peer.blink(), Blink::InvalidMove);
        peer.receive(b'o');
        assert!(!peer.is_powered());

        peer.press(sq("d2"));
        assert!(peer.is_powered());
        assert_eq!(peer.blink(), Blink::Steady);
    }

    #[test]
    fn test_exchange_with_receiver() {
        let mut peer = BoardPeer::new();
        let mut rx = FrameReceiver::default();
        peer.enter(sq("g1"), sq("f3"));

        let mut frame = None;
        for _ in 0..16 {
            let input = match peer.next_tx() {
                Some(byte) => RxInput::Byte(byte),
                None => RxInput::Timeout,
            };
            match rx.feed(input).unwrap() {
                ReceiveAction::Ack => peer.receive(b'a'),
                ReceiveAction::Repeat => peer.receive(b'r'),
                ReceiveAction::Frame(f) => {
                    frame = Some(f);
                    break;
                }
                ReceiveAction::Wait | ReceiveAction::Idle => {}
            }
        }
        assert_eq!(frame.and_then(|f| f.to_move()), Move::parse("g1f3"));
    }
}

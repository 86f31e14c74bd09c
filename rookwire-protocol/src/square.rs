//! Board squares, moves, and the single-byte square codec
//!
//! A square is sent as `rank * 8 + file + OFFSET`. With `OFFSET = 33` the 64
//! squares occupy `b'!'..=b'`'`, so a payload byte can never collide with a
//! control byte (`'a'` and up).

use core::fmt;

use heapless::String;

/// Added to the 0-63 square index before transmission
pub const OFFSET: u8 = 33;

/// Squares per board
pub const SQUARE_COUNT: u8 = 64;

/// Highest byte a conformant peer sends for a square
pub const MAX_SQUARE_BYTE: u8 = OFFSET + SQUARE_COUNT - 1;

/// Longest move token (`e7e8q`)
pub const MAX_MOVE_LEN: usize = 5;

/// A board square, file a-h and rank 1-8 stored zero-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Create a square from zero-based file and rank
    pub const fn new(file: u8, rank: u8) -> Option<Self> {
        if file < 8 && rank < 8 {
            Some(Self { file, rank })
        } else {
            None
        }
    }

    /// Create a square in a constant context
    ///
    /// Panics (at compile time when used for a `const`) if out of range.
    pub const fn at(file: u8, rank: u8) -> Self {
        match Self::new(file, rank) {
            Some(square) => square,
            None => panic!("square out of range"),
        }
    }

    /// Create a square from its 0-63 index
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < SQUARE_COUNT {
            Some(Self {
                file: index % 8,
                rank: index / 8,
            })
        } else {
            None
        }
    }

    /// Zero-based file (0 = a)
    pub const fn file(self) -> u8 {
        self.file
    }

    /// Zero-based rank (0 = rank 1)
    pub const fn rank(self) -> u8 {
        self.rank
    }

    /// Rank as printed on the board (1-8)
    pub const fn rank_number(self) -> u8 {
        self.rank + 1
    }

    /// Index 0-63, a1 = 0, h8 = 63
    pub const fn index(self) -> u8 {
        self.rank * 8 + self.file
    }

    /// Encode for the wire
    pub const fn encode(self) -> u8 {
        self.index() + OFFSET
    }

    /// Decode a wire byte, rejecting anything outside the square range
    pub const fn decode(byte: u8) -> Option<Self> {
        if byte < OFFSET || byte > MAX_SQUARE_BYTE {
            return None;
        }
        Self::from_index(byte - OFFSET)
    }

    /// Check whether a byte is a valid encoded square
    pub const fn is_square_byte(byte: u8) -> bool {
        byte >= OFFSET && byte <= MAX_SQUARE_BYTE
    }

    /// Parse ASCII coordinates such as `b"e2"`
    pub fn from_ascii(file: u8, rank: u8) -> Option<Self> {
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return None;
        }
        Self::new(file - b'a', rank - b'1')
    }

    /// Parse a two-character coordinate (`"e2"`)
    pub fn parse(coord: &str) -> Option<Self> {
        match coord.as_bytes() {
            [file, rank] => Self::from_ascii(*file, *rank),
            _ => None,
        }
    }

    /// File letter
    pub const fn file_char(self) -> char {
        (b'a' + self.file) as char
    }

    /// Rank digit
    pub const fn rank_char(self) -> char {
        (b'1' + self.rank) as char
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Square {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let coord = [self.file_char() as u8, self.rank_char() as u8];
        match core::str::from_utf8(&coord) {
            Ok(coord) => serializer.serialize_str(coord),
            Err(_) => Err(serde::ser::Error::custom("square is not ascii")),
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Square {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SquareVisitor;

        impl serde::de::Visitor<'_> for SquareVisitor {
            type Value = Square;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a board coordinate such as \"e2\"")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Square, E> {
                Square::parse(v)
                    .ok_or_else(|| E::invalid_value(serde::de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_str(SquareVisitor)
    }
}

/// Promotion piece carried by remote move tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Promotion {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl Promotion {
    /// Parse the lowercase suffix letter
    pub fn from_ascii(byte: u8) -> Option<Self> {
        match byte {
            b'q' => Some(Promotion::Queen),
            b'r' => Some(Promotion::Rook),
            b'b' => Some(Promotion::Bishop),
            b'n' => Some(Promotion::Knight),
            _ => None,
        }
    }

    /// Lowercase suffix letter
    pub fn to_char(self) -> char {
        match self {
            Promotion::Queen => 'q',
            Promotion::Rook => 'r',
            Promotion::Bishop => 'b',
            Promotion::Knight => 'n',
        }
    }
}

/// A from/to square pair
///
/// When `from == to` this is not a board move but a sentinel command (the
/// same button pressed twice).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Promotion>,
}

impl Move {
    /// Create a move without promotion
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// Parse a coordinate token (`"e2e4"`, `"e7e8q"`)
    pub fn parse(token: &str) -> Option<Self> {
        let bytes = token.as_bytes();
        if bytes.len() != 4 && bytes.len() != 5 {
            return None;
        }
        let from = Square::from_ascii(bytes[0], bytes[1])?;
        let to = Square::from_ascii(bytes[2], bytes[3])?;
        let promotion = match bytes.get(4) {
            Some(&suffix) => Some(Promotion::from_ascii(suffix)?),
            None => None,
        };
        Some(Self {
            from,
            to,
            promotion,
        })
    }

    /// Same square twice
    pub fn is_sentinel(&self) -> bool {
        self.from == self.to
    }

    /// Encode as a two-byte payload
    pub const fn to_bytes(&self) -> [u8; 2] {
        [self.from.encode(), self.to.encode()]
    }

    /// Decode a two-byte payload
    pub const fn from_bytes(bytes: [u8; 2]) -> Option<Self> {
        let from = match Square::decode(bytes[0]) {
            Some(square) => square,
            None => return None,
        };
        let to = match Square::decode(bytes[1]) {
            Some(square) => square,
            None => return None,
        };
        Some(Self::new(from, to))
    }

    /// Coordinate token as sent to the remote server
    pub fn to_token(&self) -> String<MAX_MOVE_LEN> {
        let mut token = String::new();
        // Capacity covers the longest token
        let _ = token.push(self.from.file_char());
        let _ = token.push(self.from.rank_char());
        let _ = token.push(self.to.file_char());
        let _ = token.push(self.to.rank_char());
        if let Some(promotion) = self.promotion {
            let _ = token.push(promotion.to_char());
        }
        token
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.to_char())?;
        }
        Ok(())
    }
}

//! Leaf wire entities shared by every message.

use std::collections::{BTreeMap, BTreeSet};

use crate::buffer::{Reader, Writer};
use crate::error::{WireError, WireResult};

/// A value with a fixed binary layout on the wire.
///
/// Implementations are a closed set: every message kind gets exactly one
/// `encode` and one `decode`, and variant types lead with a single
/// discriminant byte.
pub trait Wire: Sized {
    /// Appends the encoding of `self` to `w`.
    fn encode(&self, w: &mut Writer) -> WireResult<()>;

    /// Decodes one value from `r`, consuming exactly its bytes.
    fn decode(r: &mut Reader<'_>) -> WireResult<Self>;
}

impl Wire for u8 {
    fn encode(&self, w: &mut Writer) -> WireResult<()> {
        w.write_u8(*self)
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        r.read_u8()
    }
}

impl Wire for u16 {
    fn encode(&self, w: &mut Writer) -> WireResult<()> {
        w.write_u16(*self)
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        r.read_u16()
    }
}

impl Wire for u32 {
    fn encode(&self, w: &mut Writer) -> WireResult<()> {
        w.write_u32(*self)
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        r.read_u32()
    }
}

impl Wire for String {
    fn encode(&self, w: &mut Writer) -> WireResult<()> {
        w.write_string(self)
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        r.read_string()
    }
}

/// `list<T>`: `u32` count followed by the elements.
impl<T: Wire> Wire for Vec<T> {
    fn encode(&self, w: &mut Writer) -> WireResult<()> {
        w.write_count(self.len())?;
        for item in self {
            item.encode(w)?;
        }
        Ok(())
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        let count = r.read_count()?;
        let mut items = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            items.push(T::decode(r)?);
        }
        Ok(items)
    }
}

/// `map<K, V>`: `u32` count followed by key/value pairs.
///
/// A `BTreeMap` serializes in ascending key order by construction, which
/// keeps encodings deterministic; any key order is accepted on decode.
impl<K: Wire + Ord, V: Wire> Wire for BTreeMap<K, V> {
    fn encode(&self, w: &mut Writer) -> WireResult<()> {
        w.write_count(self.len())?;
        for (key, value) in self {
            key.encode(w)?;
            value.encode(w)?;
        }
        Ok(())
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        let count = r.read_count()?;
        let mut map = BTreeMap::new();
        for _ in 0..count {
            let key = K::decode(r)?;
            let value = V::decode(r)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

/// A cell on the game grid.
///
/// `Ord` is x-then-y; it keys ordered block sets and breaks ties in the
/// server's bomb heap, so the derive order matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    /// Column, in `[0, size_x)`.
    pub x: u16,
    /// Row, in `[0, size_y)`.
    pub y: u16,
}

impl Position {
    /// Creates a position.
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

impl Wire for Position {
    fn encode(&self, w: &mut Writer) -> WireResult<()> {
        w.write_u16(self.x)?;
        w.write_u16(self.y)
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        Ok(Self {
            x: r.read_u16()?,
            y: r.read_u16()?,
        })
    }
}

/// A joined player as seen on the wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Player {
    /// Display name, as sent in `Join`.
    pub name: String,
    /// Remote address of the player's connection.
    pub address: String,
}

impl Wire for Player {
    fn encode(&self, w: &mut Writer) -> WireResult<()> {
        w.write_string(&self.name)?;
        w.write_string(&self.address)
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        Ok(Self {
            name: r.read_string()?,
            address: r.read_string()?,
        })
    }
}

/// An active bomb in the draw message: where it sits and how many turns
/// remain until it explodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BombInfo {
    /// Grid cell the bomb occupies.
    pub position: Position,
    /// Turns left until explosion.
    pub timer: u16,
}

impl Wire for BombInfo {
    fn encode(&self, w: &mut Writer) -> WireResult<()> {
        self.position.encode(w)?;
        w.write_u16(self.timer)
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        Ok(Self {
            position: Position::decode(r)?,
            timer: r.read_u16()?,
        })
    }
}

/// A movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    /// +y
    Up = 0,
    /// +x
    Right = 1,
    /// −y
    Down = 2,
    /// −x
    Left = 3,
}

impl TryFrom<u8> for Direction {
    type Error = WireError;

    fn try_from(value: u8) -> WireResult<Self> {
        match value {
            0 => Ok(Self::Up),
            1 => Ok(Self::Right),
            2 => Ok(Self::Down),
            3 => Ok(Self::Left),
            other => Err(WireError::BadType(other)),
        }
    }
}

impl Wire for Direction {
    fn encode(&self, w: &mut Writer) -> WireResult<()> {
        w.write_u8(*self as u8)
    }

    fn decode(r: &mut Reader<'_>) -> WireResult<Self> {
        Self::try_from(r.read_u8()?)
    }
}

/// Projects an ordered block set onto the wire `list` representation.
pub fn block_list(blocks: &BTreeSet<Position>) -> Vec<Position> {
    blocks.iter().copied().collect()
}

//! Window slot arguments

use std::fmt;

use crate::args;
use crate::error::ArgError;

/// Wire value standing for [`Slot::Unset`]
pub const UNSET: i32 = -1;

/// A slot index argument, or "unset" meaning the session's current slot
///
/// Unset is kept through parsing and transport; it is resolved only when the
/// command executes, against the state at that moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Slot {
    #[default]
    Unset,
    At(u32),
}

impl Slot {
    /// Parse an index argument in `0..=i32::MAX`
    pub fn parse(text: &str) -> Result<Self, ArgError> {
        let index = args::ranged("index", text, 0, i64::from(i32::MAX))?;
        u32::try_from(index)
            .map(Slot::At)
            .map_err(|_| ArgError::Range {
                what: "index",
                problem: "invalid",
            })
    }

    /// Parse an optional flag value, absent meaning unset
    pub fn parse_opt(text: Option<&str>) -> Result<Self, ArgError> {
        text.map_or(Ok(Slot::Unset), Slot::parse)
    }

    /// Decode a wire value; every negative value means unset
    pub fn from_wire(value: i32) -> Self {
        u32::try_from(value).map_or(Slot::Unset, Slot::At)
    }

    /// Encode for the wire
    pub fn to_wire(self) -> i32 {
        match self {
            Slot::Unset => UNSET,
            Slot::At(index) => i32::try_from(index).unwrap_or(i32::MAX),
        }
    }

    /// The explicit index, if any
    pub fn index(self) -> Option<u32> {
        match self {
            Slot::Unset => None,
            Slot::At(index) => Some(index),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Unset => write!(f, "current"),
            Slot::At(index) => write!(f, "{}", index),
        }
    }
}

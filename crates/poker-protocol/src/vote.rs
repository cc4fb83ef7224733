//! The estimate deck.
//!
//! Votes are restricted to a fixed, ordered set of cards:
//! `0, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, "?"`. Numeric cards travel as JSON
//! numbers, the "unknown" card travels as the string `"?"`. Anything else is
//! rejected at decode time, so a `VoteValue` in hand is always a valid card.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One card of the estimate deck.
///
/// The derived ordering follows deck order, with `Unknown` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VoteValue {
    Zero,
    One,
    Two,
    Three,
    Five,
    Eight,
    Thirteen,
    TwentyOne,
    ThirtyFour,
    FiftyFive,
    EightyNine,
    /// "?" - abstain / no idea. Excluded from numeric aggregation.
    Unknown,
}

impl VoteValue {
    /// The whole deck, in order.
    pub const DECK: [VoteValue; 12] = [
        VoteValue::Zero,
        VoteValue::One,
        VoteValue::Two,
        VoteValue::Three,
        VoteValue::Five,
        VoteValue::Eight,
        VoteValue::Thirteen,
        VoteValue::TwentyOne,
        VoteValue::ThirtyFour,
        VoteValue::FiftyFive,
        VoteValue::EightyNine,
        VoteValue::Unknown,
    ];

    /// Literal used on the wire for the unknown card.
    pub const UNKNOWN_LITERAL: &'static str = "?";

    /// Numeric value of the card, or `None` for `?`.
    #[must_use]
    pub const fn points(self) -> Option<u8> {
        match self {
            VoteValue::Zero => Some(0),
            VoteValue::One => Some(1),
            VoteValue::Two => Some(2),
            VoteValue::Three => Some(3),
            VoteValue::Five => Some(5),
            VoteValue::Eight => Some(8),
            VoteValue::Thirteen => Some(13),
            VoteValue::TwentyOne => Some(21),
            VoteValue::ThirtyFour => Some(34),
            VoteValue::FiftyFive => Some(55),
            VoteValue::EightyNine => Some(89),
            VoteValue::Unknown => None,
        }
    }

    /// Look up the numeric card with the given value.
    #[must_use]
    pub fn from_points(points: u64) -> Option<Self> {
        Self::DECK
            .into_iter()
            .find(|card| card.points().map(u64::from) == Some(points))
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.points() {
            Some(points) => write!(f, "{points}"),
            None => f.write_str(Self::UNKNOWN_LITERAL),
        }
    }
}

impl Serialize for VoteValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // serde_json renders integer map keys as strings, so this also yields
        // `"5"` / `"?"` keys inside a stats distribution.
        match self.points() {
            Some(points) => serializer.serialize_u8(points),
            None => serializer.serialize_str(Self::UNKNOWN_LITERAL),
        }
    }
}

impl<'de> Deserialize<'de> for VoteValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(VoteValueVisitor)
    }
}

struct VoteValueVisitor;

impl Visitor<'_> for VoteValueVisitor {
    type Value = VoteValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("one of 0, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89 or \"?\"")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<VoteValue, E> {
        VoteValue::from_points(v).ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<VoteValue, E> {
        u64::try_from(v)
            .ok()
            .and_then(VoteValue::from_points)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<VoteValue, E> {
        // Browsers may send `5.0`; only whole numbers can name a card.
        if v.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(&v) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let whole = v as u64;
            if let Some(card) = VoteValue::from_points(whole) {
                return Ok(card);
            }
        }
        Err(E::invalid_value(de::Unexpected::Float(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<VoteValue, E> {
        if v == VoteValue::UNKNOWN_LITERAL {
            Ok(VoteValue::Unknown)
        } else {
            Err(E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}

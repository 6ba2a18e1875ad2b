//! Shared types, error definitions, and constants for the Raahi agent.
//!
//! This crate provides the foundational types used across all Raahi crates:
//! the closed-set enums that make up a conversation's state, the persisted
//! [`TripState`] itself, and the knowledge document model.
//!
//! Every enum here has a canonical lowercase wire form and a lenient parser.
//! External services (the reasoning model in particular) return these values
//! as loosely-typed strings; deserialization coerces them into variants at the
//! boundary and rejects anything unrecognized.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

mod knowledge;
mod trip;
pub mod voice;

pub use knowledge::KnowledgeDocument;
pub use trip::{Preferences, Slot, TripState, UserInfo};

/// Idle window after which a session is forgotten.
pub const SESSION_TTL_SECONDS: u64 = 300;

/// Number of knowledge documents retrieved per turn.
pub const CONTEXT_DOCUMENTS_PER_TURN: usize = 2;

/// Prefix of the signaling room a caller joins.
pub const ROOM_PREFIX: &str = "trip_";

/// Returns the signaling room name for a caller's phone.
pub fn room_name(phone: &str) -> String {
    format!("{ROOM_PREFIX}{phone}")
}

/// Returns `true` if the text contains any Devanagari characters.
///
/// Used to pick the Hindi register for canned replies and the Hindi voice for
/// synthesis.
pub fn contains_devanagari(text: &str) -> bool {
    text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c))
}

/// Error returned when a wire string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {kind}: {value:?}")]
pub struct ParseEnumError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Lowercases, trims, and folds `-` and spaces into `_`.
fn normalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Implements `FromStr`, `TryFrom<String>`, `From<_> for String` and
/// `Display` for an enum with `as_str` and `parse_normalized`.
macro_rules! wire_enum {
    ($ty:ident, $kind:literal) => {
        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse_normalized(&normalize(s)).ok_or_else(|| ParseEnumError {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ParseEnumError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// What the agent is doing this turn.
///
/// The reasoning step picks the intent; the orchestrator only constrains
/// [`Intent::CreateTrip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Intent {
    /// Opening greeting. Initial value for a fresh session.
    #[default]
    Greet,
    AskSource,
    AskDestination,
    AskTripType,
    /// Asks for the start date, or the return date on a round trip.
    AskDate,
    AskPreferences,
    /// All slots filled; summarize and ask for a go-ahead.
    ConfirmTrip,
    /// The caller confirmed; the booking gate may fire.
    CreateTrip,
    /// A domain question answered from retrieved knowledge.
    General,
    Unknown,
}

impl Intent {
    /// Returns the canonical wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greet => "greet",
            Self::AskSource => "ask_source",
            Self::AskDestination => "ask_destination",
            Self::AskTripType => "ask_trip_type",
            Self::AskDate => "ask_date",
            Self::AskPreferences => "ask_preferences",
            Self::ConfirmTrip => "confirm_trip",
            Self::CreateTrip => "create_trip",
            Self::General => "general",
            Self::Unknown => "unknown",
        }
    }

    fn parse_normalized(s: &str) -> Option<Self> {
        match s {
            "greet" | "greeting" => Some(Self::Greet),
            "ask_source" => Some(Self::AskSource),
            "ask_destination" => Some(Self::AskDestination),
            "ask_trip_type" => Some(Self::AskTripType),
            "ask_date" => Some(Self::AskDate),
            "ask_preferences" => Some(Self::AskPreferences),
            "confirm_trip" => Some(Self::ConfirmTrip),
            "create_trip" => Some(Self::CreateTrip),
            "general" => Some(Self::General),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

wire_enum!(Intent, "intent");

/// Whether the caller wants a return leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TripType {
    OneWay,
    RoundTrip,
    #[default]
    NotDecided,
}

impl TripType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneWay => "one_way",
            Self::RoundTrip => "round_trip",
            Self::NotDecided => "not_decided",
        }
    }

    fn parse_normalized(s: &str) -> Option<Self> {
        match s {
            "one_way" | "oneway" => Some(Self::OneWay),
            "round_trip" | "roundtrip" => Some(Self::RoundTrip),
            "not_decided" | "undecided" | "" => Some(Self::NotDecided),
            _ => None,
        }
    }
}

wire_enum!(TripType, "trip type");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VehicleType {
    Suv,
    Sedan,
    Hatchback,
    #[default]
    None,
}

impl VehicleType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Suv => "suv",
            Self::Sedan => "sedan",
            Self::Hatchback => "hatchback",
            Self::None => "none",
        }
    }

    fn parse_normalized(s: &str) -> Option<Self> {
        match s {
            "suv" => Some(Self::Suv),
            "sedan" => Some(Self::Sedan),
            "hatchback" => Some(Self::Hatchback),
            "none" | "" => Some(Self::None),
            _ => None,
        }
    }
}

wire_enum!(VehicleType, "vehicle type");

/// Conversation language preference.
///
/// Hinglish callers are answered in the Hindi register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    English,
    Hindi,
    #[default]
    Unset,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Unset => "xx",
        }
    }

    fn parse_normalized(s: &str) -> Option<Self> {
        match s {
            "en" | "english" | "en_in" | "en_us" => Some(Self::English),
            "hi" | "hindi" | "hinglish" | "hi_in" => Some(Self::Hindi),
            "xx" | "unset" | "none" | "" => Some(Self::Unset),
            _ => None,
        }
    }
}

wire_enum!(Language, "language");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_wire_strings_parse_back() {
        for intent in [
            Intent::Greet,
            Intent::AskSource,
            Intent::AskDestination,
            Intent::AskTripType,
            Intent::AskDate,
            Intent::AskPreferences,
            Intent::ConfirmTrip,
            Intent::CreateTrip,
            Intent::General,
            Intent::Unknown,
        ] {
            assert_eq!(intent.as_str().parse::<Intent>(), Ok(intent));
        }
    }

    #[test]
    fn enum_parsing_is_lenient_about_case_and_separators() {
        assert_eq!("CREATE_TRIP".parse::<Intent>(), Ok(Intent::CreateTrip));
        assert_eq!("Ask-Source".parse::<Intent>(), Ok(Intent::AskSource));
        assert_eq!("ROUND TRIP".parse::<TripType>(), Ok(TripType::RoundTrip));
        assert_eq!("SUV".parse::<VehicleType>(), Ok(VehicleType::Suv));
        assert_eq!("Hinglish".parse::<Language>(), Ok(Language::Hindi));
        assert_eq!("".parse::<Language>(), Ok(Language::Unset));
    }

    #[test]
    fn unknown_values_are_rejected() {
        let err = "book_now".parse::<Intent>().unwrap_err();
        assert_eq!(err.kind, "intent");
        assert_eq!(err.value, "book_now");
        assert!("bus".parse::<VehicleType>().is_err());
        assert!("french".parse::<Language>().is_err());
        assert!("".parse::<Intent>().is_err());
    }

    #[test]
    fn enums_serialize_to_canonical_strings() {
        let json = serde_json::to_string(&Intent::AskTripType).unwrap();
        assert_eq!(json, "\"ask_trip_type\"");
        let json = serde_json::to_string(&Language::Unset).unwrap();
        assert_eq!(json, "\"xx\"");
        let parsed: TripType = serde_json::from_str("\"ONE_WAY\"").unwrap();
        assert_eq!(parsed, TripType::OneWay);
        assert!(serde_json::from_str::<TripType>("\"multi_city\"").is_err());
    }

    #[test]
    fn devanagari_detection() {
        assert!(contains_devanagari("बहुत बढ़िया"));
        assert!(contains_devanagari("Okay, आपकी trip"));
        assert!(!contains_devanagari("Aap kahan jaana chahte hain?"));
    }

    #[test]
    fn room_name_uses_phone() {
        assert_eq!(room_name("9999999999"), "trip_9999999999");
    }
}

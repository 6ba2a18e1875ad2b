//! The per-caller conversation state.

use serde::{Deserialize, Serialize};

use crate::{Intent, Language, TripType, VehicleType};

/// Caller identity bound to a session. `phone` is the session key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub phone: String,
}

impl UserInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone: phone.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub language: Language,
}

impl Preferences {
    /// The vehicle is the only preference the agent insists on.
    pub fn is_complete(&self) -> bool {
        self.vehicle_type != VehicleType::None
    }
}

/// A mandatory slot, in the order the conversation elicits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Source,
    Destination,
    TripType,
    StartDate,
    /// Only mandatory on a round trip.
    EndDate,
}

impl Slot {
    /// The intent whose job is to ask for this slot.
    pub fn ask_intent(self) -> Intent {
        match self {
            Self::Source => Intent::AskSource,
            Self::Destination => Intent::AskDestination,
            Self::TripType => Intent::AskTripType,
            Self::StartDate | Self::EndDate => Intent::AskDate,
        }
    }
}

/// The single persisted unit per caller.
///
/// Slots use the empty string for "unset". The reasoning step returns a full
/// next state each turn; it replaces the previous one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripState {
    pub intent: Intent,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub trip_type: TripType,
    #[serde(default)]
    pub trip_start_date: String,
    #[serde(default)]
    pub trip_end_date: String,
    #[serde(default)]
    pub preferences: Preferences,
    /// Monotonic within a session: once true it never goes back.
    #[serde(default)]
    pub trip_created: bool,
    #[serde(default)]
    pub agent_response: String,
    pub user: UserInfo,
}

impl TripState {
    /// The state of a brand new (or expired) session.
    pub fn initial(user: UserInfo) -> Self {
        Self {
            intent: Intent::Greet,
            source: String::new(),
            destination: String::new(),
            trip_type: TripType::NotDecided,
            trip_start_date: String::new(),
            trip_end_date: String::new(),
            preferences: Preferences::default(),
            trip_created: false,
            agent_response: String::new(),
            user,
        }
    }

    /// Returns the first mandatory slot that is still empty, in elicitation
    /// order.
    pub fn first_missing_slot(&self) -> Option<Slot> {
        if is_blank(&self.source) {
            Some(Slot::Source)
        } else if is_blank(&self.destination) {
            Some(Slot::Destination)
        } else if self.trip_type == TripType::NotDecided {
            Some(Slot::TripType)
        } else if is_blank(&self.trip_start_date) {
            Some(Slot::StartDate)
        } else if self.trip_type == TripType::RoundTrip && is_blank(&self.trip_end_date) {
            Some(Slot::EndDate)
        } else {
            None
        }
    }

    pub fn mandatory_slots_filled(&self) -> bool {
        self.first_missing_slot().is_none()
    }

    /// A one-way trip ends the day it starts. Fills the end date from the
    /// start date when it is missing; returns whether anything changed.
    pub fn infer_one_way_end_date(&mut self) -> bool {
        if self.trip_type == TripType::OneWay
            && is_blank(&self.trip_end_date)
            && !is_blank(&self.trip_start_date)
        {
            self.trip_end_date = self.trip_start_date.clone();
            true
        } else {
            false
        }
    }

    /// Returns `true` if `agent_response` holds anything to say.
    pub fn has_response(&self) -> bool {
        !is_blank(&self.agent_response)
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_one_way() -> TripState {
        let mut state = TripState::initial(UserInfo::new("u1", "Asha", "9999999999"));
        state.source = "Noida".to_string();
        state.destination = "Agra".to_string();
        state.trip_type = TripType::OneWay;
        state.trip_start_date = "2026-10-21T09:00:00".to_string();
        state
    }

    #[test]
    fn initial_state_is_a_greeting_with_no_slots() {
        let state = TripState::initial(UserInfo::new("u1", "Asha", "9999999999"));
        assert_eq!(state.intent, Intent::Greet);
        assert_eq!(state.trip_type, TripType::NotDecided);
        assert_eq!(state.preferences.vehicle_type, VehicleType::None);
        assert_eq!(state.preferences.language, Language::Unset);
        assert!(!state.trip_created);
        assert_eq!(state.first_missing_slot(), Some(Slot::Source));
        assert_eq!(state.user.phone, "9999999999");
    }

    #[test]
    fn missing_slots_follow_elicitation_order() {
        let mut state = TripState::initial(UserInfo::default());
        state.source = "Noida".to_string();
        assert_eq!(state.first_missing_slot(), Some(Slot::Destination));
        state.destination = "Agra".to_string();
        assert_eq!(state.first_missing_slot(), Some(Slot::TripType));
        state.trip_type = TripType::RoundTrip;
        assert_eq!(state.first_missing_slot(), Some(Slot::StartDate));
        state.trip_start_date = "2026-10-21".to_string();
        assert_eq!(state.first_missing_slot(), Some(Slot::EndDate));
        assert_eq!(Slot::EndDate.ask_intent(), Intent::AskDate);
        state.trip_end_date = "2026-10-23".to_string();
        assert!(state.mandatory_slots_filled());
    }

    #[test]
    fn one_way_trip_does_not_need_an_end_date() {
        let mut state = filled_one_way();
        assert!(state.mandatory_slots_filled());
        assert!(state.infer_one_way_end_date());
        assert_eq!(state.trip_end_date, state.trip_start_date);
        assert!(!state.infer_one_way_end_date(), "second call is a no-op");
    }

    #[test]
    fn whitespace_counts_as_unset() {
        let mut state = filled_one_way();
        state.destination = "   ".to_string();
        assert_eq!(state.first_missing_slot(), Some(Slot::Destination));
    }

    #[test]
    fn state_json_uses_camel_case_fields() {
        let state = filled_one_way();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["tripType"], "one_way");
        assert_eq!(json["tripStartDate"], "2026-10-21T09:00:00");
        assert_eq!(json["preferences"]["vehicleType"], "none");
        assert_eq!(json["tripCreated"], false);
        assert_eq!(json["user"]["phone"], "9999999999");
    }

    #[test]
    fn missing_trip_created_defaults_to_false() {
        let json = serde_json::json!({
            "intent": "confirm_trip",
            "agentResponse": "Shall I book it?",
            "source": "Noida",
            "destination": "Agra",
            "tripStartDate": "2026-10-21",
            "tripEndDate": "",
            "tripType": "ONE_WAY",
            "preferences": { "vehicleType": "SEDAN", "language": "en" },
            "user": { "id": "u1", "name": "Asha", "phone": "9999999999" }
        });
        let state: TripState = serde_json::from_value(json).unwrap();
        assert!(!state.trip_created);
        assert_eq!(state.trip_type, TripType::OneWay);
        assert_eq!(state.preferences.vehicle_type, VehicleType::Sedan);
        assert!(state.preferences.is_complete());
    }
}

// MIT License - Copyright (c) 2026 Peter Wright
// Panel state translation

use std::fmt;

use crate::error::{Result, SyncError};

/// HomeKit security-system code for "stay armed". Accepted on input only.
pub const STAY_ARM: u8 = 0;
/// HomeKit security-system code for "away armed".
pub const AWAY_ARM: u8 = 1;
/// HomeKit security-system code for "night armed".
pub const NIGHT_ARM: u8 = 2;
/// HomeKit security-system code for "disarmed".
pub const DISARMED: u8 = 3;

/// Panel state as reported by the Yale Sync service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelState {
    /// Fully armed
    Armed,
    /// Part armed (home/night)
    Home,
    Disarmed,
}

impl PanelState {
    /// Parse the service's wire name. Case-insensitive, surrounding whitespace ignored.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "armed" => Some(Self::Armed),
            "home" => Some(Self::Home),
            "disarmed" => Some(Self::Disarmed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Armed => "armed",
            Self::Home => "home",
            Self::Disarmed => "disarmed",
        }
    }

    pub fn to_observed(self) -> ObservedState {
        to_observed(self)
    }
}

impl fmt::Display for PanelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Security-system state as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservedState {
    AwayArmed,
    NightArmed,
    Disarmed,
}

impl ObservedState {
    /// The HomeKit characteristic code for this state.
    pub fn code(&self) -> u8 {
        match self {
            Self::AwayArmed => AWAY_ARM,
            Self::NightArmed => NIGHT_ARM,
            Self::Disarmed => DISARMED,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwayArmed => "AWAY_ARM",
            Self::NightArmed => "NIGHT_ARM",
            Self::Disarmed => "DISARMED",
        }
    }

    pub fn to_native(self) -> PanelState {
        match self {
            Self::AwayArmed => PanelState::Armed,
            Self::NightArmed => PanelState::Home,
            Self::Disarmed => PanelState::Disarmed,
        }
    }
}

impl fmt::Display for ObservedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a panel state to the state shown to the host.
pub fn to_observed(state: PanelState) -> ObservedState {
    match state {
        PanelState::Armed => ObservedState::AwayArmed,
        PanelState::Home => ObservedState::NightArmed,
        PanelState::Disarmed => ObservedState::Disarmed,
    }
}

/// Map a requested characteristic code to the panel state to set.
///
/// Stay and night both collapse to [`PanelState::Home`]; the panel has a
/// single part-armed mode.
pub fn to_native(code: u8) -> Result<PanelState> {
    match code {
        AWAY_ARM => Ok(PanelState::Armed),
        STAY_ARM | NIGHT_ARM => Ok(PanelState::Home),
        DISARMED => Ok(PanelState::Disarmed),
        other => Err(SyncError::UnrecognizedState {
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_NATIVE: [PanelState; 3] = [PanelState::Armed, PanelState::Home, PanelState::Disarmed];

    #[test]
    fn test_forward_mapping() {
        assert_eq!(to_observed(PanelState::Armed), ObservedState::AwayArmed);
        assert_eq!(to_observed(PanelState::Home), ObservedState::NightArmed);
        assert_eq!(to_observed(PanelState::Disarmed), ObservedState::Disarmed);
    }

    #[test]
    fn test_native_roundtrip() {
        for state in ALL_NATIVE {
            assert_eq!(to_native(to_observed(state).code()).unwrap(), state);
            assert_eq!(state.to_observed().to_native(), state);
        }
    }

    #[test]
    fn test_stay_and_night_collapse_to_home() {
        assert_eq!(to_native(STAY_ARM).unwrap(), PanelState::Home);
        assert_eq!(to_native(NIGHT_ARM).unwrap(), PanelState::Home);
    }

    #[test]
    fn test_unrecognized_code() {
        for code in [4u8, 7, 255] {
            match to_native(code) {
                Err(SyncError::UnrecognizedState { value }) => assert_eq!(value, code.to_string()),
                other => panic!("expected UnrecognizedState, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_stay_is_never_reported() {
        let reported: Vec<u8> = [PanelState::Armed, PanelState::Home, PanelState::Disarmed]
            .into_iter()
            .map(|s| to_observed(s).code())
            .collect();
        assert_eq!(reported, vec![AWAY_ARM, NIGHT_ARM, DISARMED]);
        assert!(!reported.contains(&STAY_ARM));
    }

    #[test]
    fn test_panel_state_from_name() {
        assert_eq!(PanelState::from_name("armed"), Some(PanelState::Armed));
        assert_eq!(PanelState::from_name(" Home "), Some(PanelState::Home));
        assert_eq!(PanelState::from_name("DISARMED"), Some(PanelState::Disarmed));
        assert_eq!(PanelState::from_name("alarm"), None);
        assert_eq!(PanelState::from_name(""), None);
    }
}

//! Action codes identifying the semantic type of every envelope

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Message type tag carried in the `action` field of every envelope.
///
/// The set is versioned together with the service API and is additive-only:
/// existing string values are never reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionCode {
    InputAction,

    ConfigurationState,
    ConfigurationResponse,
    SetConfigurationState,
    RequestConfigurationState,

    VersionHandshake,
    VersionHandshakeResponse,

    HandPresenceEvent,

    RequestServiceStatus,
    ServiceStatusResponse,
    ServiceStatus,

    RequestConfigurationFile,
    ConfigurationFileState,
    SetConfigurationFile,
    ConfigurationFileChangeResponse,

    QuickSetup,
    QuickSetupConfig,
    QuickSetupResponse,

    GetTrackingState,
    SetTrackingState,
    TrackingState,

    SetHandDataStreamState,

    InteractionZoneEvent,

    ResetInteractionConfigFile,

    AnalyticsSessionRequest,
    AnalyticsUpdateSessionEventsRequest,

    GetLicenseState,
    LicenseState,
    LicenseStateResponse,
    AddLicenseKey,
    RemoveLicenseKey,
    LicenseChangeResponse,
}

impl ActionCode {
    /// Every known action code, in declaration order
    pub const ALL: &'static [ActionCode] = &[
        ActionCode::InputAction,
        ActionCode::ConfigurationState,
        ActionCode::ConfigurationResponse,
        ActionCode::SetConfigurationState,
        ActionCode::RequestConfigurationState,
        ActionCode::VersionHandshake,
        ActionCode::VersionHandshakeResponse,
        ActionCode::HandPresenceEvent,
        ActionCode::RequestServiceStatus,
        ActionCode::ServiceStatusResponse,
        ActionCode::ServiceStatus,
        ActionCode::RequestConfigurationFile,
        ActionCode::ConfigurationFileState,
        ActionCode::SetConfigurationFile,
        ActionCode::ConfigurationFileChangeResponse,
        ActionCode::QuickSetup,
        ActionCode::QuickSetupConfig,
        ActionCode::QuickSetupResponse,
        ActionCode::GetTrackingState,
        ActionCode::SetTrackingState,
        ActionCode::TrackingState,
        ActionCode::SetHandDataStreamState,
        ActionCode::InteractionZoneEvent,
        ActionCode::ResetInteractionConfigFile,
        ActionCode::AnalyticsSessionRequest,
        ActionCode::AnalyticsUpdateSessionEventsRequest,
        ActionCode::GetLicenseState,
        ActionCode::LicenseState,
        ActionCode::LicenseStateResponse,
        ActionCode::AddLicenseKey,
        ActionCode::RemoveLicenseKey,
        ActionCode::LicenseChangeResponse,
    ];

    /// The wire string for this code
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionCode::InputAction => "INPUT_ACTION",
            ActionCode::ConfigurationState => "CONFIGURATION_STATE",
            ActionCode::ConfigurationResponse => "CONFIGURATION_RESPONSE",
            ActionCode::SetConfigurationState => "SET_CONFIGURATION_STATE",
            ActionCode::RequestConfigurationState => "REQUEST_CONFIGURATION_STATE",
            ActionCode::VersionHandshake => "VERSION_HANDSHAKE",
            ActionCode::VersionHandshakeResponse => "VERSION_HANDSHAKE_RESPONSE",
            ActionCode::HandPresenceEvent => "HAND_PRESENCE_EVENT",
            ActionCode::RequestServiceStatus => "REQUEST_SERVICE_STATUS",
            ActionCode::ServiceStatusResponse => "SERVICE_STATUS_RESPONSE",
            ActionCode::ServiceStatus => "SERVICE_STATUS",
            ActionCode::RequestConfigurationFile => "REQUEST_CONFIGURATION_FILE",
            ActionCode::ConfigurationFileState => "CONFIGURATION_FILE_STATE",
            ActionCode::SetConfigurationFile => "SET_CONFIGURATION_FILE",
            ActionCode::ConfigurationFileChangeResponse => "CONFIGURATION_FILE_CHANGE_RESPONSE",
            ActionCode::QuickSetup => "QUICK_SETUP",
            ActionCode::QuickSetupConfig => "QUICK_SETUP_CONFIG",
            ActionCode::QuickSetupResponse => "QUICK_SETUP_RESPONSE",
            ActionCode::GetTrackingState => "GET_TRACKING_STATE",
            ActionCode::SetTrackingState => "SET_TRACKING_STATE",
            ActionCode::TrackingState => "TRACKING_STATE",
            ActionCode::SetHandDataStreamState => "SET_HAND_DATA_STREAM_STATE",
            ActionCode::InteractionZoneEvent => "INTERACTION_ZONE_EVENT",
            ActionCode::ResetInteractionConfigFile => "RESET_INTERACTION_CONFIG_FILE",
            ActionCode::AnalyticsSessionRequest => "ANALYTICS_SESSION_REQUEST",
            ActionCode::AnalyticsUpdateSessionEventsRequest => {
                "ANALYTICS_UPDATE_SESSION_EVENTS_REQUEST"
            }
            ActionCode::GetLicenseState => "GET_LICENSE_STATE",
            ActionCode::LicenseState => "LICENSE_STATE",
            ActionCode::LicenseStateResponse => "LICENSE_STATE_RESPONSE",
            ActionCode::AddLicenseKey => "ADD_LICENSE_KEY",
            ActionCode::RemoveLicenseKey => "REMOVE_LICENSE_KEY",
            ActionCode::LicenseChangeResponse => "LICENSE_CHANGE_RESPONSE",
        }
    }
}

impl fmt::Display for ActionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an envelope names an action code this client does not know
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownActionCode(pub String);

impl fmt::Display for UnknownActionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action code '{}'", self.0)
    }
}

impl std::error::Error for UnknownActionCode {}

impl FromStr for ActionCode {
    type Err = UnknownActionCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownActionCode(s.to_string()))
    }
}

//! Envelope and payload types exchanged with the TouchFree service
//!
//! Field names follow the service's JSON exactly (`requestID`, PascalCase
//! configuration fields), so every struct carries explicit serde renames.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::action::ActionCode;

/// A state enum the service may send by name or by declaration index.
///
/// Serializes as the name. Deserializes from either form, so pushes from
/// services that emit numeric enums decode the same as named ones.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant in wire index order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                match IndexOrName::deserialize(deserializer)? {
                    IndexOrName::Index(index) => usize::try_from(index)
                        .ok()
                        .and_then(|i| Self::ALL.get(i).copied())
                        .ok_or_else(|| {
                            de::Error::custom(format!(
                                "{} is not a valid {} index",
                                index,
                                stringify!($name)
                            ))
                        }),
                    IndexOrName::Name(name) => Self::ALL
                        .iter()
                        .copied()
                        .find(|variant| variant.as_str() == name)
                        .ok_or_else(|| de::Error::unknown_variant(&name, &[$($wire),+])),
                }
            }
        }
    };
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IndexOrName {
    Index(u64),
    Name(String),
}

/// Header naming the client's API version in the handshake request
pub const API_VERSION_HEADER: &str = "TfApiVersion";

/// Protocol version this client speaks
pub const API_VERSION: &str = "1.5.0";

/// Outbound message: an action code plus action-specific content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestEnvelope {
    pub action: ActionCode,
    pub content: Value,
}

impl RequestEnvelope {
    /// Build an envelope from any serializable content.
    pub fn new<T: Serialize>(action: ActionCode, content: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            action,
            content: serde_json::to_value(content)?,
        })
    }

    /// The `requestID` inside the content, if there is one
    pub fn request_id(&self) -> Option<&str> {
        self.content.get("requestID").and_then(Value::as_str)
    }
}

/// Inbound message before the action code has been resolved.
///
/// The action stays a string here so codes added by newer services can be
/// logged and skipped instead of failing the whole message.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEnvelope {
    pub action: String,
    #[serde(default)]
    pub content: Value,
}

/// Implemented by every payload that answers a request
pub trait Correlated {
    fn request_id(&self) -> &str;
}

macro_rules! correlated {
    ($($ty:ty),* $(,)?) => {
        $(impl Correlated for $ty {
            fn request_id(&self) -> &str {
                &self.request_id
            }
        })*
    };
}

correlated!(
    WebSocketResponse,
    HandshakeResponse,
    ServiceStatus,
    ConfigState,
    TrackingStateResponse,
    LicenseStateResponse,
    LicenseChangeResponse,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    Success,
    Failure,
    #[serde(other)]
    Unknown,
}

/// Generic acknowledgement used by most requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSocketResponse {
    #[serde(rename = "requestID", default)]
    pub request_id: String,
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "originalRequest", default)]
    pub original_request: String,
}

impl WebSocketResponse {
    /// A locally generated failure, used when a request never reaches the service
    pub fn failure(
        request_id: impl Into<String>,
        message: impl Into<String>,
        original_request: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            status: ResponseStatus::Failure,
            message: message.into(),
            original_request: original_request.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

/// Handshake request content; the version travels under [`API_VERSION_HEADER`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandshakeRequest {
    #[serde(rename = "requestID")]
    pub request_id: String,
    #[serde(rename = "TfApiVersion")]
    pub api_version: String,
}

/// Configuration advisory piggybacked on the handshake response.
///
/// Independent of the handshake status: a successful handshake may still
/// report that the service fell back to, or failed to load, its config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigAdvisory {
    Error,
    Default,
    #[serde(other)]
    Ok,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakeResponse {
    #[serde(rename = "requestID", default)]
    pub request_id: String,
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "originalRequest", default)]
    pub original_request: String,
    #[serde(rename = "touchFreeVersion", default)]
    pub touchfree_version: Option<String>,
    #[serde(rename = "apiVersion", default)]
    pub api_version: Option<String>,
    #[serde(rename = "configurationStatus", default)]
    pub configuration_status: Option<ConfigAdvisory>,
}

wire_enum! {
    pub enum TrackingServiceState {
        Unavailable => "UNAVAILABLE",
        NoCamera => "NO_CAMERA",
        Connected => "CONNECTED",
    }
}

wire_enum! {
    pub enum ConfigurationState {
        NotLoaded => "NOT_LOADED",
        Loaded => "LOADED",
        Errored => "ERRORED",
    }
}

/// Service health, either requested or pushed unsolicited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    #[serde(rename = "requestID", default)]
    pub request_id: String,
    #[serde(default)]
    pub tracking_service_state: Option<TrackingServiceState>,
    #[serde(default)]
    pub configuration_state: Option<ConfigurationState>,
    #[serde(default)]
    pub service_version: Option<String>,
    #[serde(default)]
    pub tracking_version: Option<String>,
    #[serde(default)]
    pub camera_serial: Option<String>,
    #[serde(default)]
    pub camera_firmware_version: Option<String>,
}

/// Content for requests that carry nothing but their ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleRequest {
    #[serde(rename = "requestID")]
    pub request_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "Z")]
    pub z: f64,
}

wire_enum! {
    pub enum InteractionType {
        Grab => "GRAB",
        Hover => "HOVER",
        Push => "PUSH",
        Touchplane => "TOUCHPLANE",
        Velocityswipe => "VELOCITYSWIPE",
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HoverAndHoldConfig {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hover_start_time_s: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hover_complete_time_s: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TouchPlaneConfig {
    #[serde(rename = "TouchPlaneActivationDistanceCM")]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub activation_distance_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub touch_plane_tracked_position: Option<String>,
}

/// Interaction settings. Every field is optional so the same type expresses
/// both a full state report and a partial update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InteractionConfig {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub use_scrolling_or_dragging: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub use_swipe_interaction: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deadzone_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub interaction_zone_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub interaction_min_distance_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub interaction_max_distance_cm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub interaction_type: Option<InteractionType>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hover_and_hold: Option<HoverAndHoldConfig>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub touch_plane: Option<TouchPlaneConfig>,
}

/// Screen and camera geometry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PhysicalConfig {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub screen_height_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub leap_position_relative_to_screen_bottom_m: Option<Vector3>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub leap_rotation_d: Option<Vector3>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub screen_rotation_d: Option<f64>,
    #[serde(rename = "ScreenWidthPX")]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub screen_width_px: Option<u32>,
    #[serde(rename = "ScreenHeightPX")]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub screen_height_px: Option<u32>,
}

/// Configuration snapshot; also the content of set-configuration requests
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfigState {
    #[serde(rename = "requestID", default)]
    pub request_id: String,
    #[serde(default)]
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub physical: PhysicalConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuickSetupPosition {
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickSetupRequest {
    #[serde(rename = "requestID")]
    pub request_id: String,
    pub position: QuickSetupPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MaskData {
    pub lower: f64,
    pub upper: f64,
    pub right: f64,
    pub left: f64,
}

/// Per-field outcome in a tracking state response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessWrapper<T> {
    pub succeeded: bool,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub content: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStateRequest {
    #[serde(rename = "requestID")]
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mask: Option<MaskData>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub camera_reversed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub allow_images: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub analytics_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStateResponse {
    #[serde(rename = "requestID", default)]
    pub request_id: String,
    #[serde(default)]
    pub mask: Option<SuccessWrapper<MaskData>>,
    #[serde(default)]
    pub camera_reversed: Option<SuccessWrapper<bool>>,
    #[serde(default)]
    pub allow_images: Option<SuccessWrapper<bool>>,
    #[serde(default)]
    pub analytics_enabled: Option<SuccessWrapper<bool>>,
}

wire_enum! {
    pub enum HandPresenceState {
        HandFound => "HAND_FOUND",
        HandsLost => "HANDS_LOST",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandPresenceEvent {
    pub state: HandPresenceState,
}

wire_enum! {
    pub enum InteractionZoneState {
        HandEntered => "HAND_ENTERED",
        HandExited => "HAND_EXITED",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionZoneEvent {
    pub state: InteractionZoneState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lens {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandDataStreamRequest {
    #[serde(rename = "requestID")]
    pub request_id: String,
    pub enabled: bool,
    pub lens: Lens,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalyticsRequestType {
    Start,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsSessionRequest {
    #[serde(rename = "requestID")]
    pub request_id: String,
    #[serde(rename = "sessionID")]
    pub session_id: String,
    #[serde(rename = "requestType")]
    pub request_type: AnalyticsRequestType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsEventsRequest {
    #[serde(rename = "requestID")]
    pub request_id: String,
    #[serde(rename = "sessionID")]
    pub session_id: String,
    #[serde(rename = "sessionEvents")]
    pub session_events: BTreeMap<String, u64>,
}

wire_enum! {
    pub enum LicenseState {
        NoLicense => "NO_LICENSE",
        Licensed => "LICENSED",
        CameraUnlicensed => "CAMERA_UNLICENSED",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseStateResponse {
    #[serde(rename = "requestID", default)]
    pub request_id: String,
    #[serde(rename = "licenseState")]
    pub license_state: LicenseState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseKeyRequest {
    #[serde(rename = "requestID")]
    pub request_id: String,
    #[serde(rename = "licenseKey")]
    pub license_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseChangeResponse {
    #[serde(rename = "requestID", default)]
    pub request_id: String,
    pub succeeded: bool,
    #[serde(rename = "changeDetails", default)]
    pub change_details: String,
}

//! Input action wire format and its decoding into [`InputAction`]
//!
//! On the wire, four independent enumerations are packed into one
//! `InteractionFlags` integer. The bitmask never leaves this module: decoding
//! produces a tagged record, and a missing bit falls back to a documented
//! default (logged as an error) rather than rejecting the action.

use serde::{Deserialize, Serialize};
use tracing::error;

use super::messages::{InteractionType, Vector2};

/// Bit assignments inside `InteractionFlags`. Adding bits is a breaking
/// change for older services, so values are fixed.
pub mod flags {
    pub const LEFT: u32 = 1;
    pub const RIGHT: u32 = 2;

    pub const PRIMARY: u32 = 4;
    pub const SECONDARY: u32 = 8;

    pub const NONE_INPUT: u32 = 16;
    pub const CANCEL: u32 = 32;
    pub const DOWN: u32 = 64;
    pub const MOVE: u32 = 128;
    pub const UP: u32 = 256;

    pub const GRAB: u32 = 512;
    pub const HOVER: u32 = 1024;
    pub const PUSH: u32 = 2048;
    pub const TOUCHPLANE: u32 = 4096;
    pub const VELOCITYSWIPE: u32 = 8192;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandChirality {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandType {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputType {
    None,
    Cancel,
    Down,
    Move,
    Up,
}

/// Input action exactly as the service sends it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireInputAction {
    pub timestamp: i64,
    pub interaction_flags: u32,
    pub cursor_position: Vector2,
    pub distance_from_screen: f64,
    pub progress_to_click: f64,
}

impl WireInputAction {
    /// True for actions the queue may drop under back-pressure.
    ///
    /// Classified from the raw bits: anything carrying MOVE or NONE_INPUT is
    /// disposable; DOWN, UP and CANCEL are state transitions and never are.
    pub fn is_cullable(&self) -> bool {
        self.interaction_flags & (flags::MOVE | flags::NONE_INPUT) != 0
    }

    /// Decode the bitmask into a tagged [`InputAction`].
    pub fn decode(&self) -> InputAction {
        let bits = self.interaction_flags;
        InputAction {
            timestamp: self.timestamp,
            interaction_type: interaction_type_from_flags(bits),
            hand_type: hand_type_from_flags(bits),
            chirality: chirality_from_flags(bits),
            input_type: input_type_from_flags(bits),
            cursor_position: self.cursor_position,
            distance_from_screen: self.distance_from_screen,
            progress_to_click: self.progress_to_click,
        }
    }
}

/// A decoded input action as delivered to consumers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputAction {
    pub timestamp: i64,
    pub interaction_type: InteractionType,
    pub hand_type: HandType,
    pub chirality: HandChirality,
    pub input_type: InputType,
    pub cursor_position: Vector2,
    pub distance_from_screen: f64,
    pub progress_to_click: f64,
}

fn chirality_from_flags(bits: u32) -> HandChirality {
    if bits & flags::LEFT != 0 {
        HandChirality::Left
    } else if bits & flags::RIGHT != 0 {
        HandChirality::Right
    } else {
        error!(flags = bits, "InputAction missing chirality, defaulting to RIGHT");
        HandChirality::Right
    }
}

fn hand_type_from_flags(bits: u32) -> HandType {
    if bits & flags::PRIMARY != 0 {
        HandType::Primary
    } else if bits & flags::SECONDARY != 0 {
        HandType::Secondary
    } else {
        error!(flags = bits, "InputAction missing hand type, defaulting to PRIMARY");
        HandType::Primary
    }
}

fn input_type_from_flags(bits: u32) -> InputType {
    if bits & flags::NONE_INPUT != 0 {
        InputType::None
    } else if bits & flags::CANCEL != 0 {
        InputType::Cancel
    } else if bits & flags::DOWN != 0 {
        InputType::Down
    } else if bits & flags::MOVE != 0 {
        InputType::Move
    } else if bits & flags::UP != 0 {
        InputType::Up
    } else {
        error!(flags = bits, "InputAction missing input type, defaulting to NONE");
        InputType::None
    }
}

fn interaction_type_from_flags(bits: u32) -> InteractionType {
    if bits & flags::GRAB != 0 {
        InteractionType::Grab
    } else if bits & flags::HOVER != 0 {
        InteractionType::Hover
    } else if bits & flags::PUSH != 0 {
        InteractionType::Push
    } else if bits & flags::TOUCHPLANE != 0 {
        InteractionType::Touchplane
    } else if bits & flags::VELOCITYSWIPE != 0 {
        InteractionType::Velocityswipe
    } else {
        error!(flags = bits, "InputAction missing interaction type, defaulting to PUSH");
        InteractionType::Push
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(bits: u32) -> WireInputAction {
        WireInputAction {
            timestamp: 1_000,
            interaction_flags: bits,
            cursor_position: Vector2 { x: 10.0, y: 20.0 },
            distance_from_screen: 0.1,
            progress_to_click: 0.5,
        }
    }

    #[test]
    fn test_decode_all_fields() {
        let action = wire(flags::LEFT | flags::SECONDARY | flags::DOWN | flags::HOVER).decode();
        assert_eq!(action.chirality, HandChirality::Left);
        assert_eq!(action.hand_type, HandType::Secondary);
        assert_eq!(action.input_type, InputType::Down);
        assert_eq!(action.interaction_type, InteractionType::Hover);
        assert_eq!(action.cursor_position, Vector2 { x: 10.0, y: 20.0 });
        assert_eq!(action.timestamp, 1_000);
    }

    #[test]
    fn test_missing_bits_fall_back_to_defaults() {
        let action = wire(0).decode();
        assert_eq!(action.chirality, HandChirality::Right);
        assert_eq!(action.hand_type, HandType::Primary);
        assert_eq!(action.input_type, InputType::None);
        assert_eq!(action.interaction_type, InteractionType::Push);
    }

    #[test]
    fn test_each_input_type_bit() {
        let cases = [
            (flags::NONE_INPUT, InputType::None),
            (flags::CANCEL, InputType::Cancel),
            (flags::DOWN, InputType::Down),
            (flags::MOVE, InputType::Move),
            (flags::UP, InputType::Up),
        ];
        for (bit, expected) in cases {
            assert_eq!(wire(flags::RIGHT | flags::PRIMARY | bit).decode().input_type, expected);
        }
    }

    #[test]
    fn test_each_interaction_type_bit() {
        let cases = [
            (flags::GRAB, InteractionType::Grab),
            (flags::HOVER, InteractionType::Hover),
            (flags::PUSH, InteractionType::Push),
            (flags::TOUCHPLANE, InteractionType::Touchplane),
            (flags::VELOCITYSWIPE, InteractionType::Velocityswipe),
        ];
        for (bit, expected) in cases {
            assert_eq!(wire(bit).decode().interaction_type, expected);
        }
    }

    #[test]
    fn test_overlapping_bits_take_first_in_precedence() {
        let both_hands = wire(flags::LEFT | flags::RIGHT | flags::PRIMARY | flags::MOVE | flags::PUSH);
        assert_eq!(both_hands.decode().chirality, HandChirality::Left);

        let down_up = wire(flags::RIGHT | flags::PRIMARY | flags::DOWN | flags::UP | flags::PUSH);
        assert_eq!(down_up.decode().input_type, InputType::Down);

        let move_up = wire(flags::RIGHT | flags::PRIMARY | flags::MOVE | flags::UP | flags::PUSH);
        assert_eq!(move_up.decode().input_type, InputType::Move);

        let cancel_down = wire(flags::RIGHT | flags::PRIMARY | flags::CANCEL | flags::DOWN | flags::PUSH);
        assert_eq!(cancel_down.decode().input_type, InputType::Cancel);
    }

    #[test]
    fn test_cullable_classification() {
        assert!(wire(flags::MOVE | flags::PUSH).is_cullable());
        assert!(wire(flags::NONE_INPUT).is_cullable());
        assert!(!wire(flags::DOWN).is_cullable());
        assert!(!wire(flags::UP).is_cullable());
        assert!(!wire(flags::CANCEL).is_cullable());
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::json!({
            "Timestamp": 42,
            "InteractionFlags": flags::RIGHT | flags::PRIMARY | flags::MOVE | flags::PUSH,
            "CursorPosition": { "x": 1.5, "y": 2.5 },
            "DistanceFromScreen": 0.2,
            "ProgressToClick": 0.0,
        });
        let action: WireInputAction = serde_json::from_value(json).unwrap();
        assert_eq!(action.timestamp, 42);
        assert_eq!(action.decode().input_type, InputType::Move);
    }
}

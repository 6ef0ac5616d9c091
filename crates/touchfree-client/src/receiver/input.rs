//! Input action queue with back-pressure culling
//!
//! The service streams input actions faster than a slow consumer may drain
//! them. Before each delivery, movement-only actions at the head of the queue
//! are dropped until at most `cull_to` remain, so the consumer stays close to
//! real time. State transitions (DOWN, UP, CANCEL) block culling: anything
//! queued behind one survives until it has been delivered.

use serde_json::Value;

use super::{decode, Drainable, Receiver, TickContext};
use crate::error::ClientError;
use crate::events::Dispatch;
use crate::protocol::{ActionCode, InputAction, InputType, Vector2, WireInputAction};

#[derive(Debug)]
pub struct InputActionQueue {
    queue: Drainable<WireInputAction>,
    cull_to: usize,
    last_known_cursor: Vector2,
}

impl InputActionQueue {
    pub fn new(cull_to: usize) -> Self {
        Self {
            queue: Drainable::default(),
            cull_to,
            last_known_cursor: Vector2::default(),
        }
    }

    pub fn push(&mut self, action: WireInputAction) {
        self.queue.push(action);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Cursor position of the most recent non-UP action delivered
    pub fn last_known_cursor(&self) -> Vector2 {
        self.last_known_cursor
    }

    /// Drop cullable actions from the head while more than `cull_to` remain.
    fn cull(&mut self) {
        while self.queue.len() > self.cull_to {
            match self.queue.front() {
                Some(front) if front.is_cullable() => {
                    self.queue.pop();
                }
                _ => break,
            }
        }
    }

    /// Cull, then decode the next action.
    ///
    /// UP actions report the position of the last delivered non-UP action,
    /// since services report an unreliable position once the hand lifts.
    pub fn next(&mut self) -> Option<InputAction> {
        self.cull();
        let mut action = self.queue.pop()?.decode();

        if action.input_type == InputType::Up {
            action.cursor_position = self.last_known_cursor;
        } else {
            self.last_known_cursor = action.cursor_position;
        }
        Some(action)
    }
}

pub struct InputActionReceiver {
    queue: InputActionQueue,
}

impl InputActionReceiver {
    pub fn new(cull_to: usize) -> Self {
        Self {
            queue: InputActionQueue::new(cull_to),
        }
    }

    pub fn queue(&self) -> &InputActionQueue {
        &self.queue
    }
}

impl Receiver for InputActionReceiver {
    fn name(&self) -> &'static str {
        "input-action"
    }

    fn action_codes(&self) -> &[ActionCode] {
        &[ActionCode::InputAction]
    }

    fn receive(&mut self, action: ActionCode, content: Value) -> Result<(), ClientError> {
        let wire: WireInputAction = decode(self.name(), action, content)?;
        self.queue.push(wire);
        Ok(())
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        if let Some(action) = self.queue.next() {
            ctx.defer(Dispatch::InputAction(action));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::flags;

    fn action(bits: u32, timestamp: i64, x: f64) -> WireInputAction {
        WireInputAction {
            timestamp,
            interaction_flags: flags::RIGHT | flags::PRIMARY | flags::PUSH | bits,
            cursor_position: Vector2 { x, y: 0.0 },
            distance_from_screen: 0.1,
            progress_to_click: 0.0,
        }
    }

    fn drain(queue: &mut InputActionQueue) -> Vec<(i64, InputType)> {
        std::iter::from_fn(|| queue.next())
            .map(|a| (a.timestamp, a.input_type))
            .collect()
    }

    #[test]
    fn test_moves_culled_to_threshold() {
        let mut queue = InputActionQueue::new(2);
        for t in 0..5 {
            queue.push(action(flags::MOVE, t, t as f64));
        }

        // 5 queued, culled to 2, one delivered
        let first = queue.next().unwrap();
        assert_eq!(first.timestamp, 3);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_cull_preserves_state_transitions() {
        let mut queue = InputActionQueue::new(2);
        queue.push(action(flags::MOVE, 1, 0.0));
        queue.push(action(flags::DOWN, 2, 0.0));
        queue.push(action(flags::MOVE, 3, 0.0));
        queue.push(action(flags::MOVE, 4, 0.0));
        queue.push(action(flags::UP, 5, 0.0));

        // MOVE(1) is dropped; culling stops at DOWN
        assert_eq!(
            drain(&mut queue),
            vec![
                (2, InputType::Down),
                (4, InputType::Move),
                (5, InputType::Up),
            ]
        );
    }

    #[test]
    fn test_down_and_up_are_never_culled() {
        let mut queue = InputActionQueue::new(0);
        queue.push(action(flags::DOWN, 1, 0.0));
        queue.push(action(flags::UP, 2, 0.0));
        queue.push(action(flags::CANCEL, 3, 0.0));

        assert_eq!(
            drain(&mut queue),
            vec![
                (1, InputType::Down),
                (2, InputType::Up),
                (3, InputType::Cancel),
            ]
        );
    }

    #[test]
    fn test_short_queue_is_not_culled() {
        let mut queue = InputActionQueue::new(2);
        queue.push(action(flags::MOVE, 1, 0.0));
        queue.push(action(flags::MOVE, 2, 0.0));
        assert_eq!(drain(&mut queue).len(), 2);
    }

    #[test]
    fn test_up_uses_last_known_cursor() {
        let mut queue = InputActionQueue::new(10);
        queue.push(action(flags::MOVE, 1, 10.0));
        queue.push(action(flags::DOWN, 2, 42.0));
        queue.push(action(flags::UP, 3, 999.0));

        queue.next();
        queue.next();
        let up = queue.next().unwrap();
        assert_eq!(up.input_type, InputType::Up);
        assert_eq!(up.cursor_position, Vector2 { x: 42.0, y: 0.0 });
        assert_eq!(queue.last_known_cursor(), Vector2 { x: 42.0, y: 0.0 });
    }

    #[test]
    fn test_up_after_culled_moves_uses_last_delivered_cursor() {
        let mut queue = InputActionQueue::new(2);
        queue.push(action(flags::DOWN, 1, 1.0));
        queue.push(action(flags::MOVE, 2, 2.0));
        queue.push(action(flags::MOVE, 3, 3.0));
        queue.push(action(flags::MOVE, 4, 4.0));
        queue.push(action(flags::UP, 5, 99.0));

        let down = queue.next().unwrap();
        assert_eq!(down.input_type, InputType::Down);
        assert_eq!(down.cursor_position.x, 1.0);

        // MOVE(2) and MOVE(3) are culled
        let moved = queue.next().unwrap();
        assert_eq!((moved.timestamp, moved.cursor_position.x), (4, 4.0));

        let up = queue.next().unwrap();
        assert_eq!(up.input_type, InputType::Up);
        assert_eq!(up.cursor_position, Vector2 { x: 4.0, y: 0.0 });
        assert!(queue.next().is_none());
    }

    #[test]
    fn test_up_behind_fully_culled_moves_keeps_down_position() {
        let mut queue = InputActionQueue::new(0);
        queue.push(action(flags::DOWN, 1, 1.0));
        queue.push(action(flags::MOVE, 2, 2.0));
        queue.push(action(flags::MOVE, 3, 3.0));
        queue.push(action(flags::UP, 4, 99.0));

        assert_eq!(queue.next().unwrap().input_type, InputType::Down);
        let up = queue.next().unwrap();
        assert_eq!(up.timestamp, 4);
        assert_eq!(up.cursor_position, Vector2 { x: 1.0, y: 0.0 });
    }

    #[test]
    fn test_receiver_delivers_one_action_per_tick() {
        use crate::handshake::HandshakeState;
        use crate::registry::Registries;
        use std::collections::VecDeque;
        use touchfree_config::TimingConfig;

        let mut receiver = InputActionReceiver::new(2);
        for t in 0..2 {
            let wire = serde_json::to_value(action(flags::MOVE, t, 0.0)).unwrap();
            receiver.receive(ActionCode::InputAction, wire).unwrap();
        }

        let mut registries = Registries::new(&TimingConfig::default());
        let mut handshake = HandshakeState::default();
        let mut deferred = VecDeque::new();
        let mut ctx = TickContext {
            registries: &mut registries,
            handshake: &mut handshake,
            deferred: &mut deferred,
        };
        receiver.tick(&mut ctx);

        assert_eq!(deferred.len(), 1);
        assert_eq!(receiver.queue().len(), 1);
    }
}

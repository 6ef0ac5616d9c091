//! Input action plugins
//!
//! Plugins see every decoded input action after it has been published raw and
//! before it is published as final. Each plugin may rewrite the action or
//! swallow it by returning `None`, which stops the chain.

use tracing::trace;

use crate::protocol::InputAction;

pub trait InputActionPlugin: Send {
    fn name(&self) -> &str {
        "anonymous"
    }

    fn modify_input_action(&mut self, action: InputAction) -> Option<InputAction>;
}

impl<F> InputActionPlugin for F
where
    F: FnMut(InputAction) -> Option<InputAction> + Send,
{
    fn modify_input_action(&mut self, action: InputAction) -> Option<InputAction> {
        self(action)
    }
}

/// Plugins in registration order
#[derive(Default)]
pub struct PluginChain {
    plugins: Vec<Box<dyn InputActionPlugin>>,
}

impl PluginChain {
    pub fn new(plugins: Vec<Box<dyn InputActionPlugin>>) -> Self {
        Self { plugins }
    }

    pub fn push(&mut self, plugin: Box<dyn InputActionPlugin>) {
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn run(&mut self, action: InputAction) -> Option<InputAction> {
        let mut current = action;
        for plugin in &mut self.plugins {
            match plugin.modify_input_action(current) {
                Some(next) => current = next,
                None => {
                    trace!(plugin = plugin.name(), "Input action dropped by plugin");
                    return None;
                }
            }
        }
        Some(current)
    }
}

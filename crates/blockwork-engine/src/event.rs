//! Data events dispatched around `Block::set_data`.

use std::sync::Arc;

use crate::error::Result;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockEvents {
    /// Before data is transformed; listeners may replace the data.
    PreSetData,
    /// After all three data representations were updated.
    PostSetData,
}

/// Event payload handed to listeners.
#[derive(Debug)]
pub struct BlockEvent<'a> {
    block_name: &'a str,
    data: Value,
}

impl<'a> BlockEvent<'a> {
    pub fn new(block_name: &'a str, data: Value) -> Self {
        Self { block_name, data }
    }

    pub fn block_name(&self) -> &str {
        self.block_name
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn set_data(&mut self, data: Value) {
        self.data = data;
    }

    pub fn into_data(self) -> Value {
        self.data
    }
}

pub type Listener = Arc<dyn Fn(&mut BlockEvent<'_>) -> Result<()> + Send + Sync>;

#[derive(Clone, Default)]
pub struct EventDispatcher {
    listeners: Vec<(BlockEvents, i32, Listener)>,
}

impl EventDispatcher {
    pub fn add_listener(&mut self, event: BlockEvents, priority: i32, listener: Listener) {
        self.listeners.push((event, priority, listener));
        // stable: equal priorities keep registration order
        self.listeners.sort_by(|a, b| b.1.cmp(&a.1));
    }

    pub fn has_listeners(&self, event: BlockEvents) -> bool {
        self.listeners.iter().any(|(e, _, _)| *e == event)
    }

    pub fn dispatch(&self, event: BlockEvents, payload: &mut BlockEvent<'_>) -> Result<()> {
        for (_, _, listener) in self.listeners.iter().filter(|(e, _, _)| *e == event) {
            listener(payload)?;
        }
        Ok(())
    }
}

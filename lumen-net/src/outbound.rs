//! Coalescing queue of outbound change notifications.

use std::collections::{HashMap, VecDeque};

use lumen_types::Value;

/// Repeated changes to one address collapse into a single entry holding the
/// latest value, at the position of the first change.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    order: VecDeque<String>,
    latest: HashMap<String, Value>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, address: &str, value: Value) {
        if self.latest.insert(address.to_string(), value).is_none() {
            self.order.push_back(address.to_string());
        }
    }

    pub fn pop(&mut self) -> Option<(String, Value)> {
        let address = self.order.pop_front()?;
        let value = self.latest.remove(&address)?;
        Some((address, value))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.latest.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_value_wins_first_position_kept() {
        let mut q = OutboundQueue::new();
        q.push("/a", Value::Float(1.0));
        q.push("/b", Value::Float(2.0));
        q.push("/a", Value::Float(3.0));
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(("/a".to_string(), Value::Float(3.0))));
        assert_eq!(q.pop(), Some(("/b".to_string(), Value::Float(2.0))));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn popped_address_can_queue_again() {
        let mut q = OutboundQueue::new();
        q.push("/a", Value::Int(1));
        q.pop();
        q.push("/a", Value::Int(2));
        assert_eq!(q.pop(), Some(("/a".to_string(), Value::Int(2))));
    }
}

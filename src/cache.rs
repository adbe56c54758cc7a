use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: HashMap<String, (Instant, Value)>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&mut self, key: String, value: Value) {
        self.insert_at(key, value, Instant::now());
    }

    fn get_at(&mut self, key: &str, now: Instant) -> Option<Value> {
        let fresh = match self.entries.get(key) {
            Some((stored_at, _)) => now.duration_since(*stored_at) < self.ttl,
            None => return None,
        };
        if fresh {
            self.entries.get(key).map(|(_, value)| value.clone())
        } else {
            self.entries.remove(key);
            None
        }
    }

    fn insert_at(&mut self, key: String, value: Value, now: Instant) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries.retain(|_, (stored_at, _)| now.duration_since(*stored_at) < self.ttl);
        self.entries.insert(key, (now, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

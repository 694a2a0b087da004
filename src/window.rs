use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

// Upper bound on eager allocation; capacities can come from stored JSON.
const PREALLOCATE_LIMIT: usize = 64;

/// Fixed-capacity FIFO. Pushing into a full window evicts the oldest item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "WindowParts<T>",
    bound(deserialize = "T: Deserialize<'de>", serialize = "T: Serialize")
)]
pub struct RollingWindow<T> {
    capacity: usize,
    items: VecDeque<T>,
}

#[derive(Deserialize)]
struct WindowParts<T> {
    capacity: usize,
    #[serde(default = "VecDeque::new")]
    items: VecDeque<T>,
}

impl<T> From<WindowParts<T>> for RollingWindow<T> {
    fn from(parts: WindowParts<T>) -> Self {
        let mut window = RollingWindow::new(parts.capacity);
        for item in parts.items {
            window.push(item);
        }
        window
    }
}

impl<T> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity.min(PREALLOCATE_LIMIT)),
        }
    }

    /// Same items under a new capacity, dropping the oldest on overflow.
    pub fn resized(self, capacity: usize) -> Self {
        let mut window = Self::new(capacity);
        for item in self.items {
            window.push(item);
        }
        window
    }

    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }
}

impl RollingWindow<f64> {
    pub fn mean(&self) -> Option<f64> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items.iter().sum::<f64>() / self.items.len() as f64)
    }

    /// Population variance; 0 for fewer than two samples.
    pub fn variance(&self) -> f64 {
        let n = self.items.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.items.iter().sum::<f64>() / n as f64;
        self.items.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64
    }

    /// Mean of `len` samples ending `skip` samples before the newest one.
    pub fn tail_mean(&self, skip: usize, len: usize) -> Option<f64> {
        if len == 0 || self.items.len() < skip + len {
            return None;
        }
        let sum: f64 = self.items.iter().rev().skip(skip).take(len).sum();
        Some(sum / len as f64)
    }
}

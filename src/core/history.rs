use std::collections::VecDeque;

/// Number of readings retained per scalar metric.
pub const HISTORY_CAPACITY: usize = 60;

/// Fixed-capacity, oldest-evicted-first buffer of scalar readings.
///
/// Written only by the sampler that owns it. Readers get a copy through
/// [`HistoryBuffer::snapshot`], never a view into the live storage.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    values: VecDeque<f64>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append the newest reading, evicting the oldest once full.
    pub fn append(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Owned copy of the current contents in chronological order.
    pub fn snapshot(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

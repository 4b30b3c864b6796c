//! Fixed-capacity heart-rate history with O(1) running mean.

use std::collections::VecDeque;

/// Rolling heart-rate readings, oldest evicted first
#[derive(Clone, Debug)]
pub struct HeartRateWindow {
    readings: VecDeque<f32>,
    capacity: usize,
    /// Kept in f64 so long add/evict sequences don't drift
    sum: f64,
}

impl HeartRateWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            readings: VecDeque::with_capacity(capacity),
            capacity,
            sum: 0.0,
        }
    }

    /// Append a reading, returning the evicted one if the window was full
    pub fn push(&mut self, bpm: f32) -> Option<f32> {
        let evicted = if self.readings.len() == self.capacity {
            self.readings.pop_front()
        } else {
            None
        };
        if let Some(old) = evicted {
            self.sum -= old as f64;
        }
        self.readings.push_back(bpm);
        self.sum += bpm as f64;
        evicted
    }

    pub fn clear(&mut self) {
        self.readings.clear();
        self.sum = 0.0;
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn mean(&self) -> Option<f32> {
        if self.readings.is_empty() {
            None
        } else {
            Some((self.sum / self.readings.len() as f64) as f32)
        }
    }

    pub fn max(&self) -> Option<f32> {
        self.readings.iter().copied().reduce(f32::max)
    }

    /// Mean of the oldest `n` readings still in the window
    pub fn head_mean(&self, n: usize) -> Option<f32> {
        mean_of(self.readings.iter().take(n))
    }

    /// Mean of the newest `n` readings
    pub fn tail_mean(&self, n: usize) -> Option<f32> {
        mean_of(self.readings.iter().rev().take(n))
    }
}

fn mean_of<'a>(values: impl Iterator<Item = &'a f32>) -> Option<f32> {
    let (sum, count) = values.fold((0.0f64, 0usize), |(sum, count), v| {
        (sum + *v as f64, count + 1)
    });
    if count == 0 {
        None
    } else {
        Some((sum / count as f64) as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_tracks_pushes() {
        let mut window = HeartRateWindow::new(4);
        assert_eq!(window.mean(), None);
        window.push(100.0);
        window.push(110.0);
        assert_eq!(window.mean(), Some(105.0));
        assert_eq!(window.max(), Some(110.0));
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut window = HeartRateWindow::new(3);
        assert_eq!(window.push(1.0), None);
        assert_eq!(window.push(2.0), None);
        assert_eq!(window.push(3.0), None);
        assert_eq!(window.push(4.0), Some(1.0));
        assert_eq!(window.len(), 3);
        assert_eq!(window.mean(), Some(3.0));
        assert_eq!(window.head_mean(1), Some(2.0));
        assert_eq!(window.tail_mean(1), Some(4.0));
    }

    #[test]
    fn test_running_sum_after_many_evictions() {
        let mut window = HeartRateWindow::new(120);
        for i in 0..10_000 {
            window.push(100.0 + (i % 50) as f32);
        }
        let expected = window.head_mean(120).unwrap();
        assert!((window.mean().unwrap() - expected).abs() < 1e-3);
        assert_eq!(window.len(), 120);
    }

    #[test]
    fn test_clear_resets_sum() {
        let mut window = HeartRateWindow::new(2);
        window.push(150.0);
        window.clear();
        assert!(window.is_empty());
        window.push(80.0);
        assert_eq!(window.mean(), Some(80.0));
    }

    #[test]
    fn test_zero_capacity_is_promoted_to_one() {
        let mut window = HeartRateWindow::new(0);
        window.push(90.0);
        window.push(91.0);
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.mean(), Some(91.0));
    }
}

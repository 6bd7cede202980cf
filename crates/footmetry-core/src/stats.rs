//! Running statistics over fixed-size sample windows.
//!
//! `CyclicStat` keeps an O(1) incremental mean/variance over the last
//! `capacity` scalar samples. `InertialAverage` is the vector-friendly
//! variant used to damp frame-to-frame noise in derived quantities.

use std::ops::{Add, Div, Sub};

/// Ring buffer of scalar samples with O(1) incremental mean and variance.
///
/// While fewer than `capacity` samples have been seen, `mean`/`mean_square`
/// are the exact arithmetic means of all samples. Once the buffer is full,
/// the oldest sample is evicted and both moments are updated by the delta
/// rule, so they always reflect exactly the last `capacity` values without
/// ever replaying the window.
#[derive(Clone, Debug)]
pub struct CyclicStat {
    buffer: Vec<f32>,
    count: u64,
    mean: f32,
    mean_square: f32,
}

impl CyclicStat {
    /// Create an empty window holding up to `capacity` samples.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "CyclicStat capacity must be positive");
        Self {
            buffer: vec![0.0; capacity],
            count: 0,
            mean: 0.0,
            mean_square: 0.0,
        }
    }

    /// Insert a sample and return the updated mean.
    pub fn update(&mut self, value: f32) -> f32 {
        let capacity = self.buffer.len();
        self.count += 1;
        if self.count <= capacity as u64 {
            let n = self.count as f32;
            self.buffer[(self.count - 1) as usize] = value;
            self.mean = (self.mean * (n - 1.0) + value) / n;
            self.mean_square = (self.mean_square * (n - 1.0) + value * value) / n;
        } else {
            let pos = ((self.count - 1) % capacity as u64) as usize;
            let old = self.buffer[pos];
            self.buffer[pos] = value;
            self.mean += (value - old) / capacity as f32;
            self.mean_square += (value * value - old * old) / capacity as f32;
        }
        self.mean
    }

    #[inline]
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// Standard deviation of the window, clamped to zero when floating
    /// error drives `mean_square` below `mean²`.
    pub fn deviation(&self) -> f32 {
        (self.mean_square - self.mean * self.mean).max(0.0).sqrt()
    }

    /// Number of samples currently represented: `min(total, capacity)`.
    #[inline]
    pub fn len(&self) -> usize {
        (self.count as usize).min(self.buffer.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Total samples ever inserted, including evicted ones.
    #[inline]
    pub fn total_seen(&self) -> u64 {
        self.count
    }

    /// Forget all samples. Capacity is kept.
    pub fn reset(&mut self) {
        self.count = 0;
        self.mean = 0.0;
        self.mean_square = 0.0;
        self.buffer.fill(0.0);
    }
}

/// Fixed-window running mean over the last `capacity` raw samples.
///
/// Works for any value with componentwise add/sub and scalar division,
/// in practice `f32` and `nalgebra::Vector3<f32>`. The window is cleared
/// only by an explicit [`InertialAverage::reset`], never implicitly.
#[derive(Clone, Debug)]
pub struct InertialAverage<T> {
    window: Vec<T>,
    cap: usize,
    next: usize,
    sum: T,
}

impl<T> InertialAverage<T>
where
    T: Copy + Default + Add<Output = T> + Sub<Output = T> + Div<f32, Output = T>,
{
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "InertialAverage capacity must be positive");
        Self {
            window: Vec::with_capacity(capacity),
            cap: capacity,
            next: 0,
            sum: T::default(),
        }
    }

    /// Insert a raw sample, evicting the oldest once the window is full.
    pub fn push(&mut self, value: T) {
        if self.window.len() < self.cap {
            self.window.push(value);
            self.sum = self.sum + value;
        } else {
            self.sum = self.sum - self.window[self.next] + value;
            self.window[self.next] = value;
        }
        self.next = (self.next + 1) % self.cap;
    }

    /// Smoothed value, or `None` while the window is empty.
    pub fn mean(&self) -> Option<T> {
        if self.window.is_empty() {
            None
        } else {
            Some(self.sum / self.window.len() as f32)
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Drop the whole history. The next `mean` is `None` until a new
    /// sample arrives.
    pub fn reset(&mut self) {
        self.window.clear();
        self.next = 0;
        self.sum = T::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn exact_stats(values: &[f32]) -> (f32, f32) {
        let n = values.len() as f32;
        let mean = values.iter().sum::<f32>() / n;
        let mean_sq = values.iter().map(|v| v * v).sum::<f32>() / n;
        (mean, (mean_sq - mean * mean).max(0.0).sqrt())
    }

    #[test]
    fn partial_window_is_exact_mean() {
        let mut stat = CyclicStat::new(8);
        let values = [0.81, 0.79, 0.80, 0.805];
        for &v in &values {
            stat.update(v);
        }
        let (mean, dev) = exact_stats(&values);
        assert_relative_eq!(stat.mean(), mean, epsilon = 1e-5);
        assert_relative_eq!(stat.deviation(), dev, epsilon = 1e-4);
        assert_eq!(stat.len(), 4);
    }

    #[test]
    fn full_window_tracks_last_capacity_values() {
        let mut stat = CyclicStat::new(5);
        let values: Vec<f32> = (0..23).map(|i| 0.1 * i as f32).collect();
        for &v in &values {
            stat.update(v);
        }
        let tail = &values[values.len() - 5..];
        let (mean, dev) = exact_stats(tail);
        assert_relative_eq!(stat.mean(), mean, epsilon = 1e-4);
        assert_relative_eq!(stat.deviation(), dev, epsilon = 1e-3);
        assert_eq!(stat.len(), 5);
        assert_eq!(stat.total_seen(), 23);
    }

    #[test]
    fn constant_input_has_zero_deviation() {
        let mut stat = CyclicStat::new(4);
        for _ in 0..40 {
            stat.update(0.8);
        }
        assert_relative_eq!(stat.mean(), 0.8, epsilon = 1e-6);
        // deviation must clamp, not go NaN, under accumulated rounding
        assert!(stat.deviation() >= 0.0);
        assert!(stat.deviation() < 1e-3);
    }

    #[test]
    fn reset_clears_window() {
        let mut stat = CyclicStat::new(3);
        stat.update(1.0);
        stat.update(2.0);
        stat.reset();
        assert!(stat.is_empty());
        assert_eq!(stat.update(5.0), 5.0);
    }

    #[test]
    fn inertial_average_scalar_window() {
        let mut avg = InertialAverage::<f32>::new(3);
        assert!(avg.mean().is_none());
        avg.push(1.0);
        avg.push(2.0);
        assert_relative_eq!(avg.mean().unwrap(), 1.5);
        avg.push(3.0);
        avg.push(4.0); // evicts 1.0
        assert_relative_eq!(avg.mean().unwrap(), 3.0);
    }

    #[test]
    fn inertial_average_vectors() {
        let mut avg = InertialAverage::<Vector3<f32>>::new(2);
        avg.push(Vector3::new(1.0, 0.0, 0.0));
        avg.push(Vector3::new(0.0, 1.0, 0.0));
        let m = avg.mean().unwrap();
        assert_relative_eq!(m.x, 0.5);
        assert_relative_eq!(m.y, 0.5);
        avg.reset();
        assert!(avg.mean().is_none());
    }
}

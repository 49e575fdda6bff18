/// Running statistics for a single station.
///
/// Only ever constructed from a first observation, so `count` is at least 1
/// and [`StationStats::mean`] never divides by zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationStats {
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub count: u64,
}

impl StationStats {
    #[inline]
    pub fn new(value: f64) -> Self {
        Self {
            min: value,
            max: value,
            sum: value,
            count: 1,
        }
    }

    #[inline]
    pub fn update(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value;
        self.count += 1;
    }

    /// Folds another partial result into this one.
    ///
    /// Min, max and count are exact regardless of merge order; the sum is
    /// subject to floating-point reassociation.
    #[inline]
    pub fn merge(&mut self, other: &StationStats) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

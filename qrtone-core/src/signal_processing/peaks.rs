//! Local maximum detection over streamed (index, value) pairs
//!
//! The peak finder tracks monotone increase and decrease runs. A candidate
//! peak is recorded when an increase run of at least `min_increase_count`
//! samples turns down; it is emitted once the following decrease run reaches
//! `min_decrease_count` samples. Either threshold can be disabled with -1.

/// Stateful local-maximum detector.
#[derive(Debug, Clone)]
pub struct PeakFinder {
    increase: bool,
    old_value: f32,
    old_index: i64,
    added: bool,
    last_peak_value: f32,
    last_peak_index: i64,
    increase_count: i32,
    decrease_count: i32,
    min_increase_count: i32,
    min_decrease_count: i32,
}

impl PeakFinder {
    pub fn new(min_increase_count: i32, min_decrease_count: i32) -> Self {
        Self {
            increase: true,
            old_value: f32::MIN,
            old_index: 0,
            added: false,
            last_peak_value: 0.0,
            last_peak_index: 0,
            increase_count: 0,
            decrease_count: 0,
            min_increase_count,
            min_decrease_count,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.min_increase_count, self.min_decrease_count);
    }

    /// Feed the next sample; returns true when a peak is confirmed. The
    /// confirmed peak is available through [`Self::last_peak_index`] and
    /// [`Self::last_peak_value`].
    pub fn add(&mut self, index: i64, value: f32) -> bool {
        let mut emitted = false;
        let diff = value - self.old_value;
        if diff <= 0.0 && self.increase {
            // turn from increasing to non-increasing
            if self.increase_count >= self.min_increase_count {
                self.last_peak_index = self.old_index;
                self.last_peak_value = self.old_value;
                self.added = true;
                if self.min_decrease_count <= 1 {
                    emitted = true;
                }
            }
        } else if diff > 0.0 && !self.increase {
            // turn from decreasing to increasing, discard a candidate whose
            // decrease run stayed too short
            if self.added
                && self.min_decrease_count != -1
                && self.decrease_count < self.min_decrease_count
            {
                self.last_peak_index = 0;
                self.added = false;
            }
        }
        self.increase = diff > 0.0;
        if self.increase {
            self.increase_count += 1;
            self.decrease_count = 0;
        } else {
            self.decrease_count += 1;
            if self.decrease_count >= self.min_decrease_count && self.added {
                self.added = false;
                emitted = true;
            }
            self.increase_count = 0;
        }
        self.old_value = value;
        self.old_index = index;
        emitted
    }

    pub fn last_peak_index(&self) -> i64 {
        self.last_peak_index
    }

    pub fn last_peak_value(&self) -> f32 {
        self.last_peak_value
    }
}

/// Quadratic interpolation of three equally spaced samples around a local
/// maximum `p1`. Returns `(location, height, half_curvature)` where
/// `location` is in [-1, 1] relative to the center point.
///
/// <https://www.dsprelated.com/freebooks/sasp/Sinusoidal_Peak_Interpolation.html>
pub fn quadratic_interpolation(p0: f64, p1: f64, p2: f64) -> (f64, f64, f64) {
    let location = (p2 - p0) / (2.0 * (2.0 * p1 - p2 - p0));
    let height = p1 - 0.25 * (p0 - p2) * location;
    let half_curvature = 0.5 * (p0 - 2.0 * p1 + p2);
    (location, height, half_curvature)
}

/// Peak sample position of a curve sampled every `window_length` samples,
/// with `p1` the maximum observed at `p1_location`.
pub fn find_peak_location(
    p0: f64,
    p1: f64,
    p2: f64,
    p1_location: i64,
    window_length: usize,
) -> i64 {
    let (location, _, _) = quadratic_interpolation(p0, p1, p2);
    p1_location + (location * window_length as f64) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SERIES: [f32; 16] = [
        4.0, 5.0, 7.0, 13.0, 10.0, 9.0, 9.0, 10.0, 4.0, 6.0, 7.0, 8.0, 11.0, 3.0, 2.0, 2.0,
    ];

    fn collect_peaks(finder: &mut PeakFinder, values: &[f32]) -> Vec<i64> {
        let mut peaks = Vec::new();
        for (i, &value) in values.iter().enumerate() {
            if finder.add(i as i64, value) {
                peaks.push(finder.last_peak_index());
            }
        }
        peaks
    }

    #[test]
    fn increase_run_threshold_filters_short_rises() {
        let mut finder = PeakFinder::new(3, -1);
        assert_eq!(vec![3, 12], collect_peaks(&mut finder, &SERIES));
    }

    #[test]
    fn decrease_run_threshold_filters_short_falls() {
        let mut finder = PeakFinder::new(-1, 2);
        assert_eq!(vec![3, 12], collect_peaks(&mut finder, &SERIES));
    }

    #[test]
    fn reset_clears_run_state() {
        let mut finder = PeakFinder::new(3, -1);
        collect_peaks(&mut finder, &SERIES);
        finder.reset();
        assert_eq!(vec![3, 12], collect_peaks(&mut finder, &SERIES));
    }

    #[test]
    fn interpolated_peak_of_a_parabola_is_exact() {
        // y = 1 - x^2 sampled at x = -0.75, 0.25, 1.25
        let (location, height, half_curvature) =
            quadratic_interpolation(0.4375, 0.9375, -0.5625);
        assert_relative_eq!(-0.25, location, epsilon = 1e-9);
        assert_relative_eq!(1.0, height, epsilon = 1e-9);
        assert_relative_eq!(-1.0, half_curvature, epsilon = 1e-9);
    }
}

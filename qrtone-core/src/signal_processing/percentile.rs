//! P-square running quantile
//!
//! Single-pass quantile estimation as documented in "The P-Square Algorithm
//! for Dynamic Calculation of Percentiles and Histograms without Storing
//! Observations", Communications of the ACM, October 1985, R. Jain and
//! I. Chlamtac. Five markers track one target quantile: the two extremes,
//! the quantile itself and the midpoints on either side. Until five samples
//! have been seen the raw values are held and the estimate falls back to a
//! sorted lookup.

/// Running estimator of a single quantile in (0, 1).
#[derive(Debug, Clone)]
pub struct Percentile {
    /// Marker heights.
    q: Vec<f64>,
    /// Desired marker positions, as quantiles.
    dn: Vec<f64>,
    /// Desired marker positions, as sample counts.
    np: Vec<f64>,
    /// Actual marker positions.
    n: Vec<i64>,
    count: usize,
}

impl Percentile {
    pub fn new(quantile: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&quantile),
            "quantile must be within [0, 1]"
        );
        let mut dn = vec![
            0.0,
            quantile / 2.0,
            quantile,
            (1.0 + quantile) / 2.0,
            1.0,
        ];
        dn.sort_by(|a, b| a.partial_cmp(b).expect("marker positions are finite"));
        let marker_count = dn.len();
        let np = dn
            .iter()
            .map(|&d| (marker_count - 1) as f64 * d + 1.0)
            .collect();
        Self {
            q: vec![0.0; marker_count],
            dn,
            np,
            n: vec![0; marker_count],
            count: 0,
        }
    }

    fn marker_count(&self) -> usize {
        self.q.len()
    }

    pub fn add(&mut self, data: f64) {
        let marker_count = self.marker_count();
        if self.count >= marker_count {
            self.count += 1;

            // B1: find the cell k holding the new observation
            let mut k = 0;
            if data < self.q[0] {
                self.q[0] = data;
                k = 1;
            } else if data >= self.q[marker_count - 1] {
                self.q[marker_count - 1] = data;
                k = marker_count - 1;
            } else {
                for i in 1..marker_count {
                    if data < self.q[i] {
                        k = i;
                        break;
                    }
                }
            }

            // B2: shift positions above the cell
            for i in k..marker_count {
                self.n[i] += 1;
                self.np[i] += self.dn[i];
            }
            for i in 0..k {
                self.np[i] += self.dn[i];
            }

            // B3: adjust interior markers by parabolic prediction, falling
            // back to linear when the prediction escapes the neighbors
            for i in 1..marker_count - 1 {
                let d = self.np[i] - self.n[i] as f64;
                if (d >= 1.0 && self.n[i + 1] - self.n[i] > 1)
                    || (d <= -1.0 && self.n[i - 1] - self.n[i] < -1)
                {
                    let sign: i64 = if d >= 0.0 { 1 } else { -1 };
                    let new_q = self.parabolic(i, sign);
                    if self.q[i - 1] < new_q && new_q < self.q[i + 1] {
                        self.q[i] = new_q;
                    } else {
                        self.q[i] = self.linear(i, sign);
                    }
                    self.n[i] += sign;
                }
            }
        } else {
            self.q[self.count] = data;
            self.count += 1;

            if self.count == marker_count {
                // enough samples to start the algorithm
                self.q
                    .sort_by(|a, b| a.partial_cmp(b).expect("bootstrap values are comparable"));
                for (i, position) in self.n.iter_mut().enumerate() {
                    *position = i as i64 + 1;
                }
            }
        }
    }

    fn parabolic(&self, i: usize, d: i64) -> f64 {
        let d = d as f64;
        let n = |j: usize| self.n[j] as f64;
        self.q[i]
            + d / (n(i + 1) - n(i - 1))
                * ((n(i) - n(i - 1) + d) * (self.q[i + 1] - self.q[i]) / (n(i + 1) - n(i))
                    + (n(i + 1) - n(i) - d) * (self.q[i] - self.q[i - 1]) / (n(i) - n(i - 1)))
    }

    fn linear(&self, i: usize, d: i64) -> f64 {
        let neighbor = (i as i64 + d) as usize;
        self.q[i]
            + d as f64 * (self.q[neighbor] - self.q[i]) / (self.n[neighbor] - self.n[i]) as f64
    }

    /// Current estimate of the configured quantile.
    pub fn result(&self) -> f64 {
        self.result_quantile(self.dn[(self.marker_count() - 1) / 2])
    }

    fn result_quantile(&self, quantile: f64) -> f64 {
        let marker_count = self.marker_count();
        if self.count < marker_count {
            // not bootstrapped yet, pick from the sorted raw values
            let mut sorted = self.q.clone();
            sorted[..self.count]
                .sort_by(|a, b| a.partial_cmp(b).expect("raw values are comparable"));
            let mut closest = 1;
            for i in 2..self.count {
                if (i as f64 / self.count as f64 - quantile).abs()
                    < (closest as f64 / marker_count as f64 - quantile).abs()
                {
                    closest = i;
                }
            }
            sorted[closest]
        } else {
            let mut closest = 1;
            for i in 2..marker_count - 1 {
                if (self.dn[i] - quantile).abs() < (self.dn[closest] - quantile).abs() {
                    closest = i;
                }
            }
            self.q[closest]
        }
    }
}

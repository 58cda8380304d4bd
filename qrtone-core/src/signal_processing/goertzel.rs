//! Incremental Goertzel analysis
//!
//! A second-order IIR that evaluates the DFT at a single frequency in O(N)
//! time with O(1) state. Samples may arrive in chunks of any size; the sum
//! of chunk lengths between resets must equal the window size. The very last
//! sample of the window is held back and folded in during the RMS
//! finalization, which also corrects the phase for non-integer bin
//! frequencies.

use num_complex::Complex64;
use std::f64::consts::TAU;

use super::windows::hann_window;

/// Single-frequency power estimator with an optional Hann window.
#[derive(Debug, Clone)]
pub struct Goertzel {
    s0: f64,
    s1: f64,
    s2: f64,
    cos_pik_term2: f64,
    pik_term: f64,
    last_sample: f64,
    window_size: usize,
    processed_samples: usize,
    /// First half of the Hann curve; the second half is mirrored.
    window_cache: Option<Vec<f32>>,
}

impl Goertzel {
    pub fn new(sample_rate: f32, frequency: f32, window_size: usize, hann: bool) -> Self {
        let window_cache = hann.then(|| {
            let mut cache = vec![1.0f32; window_size / 2 + 1];
            hann_window(&mut cache, window_size, 0);
            cache
        });
        // Fix the analyzed bin using the sample rate of the signal
        let sampling_rate_factor = window_size as f64 / sample_rate as f64;
        let pik_term = TAU * (frequency as f64 * sampling_rate_factor) / window_size as f64;
        Self {
            s0: 0.0,
            s1: 0.0,
            s2: 0.0,
            cos_pik_term2: pik_term.cos() * 2.0,
            pik_term,
            last_sample: 0.0,
            window_size,
            processed_samples: 0,
            window_cache,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn processed_samples(&self) -> usize {
        self.processed_samples
    }

    pub fn reset(&mut self) {
        self.s0 = 0.0;
        self.s1 = 0.0;
        self.s2 = 0.0;
        self.processed_samples = 0;
        self.last_sample = 0.0;
    }

    /// Feed a chunk of the analysis window. Chunks that would overflow the
    /// window are ignored.
    pub fn process_samples(&mut self, samples: &[f32]) {
        if self.processed_samples + samples.len() > self.window_size {
            return;
        }
        let size = if self.processed_samples + samples.len() == self.window_size {
            // hold the final sample back for compute_rms; under a Hann
            // window it is zero anyway
            self.last_sample = if self.window_cache.is_some() {
                0.0
            } else {
                f64::from(samples[samples.len() - 1])
            };
            samples.len() - 1
        } else {
            samples.len()
        };
        for (i, &sample) in samples[..size].iter().enumerate() {
            let x = match &self.window_cache {
                Some(cache) => {
                    let pos = i + self.processed_samples;
                    let hann = if pos < cache.len() {
                        cache[pos]
                    } else {
                        cache[(self.window_size - 1) - pos]
                    };
                    f64::from(sample) * f64::from(hann)
                }
                None => f64::from(sample),
            };
            self.s0 = x + self.cos_pik_term2 * self.s1 - self.s2;
            self.s2 = self.s1;
            self.s1 = self.s0;
        }
        self.processed_samples += samples.len();
    }

    /// Finalize the window and return the RMS of the analyzed bin. The
    /// analyzer is reset for the next window.
    pub fn compute_rms(&mut self) -> f32 {
        self.s0 = self.last_sample + self.cos_pik_term2 * self.s1 - self.s2;
        // substitute the last iteration with a complex multiplication,
        // correcting the phase for non-integer bin frequencies
        let cc = Complex64::new(self.pik_term.cos(), -self.pik_term.sin());
        let part_a = Complex64::new(self.s0, 0.0) - Complex64::new(self.s1, 0.0) * cc;
        let phase = self.pik_term * (self.window_size as f64 - 1.0);
        let part_b = Complex64::new(phase.cos(), -phase.sin());
        let y = part_a * part_b;
        let rms = (y.norm_sqr() * 2.0).sqrt() / self.window_size as f64;
        self.reset();
        rms as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE_RATE: f32 = 44_100.0;
    const SAMPLES: usize = 2205;

    fn sine(frequency: f32, peak: f64) -> Vec<f32> {
        (0..SAMPLES)
            .map(|s| {
                let t = s as f64 / SAMPLE_RATE as f64;
                ((TAU * frequency as f64 * t).sin() * peak) as f32
            })
            .collect()
    }

    #[test]
    fn rms_of_pure_sine_matches_its_level() {
        let power_rms = 10f64.powf(-26.0 / 20.0);
        let audio = sine(1000.0, power_rms * 2f64.sqrt());
        let mut goertzel = Goertzel::new(SAMPLE_RATE, 1000.0, SAMPLES, false);
        goertzel.process_samples(&audio);
        let signal_rms = goertzel.compute_rms() as f64;
        assert_relative_eq!(
            20.0 * power_rms.log10(),
            20.0 * signal_rms.log10(),
            epsilon = 0.01
        );
    }

    #[test]
    fn partial_feeds_match_a_single_feed() {
        let power_rms = 10f64.powf(-26.0 / 20.0);
        let audio = sine(1000.0, power_rms * 2f64.sqrt());
        let mut whole = Goertzel::new(SAMPLE_RATE, 1000.0, SAMPLES, false);
        whole.process_samples(&audio);
        let expected = whole.compute_rms();

        let mut chunked = Goertzel::new(SAMPLE_RATE, 1000.0, SAMPLES, false);
        let mut cursor = 0;
        let mut step = 20;
        while cursor < SAMPLES {
            let size = step.min(SAMPLES - cursor);
            chunked.process_samples(&audio[cursor..cursor + size]);
            cursor += size;
            step = (step * 7) % 115 + 20;
        }
        let actual = chunked.compute_rms();
        assert_relative_eq!(expected, actual, epsilon = 1e-5);
    }

    #[test]
    fn off_frequency_tone_is_attenuated() {
        let audio = sine(1000.0, 0.5);
        let mut on_bin = Goertzel::new(SAMPLE_RATE, 1000.0, SAMPLES, false);
        on_bin.process_samples(&audio);
        let mut off_bin = Goertzel::new(SAMPLE_RATE, 1380.0, SAMPLES, false);
        off_bin.process_samples(&audio);
        assert!(on_bin.compute_rms() > off_bin.compute_rms() * 10.0);
    }

    #[test]
    fn overflowing_chunk_is_ignored() {
        let audio = sine(1000.0, 0.5);
        let mut goertzel = Goertzel::new(SAMPLE_RATE, 1000.0, 64, false);
        goertzel.process_samples(&audio[..60]);
        goertzel.process_samples(&audio[..60]);
        assert_eq!(60, goertzel.processed_samples());
    }
}

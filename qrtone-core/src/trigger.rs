//! Start-of-frame detection
//!
//! Every frame opens with two gate tones of `gate_length` samples each. The
//! analyzer watches both gate frequencies through two Goertzel pipelines
//! whose windows are staggered by half a window, so a gate tone always falls
//! near the center of one of them. Per completed window it records the SPL
//! of both gates, feeds the gate-2 level to a background-noise percentile
//! and a peak finder, and on a gate-2 peak verifies the expected gate
//! sequence: gate 1 loud then silent, gate 2 silent then loud, everything
//! sufficiently above the noise floor. The exact first-tone position is
//! refined by parabolic interpolation over the SPL history.

use crate::config::PERCENTILE_BACKGROUND;
use crate::signal_processing::windows::hann_window;
use crate::signal_processing::{find_peak_location, CircularBuffer, Goertzel, PeakFinder, Percentile};

/// Observer invoked for every analysis window with
/// `(sample_index, gate1_spl, gate2_spl, triggered)`.
pub type LevelCallback = Box<dyn FnMut(i64, f32, f32, bool)>;

#[derive(Debug, Clone, Copy)]
enum Pipeline {
    Alpha,
    Beta,
}

/// Locates the start-of-frame gate sequence in a continuous sample stream.
#[derive(Debug)]
pub struct TriggerAnalyzer {
    processed_window_alpha: usize,
    processed_window_beta: usize,
    window_offset: usize,
    gate_length: usize,
    frequency_analyzers_alpha: [Goertzel; 2],
    frequency_analyzers_beta: [Goertzel; 2],
    background_noise_evaluator: Percentile,
    /// SPL history per gate frequency, one entry per completed window.
    spl_history: [CircularBuffer; 2],
    peak_finder: PeakFinder,
    window_analyze: usize,
    window_cache: Vec<f32>,
    trigger_snr: f32,
    first_tone_location: Option<i64>,
}

impl TriggerAnalyzer {
    pub fn new(
        sample_rate: f32,
        gate_length: usize,
        window_analyze: usize,
        gate_frequencies: [f32; 2],
        trigger_snr: f32,
    ) -> Self {
        let window_offset = window_analyze / 2;
        let bank = |frequencies: [f32; 2]| {
            [
                Goertzel::new(sample_rate, frequencies[0], window_analyze, false),
                Goertzel::new(sample_rate, frequencies[1], window_analyze, false),
            ]
        };
        let history_length = (gate_length * 3) / window_offset;
        let slope_windows = 1.max((gate_length / 2) / window_offset);
        let mut window_cache = vec![1.0f32; window_analyze / 2 + 1];
        hann_window(&mut window_cache, window_analyze, 0);
        Self {
            processed_window_alpha: 0,
            processed_window_beta: 0,
            window_offset,
            gate_length,
            frequency_analyzers_alpha: bank(gate_frequencies),
            frequency_analyzers_beta: bank(gate_frequencies),
            background_noise_evaluator: Percentile::new(PERCENTILE_BACKGROUND),
            spl_history: [
                CircularBuffer::new(history_length),
                CircularBuffer::new(history_length),
            ],
            peak_finder: PeakFinder::new(-1, slope_windows as i32),
            window_analyze,
            window_cache,
            trigger_snr,
            first_tone_location: None,
        }
    }

    /// Sample index of the first payload tone, once the gate sequence has
    /// been recognized.
    pub fn first_tone_location(&self) -> Option<i64> {
        self.first_tone_location
    }

    /// Samples accepted before the next window boundary of either pipeline.
    pub fn maximum_window_length(&self) -> usize {
        (self.window_analyze - self.processed_window_alpha)
            .min(self.window_analyze - self.processed_window_beta)
    }

    /// Clear per-frame state. The background noise estimate survives, it
    /// describes the room rather than the frame.
    pub fn reset(&mut self) {
        self.first_tone_location = None;
        self.peak_finder.reset();
        self.processed_window_alpha = 0;
        self.processed_window_beta = 0;
        for analyzer in self
            .frequency_analyzers_alpha
            .iter_mut()
            .chain(self.frequency_analyzers_beta.iter_mut())
        {
            analyzer.reset();
        }
        for history in self.spl_history.iter_mut() {
            history.clear();
        }
    }

    /// Feed a chunk of audio. `total_processed` is the stream position of
    /// `samples[0]`.
    pub fn process_samples(
        &mut self,
        total_processed: i64,
        samples: &[f32],
        level_callback: &mut Option<LevelCallback>,
    ) {
        let mut scratch = samples.to_vec();
        self.process_pipeline(total_processed, &mut scratch, Pipeline::Alpha, level_callback);
        let offset = self.window_offset as i64;
        if total_processed > offset {
            let mut scratch = samples.to_vec();
            self.process_pipeline(total_processed, &mut scratch, Pipeline::Beta, level_callback);
        } else if offset - total_processed < samples.len() as i64 {
            // the staggered pipeline starts half a window into the stream
            let from = (offset - total_processed) as usize;
            let mut scratch = samples[from..].to_vec();
            self.process_pipeline(
                total_processed + from as i64,
                &mut scratch,
                Pipeline::Beta,
                level_callback,
            );
        }
    }

    fn process_pipeline(
        &mut self,
        total_processed: i64,
        samples: &mut [f32],
        pipeline: Pipeline,
        level_callback: &mut Option<LevelCallback>,
    ) {
        let mut processed = 0usize;
        while self.first_tone_location.is_none() && processed < samples.len() {
            let window_processed = match pipeline {
                Pipeline::Alpha => self.processed_window_alpha,
                Pipeline::Beta => self.processed_window_beta,
            };
            let to_process =
                (samples.len() - processed).min(self.window_analyze - window_processed);
            for i in 0..to_process {
                let pos = i + window_processed;
                let hann = if pos < self.window_cache.len() {
                    self.window_cache[pos]
                } else {
                    self.window_cache[(self.window_analyze - 1) - pos]
                };
                samples[processed + i] *= hann;
            }
            {
                let analyzers = match pipeline {
                    Pipeline::Alpha => &mut self.frequency_analyzers_alpha,
                    Pipeline::Beta => &mut self.frequency_analyzers_beta,
                };
                for analyzer in analyzers.iter_mut() {
                    analyzer.process_samples(&samples[processed..processed + to_process]);
                }
            }
            processed += to_process;
            let window_processed = window_processed + to_process;
            if window_processed < self.window_analyze {
                match pipeline {
                    Pipeline::Alpha => self.processed_window_alpha = window_processed,
                    Pipeline::Beta => self.processed_window_beta = window_processed,
                }
                continue;
            }
            match pipeline {
                Pipeline::Alpha => self.processed_window_alpha = 0,
                Pipeline::Beta => self.processed_window_beta = 0,
            }
            let spl_levels = {
                let analyzers = match pipeline {
                    Pipeline::Alpha => &mut self.frequency_analyzers_alpha,
                    Pipeline::Beta => &mut self.frequency_analyzers_beta,
                };
                [
                    20.0 * analyzers[0].compute_rms().log10(),
                    20.0 * analyzers[1].compute_rms().log10(),
                ]
            };
            for (history, &spl) in self.spl_history.iter_mut().zip(&spl_levels) {
                history.add(spl);
            }
            self.background_noise_evaluator.add(f64::from(spl_levels[1]));
            let location = total_processed + processed as i64 - self.window_analyze as i64;
            let mut triggered = false;
            if self.peak_finder.add(location, spl_levels[1]) {
                triggered = self.check_gate_sequence(location);
            }
            if let Some(callback) = level_callback.as_mut() {
                callback(location, spl_levels[0], spl_levels[1], triggered);
            }
        }
    }

    /// A gate-2 SPL peak was found; verify the full gate sequence around it
    /// and lock the first tone location on success.
    fn check_gate_sequence(&mut self, location: i64) -> bool {
        let element_index = self.peak_finder.last_peak_index();
        let element_value = self.peak_finder.last_peak_value();
        let background = self.background_noise_evaluator.result() as f32;
        if element_value <= background + self.trigger_snr {
            return false;
        }
        let silence_level = element_value - self.trigger_snr;
        let window_offset = self.window_offset as i64;
        let gate1_history = &self.spl_history[0];
        let gate2_history = &self.spl_history[1];
        let history_size = gate2_history.size() as i64;

        // gate 1 must be quiet while gate 2 peaks
        let peak_index =
            history_size - 1 - (location / window_offset - element_index / window_offset);
        if peak_index < 0 || peak_index >= history_size {
            return false;
        }
        if gate1_history.get(peak_index as usize) >= silence_level {
            return false;
        }

        // one gate earlier, gate 1 must have peaked with gate 2 quiet
        let first_peak_index = peak_index - (self.gate_length / self.window_offset) as i64;
        if first_peak_index < 0 || first_peak_index >= history_size {
            return false;
        }
        if gate1_history.get(first_peak_index as usize) <= silence_level {
            return false;
        }
        if gate2_history.get(first_peak_index as usize) >= silence_level {
            return false;
        }

        if peak_index < 1 || peak_index + 1 >= history_size {
            return false;
        }
        let peak_location = find_peak_location(
            f64::from(gate2_history.get((peak_index - 1) as usize)),
            f64::from(gate2_history.get(peak_index as usize)),
            f64::from(gate2_history.get((peak_index + 1) as usize)),
            element_index,
            self.window_offset,
        );
        self.first_tone_location =
            Some(peak_location + (self.gate_length / 2) as i64 + window_offset);
        true
    }
}

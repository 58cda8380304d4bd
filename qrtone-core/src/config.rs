//! Configuration types and physical-layer constants for the QRTone modem.
//!
//! The wire format is fixed: 32 tones spaced a 12-TET semitone apart from
//! 1720 Hz, 60 ms words separated by 10 ms of silence, 120 ms gate tones.
//! Only the sample rate is chosen by the caller; everything else derives
//! from it.

use serde::{Deserialize, Serialize};

/// Number of analyzed tone frequencies (16 columns + 16 rows).
pub const NUM_FREQUENCIES: usize = 32;
/// Column/row split of the tone grid, DTMF style.
pub const FREQUENCY_ROOT: usize = 16;
/// Lowest tone of the grid, in Hz.
pub const AUDIBLE_FIRST_FREQUENCY: f64 = 1720.0;
/// 12-TET semitone ratio between adjacent tones.
pub const MULT_SEMITONE: f64 = 1.047_294_122_820_626_7;
/// Word (tone pair) duration in seconds.
pub const WORD_TIME: f64 = 0.06;
/// Silence before each word in seconds.
pub const WORD_SILENCE_TIME: f64 = 0.01;
/// Gate tone duration in seconds.
pub const GATE_TIME: f64 = 0.12;
/// Signal-to-noise ratio required of the gate peaks, in dB.
pub const DEFAULT_TRIGGER_SNR: f32 = 15.0;
/// Quantile used as the background noise estimate.
pub const PERCENTILE_BACKGROUND: f64 = 0.5;
/// Taper fraction of the word Tukey window.
pub const TUKEY_ALPHA: f32 = 0.5;
/// Tone analysis bin half-width, as a fraction of a semitone. The received
/// pitch may be off target, so the window is sized to still capture it.
pub const WINDOW_WIDTH: f64 = 0.65;

/// Bytes appended to the payload when the CRC flag is set.
pub const CRC_BYTE_LENGTH: usize = 2;
/// Encoded header length in bytes.
pub const HEADER_SIZE: usize = 3;
/// Parity symbols protecting the header block.
pub const HEADER_ECC_SYMBOLS: usize = 2;
/// Symbols of a complete header block (2 per byte plus parity).
pub const HEADER_SYMBOLS: usize = HEADER_SIZE * 2 + HEADER_ECC_SYMBOLS;

/// Reed-Solomon field parameters: GF(16), primitive polynomial 0x13,
/// generator base 1.
pub const RS_PRIMITIVE: i32 = 0x13;
pub const RS_FIELD_SIZE: i32 = 16;
pub const RS_GENERATOR_BASE: i32 = 1;

/// Error-correction level of a frame, trading payload rate for robustness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EccLevel {
    Low,
    Medium,
    Quality,
    High,
}

impl EccLevel {
    /// Symbols per Reed-Solomon block at this level.
    pub fn block_symbols(self) -> usize {
        match self {
            EccLevel::Low => 14,
            EccLevel::Medium => 14,
            EccLevel::Quality => 12,
            EccLevel::High => 10,
        }
    }

    /// Parity symbols per Reed-Solomon block at this level.
    pub fn ecc_symbols(self) -> usize {
        match self {
            EccLevel::Low => 2,
            EccLevel::Medium => 4,
            EccLevel::Quality => 6,
            EccLevel::High => 6,
        }
    }

    /// Wire encoding of the level (2 bits of the header flags byte).
    pub fn index(self) -> u8 {
        match self {
            EccLevel::Low => 0,
            EccLevel::Medium => 1,
            EccLevel::Quality => 2,
            EccLevel::High => 3,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(EccLevel::Low),
            1 => Some(EccLevel::Medium),
            2 => Some(EccLevel::Quality),
            3 => Some(EccLevel::High),
            _ => None,
        }
    }
}

impl Default for EccLevel {
    fn default() -> Self {
        EccLevel::Quality
    }
}

/// Physical-layer geometry derived from the sample rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub sample_rate: f32,
    /// Samples of one word (tone pair).
    pub word_length: usize,
    /// Samples of one gate tone.
    pub gate_length: usize,
    /// Samples of silence preceding each word.
    pub word_silence_length: usize,
    /// The 32-tone grid; columns are indices 0..16, rows 16..32.
    pub frequencies: [f32; NUM_FREQUENCIES],
    pub gate1_frequency: f32,
    pub gate2_frequency: f32,
    pub trigger_snr: f32,
}

impl ProtocolConfig {
    pub fn new(sample_rate: f32) -> Self {
        let frequencies = compute_frequencies(0.0);
        Self {
            sample_rate,
            word_length: (sample_rate as f64 * WORD_TIME).round() as usize,
            gate_length: (sample_rate as f64 * GATE_TIME).round() as usize,
            word_silence_length: (sample_rate as f64 * WORD_SILENCE_TIME).round() as usize,
            frequencies,
            gate1_frequency: frequencies[FREQUENCY_ROOT],
            gate2_frequency: frequencies[FREQUENCY_ROOT + 2],
            trigger_snr: DEFAULT_TRIGGER_SNR,
        }
    }

    /// Goertzel window for tone `index`: the word length, shortened when the
    /// spacing to the nearest analyzed neighbor allows a leak-free window.
    pub fn tone_analyze_window(&self, index: usize) -> usize {
        let shifted = compute_frequencies(WINDOW_WIDTH);
        let adaptive = minimum_window_size(
            self.sample_rate,
            self.frequencies[index],
            shifted[index],
        );
        self.word_length.min(adaptive)
    }

    /// Samples of one word slot on the wire (leading silence plus tones).
    pub fn word_slot_length(&self) -> usize {
        self.word_silence_length + self.word_length
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self::new(44_100.0)
    }
}

/// The tone grid, optionally shifted by a fraction of a semitone.
pub fn compute_frequencies(offset: f64) -> [f32; NUM_FREQUENCIES] {
    let mut frequencies = [0.0f32; NUM_FREQUENCIES];
    for (i, frequency) in frequencies.iter_mut().enumerate() {
        *frequency = (AUDIBLE_FIRST_FREQUENCY * MULT_SEMITONE.powf(i as f64 + offset)) as f32;
    }
    frequencies
}

/// Smallest window separating `target_frequency` from `closest_frequency`
/// without spectral leakage, floored at five periods of the target.
pub fn minimum_window_size(
    sample_rate: f32,
    target_frequency: f32,
    closest_frequency: f32,
) -> usize {
    let max_bin_size = (closest_frequency - target_frequency).abs() / 2.0;
    let window_size = (sample_rate / max_bin_size).ceil() as usize;
    window_size.max((sample_rate as f64 * (5.0 / target_frequency as f64)).ceil() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn tone_grid_spans_two_semitone_octaves() {
        let frequencies = compute_frequencies(0.0);
        assert_relative_eq!(1720.0, frequencies[0], epsilon = 1e-3);
        // each step is one semitone
        for pair in frequencies.windows(2) {
            assert_relative_eq!(
                MULT_SEMITONE as f32,
                pair[1] / pair[0],
                epsilon = 1e-4
            );
        }
    }

    #[test]
    fn derived_lengths_at_44100() {
        let config = ProtocolConfig::new(44_100.0);
        assert_eq!(2646, config.word_length);
        assert_eq!(5292, config.gate_length);
        assert_eq!(441, config.word_silence_length);
        assert_relative_eq!(config.frequencies[16], config.gate1_frequency);
        assert_relative_eq!(config.frequencies[18], config.gate2_frequency);
    }

    #[test]
    fn tone_windows_never_exceed_the_word() {
        let config = ProtocolConfig::new(44_100.0);
        for index in 0..NUM_FREQUENCIES {
            let window = config.tone_analyze_window(index);
            assert!(window > 0 && window <= config.word_length);
        }
    }

    #[test]
    fn ecc_levels_match_the_wire_table() {
        let table = [
            (EccLevel::Low, 14, 2),
            (EccLevel::Medium, 14, 4),
            (EccLevel::Quality, 12, 6),
            (EccLevel::High, 10, 6),
        ];
        for (level, block, ecc) in table {
            assert_eq!(block, level.block_symbols());
            assert_eq!(ecc, level.ecc_symbols());
            assert_eq!(Some(level), EccLevel::from_index(level.index()));
        }
    }
}

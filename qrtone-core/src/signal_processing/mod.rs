//! Signal processing primitives for the QRTone modem
//!
//! This module collects the DSP building blocks: the incremental Goertzel
//! analyzer, window functions and tone synthesis, the P-square quantile
//! estimator, the circular SPL history and the peak finder. They carry no
//! protocol knowledge and are reusable on their own.

pub mod goertzel;
pub mod history;
pub mod peaks;
pub mod percentile;
pub mod windows;

pub use goertzel::Goertzel;
pub use history::CircularBuffer;
pub use peaks::{find_peak_location, quadratic_interpolation, PeakFinder};
pub use percentile::Percentile;
pub use windows::{generate_pitch, hann_window, tukey_window, IterativeHann, IterativeTone};

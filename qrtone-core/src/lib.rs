//! QRTone core library
//!
//! QRTone is an acoustic data link: short byte payloads are modulated into
//! an audible tone sequence, played through a loudspeaker, captured by a
//! microphone and recovered from the received audio. This crate is the
//! complete physical layer: framing, Reed-Solomon error correction,
//! chirp-based synchronization, Goertzel demodulation and the streaming
//! modem state machine. Audio I/O stays with the embedder; the modem only
//! ever sees `f32` sample buffers.
//!
//! ```no_run
//! use qrtone_core::Modem;
//!
//! let mut sender = Modem::new(44_100.0);
//! let total = sender.set_payload(b"hello").unwrap();
//! let mut audio = vec![0.0f32; total];
//! sender.get_samples(&mut audio, 0, 0.5);
//!
//! let mut receiver = Modem::new(44_100.0);
//! let mut cursor = 0;
//! while cursor < audio.len() {
//!     let size = receiver.get_maximum_length().min(audio.len() - cursor);
//!     if receiver.push_samples(&audio[cursor..cursor + size]) {
//!         assert_eq!(Some(&b"hello"[..]), receiver.payload());
//!         break;
//!     }
//!     cursor += size;
//! }
//! ```

pub mod config;
pub mod crc;
pub mod ecc;
pub mod errors;
pub mod frame;
pub mod logging;
pub mod modem;
pub mod signal_processing;
pub mod trigger;

pub use config::{EccLevel, ProtocolConfig};
pub use errors::{EccError, EncodingError, QrToneError, Result};
pub use frame::FrameHeader;
pub use modem::Modem;
pub use trigger::LevelCallback;

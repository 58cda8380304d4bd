//! Modem orchestrator
//!
//! Ties the DSP and coding layers into the two public pipelines:
//!
//! * send: payload bytes -> header + Reed-Solomon blocks -> interleaved
//!   hex-nibble symbols -> gate tones and Tukey-shaped tone-pair words,
//!   synthesized on demand for any `[offset, offset + n)` window of the
//!   waveform;
//! * receive: arbitrary sample chunks -> trigger analyzer until the gate
//!   sequence locks -> per-word Goertzel bank over all 32 tones -> header
//!   decode, then body decode with the geometry the header announced.
//!
//! The receive side is a two-state machine. WAITING_TRIGGER owns the
//! trigger analyzer, PARSING_SYMBOLS owns the symbol buffer and indices.
//! Every decode failure (header CRC-8, uncorrectable Reed-Solomon block,
//! payload CRC-16) silently re-arms the trigger.

use crate::config::{
    EccLevel, ProtocolConfig, CRC_BYTE_LENGTH, FREQUENCY_ROOT, HEADER_ECC_SYMBOLS, HEADER_SIZE,
    HEADER_SYMBOLS, NUM_FREQUENCIES, RS_FIELD_SIZE, RS_GENERATOR_BASE, RS_PRIMITIVE, TUKEY_ALPHA,
};
use crate::crc::Crc16;
use crate::ecc::{reed_solomon, GaloisField, ReedSolomonEncoder};
use crate::errors::{EncodingError, Result};
use crate::frame::{deinterleave_symbols, interleave_symbols, BlockLayout, FrameHeader};
use crate::logging::SignalLogger;
use crate::signal_processing::{generate_pitch, hann_window, tukey_window, Goertzel};
use crate::trigger::{LevelCallback, TriggerAnalyzer};

/// Per-frame state while symbols are being demodulated.
#[derive(Debug)]
struct FrameParsing {
    /// Decoded header, `None` while the header symbols themselves are
    /// still being received.
    header: Option<FrameHeader>,
    symbols: Vec<u8>,
    symbol_index: usize,
}

#[derive(Debug)]
enum DecoderState {
    WaitingTrigger(TriggerAnalyzer),
    ParsingSymbols(FrameParsing),
}

enum FrameEvent {
    None,
    Dropped,
    Completed,
}

/// Bidirectional QRTone modem bound to one sample rate.
pub struct Modem {
    config: ProtocolConfig,
    state: DecoderState,
    tone_analyzers: Vec<Goertzel>,
    first_tone_sample_index: i64,
    pushed_samples: i64,
    symbols_to_deliver: Vec<u8>,
    payload: Option<Vec<u8>>,
    fixed_errors: i32,
    encoder: ReedSolomonEncoder,
    level_callback: Option<LevelCallback>,
    logger: SignalLogger,
}

impl Modem {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_config(ProtocolConfig::new(sample_rate))
    }

    pub fn with_config(config: ProtocolConfig) -> Self {
        let tone_analyzers: Vec<Goertzel> = (0..NUM_FREQUENCIES)
            .map(|i| {
                Goertzel::new(
                    config.sample_rate,
                    config.frequencies[i],
                    config.tone_analyze_window(i),
                    true,
                )
            })
            .collect();
        let trigger = Self::new_trigger(&config, &tone_analyzers);
        Self {
            config,
            state: DecoderState::WaitingTrigger(trigger),
            tone_analyzers,
            first_tone_sample_index: -1,
            pushed_samples: 0,
            symbols_to_deliver: Vec::new(),
            payload: None,
            fixed_errors: 0,
            encoder: ReedSolomonEncoder::new(RS_PRIMITIVE, RS_FIELD_SIZE, RS_GENERATOR_BASE),
            level_callback: None,
            logger: SignalLogger::default(),
        }
    }

    fn new_trigger(config: &ProtocolConfig, tone_analyzers: &[Goertzel]) -> TriggerAnalyzer {
        // the trigger analyzes gate 1 with the same window as the gate-1
        // tone of the word bank
        TriggerAnalyzer::new(
            config.sample_rate,
            config.gate_length,
            tone_analyzers[FREQUENCY_ROOT].window_size(),
            [config.gate1_frequency, config.gate2_frequency],
            config.trigger_snr,
        )
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn logger(&self) -> &SignalLogger {
        &self.logger
    }

    pub fn logger_mut(&mut self) -> &mut SignalLogger {
        &mut self.logger
    }

    /// Observe per-window gate levels and trigger decisions.
    pub fn set_level_callback(&mut self, callback: LevelCallback) {
        self.level_callback = Some(callback);
    }

    // --- send path ---

    /// Configure a frame at the default level (Quality) with CRC, returning
    /// the total sample count of the waveform.
    pub fn set_payload(&mut self, payload: &[u8]) -> Result<usize> {
        self.set_payload_ext(payload, EccLevel::default(), true)
    }

    /// Configure a frame, returning the total sample count of the waveform.
    pub fn set_payload_ext(
        &mut self,
        payload: &[u8],
        ecc_level: EccLevel,
        add_crc: bool,
    ) -> Result<usize> {
        if payload.len() > usize::from(u8::MAX) {
            return Err(EncodingError::PayloadTooLong {
                length: payload.len(),
                max: usize::from(u8::MAX),
            }
            .into());
        }
        let header = FrameHeader::new(payload.len() as u8, ecc_level, add_crc);
        let layout = header.layout();
        let mut symbols = vec![0u8; HEADER_SYMBOLS + layout.number_of_symbols];
        let header_data = header.encode();
        self.encode_payload_symbols(
            &header_data,
            HEADER_SYMBOLS,
            HEADER_ECC_SYMBOLS,
            false,
            &mut symbols[..HEADER_SYMBOLS],
        )?;
        self.encode_payload_symbols(
            payload,
            ecc_level.block_symbols(),
            ecc_level.ecc_symbols(),
            add_crc,
            &mut symbols[HEADER_SYMBOLS..],
        )?;
        self.symbols_to_deliver = symbols;
        Ok(2 * self.config.gate_length
            + (self.symbols_to_deliver.len() / 2) * self.config.word_slot_length())
    }

    /// Turn payload bytes into an interleaved symbol stream with the given
    /// block geometry.
    pub fn payload_to_symbols(
        &mut self,
        payload: &[u8],
        block_symbols: usize,
        ecc_symbols: usize,
        has_crc: bool,
    ) -> Result<Vec<u8>> {
        let crc_bytes = if has_crc { CRC_BYTE_LENGTH } else { 0 };
        let layout = BlockLayout::new(payload.len() + crc_bytes, block_symbols, ecc_symbols);
        let mut symbols = vec![0u8; layout.number_of_symbols];
        self.encode_payload_symbols(payload, block_symbols, ecc_symbols, has_crc, &mut symbols)?;
        Ok(symbols)
    }

    fn encode_payload_symbols(
        &mut self,
        payload: &[u8],
        block_symbols: usize,
        ecc_symbols: usize,
        has_crc: bool,
        symbols: &mut [u8],
    ) -> Result<()> {
        let mut payload_bytes = payload.to_vec();
        if has_crc {
            let mut crc = Crc16::new();
            crc.add_bytes(payload);
            let value = crc.value();
            payload_bytes.push((value >> 8) as u8);
            payload_bytes.push((value & 0xFF) as u8);
        }
        let layout = BlockLayout::new(payload_bytes.len(), block_symbols, ecc_symbols);
        debug_assert_eq!(symbols.len(), layout.number_of_symbols);
        let mut block = vec![0i32; block_symbols];
        for block_id in 0..layout.number_of_blocks {
            block.fill(0);
            let byte_offset = block_id * layout.payload_bytes_per_block;
            let payload_size = layout
                .payload_bytes_per_block
                .min(payload_bytes.len() - byte_offset);
            for i in 0..payload_size {
                let byte = payload_bytes[byte_offset + i];
                block[i * 2] = i32::from(byte >> 4);
                block[i * 2 + 1] = i32::from(byte & 0x0F);
            }
            self.encoder.encode(&mut block, ecc_symbols)?;
            let out = &mut symbols[block_id * block_symbols..];
            for i in 0..payload_size * 2 {
                out[i] = block[i] as u8;
            }
            for i in 0..ecc_symbols {
                out[payload_size * 2 + i] = block[layout.payload_symbols + i] as u8;
            }
        }
        interleave_symbols(symbols, block_symbols);
        Ok(())
    }

    /// Synthesize `samples.len()` samples of the configured frame starting
    /// at `offset` within its waveform. Tones are summed into the buffer,
    /// the caller clears it beforehand.
    pub fn get_samples(&self, samples: &mut [f32], offset: usize, power_peak: f32) {
        let request_offset = offset as i64;
        let request_end = request_offset + samples.len() as i64;
        let mut cursor: i64 = 0;

        for gate_frequency in [self.config.gate1_frequency, self.config.gate2_frequency] {
            if let Some((segment, inner_offset)) =
                overlap(samples, request_offset, cursor, self.config.gate_length)
            {
                generate_pitch(
                    segment,
                    inner_offset,
                    self.config.sample_rate,
                    gate_frequency,
                    power_peak,
                );
                hann_window(segment, self.config.gate_length, inner_offset);
            }
            cursor += self.config.gate_length as i64;
            if cursor > request_end {
                return;
            }
        }

        for pair in self.symbols_to_deliver.chunks_exact(2) {
            cursor += self.config.word_silence_length as i64;
            if let Some((segment, inner_offset)) =
                overlap(samples, request_offset, cursor, self.config.word_length)
            {
                let column = self.config.frequencies[pair[0] as usize];
                let row = self.config.frequencies[pair[1] as usize + FREQUENCY_ROOT];
                generate_pitch(
                    segment,
                    inner_offset,
                    self.config.sample_rate,
                    column,
                    power_peak / 2.0,
                );
                generate_pitch(
                    segment,
                    inner_offset,
                    self.config.sample_rate,
                    row,
                    power_peak / 2.0,
                );
                tukey_window(segment, TUKEY_ALPHA, self.config.word_length, inner_offset);
            }
            cursor += self.config.word_length as i64;
            if cursor > request_end {
                return;
            }
        }
    }

    // --- receive path ---

    /// Upper bound on the next `push_samples` chunk: the distance to the
    /// next internal window boundary.
    pub fn get_maximum_length(&self) -> usize {
        match &self.state {
            DecoderState::WaitingTrigger(trigger) => trigger.maximum_window_length(),
            DecoderState::ParsingSymbols(parsing) => {
                let remaining = self.config.word_length as i64
                    + (self.pushed_samples - self.tone_location(parsing.symbol_index));
                remaining.max(0) as usize
            }
        }
    }

    /// Stream position where the word slot of `symbol_index` starts its
    /// tones.
    fn tone_location(&self, symbol_index: usize) -> i64 {
        self.first_tone_sample_index
            + symbol_index as i64 * self.config.word_slot_length() as i64
            + self.config.word_silence_length as i64
    }

    /// Consume a chunk of microphone samples. Returns true when a complete
    /// payload has been decoded; it stays available through
    /// [`Self::payload`] until the next frame locks.
    pub fn push_samples(&mut self, samples: &[f32]) -> bool {
        self.pushed_samples += samples.len() as i64;
        if matches!(self.state, DecoderState::WaitingTrigger(_)) {
            self.feed_trigger_analyzer(samples);
        }
        if matches!(self.state, DecoderState::ParsingSymbols(_)) {
            return self.analyze_tones(samples);
        }
        false
    }

    /// Abandon any in-progress frame and return to WAITING_TRIGGER.
    pub fn reset(&mut self) {
        self.symbols_to_deliver.clear();
        for analyzer in self.tone_analyzers.iter_mut() {
            analyzer.reset();
        }
        self.state = DecoderState::WaitingTrigger(Self::new_trigger(&self.config, &self.tone_analyzers));
    }

    /// Payload of the most recent successful decode.
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Symbols corrected by Reed-Solomon in the most recent decode.
    pub fn fixed_errors(&self) -> i32 {
        self.fixed_errors
    }

    /// Stream position of the first gate sample of the decoded frame.
    pub fn payload_sample_index(&self) -> i64 {
        self.first_tone_sample_index
            - (HEADER_SYMBOLS as i64 / 2) * self.config.word_slot_length() as i64
            - 2 * self.config.gate_length as i64
    }

    fn feed_trigger_analyzer(&mut self, samples: &[f32]) {
        let total_processed = self.pushed_samples - samples.len() as i64;
        let first_tone_location = {
            let DecoderState::WaitingTrigger(trigger) = &mut self.state else {
                return;
            };
            trigger.process_samples(total_processed, samples, &mut self.level_callback);
            trigger.first_tone_location()
        };
        if let Some(location) = first_tone_location {
            self.payload = None;
            self.first_tone_sample_index = location;
            self.fixed_errors = 0;
            for analyzer in self.tone_analyzers.iter_mut() {
                analyzer.reset();
            }
            self.logger.info(
                "TRIGGER",
                format!("gate sequence locked, first tone at sample {location}"),
            );
            self.state = DecoderState::ParsingSymbols(FrameParsing {
                header: None,
                symbols: vec![0u8; HEADER_SYMBOLS],
                symbol_index: 0,
            });
        }
    }

    /// Word-synchronous demodulation. Feeds each tone analyzer the part of
    /// the chunk that falls inside its centered window, emits two symbols
    /// per completed word and hands finished symbol buffers to the frame
    /// decoders.
    fn analyze_tones(&mut self, samples: &[f32]) -> bool {
        let samples_length = samples.len() as i64;
        let word_length = self.config.word_length as i64;
        let word_slot = self.config.word_slot_length() as i64;
        let silence = self.config.word_silence_length as i64;
        let pushed = self.pushed_samples;
        let mut first_tone = self.first_tone_sample_index;
        let tone_location =
            |first_tone: i64, symbol_index: usize| first_tone + symbol_index as i64 * word_slot + silence;

        let mut event = FrameEvent::None;
        {
            let DecoderState::ParsingSymbols(parsing) = &mut self.state else {
                return false;
            };
            let mut processed_samples =
                pushed - samples_length - tone_location(first_tone, parsing.symbol_index);
            let mut cursor =
                (samples_length - (pushed - tone_location(first_tone, parsing.symbol_index))).max(0);
            while cursor < samples_length {
                let tone_window_cursor = processed_samples + cursor;
                let cursor_increment =
                    (samples_length - cursor).min(word_length - tone_window_cursor);
                for analyzer in self.tone_analyzers.iter_mut() {
                    let window_size = analyzer.window_size() as i64;
                    let start_window = word_length / 2 - window_size / 2;
                    let start_analyze = (start_window - tone_window_cursor).max(0) + cursor;
                    let analyze_length = (samples_length - start_analyze)
                        .min(window_size - analyzer.processed_samples() as i64);
                    if analyze_length > 0 && start_analyze < samples_length {
                        analyzer.process_samples(
                            &samples[start_analyze as usize..(start_analyze + analyze_length) as usize],
                        );
                    }
                }
                if tone_window_cursor + cursor_increment == word_length {
                    // word complete, pick the strongest column and row tone
                    let mut spl = [0.0f32; NUM_FREQUENCIES];
                    for (analyzer, level) in self.tone_analyzers.iter_mut().zip(spl.iter_mut()) {
                        *level = 20.0 * analyzer.compute_rms().log10();
                    }
                    for symbol_offset in 0..2 {
                        let start = symbol_offset * FREQUENCY_ROOT;
                        let mut max_symbol_id = start;
                        for id_freq in start..start + FREQUENCY_ROOT {
                            if spl[id_freq] > spl[max_symbol_id] {
                                max_symbol_id = id_freq;
                            }
                        }
                        parsing.symbols[parsing.symbol_index * 2 + symbol_offset] =
                            (max_symbol_id - start) as u8;
                    }
                    parsing.symbol_index += 1;
                    // jump to the next word slot
                    processed_samples =
                        pushed - samples_length - tone_location(first_tone, parsing.symbol_index);
                    cursor = cursor.max(
                        samples_length - (pushed - tone_location(first_tone, parsing.symbol_index)),
                    );
                    if parsing.symbol_index * 2 == parsing.symbols.len() {
                        match parsing.header {
                            None => {
                                let header = symbols_to_payload(
                                    self.encoder.field(),
                                    &mut self.fixed_errors,
                                    &mut parsing.symbols,
                                    HEADER_SYMBOLS,
                                    HEADER_ECC_SYMBOLS,
                                    false,
                                )
                                .and_then(|bytes| <[u8; HEADER_SIZE]>::try_from(bytes).ok())
                                .and_then(|data| FrameHeader::decode(&data));
                                match header {
                                    None => {
                                        self.logger.warn("FRAME", "header rejected, re-arming");
                                        event = FrameEvent::Dropped;
                                        break;
                                    }
                                    // a zero-length CRC-less frame carries no body
                                    Some(header) if header.layout().number_of_symbols == 0 => {
                                        self.logger.warn("FRAME", "empty frame, re-arming");
                                        event = FrameEvent::Dropped;
                                        break;
                                    }
                                    Some(header) => {
                                        self.logger.debug(
                                            "FRAME",
                                            format!(
                                                "header: {} bytes, ecc {:?}, crc {}",
                                                header.length(),
                                                header.ecc_level(),
                                                header.crc()
                                            ),
                                        );
                                        parsing.symbols =
                                            vec![0u8; header.layout().number_of_symbols];
                                        parsing.symbol_index = 0;
                                        // body word slots are indexed past the header
                                        first_tone += (HEADER_SYMBOLS as i64 / 2) * word_slot;
                                        parsing.header = Some(header);
                                    }
                                }
                            }
                            Some(header) => {
                                self.payload = symbols_to_payload(
                                    self.encoder.field(),
                                    &mut self.fixed_errors,
                                    &mut parsing.symbols,
                                    header.ecc_level().block_symbols(),
                                    header.ecc_level().ecc_symbols(),
                                    header.crc(),
                                );
                                event = FrameEvent::Completed;
                                break;
                            }
                        }
                    }
                }
                cursor += cursor_increment;
            }
        }
        self.first_tone_sample_index = first_tone;
        match event {
            FrameEvent::None => false,
            FrameEvent::Dropped => {
                self.reset();
                false
            }
            FrameEvent::Completed => {
                if self.fixed_errors > 0 {
                    self.logger
                        .info("FEC", format!("corrected {} symbols", self.fixed_errors));
                }
                match &self.payload {
                    Some(payload) => self
                        .logger
                        .info("FRAME", format!("decoded {} byte payload", payload.len())),
                    None => self.logger.warn("FRAME", "frame dropped, re-arming"),
                }
                self.reset();
                self.payload.is_some()
            }
        }
    }

    /// Recover payload bytes from a (possibly corrupted) symbol stream with
    /// the given block geometry. Returns `None` when a block is
    /// uncorrectable or the payload CRC-16 mismatches.
    pub fn symbols_to_payload(
        &mut self,
        symbols: &mut [u8],
        block_symbols: usize,
        ecc_symbols: usize,
        has_crc: bool,
    ) -> Option<Vec<u8>> {
        symbols_to_payload(
            self.encoder.field(),
            &mut self.fixed_errors,
            symbols,
            block_symbols,
            ecc_symbols,
            has_crc,
        )
    }
}

/// The part of `samples` overlapped by the timeline segment starting at
/// `cursor`, together with the offset of that part inside the segment.
fn overlap<'a>(
    samples: &'a mut [f32],
    request_offset: i64,
    cursor: i64,
    segment_length: usize,
) -> Option<(&'a mut [f32], usize)> {
    let destination = (cursor - request_offset).max(0);
    let inner_offset = (request_offset - cursor).max(0);
    let length = (segment_length as i64 - inner_offset).min(samples.len() as i64 - destination);
    if length <= 0 {
        return None;
    }
    let destination = destination as usize;
    Some((
        &mut samples[destination..destination + length as usize],
        inner_offset as usize,
    ))
}

fn symbols_to_payload(
    field: &GaloisField,
    fixed_errors: &mut i32,
    symbols: &mut [u8],
    block_symbols: usize,
    ecc_symbols: usize,
    has_crc: bool,
) -> Option<Vec<u8>> {
    let symbols_length = symbols.len();
    let payload_symbols = block_symbols - ecc_symbols;
    let payload_bytes_per_block = payload_symbols / 2;
    let tail_data_symbols = (symbols_length % block_symbols).saturating_sub(ecc_symbols);
    let payload_length =
        ((symbols_length / block_symbols) * payload_symbols + tail_data_symbols) / 2;
    let number_of_blocks = symbols_length.div_ceil(block_symbols);
    deinterleave_symbols(symbols, block_symbols);

    let data_length = if has_crc {
        payload_length.saturating_sub(CRC_BYTE_LENGTH)
    } else {
        payload_length
    };
    let mut payload = vec![0u8; data_length];
    let mut crc_value = [0u8; CRC_BYTE_LENGTH];
    let mut crc_index = 0;
    let mut block = vec![0i32; block_symbols];
    for block_id in 0..number_of_blocks {
        block.fill(0);
        let block_offset = block_id * block_symbols;
        let payload_symbols_length = payload_symbols.min(symbols_length - ecc_symbols - block_offset);
        for i in 0..payload_symbols_length {
            block[i] = i32::from(symbols[block_offset + i]);
        }
        for i in 0..ecc_symbols {
            block[payload_symbols + i] = i32::from(symbols[block_offset + payload_symbols_length + i]);
        }
        reed_solomon::decode(field, &mut block, ecc_symbols, fixed_errors).ok()?;

        let byte_offset = block_id * payload_bytes_per_block;
        let payload_block_bytes = payload_bytes_per_block.min(data_length.saturating_sub(byte_offset));
        for i in 0..payload_block_bytes {
            payload[byte_offset + i] = (((block[i * 2] << 4) | (block[i * 2 + 1] & 0x0F)) & 0xFF) as u8;
        }
        if has_crc {
            // bytes past the data span of the final blocks carry the CRC
            let block_bytes = payload_bytes_per_block.min(payload_length - byte_offset);
            for i in payload_block_bytes..block_bytes {
                if crc_index < CRC_BYTE_LENGTH {
                    crc_value[crc_index] =
                        (((block[i * 2] << 4) | (block[i * 2 + 1] & 0x0F)) & 0xFF) as u8;
                    crc_index += 1;
                }
            }
        }
    }
    if has_crc {
        let stored_crc = u16::from(crc_value[0]) << 8 | u16::from(crc_value[1]);
        let mut crc = Crc16::new();
        crc.add_bytes(&payload);
        if crc.value() != stored_crc {
            return None;
        }
    }
    Some(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: [u8; 13] = [
        0x00, 0x04, b'n', b'i', b'c', b'o', 0x01, 0x05, b'h', b'e', b'l', b'l', b'o',
    ];
    const EXPECTED_SYMBOLS: [u8; 36] = [
        0, 0, 6, 0, 1, 15, 0, 0, 8, 4, 5, 12, 6, 6, 13, 14, 8, 0, 6, 6, 6, 9, 5, 14, 6, 6, 3, 12,
        6, 6, 15, 12, 2, 9, 6, 7,
    ];

    #[test]
    fn payload_to_symbols_matches_the_reference_stream() {
        let mut modem = Modem::new(44_100.0);
        let symbols = modem
            .payload_to_symbols(&PAYLOAD, 14, 2, true)
            .expect("payload fits");
        assert_eq!(EXPECTED_SYMBOLS.to_vec(), symbols);
    }

    #[test]
    fn symbols_round_trip_without_errors() {
        let mut modem = Modem::new(44_100.0);
        let mut symbols = modem.payload_to_symbols(&PAYLOAD, 14, 2, true).unwrap();
        let decoded = modem
            .symbols_to_payload(&mut symbols, 14, 2, true)
            .expect("clean symbols decode");
        assert_eq!(PAYLOAD.to_vec(), decoded);
        assert_eq!(0, modem.fixed_errors());
    }

    #[test]
    fn a_corrupted_symbol_is_fixed_and_counted() {
        let mut modem = Modem::new(44_100.0);
        let mut symbols = modem.payload_to_symbols(&PAYLOAD, 14, 2, true).unwrap();
        assert_eq!(EXPECTED_SYMBOLS.to_vec(), symbols);
        symbols[5] = !symbols[5] & 0x0F;
        let decoded = modem
            .symbols_to_payload(&mut symbols, 14, 2, true)
            .expect("single error is correctable");
        assert_eq!(PAYLOAD.to_vec(), decoded);
        assert_eq!(1, modem.fixed_errors());
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let mut modem = Modem::new(44_100.0);
        let payload = vec![0u8; 300];
        assert!(modem.set_payload(&payload).is_err());
    }

    #[test]
    fn frame_sample_count_matches_the_wire_layout() {
        let mut modem = Modem::new(44_100.0);
        let samples = modem.set_payload(&PAYLOAD).unwrap();
        let config = modem.config();
        // 13 bytes + CRC at level Q: 60 body symbols in (12, 6) blocks
        let body_symbols = FrameHeader::new(PAYLOAD.len() as u8, EccLevel::Quality, true)
            .layout()
            .number_of_symbols;
        let words = (HEADER_SYMBOLS + body_symbols) / 2;
        assert_eq!(
            2 * config.gate_length + words * config.word_slot_length(),
            samples
        );
    }

    #[test]
    fn synthesis_is_position_independent() {
        let mut modem = Modem::new(44_100.0);
        let total = modem.set_payload(&PAYLOAD).unwrap();
        let mut whole = vec![0.0f32; total];
        modem.get_samples(&mut whole, 0, 0.5);
        let mut pieced = vec![0.0f32; total];
        let mut cursor = 0;
        let mut step = 333;
        while cursor < total {
            let size = step.min(total - cursor);
            modem.get_samples(&mut pieced[cursor..cursor + size], cursor, 0.5);
            cursor += size;
            step = step % 1000 + 97;
        }
        for (a, b) in whole.iter().zip(&pieced) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}

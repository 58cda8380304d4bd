use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{bail, Context, Result};

use qrtone_core::{EccLevel, Modem};

#[derive(Parser, Debug)]
#[command(author, version, about = "QRTone acoustic data link", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a payload into a WAV file
    Encode {
        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,

        /// Message to encode (at most 255 bytes)
        #[arg(short, long)]
        message: String,

        /// Sample rate of the generated audio
        #[arg(long, default_value_t = 44_100)]
        sample_rate: u32,

        /// Error-correction level
        #[arg(long, value_enum, default_value = "quality")]
        ecc: EccArg,

        /// Skip the payload CRC-16
        #[arg(long)]
        no_crc: bool,

        /// Peak tone amplitude in dBFS
        #[arg(long, default_value_t = -16.0, allow_hyphen_values = true)]
        peak_dbfs: f32,

        /// Silence prepended and appended, in seconds
        #[arg(long, default_value_t = 0.5)]
        silence: f32,
    },
    /// Decode payloads from a WAV file
    Decode {
        /// Input WAV path
        input: PathBuf,

        /// Print the decoder log after the run
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EccArg {
    Low,
    Medium,
    Quality,
    High,
}

impl From<EccArg> for EccLevel {
    fn from(value: EccArg) -> Self {
        match value {
            EccArg::Low => EccLevel::Low,
            EccArg::Medium => EccLevel::Medium,
            EccArg::Quality => EccLevel::Quality,
            EccArg::High => EccLevel::High,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    match Cli::parse().command {
        Command::Encode {
            output,
            message,
            sample_rate,
            ecc,
            no_crc,
            peak_dbfs,
            silence,
        } => encode(
            &output,
            message.as_bytes(),
            sample_rate,
            ecc.into(),
            !no_crc,
            peak_dbfs,
            silence,
        ),
        Command::Decode { input, verbose } => decode(&input, verbose),
    }
}

fn encode(
    output: &PathBuf,
    payload: &[u8],
    sample_rate: u32,
    ecc_level: EccLevel,
    crc: bool,
    peak_dbfs: f32,
    silence: f32,
) -> Result<()> {
    let mut modem = Modem::new(sample_rate as f32);
    let frame_samples = modem
        .set_payload_ext(payload, ecc_level, crc)
        .wrap_err("payload rejected")?;
    let blank = (silence * sample_rate as f32) as usize;
    let mut samples = vec![0.0f32; blank + frame_samples + blank];
    let peak = 10f32.powf(peak_dbfs / 20.0);
    modem.get_samples(&mut samples[blank..blank + frame_samples], 0, peak);

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(output, spec)
        .wrap_err_with(|| format!("cannot create {}", output.display()))?;
    for &sample in &samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    eprintln!(
        "wrote {} ({} bytes over {:.2} s)",
        output.display(),
        payload.len(),
        samples.len() as f32 / sample_rate as f32
    );
    Ok(())
}

fn decode(input: &PathBuf, verbose: bool) -> Result<()> {
    let mut reader = hound::WavReader::open(input)
        .wrap_err_with(|| format!("cannot open {}", input.display()))?;
    let spec = reader.spec();
    if spec.channels != 1 {
        bail!("expected mono audio, got {} channels", spec.channels);
    }
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|s| s as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mut modem = Modem::new(spec.sample_rate as f32);
    let mut decoded = 0usize;
    let mut cursor = 0usize;
    while cursor < samples.len() {
        let size = modem
            .get_maximum_length()
            .min(samples.len() - cursor);
        if modem.push_samples(&samples[cursor..cursor + size]) {
            let payload = modem.payload().expect("payload follows a completed frame");
            decoded += 1;
            println!(
                "frame at sample {} ({} bytes, {} corrected): {}",
                modem.payload_sample_index(),
                payload.len(),
                modem.fixed_errors(),
                String::from_utf8_lossy(payload)
            );
        }
        cursor += size;
    }
    if verbose {
        eprint!("{}", modem.logger());
    }
    if decoded == 0 {
        bail!("no frame found in {}", input.display());
    }
    Ok(())
}

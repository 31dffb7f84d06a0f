use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use tagdem_core::{
    CodeDictionary, DecodeOutcome, DemodConfig, DemodOutput, Demodulator, FeatureMethod, Signal,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Method {
    /// Raw FFT band mean
    Fft,
    /// Blackman-windowed FFT band mean
    WindowedFft,
    /// Single-bin Goertzel power
    Goertzel,
    /// Heterodyne downconversion chain
    Heterodyne,
    /// Quadrature wavelet correlation
    Wavelet,
}

impl From<Method> for FeatureMethod {
    fn from(m: Method) -> Self {
        match m {
            Method::Fft => FeatureMethod::Fft,
            Method::WindowedFft => FeatureMethod::WindowedFft,
            Method::Goertzel => FeatureMethod::Goertzel,
            Method::Heterodyne => FeatureMethod::Heterodyne,
            Method::Wavelet => FeatureMethod::Wavelet,
        }
    }
}

/// Decode coded acoustic tag pulse trains from a WAV capture
#[derive(Parser, Debug)]
#[command(name = "tagdem", version, about)]
struct Args {
    /// Input WAV file
    input: PathBuf,

    /// Detection feature to run per frame
    #[arg(short, long, value_enum, default_value_t = Method::Goertzel)]
    method: Method,

    /// Emulated ADC sample rate in S/s
    #[arg(long, default_value_t = tagdem_core::DEFAULT_ADC_RATE)]
    adc_rate: f32,

    /// ADC buffer length in samples
    #[arg(long, default_value_t = tagdem_core::DEFAULT_BUFFER_LEN)]
    buffer_len: usize,

    /// Lower band edge in Hz (FFT methods)
    #[arg(long, default_value_t = tagdem_core::DEFAULT_ON_FREQ)]
    on_freq: f32,

    /// Upper band edge in Hz (FFT methods)
    #[arg(long, default_value_t = tagdem_core::DEFAULT_OFF_FREQ)]
    off_freq: f32,

    /// Carrier frequency in Hz
    #[arg(long, default_value_t = tagdem_core::DEFAULT_TARGET_FREQ)]
    target_freq: f32,

    /// Heterodyne local oscillator frequency in Hz
    #[arg(long, default_value_t = 55_000.0)]
    lo_freq: f32,

    /// Expected pulse width in ms
    #[arg(long, default_value_t = tagdem_core::DEFAULT_PULSE_WIDTH_MS)]
    pulse_width: f32,

    /// Init interval in seconds
    #[arg(long, default_value_t = tagdem_core::DEFAULT_INIT_INTERVAL_S)]
    init_interval: f32,

    /// CFAR reference cells per side
    #[arg(long, default_value_t = tagdem_core::DEFAULT_CFAR_CELLS)]
    cells: usize,

    /// CFAR threshold offset (adaptive mode)
    #[arg(long, default_value_t = 0.0)]
    offset: f32,

    /// JSON code dictionary: {"36": "7", "38": "8", ...} in centiseconds
    #[arg(long)]
    dict: Option<PathBuf>,

    /// Write per-frame diagnostics (feature, threshold, detections) as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn read_wav(path: &PathBuf) -> Result<Signal, Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    // keep the first channel only
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .step_by(channels)
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .step_by(channels)
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    log::info!(
        "read {} samples at {} Hz ({} channel(s))",
        samples.len(),
        spec.sample_rate,
        channels
    );
    Ok(Signal::new(samples, spec.sample_rate as f32)?)
}

fn load_dictionary(path: &PathBuf) -> Result<CodeDictionary, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let raw: BTreeMap<String, String> = serde_json::from_reader(file)?;
    let mut dict = CodeDictionary::new();
    for (interval, symbol) in raw {
        let cs: i64 = interval
            .parse()
            .map_err(|_| format!("dictionary key {interval:?} is not an integer"))?;
        dict.insert(cs, symbol);
    }
    Ok(dict)
}

fn default_dictionary() -> CodeDictionary {
    CodeDictionary::from_entries([
        (36, "7"),
        (38, "8"),
        (40, "9"),
        (42, "A"),
        (44, "B"),
        (46, "C"),
    ])
}

fn write_csv(path: &PathBuf, out: &DemodOutput) -> Result<(), Box<dyn std::error::Error>> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "time,feature,threshold,detect,pulse")?;
    for i in 0..out.features.len() {
        writeln!(
            w,
            "{},{},{},{},{}",
            out.features.times[i],
            out.features.values[i],
            out.cfar.threshold[i],
            out.cfar.detect[i],
            out.pulses.detect[i]
        )?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let dictionary = match &args.dict {
        Some(path) => load_dictionary(path)?,
        None => default_dictionary(),
    };

    let config = DemodConfig {
        adc_rate: args.adc_rate,
        buffer_len: args.buffer_len,
        method: args.method.into(),
        on_freq: args.on_freq,
        off_freq: args.off_freq,
        target_freq: args.target_freq,
        lo_freq: args.lo_freq,
        cfar_cells: args.cells,
        cfar_offset: args.offset,
        pulse_width_ms: args.pulse_width,
        init_interval_s: args.init_interval,
        dictionary,
        ..DemodConfig::default()
    };

    let signal = read_wav(&args.input)?;
    let demod = Demodulator::new(config)?;
    let out = demod.run(&signal)?;

    println!("pings: {}", out.message.pings);
    println!(
        "pulse end times (s): {}",
        out.pulses
            .end_times
            .iter()
            .map(|t| format!("{t:.4}"))
            .collect::<Vec<_>>()
            .join(" ")
    );
    match &out.message.outcome {
        DecodeOutcome::Message(symbols) => println!("decoded: {}", symbols.join(" ")),
        DecodeOutcome::InsufficientData => println!("decoded: <not enough pings>"),
    }

    if let Some(path) = &args.csv {
        write_csv(path, &out)?;
        log::info!("diagnostics written to {}", path.display());
    }

    Ok(())
}

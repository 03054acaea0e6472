/// Mod Renderer — tape echo delay modulation WAV renderer.
///
/// Standalone CLI tool for auditioning the modulation signal. Renders the
/// deviation of the modulated delay time from its nominal value, scaled to
/// full code by the modulation range, so wow and flutter can be inspected
/// in any waveform editor.

use openplex_dsp::modulator::{
    DelayModulator, DELAY_TIME_MAX_MS, DELAY_TIME_MIN_MS, MODULATION_RANGE_MS,
};
use openplex_dsp::SignalGenerator;

const DEFAULT_SAMPLE_RATE: f64 = 48000.0;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut delays: Vec<f64> = Vec::new();
    let mut lfo_depth_pct: f64 = 50.0;
    let mut noise_depth_pct: f64 = 50.0;
    let mut duration: f64 = 2.0;
    let mut sample_rate: f64 = DEFAULT_SAMPLE_RATE;
    let mut seed: u64 = 0;
    let mut output_dir = String::from(".");
    let mut output_file: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--delay" | "-t" => {
                i += 1;
                for s in args[i].split(',') {
                    delays.push(s.trim().parse().expect("invalid delay time"));
                }
            }
            "--lfo-depth" | "-l" => {
                i += 1;
                lfo_depth_pct = args[i].parse().expect("invalid LFO depth");
            }
            "--noise-depth" | "-n" => {
                i += 1;
                noise_depth_pct = args[i].parse().expect("invalid noise depth");
            }
            "--duration" | "-d" => {
                i += 1;
                duration = args[i].parse().expect("invalid duration");
            }
            "--sample-rate" | "-r" => {
                i += 1;
                sample_rate = args[i].parse().expect("invalid sample rate");
            }
            "--seed" | "-s" => {
                i += 1;
                seed = args[i].parse().expect("invalid seed");
            }
            "--output" | "-o" => {
                i += 1;
                output_file = Some(args[i].clone());
            }
            "--output-dir" => {
                i += 1;
                output_dir = args[i].clone();
            }
            "--sweep" => {
                delays = vec![90.0, 200.0, 320.0, 440.0, 560.0, 680.0];
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    if delays.is_empty() {
        delays.push(DELAY_TIME_MIN_MS);
    }

    for &d in &delays {
        if !(DELAY_TIME_MIN_MS..=DELAY_TIME_MAX_MS).contains(&d) {
            eprintln!("Delay time {d} ms out of range ({DELAY_TIME_MIN_MS}-{DELAY_TIME_MAX_MS})");
            std::process::exit(1);
        }
    }

    for &delay_ms in &delays {
        let filename = if let Some(ref f) = output_file {
            if delays.len() == 1 {
                f.clone()
            } else {
                format!("{output_dir}/mod_{delay_ms:.0}ms_seed{seed}.wav")
            }
        } else {
            format!("{output_dir}/mod_{delay_ms:.0}ms_seed{seed}.wav")
        };

        eprintln!(
            "Rendering delay={delay_ms}ms lfo={lfo_depth_pct}% noise={noise_depth_pct}% \
             seed={seed} dur={duration}s → {filename}"
        );

        let samples = render_modulation(
            delay_ms,
            lfo_depth_pct,
            noise_depth_pct,
            seed,
            duration,
            sample_rate,
        );

        let peak = samples.iter().map(|x| x.abs()).fold(0.0f64, f64::max);
        eprintln!(
            "  Peak excursion: {:.4} ms ({peak:.6} full scale)",
            peak * MODULATION_RANGE_MS
        );

        write_wav(&filename, &samples, sample_rate as u32);
        eprintln!("  Written: {filename}");
    }
}

/// Renders `duration` seconds of modulated delay time and returns the
/// deviation from nominal, normalized by the modulation range.
fn render_modulation(
    delay_ms: f64,
    lfo_depth_pct: f64,
    noise_depth_pct: f64,
    seed: u64,
    duration: f64,
    sample_rate: f64,
) -> Vec<f64> {
    let mut modulator = DelayModulator::new(seed);
    let mut params = modulator.params();
    params.delay_time_ms = delay_ms;
    params.lfo_depth_pct = lfo_depth_pct;
    params.noise_depth_pct = noise_depth_pct;
    modulator.set_params(params);
    modulator.reset(sample_rate);

    let n = (duration * sample_rate) as usize;
    (0..n)
        .map(|_| (modulator.render() - delay_ms) / MODULATION_RANGE_MS)
        .collect()
}

fn write_wav(path: &str, samples: &[f64], sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 24,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("failed to create WAV file");
    let scale = (1 << 23) as f64 - 1.0;
    for &s in samples {
        let clamped = s.clamp(-1.0, 1.0);
        writer
            .write_sample((clamped * scale) as i32)
            .expect("failed to write sample");
    }
    writer.finalize().expect("failed to finalize WAV");
}

fn print_usage() {
    eprintln!(
        r#"Mod Renderer — tape echo delay modulation WAV renderer

USAGE:
    mod-renderer [OPTIONS]

OPTIONS:
    -t, --delay <MS[,MS,...]>    Nominal delay time(s) in ms (90-680, default: 90)
    -l, --lfo-depth <PCT>        Flutter depth in percent (default: 50)
    -n, --noise-depth <PCT>      Drift depth in percent (default: 50)
    -d, --duration <SECS>        Duration in seconds (default: 2.0)
    -r, --sample-rate <HZ>       Render sample rate (default: 48000)
    -s, --seed <SEED>            Random seed (default: 0)
    -o, --output <PATH>          Output WAV file (single delay only)
        --output-dir <DIR>       Output directory for batch mode (default: .)
        --sweep                  Render the full delay-time range
    -h, --help                   Print this help

EXAMPLES:
    mod-renderer -t 90 -d 2.0 -o short_loop.wav
    mod-renderer -t 90,340,680 -n 100              # delay batch, full drift
    mod-renderer --sweep -l 0.5 -d 5.0             # range sweep, light flutter"#
    );
}

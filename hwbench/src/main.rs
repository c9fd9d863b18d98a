use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hwdec_pipeline::{ConverterConfig, DecoderConfig, HwDevice};

mod bench;
mod ppm;

/// Hardware H.264/HEVC decode throughput harness
#[derive(Parser, Debug)]
#[command(name = "hwbench")]
#[command(about = "Decode a raw H.264/HEVC elementary stream on a hardware device")]
struct Args {
    /// Raw elementary stream file (Annex B)
    input: Option<PathBuf>,

    /// Codec name (h264, h265, hevc)
    #[arg(short, long, default_value = "h264")]
    codec: String,

    /// Hardware device type (vaapi, cuda, videotoolbox, dxva2, ...)
    #[arg(short, long)]
    device: Option<String>,

    /// Bytes read from the file per parse cycle
    #[arg(long, default_value = "1024")]
    chunk_size: usize,

    /// Write the first N converted frames as PPM files
    #[arg(long, default_value = "0")]
    save_frames: usize,

    /// Directory for PPM snapshots
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Use nearest-neighbour sampling during conversion
    #[arg(long)]
    fast: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Silence FFmpeg's own log output
    #[arg(short, long)]
    quiet: bool,

    /// Print the hardware device types this FFmpeg build supports and exit
    #[arg(long)]
    list_devices: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    hwdec_pipeline::set_quiet(args.quiet);

    if args.list_devices {
        for name in hwdec_pipeline::available_device_types() {
            println!("{name}");
        }
        return Ok(());
    }

    let Some(input) = args.input else {
        bail!("no input file given (see --help)");
    };
    if args.chunk_size == 0 {
        bail!("--chunk-size must be at least 1");
    }

    let device = args
        .device
        .unwrap_or_else(|| HwDevice::platform_default().name().to_string());
    let config = DecoderConfig::new(args.codec, device);
    let converter = if args.fast {
        ConverterConfig::fast()
    } else {
        ConverterConfig::default()
    };

    let data = std::fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
    info!(
        "decoding {} ({} bytes) as {} on {}",
        input.display(),
        data.len(),
        config.codec,
        config.device
    );

    let snapshots = if args.save_frames > 0 {
        std::fs::create_dir_all(&args.output_dir)
            .with_context(|| format!("creating {}", args.output_dir.display()))?;
        Some(bench::Snapshots {
            count: args.save_frames,
            dir: args.output_dir,
        })
    } else {
        None
    };

    let mut pipeline = hwdec_pipeline::open_with(&config, converter)?;
    info!(
        "decoder {} negotiated {:?}",
        pipeline.session().decoder_name(),
        pipeline.session().hw_format()
    );

    let stats = bench::run(&mut pipeline, &data, args.chunk_size, snapshots.as_ref())?;
    if stats.frames == 0 {
        warn!("no frames decoded");
    }

    println!("chunks:     {}", stats.chunks);
    println!("bytes:      {}", stats.bytes);
    println!("frames:     {}", stats.frames);
    if let Some((width, height)) = stats.first_frame {
        println!("resolution: {width}x{height}");
    }
    println!("elapsed:    {:.3}s", stats.elapsed.as_secs_f64());
    println!(
        "throughput: {:.1} fps, {:.2} MiB/s",
        stats.frames_per_second(),
        stats.megabytes_per_second()
    );
    println!(
        "contexts:   {} conversion context(s) created",
        pipeline.converter().contexts_created()
    );
    if stats.saved > 0 {
        println!("saved:      {} frame(s)", stats.saved);
    }
    Ok(())
}

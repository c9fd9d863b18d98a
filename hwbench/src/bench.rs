use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info};

use hwdec_pipeline::{FfmpegPipeline, RgbFrame};

use crate::ppm::save_ppm;

/**
    Where and how many converted frames to keep as PPM files.
*/
#[derive(Debug, Clone)]
pub struct Snapshots {
    pub count: usize,
    pub dir: PathBuf,
}

#[derive(Debug, Default)]
pub struct Stats {
    pub chunks: u64,
    pub bytes: u64,
    pub frames: u64,
    pub saved: usize,
    pub first_frame: Option<(u32, u32)>,
    pub elapsed: Duration,
}

impl Stats {
    pub fn frames_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }

    pub fn megabytes_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes as f64 / (1024.0 * 1024.0) / secs
        } else {
            0.0
        }
    }
}

/**
    Feed `data` through `pipeline` in `chunk_size` pieces, timing the whole
    run including the final drain.
*/
pub fn run(
    pipeline: &mut FfmpegPipeline,
    data: &[u8],
    chunk_size: usize,
    snapshots: Option<&Snapshots>,
) -> Result<Stats> {
    let mut stats = Stats::default();
    let start = Instant::now();

    for chunk in data.chunks(chunk_size.max(1)) {
        stats.chunks += 1;
        stats.bytes += chunk.len() as u64;
        let frames = pipeline
            .push(chunk)
            .with_context(|| format!("decoding chunk {}", stats.chunks))?;
        record(&mut stats, &frames, snapshots)?;
    }
    let frames = pipeline.finish().context("draining decoder")?;
    record(&mut stats, &frames, snapshots)?;

    stats.elapsed = start.elapsed();
    Ok(stats)
}

fn record(stats: &mut Stats, frames: &[RgbFrame], snapshots: Option<&Snapshots>) -> Result<()> {
    for frame in frames {
        stats.frames += 1;
        stats.first_frame.get_or_insert(frame.dimensions());
        debug!(
            "frame {}: {}x{} stride {}",
            stats.frames, frame.width, frame.height, frame.stride
        );

        let Some(snapshots) = snapshots else {
            continue;
        };
        if stats.saved < snapshots.count {
            let path = snapshots.dir.join(format!("frame-{:05}.ppm", stats.frames));
            save_ppm(frame, &path).with_context(|| format!("writing {}", path.display()))?;
            info!("saved {}", path.display());
            stats.saved += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_are_zero_without_elapsed_time() {
        let stats = Stats {
            frames: 10,
            bytes: 1024,
            ..Default::default()
        };
        assert_eq!(stats.frames_per_second(), 0.0);
        assert_eq!(stats.megabytes_per_second(), 0.0);
    }

    #[test]
    fn rates_scale_with_elapsed_time() {
        let stats = Stats {
            frames: 60,
            bytes: 2 * 1024 * 1024,
            elapsed: Duration::from_secs(2),
            ..Default::default()
        };
        assert_eq!(stats.frames_per_second(), 30.0);
        assert_eq!(stats.megabytes_per_second(), 1.0);
    }

    /// Needs a real H.264 elementary stream and a working hardware device:
    /// `HWDEC_SAMPLE=clip.h264 cargo test -p hwbench -- --ignored`
    #[test]
    #[ignore]
    fn chunking_does_not_change_decoded_frames() {
        let Ok(sample) = std::env::var("HWDEC_SAMPLE") else {
            return;
        };
        let device = std::env::var("HWDEC_DEVICE")
            .unwrap_or_else(|_| hwdec_pipeline::HwDevice::platform_default().name().to_string());
        let data = std::fs::read(sample).unwrap();

        let mut dims = Vec::new();
        for chunk_size in [4096, 1] {
            let mut pipeline = hwdec_pipeline::open("h264", &device).unwrap();
            let mut frames = Vec::new();
            for chunk in data.chunks(chunk_size) {
                frames.extend(pipeline.push(chunk).unwrap());
            }
            frames.extend(pipeline.finish().unwrap());
            assert!(!frames.is_empty());
            dims.push(frames.iter().map(RgbFrame::dimensions).collect::<Vec<_>>());

            let converter = pipeline.converter();
            assert_eq!(converter.predict_size(1920, 1080).unwrap(), 1920 * 1080 * 3);
        }
        assert_eq!(dims[0], dims[1]);
    }
}

//! FFmpeg encode invocation for the supported codec families.
//!
//! Each family carries a fixed set of rate-control/GOP flags; only bitrate,
//! resolution, frame rate, and the audio parameters vary per task. Progress
//! is read from ffmpeg's `-progress` stream on stderr and reported as a
//! percentage of the known source duration.

use std::path::Path;
use std::time::Duration;

use ladderforge_common::{EncoderFamily, VideoSize};
use tokio_util::sync::CancellationToken;

use crate::{Error, Result, ToolCommand};

/// Encodes can legitimately run for hours.
const ENCODE_TIMEOUT: Duration = Duration::from_secs(86400);

/// Per-task encode parameters copied from the task record.
#[derive(Debug, Clone)]
pub struct EncodeParams {
    pub video_encoder: String,
    pub video_size: VideoSize,
    /// Video bitrate in kbit/s.
    pub video_bitrate: u32,
    pub video_fps: u32,
    pub audio_encoder: String,
    /// Audio bitrate, ffmpeg-style (e.g. "320k").
    pub audio_bitrate: String,
    /// Audio sample rate in Hz (e.g. "48000").
    pub audio_frequency: String,
    pub audio_channels: u32,
}

/// Build the full ffmpeg argument list for one encode.
///
/// Pure so the per-family flag sets stay testable without running ffmpeg.
pub fn encode_args(
    input: &Path,
    output: &Path,
    params: &EncodeParams,
    family: EncoderFamily,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-progress".into(),
        "pipe:2".into(),
        "-nostats".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-b:v".into(),
        format!("{}k", params.video_bitrate),
        "-c:v".into(),
        params.video_encoder.clone(),
        "-s".into(),
        params.video_size.to_string(),
        "-r".into(),
        params.video_fps.to_string(),
        "-c:a".into(),
        params.audio_encoder.clone(),
        "-b:a".into(),
        params.audio_bitrate.clone(),
        "-ar".into(),
        params.audio_frequency.clone(),
        "-ac".into(),
        params.audio_channels.to_string(),
    ];

    args.extend(family_args(family).into_iter().map(String::from));
    args.push(output.to_string_lossy().into_owned());
    args
}

/// The fixed rate-control/GOP flags for one codec family.
fn family_args(family: EncoderFamily) -> Vec<&'static str> {
    match family {
        EncoderFamily::X265 => vec![
            "-force_key_frames",
            "expr:gte(t,n_forced*2)",
            "-x265-params",
            "keyint=48:min-keyint=48:scenecut=0:ref=5:bframes=3:b-adapt=2",
        ],
        EncoderFamily::X264 => vec![
            "-force_key_frames",
            "expr:gte(t,n_forced*2)",
            "-g",
            "48",
            "-keyint_min",
            "48",
            "-sc_threshold",
            "0",
            "-bf",
            "3",
            "-b_strategy",
            "2",
            "-refs",
            "5",
        ],
        EncoderFamily::Vp9 => vec![
            "-crf",
            "23",
            "-keyint_min",
            "48",
            "-g",
            "48",
            "-threads",
            "8",
            "-speed",
            "4",
            "-tile-columns",
            "4",
            "-auto-alt-ref",
            "1",
            "-lag-in-frames",
            "25",
            "-frame-parallel",
            "1",
            "-af",
            "channelmap=channel_layout=5.1",
        ],
    }
}

/// Run one encode, translating ffmpeg's `-progress` blocks into percentage
/// callbacks against `duration_secs`.
///
/// With an unknown duration no progress is reported; the terminal outcome is
/// unaffected. `cancel` kills the encode and surfaces [`Error::Cancelled`].
pub async fn run_encode(
    ffmpeg: &Path,
    input: &Path,
    output: &Path,
    params: &EncodeParams,
    family: EncoderFamily,
    duration_secs: Option<f64>,
    mut on_progress: impl FnMut(f64),
    cancel: Option<&CancellationToken>,
) -> Result<()> {
    let args = encode_args(input, output, params, family);
    tracing::debug!(?args, "ffmpeg encode");

    let mut last_out_time_us: Option<i64> = None;
    ToolCommand::new(ffmpeg.to_path_buf())
        .args(args)
        .timeout(ENCODE_TIMEOUT)
        .execute_with_stderr_lines(
            |line| {
                if let Some(val) = line.strip_prefix("out_time_us=") {
                    last_out_time_us = val.trim().parse::<i64>().ok();
                } else if line.starts_with("progress=") {
                    // End of a progress block.
                    if let (Some(out_us), Some(dur)) = (last_out_time_us, duration_secs) {
                        if dur > 0.0 {
                            let elapsed = out_us as f64 / 1_000_000.0;
                            let pct = (elapsed / dur * 100.0).clamp(0.0, 100.0);
                            on_progress(pct);
                        }
                    }
                }
            },
            cancel,
        )
        .await?;

    Ok(())
}

/// Extract `count` evenly spaced frames from `input` into `output_folder`.
///
/// Files are named `<base_name>-NN.png` (1-indexed, zero padded) and scaled
/// to `size`. The source duration must be known to place the seek points.
pub async fn take_screenshots(
    ffmpeg: &Path,
    input: &Path,
    output_folder: &Path,
    count: u32,
    base_name: &str,
    size: VideoSize,
    duration_secs: Option<f64>,
) -> Result<()> {
    let duration = match duration_secs {
        Some(d) if d > 0.0 => d,
        _ => {
            return Err(Error::InvalidInput(
                "cannot take screenshots without a known duration".to_string(),
            ))
        }
    };

    for i in 0..count {
        // Midpoint spacing avoids black first/last frames.
        let timestamp = duration * (i as f64 + 0.5) / count as f64;
        let target = output_folder.join(format!("{}-{:02}.png", base_name, i + 1));

        ToolCommand::new(ffmpeg.to_path_buf())
            .args([
                "-y".to_string(),
                "-ss".to_string(),
                format!("{:.3}", timestamp),
                "-i".to_string(),
                input.to_string_lossy().into_owned(),
                "-frames:v".to_string(),
                "1".to_string(),
                "-s".to_string(),
                size.to_string(),
                target.to_string_lossy().into_owned(),
            ])
            .execute()
            .await?;
    }

    Ok(())
}

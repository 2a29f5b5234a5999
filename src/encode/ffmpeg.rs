use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::sink::{FrameSink, SinkConfig, check_order};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{SkytraceError, SkytraceResult};
use crate::pipeline::generator::Frame;
use crate::render::composite::flatten_over_bg;

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    pub out_path: PathBuf,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
    /// Playback rate of the video; one grid timestep per video frame.
    pub fps: u32,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            fps: 10,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

struct Encoder {
    width: u32,
    height: u32,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Vec<u8>,
}

/// Spawns the system `ffmpeg` and streams raw frames to its stdin.
///
/// The encoder starts on the first frame, whose size fixes the video size; every later frame must
/// match it.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    encoder: Option<Encoder>,
    started: bool,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            encoder: None,
            started: false,
            last_idx: None,
        }
    }

    fn spawn(&self, width: u32, height: u32) -> SkytraceResult<Encoder> {
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(SkytraceError::validation(format!(
                "ffmpeg sink needs even frame sizes for yuv420p mp4 output, got {width}x{height}"
            )));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if self.opts.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        // Frames are flattened to opaque straight RGBA before they are written.
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{width}x{height}"),
            "-r",
            &self.opts.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&self.opts.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            SkytraceError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SkytraceError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| SkytraceError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(width, height, fps = self.opts.fps, "ffmpeg started");
        Ok(Encoder {
            width,
            height,
            child,
            stdin: Some(stdin),
            stderr_drain: Some(stderr_drain),
            scratch: vec![0u8; width as usize * height as usize * 4],
        })
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, _cfg: SinkConfig) -> SkytraceResult<()> {
        if self.opts.fps == 0 {
            return Err(SkytraceError::validation("ffmpeg sink fps must be non-zero"));
        }
        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(SkytraceError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(SkytraceError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }
        self.started = true;
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame) -> SkytraceResult<()> {
        if !self.started {
            return Err(SkytraceError::encode("ffmpeg sink not started"));
        }
        check_order(self.last_idx, frame.index)?;
        self.last_idx = Some(frame.index);

        let raster = &frame.raster;
        if self.encoder.is_none() {
            self.encoder = Some(self.spawn(raster.width, raster.height)?);
        }
        let Some(enc) = self.encoder.as_mut() else {
            return Err(SkytraceError::encode("ffmpeg encoder missing (unexpected)"));
        };
        if raster.width != enc.width || raster.height != enc.height {
            return Err(SkytraceError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                raster.width, raster.height, enc.width, enc.height
            )));
        }

        flatten_over_bg(&mut enc.scratch, &raster.data, self.opts.bg_rgba)?;

        let Some(stdin) = enc.stdin.as_mut() else {
            return Err(SkytraceError::encode("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&enc.scratch).map_err(|e| {
            SkytraceError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> SkytraceResult<()> {
        self.started = false;
        let Some(mut enc) = self.encoder.take() else {
            tracing::warn!(
                out = %self.opts.out_path.display(),
                "no frames were composited, no video written"
            );
            return Ok(());
        };
        drop(enc.stdin.take());

        let status = enc.child.wait().map_err(|e| {
            SkytraceError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match enc.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| SkytraceError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| SkytraceError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(SkytraceError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        tracing::info!(out = %self.opts.out_path.display(), "video written");
        Ok(())
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> SkytraceResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;

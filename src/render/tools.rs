use std::path::Path;
use std::process::{Command, Output};

use tokio::task;
use tracing::debug;

use crate::config::{RenderConfig, ToolsConfig};
use crate::error::{Result, ToolError};

/// Invokes pdftoppm, ffprobe and ffmpeg
#[derive(Debug, Clone, Default)]
pub struct ToolRunner {
    tools: ToolsConfig,
    render: RenderConfig,
}

impl ToolRunner {
    pub fn new(tools: ToolsConfig, render: RenderConfig) -> Self {
        Self { tools, render }
    }

    /// Check that every external program can be found, reporting all of the
    /// missing ones at once
    pub fn check_dependencies(&self) -> Result<()> {
        let missing: Vec<String> = [&self.tools.ffmpeg, &self.tools.ffprobe, &self.tools.pdftoppm]
            .into_iter()
            .filter(|program| which::which(program.as_str()).is_err())
            .cloned()
            .collect();

        if missing.is_empty() {
            debug!("All external tools found");
            Ok(())
        } else {
            Err(ToolError::Missing { tools: missing }.into())
        }
    }

    /// Duration of an audio file in seconds
    pub async fn probe_duration(&self, audio: &Path) -> Result<f64> {
        let output = run(&self.tools.ffprobe, probe_args(audio)).await?;
        parse_duration_output(&String::from_utf8_lossy(&output.stdout))
    }

    /// Render every PDF page to `<out_dir>/slide-<n>.png`
    pub async fn rasterize_pdf(&self, pdf: &Path, out_dir: &Path) -> Result<()> {
        run(&self.tools.pdftoppm, rasterize_args(pdf, out_dir, self.render.dpi)).await?;
        Ok(())
    }

    /// Encode the concat playlist into a silent slideshow video
    pub async fn encode_slideshow(&self, playlist: &Path, video_out: &Path) -> Result<()> {
        run(&self.tools.ffmpeg, slideshow_args(playlist, video_out, &self.render)).await?;
        Ok(())
    }

    /// Add the narration to the slideshow, trimming to the shorter stream
    pub async fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        run(&self.tools.ffmpeg, mux_args(video, audio, output, &self.render.audio_codec)).await?;
        Ok(())
    }
}

fn arg(path: &Path) -> String {
    path.display().to_string()
}

pub fn probe_args(audio: &Path) -> Vec<String> {
    [
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ]
    .into_iter()
    .map(String::from)
    .chain([arg(audio)])
    .collect()
}

pub fn rasterize_args(pdf: &Path, out_dir: &Path, dpi: u32) -> Vec<String> {
    vec![
        "-png".to_string(),
        "-r".to_string(),
        dpi.to_string(),
        arg(pdf),
        arg(&out_dir.join("slide")),
    ]
}

pub fn slideshow_args(playlist: &Path, video_out: &Path, render: &RenderConfig) -> Vec<String> {
    let mut args: Vec<String> = ["-y", "-f", "concat", "-safe", "0", "-i"]
        .into_iter()
        .map(String::from)
        .collect();
    args.push(arg(playlist));

    args.push("-vf".to_string());
    args.push(format!("scale=trunc(iw/2)*2:trunc(ih/2)*2,fps={}", render.fps));
    args.extend(["-pix_fmt", "yuv420p", "-c:v"].map(String::from));
    args.push(render.resolved_video_codec().to_string());

    if render.is_hardware_codec() {
        args.push("-b:v".to_string());
        args.push(render.hardware_bitrate.clone());
    } else {
        args.push("-preset".to_string());
        args.push(render.preset.clone());
        args.push("-crf".to_string());
        args.push(render.crf.to_string());
    }

    args.push(arg(video_out));
    args
}

pub fn mux_args(video: &Path, audio: &Path, output: &Path, audio_codec: &str) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        arg(video),
        "-i".to_string(),
        arg(audio),
        "-c:v".to_string(),
        "copy".to_string(),
        "-c:a".to_string(),
        audio_codec.to_string(),
        "-shortest".to_string(),
        arg(output),
    ]
}

/// Parse ffprobe's bare `format=duration` output
pub fn parse_duration_output(stdout: &str) -> Result<f64> {
    let text = stdout.trim();
    match text.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => Ok(seconds),
        _ => Err(ToolError::InvalidDuration {
            output: text.to_string(),
        }
        .into()),
    }
}

/// Run a program to completion on the blocking pool
async fn run(program: &str, args: Vec<String>) -> Result<Output> {
    let command_line = format!("{} {}", program, args.join(" "));
    debug!("Running: {}", command_line);

    let mut cmd = Command::new(program);
    cmd.args(&args);

    let output = task::spawn_blocking(move || cmd.output())
        .await
        .map_err(|e| ToolError::Failed {
            command: command_line.clone(),
            stderr: format!("Failed to spawn process: {}", e),
        })?
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ToolError::NotFound {
                tool: program.to_string(),
            },
            _ => ToolError::Failed {
                command: command_line.clone(),
                stderr: e.to_string(),
            },
        })?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            command: command_line,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SlidecastError;

    #[test]
    fn test_probe_args() {
        let args = probe_args(Path::new("talk.m4a"));
        assert_eq!(
            args,
            vec![
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
                "talk.m4a"
            ]
        );
    }

    #[test]
    fn test_rasterize_args() {
        let args = rasterize_args(Path::new("deck.pdf"), Path::new("/work/run"), 150);
        assert_eq!(args, vec!["-png", "-r", "150", "deck.pdf", "/work/run/slide"]);
    }

    #[test]
    fn test_software_slideshow_args() {
        let render = RenderConfig {
            video_codec: "libx264".to_string(),
            ..RenderConfig::default()
        };
        let args = slideshow_args(Path::new("/w/concat.txt"), Path::new("/w/video.mp4"), &render);

        assert_eq!(
            args.join(" "),
            "-y -f concat -safe 0 -i /w/concat.txt -vf scale=trunc(iw/2)*2:trunc(ih/2)*2,fps=30 \
             -pix_fmt yuv420p -c:v libx264 -preset fast -crf 23 /w/video.mp4"
        );
    }

    #[test]
    fn test_hardware_slideshow_args() {
        let render = RenderConfig {
            video_codec: "h264_videotoolbox".to_string(),
            ..RenderConfig::default()
        };
        let args = slideshow_args(Path::new("c.txt"), Path::new("v.mp4"), &render);

        assert!(args.windows(2).any(|w| w[0] == "-b:v" && w[1] == "2M"));
        assert!(!args.iter().any(|a| a == "-crf"));
    }

    #[test]
    fn test_mux_args() {
        let args = mux_args(Path::new("v.mp4"), Path::new("a.mp3"), Path::new("out/final.mp4"), "aac");
        assert_eq!(
            args.join(" "),
            "-y -i v.mp4 -i a.mp3 -c:v copy -c:a aac -shortest out/final.mp4"
        );
    }

    #[test]
    fn test_parse_duration_output() {
        assert_eq!(parse_duration_output("12.345000\n").unwrap(), 12.345);

        for bad in ["", "N/A", "0", "-3", "nan", "inf"] {
            assert!(
                matches!(
                    parse_duration_output(bad),
                    Err(SlidecastError::Tool(ToolError::InvalidDuration { .. }))
                ),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn test_missing_dependencies_are_all_reported() {
        let runner = ToolRunner::new(
            ToolsConfig {
                ffmpeg: "slidecast-missing-ffmpeg".to_string(),
                ffprobe: "slidecast-missing-ffprobe".to_string(),
                pdftoppm: "slidecast-missing-pdftoppm".to_string(),
            },
            RenderConfig::default(),
        );

        match runner.check_dependencies() {
            Err(SlidecastError::Tool(ToolError::Missing { tools })) => assert_eq!(tools.len(), 3),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_program_is_not_found() {
        let result = run("slidecast-no-such-program", vec!["--version".to_string()]).await;
        assert!(matches!(
            result,
            Err(SlidecastError::Tool(ToolError::NotFound { ref tool })) if tool == "slidecast-no-such-program"
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_program_reports_command() {
        let result = run("false", Vec::new()).await;
        assert!(matches!(
            result,
            Err(SlidecastError::Tool(ToolError::Failed { ref command, .. })) if command.starts_with("false")
        ));
    }
}

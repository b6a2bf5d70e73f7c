use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::{
    config::Config,
    error::{Result, ToolError},
    render::{
        concat::{write_concat_file, CONCAT_FILE_NAME},
        tools::ToolRunner,
        workdir::WorkDir,
    },
    slides::{SlideIndexer, SlideSet},
    timing::{DurationPlanner, TimingPlan, TimingSource},
};

/// Everything needed to turn one deck and one narration into a video
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub pdf: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
    pub timing: TimingSource,

    /// Scratch directory; a timestamped one under `work/` when unset
    pub workdir: Option<PathBuf>,

    pub keep_work: bool,

    /// Probe the audio and report the plan without rendering anything
    pub dry_run: bool,
}

impl RenderJob {
    pub fn new<P: Into<PathBuf>>(pdf: P, audio: P, output: P) -> Self {
        Self {
            pdf: pdf.into(),
            audio: audio.into(),
            output: output.into(),
            timing: TimingSource::Equal,
            workdir: None,
            keep_work: false,
            dry_run: false,
        }
    }
}

/// Outcome of a render
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub workdir: PathBuf,
    pub audio_seconds: f64,

    /// Pages found after rasterization (zero for a dry run)
    pub slides: usize,

    /// Playlist entries, which exceeds `slides` when markers revisit pages
    pub entries: usize,

    pub output: Option<PathBuf>,
    pub output_bytes: u64,
    pub elapsed: Duration,

    /// Steps that would have run, filled in for a dry run
    pub planned_steps: Vec<String>,
}

/// Drives the external tools through rasterize, plan, encode and mux
///
/// Stages run strictly one after another since each consumes the previous
/// stage's files. The working directory is removed on every exit path unless
/// the job asks to keep it.
pub struct VideoAssembler {
    config: Config,
    runner: ToolRunner,
    planner: DurationPlanner,
}

impl VideoAssembler {
    pub fn new(config: Config) -> Self {
        let runner = ToolRunner::new(config.tools.clone(), config.render.clone());
        let planner = DurationPlanner::new(config.timing.clone());
        Self {
            config,
            runner,
            planner,
        }
    }

    pub async fn assemble(&self, job: &RenderJob) -> Result<RenderReport> {
        let started = Instant::now();

        info!("🎬 Starting slidecast render");
        info!("   PDF: {:?}", job.pdf);
        info!("   Audio: {:?}", job.audio);
        info!("   Output: {:?}", job.output);
        info!("   Timing: {}", job.timing.describe());

        // Step 1: inputs and tools
        verify_input("PDF", &job.pdf)?;
        verify_input("Audio", &job.audio)?;
        self.runner.check_dependencies()?;

        // Step 2: scoped working directory
        let work = WorkDir::create(
            job.workdir.clone().unwrap_or_else(WorkDir::default_path),
            job.keep_work,
        )?;
        info!("📁 Working directory: {}", work.path().display());

        // Step 3: audio duration
        let audio_seconds = self.runner.probe_duration(&job.audio).await?;
        info!("🎵 Audio duration: {:.3}s", audio_seconds);

        if job.dry_run {
            let planned_steps = self.planned_steps(job, work.path());
            info!("🧪 Dry run, nothing rendered. Planned steps:");
            for (number, step) in planned_steps.iter().enumerate() {
                info!("   {}. {}", number + 1, step);
            }

            return Ok(RenderReport {
                workdir: work.path().to_path_buf(),
                audio_seconds,
                slides: 0,
                entries: 0,
                output: None,
                output_bytes: 0,
                elapsed: started.elapsed(),
                planned_steps,
            });
        }

        // Step 4: rasterize and plan
        let (slides, plan) = self.rasterize_and_plan(job, &work, audio_seconds).await?;

        // Step 5: slideshow video
        info!("🎞️  Encoding slideshow with {}...", self.config.render.resolved_video_codec());
        let playlist = write_concat_file(work.path(), &plan)?;
        let video = work.join("video.mp4");
        self.runner.encode_slideshow(&playlist, &video).await?;

        // Step 6: narration
        info!("🔊 Muxing narration...");
        if let Some(parent) = job.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.runner.mux_audio(&video, &job.audio, &job.output).await?;

        let output_bytes = std::fs::metadata(&job.output)?.len();
        let elapsed = started.elapsed();

        info!("🎉 Render complete! Output saved to: {:?}", job.output);
        info!("   Slides: {} ({} playlist entries)", slides.len(), plan.len());
        info!("   File size: {:.1} MB", output_bytes as f64 / 1024.0 / 1024.0);
        info!("   Elapsed: {:.1}s", elapsed.as_secs_f64());

        Ok(RenderReport {
            workdir: work.path().to_path_buf(),
            audio_seconds,
            slides: slides.len(),
            entries: plan.len(),
            output: Some(job.output.clone()),
            output_bytes,
            elapsed,
            planned_steps: Vec::new(),
        })
    }

    async fn rasterize_and_plan(
        &self,
        job: &RenderJob,
        work: &WorkDir,
        audio_seconds: f64,
    ) -> Result<(SlideSet, TimingPlan)> {
        info!("📄 Rasterizing PDF at {} dpi...", self.config.render.dpi);
        self.runner.rasterize_pdf(&job.pdf, work.path()).await?;

        let slides = SlideIndexer::scan(work.path())?;
        info!("   Found {} slides", slides.len());

        let plan = self.planner.plan(&job.timing, &slides, audio_seconds)?;
        debug!("Plan durations: {:?}", plan.durations());

        Ok((slides, plan))
    }

    /// Human-readable description of the stages a full run would execute
    pub fn planned_steps(&self, job: &RenderJob, workdir: &Path) -> Vec<String> {
        let render = &self.config.render;
        vec![
            format!(
                "Rasterize {} at {} dpi into {}",
                job.pdf.display(),
                render.dpi,
                workdir.display()
            ),
            format!("Plan slide durations ({})", job.timing.describe()),
            format!("Write {}", workdir.join(CONCAT_FILE_NAME).display()),
            format!(
                "Encode slideshow with {} at {} fps",
                render.resolved_video_codec(),
                render.fps
            ),
            format!(
                "Mux {} ({}) into {}",
                job.audio.display(),
                render.audio_codec,
                job.output.display()
            ),
        ]
    }
}

fn verify_input(label: &str, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ToolError::InputNotFound {
            label: label.to_string(),
            path: path.display().to_string(),
        }
        .into())
    }
}

use thiserror::Error;

/// Main error type for the slidecast library
#[derive(Error, Debug)]
pub enum SlidecastError {
    #[error("Timing plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("External tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Assist error: {0}")]
    Assist(#[from] AssistError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Failures of the timing engine: slide discovery, duration planning,
/// marker normalization and playlist generation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("No slide images found in {path}")]
    NoSlidesFound { path: String },

    #[error("Slide count must be at least 1, got {count}")]
    InvalidSlideCount { count: usize },

    #[error("Audio duration must be positive and finite, got {seconds}")]
    InvalidAudioDuration { seconds: f64 },

    #[error("Computed non-positive duration {duration} for slide {slide}")]
    DegenerateDuration { slide: usize, duration: f64 },

    #[error("Duplicate timing for slide {slide} (line {line})")]
    DuplicateTiming { slide: i64, line: usize },

    #[error("Slide index {slide} out of range 1..={max} (line {line})")]
    IndexOutOfRange { slide: i64, max: usize, line: usize },

    #[error("Invalid seconds '{value}' for slide {slide} (line {line})")]
    InvalidTimingValue { slide: i64, value: String, line: usize },

    #[error("Malformed timing row at line {line}: {content}")]
    MalformedTimingRow { line: usize, content: String },

    #[error("Specified timings ({specified:.3}s) exceed audio duration ({total:.3}s)")]
    TimingOverrun { specified: f64, total: f64 },

    #[error("Remaining {remaining:.3}s cannot be shared by {slides} unspecified slide(s)")]
    InsufficientRemainingTime { remaining: f64, slides: usize },

    #[error("Marker references slide {slide} which has no image")]
    UnknownSlideReference { slide: u32 },

    #[error("Non-positive duration {duration} at marker {position}")]
    NonPositiveDuration { position: usize, duration: f64 },

    #[error("Invalid marker document: {reason}")]
    InvalidMarkerDocument { reason: String },

    #[error("No usable markers: all {dropped} entries were invalid")]
    NoUsableMarkers { dropped: usize },

    #[error("Timing plan is empty")]
    EmptyPlan,
}

/// Failures of the external rasterizer, prober and encoder
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Missing dependencies: {}", tools.join(", "))]
    Missing { tools: Vec<String> },

    #[error("Command not found: {tool}. Please ensure it is installed and in PATH.")]
    NotFound { tool: String },

    #[error("Command failed: {command}\n{stderr}")]
    Failed { command: String, stderr: String },

    #[error("Invalid audio duration: {output}")]
    InvalidDuration { output: String },

    #[error("{label} not found: {path}")]
    InputNotFound { label: String, path: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Errors from the AI-integration glue
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssistError {
    #[error("No marker data found in response")]
    MarkersNotFound,

    #[error("Could not parse marker payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("Call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Upstream call failed: {reason}")]
    Upstream { reason: String },

    #[error("Slide {slide} failed after {attempts} attempt(s): {reason}")]
    Exhausted { slide: u32, attempts: u32, reason: String },
}

impl AssistError {
    /// Timeouts and upstream failures are worth another attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Upstream { .. })
    }
}

/// Convenience type alias for Results using SlidecastError
pub type Result<T> = std::result::Result<T, SlidecastError>;

impl SlidecastError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Tool(ToolError::Failed { .. }) => true,
            Self::Assist(e) => e.is_transient(),
            // Planning errors are deterministic for a given input
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Tool(ToolError::Missing { tools }) => {
                format!(
                    "Missing dependencies: {}. Install with: brew install ffmpeg poppler \
                     (macOS) or sudo apt install poppler-utils ffmpeg (Debian/Ubuntu)",
                    tools.join(", ")
                )
            }
            Self::Plan(PlanError::NoSlidesFound { .. }) => {
                "No slide images generated. Please check the PDF is valid and not empty.".to_string()
            }
            Self::Plan(PlanError::TimingOverrun { specified, total }) => {
                format!(
                    "The timings file asks for {:.1}s but the audio is only {:.1}s long.",
                    specified, total
                )
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            Self::Plan(e) => e.to_string(),
            Self::Tool(e) => e.to_string(),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tools_message_lists_all() {
        let err: SlidecastError = ToolError::Missing {
            tools: vec!["ffmpeg".to_string(), "pdftoppm".to_string()],
        }
        .into();

        let message = err.user_message();
        assert!(message.contains("ffmpeg, pdftoppm"));
        assert!(message.contains("poppler"));
    }

    #[test]
    fn test_recoverable_classification() {
        let tool: SlidecastError = ToolError::Failed {
            command: "ffmpeg -y".to_string(),
            stderr: String::new(),
        }
        .into();
        assert!(tool.is_recoverable());

        let plan: SlidecastError = PlanError::EmptyPlan.into();
        assert!(!plan.is_recoverable());

        let slow: SlidecastError = AssistError::Timeout { seconds: 30 }.into();
        assert!(slow.is_recoverable());

        let exhausted: SlidecastError = AssistError::Exhausted {
            slide: 2,
            attempts: 3,
            reason: "upstream".to_string(),
        }
        .into();
        assert!(!exhausted.is_recoverable());
        assert!(!AssistError::MarkersNotFound.is_transient());
    }
}

use crate::error::{CorpusError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub const PATH_PLACEHOLDER: &str = "{path}";

const DEFAULT_EXTENSIONS: &[&str] = &[
    "py", "pyi", "pyx", "txt", "md", "rst", "cfg", "toml", "yaml", "yml", "json", "ini", "in",
    "sh", "c", "h", "cpp", "hpp", "rs", "js", "ts",
];

const DEFAULT_FILENAMES: &[&str] = &[
    "setup.py",
    "Dockerfile",
    "Makefile",
    "LICENSE",
    "README",
    "PKG-INFO",
    "METADATA",
    "WHEEL",
];

const DEFAULT_EXCLUDED_DIRS: &[&str] = &["__pycache__", ".git", "node_modules", ".venv", "venv"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

/// What the `[<N> lines]` header counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCount {
    /// Every line after the header: delimiters, bodies and separators.
    #[default]
    Output,
    /// Body lines only.
    Body,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    #[default]
    KeepFirst,
    Suffix,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub allowed_extensions: BTreeSet<String>,
    pub allowed_filenames: BTreeSet<String>,
    pub excluded_dirs: BTreeSet<String>,
    pub max_member_size_bytes: u64,
    /// Share of U+FFFD allowed after a lossy decode, 0.0..=1.0.
    pub max_replacement_ratio: f32,
    pub comment_style: String,
    pub line_ending: LineEnding,
    pub line_count: LineCount,
    pub parallelism: usize,
    pub path_prefix: String,
    pub scan_depth: usize,
    pub sort_archives: bool,
    pub collision_policy: CollisionPolicy,
    pub archive_timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            allowed_filenames: DEFAULT_FILENAMES.iter().map(|s| s.to_string()).collect(),
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            max_member_size_bytes: 1024 * 1024,
            max_replacement_ratio: 0.1,
            comment_style: "hash".to_string(),
            line_ending: LineEnding::Lf,
            line_count: LineCount::Output,
            parallelism: 1,
            path_prefix: "packages".to_string(),
            scan_depth: 1,
            sort_archives: false,
            collision_policy: CollisionPolicy::KeepFirst,
            archive_timeout_secs: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CorpusError::Config(format!("read config {}: {e}", path.display()))
        })?;
        let cfg: PipelineConfig = serde_json::from_str(&raw).map_err(|e| {
            CorpusError::Config(format!("parse config {}: {e}", path.display()))
        })?;
        info!(config_path = %path.display(), "Loaded pipeline config");
        cfg.normalized()
    }

    /// Lowercases extensions, strips leading dots, resolves the comment preset
    /// and validates the result.
    pub fn normalized(mut self) -> Result<Self> {
        self.allowed_extensions = self
            .allowed_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self.allowed_filenames = self
            .allowed_filenames
            .iter()
            .map(|n| n.to_ascii_lowercase())
            .collect();
        self.comment_style = resolve_comment_style(&self.comment_style).to_string();
        self.validate()?;
        debug!(?self, "Pipeline config normalized");
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !resolve_comment_style(&self.comment_style).contains(PATH_PLACEHOLDER) {
            return Err(CorpusError::Config(format!(
                "comment_style must contain {PATH_PLACEHOLDER}: {:?}",
                self.comment_style
            )));
        }
        if self.comment_style.contains('\n') || self.comment_style.contains('\r') {
            return Err(CorpusError::Config(
                "comment_style must be a single line".into(),
            ));
        }
        if self.parallelism == 0 {
            return Err(CorpusError::Config("parallelism must be >= 1".into()));
        }
        if self.scan_depth == 0 {
            return Err(CorpusError::Config("scan_depth must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&self.max_replacement_ratio) {
            return Err(CorpusError::Config(format!(
                "max_replacement_ratio must be within 0..=1, got {}",
                self.max_replacement_ratio
            )));
        }
        Ok(())
    }

    pub fn archive_timeout(&self) -> Option<Duration> {
        self.archive_timeout_secs.map(Duration::from_secs)
    }
}

/// Maps a preset name to its template; anything else is taken as a template.
pub fn resolve_comment_style(style: &str) -> &str {
    match style {
        "hash" => "# === {path} ===",
        "slash" => "// === {path} ===",
        "dash" => "-- === {path} ===",
        "plain" => "=== {path} ===",
        other => other,
    }
}

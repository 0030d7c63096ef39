use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};

use crate::time_utils::current_timestamp_string;

pub const DEFAULT_ACTIVITY_LOG_LINES: usize = 100;

/// Append-only lifecycle log, trimmed after every append so only the newest
/// `max_lines` lines survive. Lines are `time: (event_id) message`.
#[derive(Debug)]
pub struct ActivityLog {
    path: PathBuf,
    max_lines: usize,
    guard: Mutex<()>,
}

impl ActivityLog {
    /// Opens (creating if needed) the log at `path` with the given line cap.
    pub fn open(path: impl Into<PathBuf>, max_lines: usize) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Ok(Self {
            path,
            max_lines: max_lines.max(1),
            guard: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line tagged with `event_id`, then enforces the line cap.
    pub fn append(&self, event_id: &str, message: &str) -> Result<()> {
        let line = format!("{}: ({}) {}", current_timestamp_string(), event_id, message);
        let _guard = self
            .guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        writeln!(file, "{line}")
            .with_context(|| format!("failed to append {}", self.path.display()))?;
        file.flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;
        drop(file);

        self.enforce_line_cap()
    }

    fn enforce_line_cap(&self) -> Result<()> {
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let lines: Vec<&str> = contents.lines().collect();
        if lines.len() <= self.max_lines {
            return Ok(());
        }
        let start = lines.len() - self.max_lines;
        let mut trimmed = lines[start..].join("\n");
        trimmed.push('\n');
        write_text_replacing(&self.path, &trimmed)
    }
}

/// Rewrites `path` via a temp file + rename so readers never observe partial data.
fn write_text_replacing(path: &Path, content: &str) -> Result<()> {
    let parent_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp_name = format!(
        ".{}.tmp-{}",
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("activity-log"),
        std::process::id()
    );
    let temp_path = parent_dir.join(temp_name);
    std::fs::write(&temp_path, content)
        .with_context(|| format!("failed to write temporary file {}", temp_path.display()))?;
    std::fs::rename(&temp_path, path).with_context(|| {
        format!(
            "failed to rename {} to {}",
            temp_path.display(),
            path.display()
        )
    })?;
    Ok(())
}

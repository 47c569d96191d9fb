//! Watch mode: re-validate a config file every time it changes on disk.
//!
//! The file's modification time is polled; a change is debounced before the
//! file is re-read so that editors writing in several steps produce a single
//! report.

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::validator::{validate_config, ValidationFinding};
use chrono::Local;
use log::{debug, warn};
use owo_colors::{OwoColorize, Style};
use std::fmt::Write as _;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Polls one config file and renders a validation report for each change.
pub struct ConfigWatcher {
    path: PathBuf,
    poll_interval: Duration,
    debounce: Duration,
    last_modified: Option<SystemTime>,
    use_colors: bool,
}

impl ConfigWatcher {
    pub fn new(path: &Path) -> Result<Self> {
        let path = fs::canonicalize(path).map_err(|e| Error::io(path, e))?;
        debug!("Watching config file {}", path.display());
        Ok(Self {
            last_modified: modified(&path),
            path,
            poll_interval: DEFAULT_POLL_INTERVAL,
            debounce: DEFAULT_DEBOUNCE,
            use_colors: std::io::stdout().is_terminal(),
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Prints the initial report, then one report per change. Never returns normally.
    pub fn run(&mut self) -> Result<()> {
        println!("{}", self.header(None));
        println!("{}", self.check());

        loop {
            thread::sleep(self.poll_interval);
            if self.poll() {
                // Clear screen and home the cursor
                print!("\x1b[H\x1b[2J");
                let changed_at = Local::now().format("%H:%M:%S").to_string();
                println!("{}", self.header(Some(&changed_at)));
                println!("{}", self.check());
            }
        }
    }

    /// Returns true once per settled change of the file's modification time.
    pub fn poll(&mut self) -> bool {
        let current = modified(&self.path);
        if current == self.last_modified {
            return false;
        }

        thread::sleep(self.debounce);
        self.last_modified = modified(&self.path);
        debug!("Change detected on {}", self.path.display());
        true
    }

    /// Validates the file as it is now and renders the report.
    pub fn check(&self) -> String {
        let start = Instant::now();
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Cannot read {}: {}", self.path.display(), e);
                return paint(
                    &format!("Error reading file: {}", e),
                    Style::new().red(),
                    self.use_colors,
                );
            }
        };

        let findings = validate_config(&content);
        let mut report = render_report(&content, &findings, self.use_colors);
        let _ = write!(
            report,
            "\n{}\n",
            paint(
                &format!("Validation completed in {:?}", start.elapsed()),
                Style::new().cyan(),
                self.use_colors
            )
        );
        report
    }

    fn header(&self, changed_at: Option<&str>) -> String {
        let title = Style::new().bright_cyan().bold();
        let mut out = String::new();
        let _ = writeln!(out, "{}", paint("API Config Watcher", title, self.use_colors));
        let _ = writeln!(out, "{}", paint("==================", title, self.use_colors));
        let _ = writeln!(
            out,
            "{}",
            paint(
                &format!("Watching: {}", self.path.display()),
                Style::new().cyan(),
                self.use_colors
            )
        );
        if let Some(at) = changed_at {
            let _ = writeln!(
                out,
                "{}",
                paint(
                    &format!("File changed at: {}", at),
                    Style::new().bright_yellow(),
                    self.use_colors
                )
            );
        }
        out
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn paint(text: &str, style: Style, use_colors: bool) -> String {
    if use_colors {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

/// Renders findings against the file content, or a config summary when there are none.
pub fn render_report(content: &str, findings: &[ValidationFinding], use_colors: bool) -> String {
    let mut out = String::new();

    if findings.is_empty() {
        render_summary(&mut out, content, use_colors);
        return out;
    }

    let error = Style::new().red();
    let _ = writeln!(
        out,
        "{}\n",
        paint(
            &format!("Validation failed with {} errors:", findings.len()),
            error.bold(),
            use_colors
        )
    );

    let _ = writeln!(out, "{}", paint("File content:", Style::new().yellow(), use_colors));
    for (i, line) in content.lines().enumerate() {
        let line_no = i + 1;
        let messages: Vec<&str> = findings
            .iter()
            .filter(|f| f.line == Some(line_no))
            .map(|f| f.message.as_str())
            .collect();

        if messages.is_empty() {
            let _ = writeln!(out, "{:>3} | {}", line_no, line);
            continue;
        }
        let _ = writeln!(
            out,
            "{}",
            paint(&format!("{:>3} | {}", line_no, line), error, use_colors)
        );
        for message in messages {
            let _ = writeln!(
                out,
                "{}",
                paint(&format!("      └─ {}", message), error, use_colors)
            );
        }
    }

    let _ = writeln!(out, "\n{}", paint("Summary of errors:", error.bold(), use_colors));
    for (i, finding) in findings.iter().enumerate() {
        let entry = match (finding.line, finding.field.as_deref()) {
            (Some(line), _) => format!("{}. Line {}: {}", i + 1, line, finding.message),
            (None, Some(field)) => format!("{}. Field '{}': {}", i + 1, field, finding.message),
            (None, None) => format!("{}. {}", i + 1, finding.message),
        };
        let _ = writeln!(out, "{}", paint(&entry, error, use_colors));
    }

    out
}

fn render_summary(out: &mut String, content: &str, use_colors: bool) {
    let _ = writeln!(
        out,
        "{}\n",
        paint("Configuration is valid!", Style::new().green().bold(), use_colors)
    );

    // Validation succeeded, so the config parses
    let Ok(config) = ApiConfig::parse(Path::new("<watched>"), content) else {
        return;
    };

    let _ = writeln!(
        out,
        "{}",
        paint("Configuration Summary:", Style::new().yellow(), use_colors)
    );
    let _ = writeln!(out, "Title: {}", config.info.title);
    let _ = writeln!(out, "Version: {}", config.info.version);
    if let Some(description) = config.info.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "Description: {}", description);
    }
    let _ = writeln!(out, "Servers: {}", config.servers.len());
    let _ = writeln!(out, "Endpoints: {}", config.endpoint_count());
    if let Some(auth) = &config.authorization {
        let _ = writeln!(out, "Auth: {} ({})", auth.name, auth.types.join(", "));
    }
}

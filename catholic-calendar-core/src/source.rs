//! Fetching raw records from romcal.
//!
//! romcal is a JavaScript library, so records are obtained by running a
//! small Node.js bridge script once per year. The script prints a JSON
//! array of event objects on stdout.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{CalendarError, CalendarResult};
use crate::value::RawRecord;

const BRIDGE_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_SCRIPT: &str = "scripts/romcal_fetch.mjs";

/// Anything that can produce the raw records for one calendar year.
pub trait CalendarSource {
    fn fetch_year(&self, year: i32) -> impl Future<Output = CalendarResult<Vec<RawRecord>>> + Send;
}

/// Fetch every year in order and concatenate the results.
pub async fn collect_records<S: CalendarSource>(
    source: &S,
    years: &[i32],
) -> CalendarResult<Vec<RawRecord>> {
    let mut records = Vec::new();
    for &year in years {
        let fetched = source.fetch_year(year).await?;
        tracing::info!(year, events = fetched.len(), "fetched liturgical calendar");
        records.extend(fetched);
    }
    Ok(records)
}

/// Runs the romcal bridge script with Node.js.
#[derive(Debug, Clone)]
pub struct RomcalBridge {
    script: PathBuf,
    locale: String,
    calendar: String,
    include_optional: bool,
    extra_args: Vec<String>,
    timeout: Duration,
}

impl RomcalBridge {
    pub fn new(script: impl Into<PathBuf>) -> Self {
        RomcalBridge {
            script: script.into(),
            locale: "en".to_string(),
            calendar: "general".to_string(),
            include_optional: true,
            extra_args: Vec::new(),
            timeout: BRIDGE_TIMEOUT,
        }
    }

    /// `scripts/romcal_fetch.mjs` next to the running executable.
    pub fn default_script_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_SCRIPT)))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRIPT))
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// romcal calendar name, e.g. `general` or `unitedStates`.
    pub fn calendar(mut self, calendar: impl Into<String>) -> Self {
        self.calendar = calendar.into();
        self
    }

    pub fn include_optional(mut self, include: bool) -> Self {
        self.include_optional = include;
        self
    }

    pub fn extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Arguments passed to `node`, script path first.
    pub fn args(&self, year: i32) -> Vec<String> {
        let mut args = vec![
            self.script.display().to_string(),
            "--year".to_string(),
            year.to_string(),
            "--locale".to_string(),
            self.locale.clone(),
            "--calendar".to_string(),
            self.calendar.clone(),
        ];
        if !self.include_optional {
            args.push("--no-optional".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }

    async fn run(&self, year: i32) -> CalendarResult<Vec<RawRecord>> {
        if !self.script.exists() {
            return Err(CalendarError::RomcalScriptNotFound(
                self.script.display().to_string(),
            ));
        }

        let node = which::which("node").map_err(|_| CalendarError::RomcalNotInstalled)?;
        tracing::debug!(node = %node.display(), year, "running romcal bridge");

        let output = Command::new(&node)
            .args(self.args(year))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| CalendarError::Romcal(format!("Failed to spawn {}: {}", node.display(), e)))?;

        interpret_output(
            year,
            output.status.success(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        )
    }
}

impl CalendarSource for RomcalBridge {
    async fn fetch_year(&self, year: i32) -> CalendarResult<Vec<RawRecord>> {
        with_timeout(self.timeout, self.run(year)).await
    }
}

async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = CalendarResult<T>>,
) -> CalendarResult<T> {
    timeout(limit, call)
        .await
        .map_err(|_| CalendarError::RomcalTimeout(limit.as_secs()))?
}

/// Map a finished bridge run to records.
///
/// A failed run reports stderr, or stdout when stderr is empty. Stderr
/// output from a successful run is only logged.
fn interpret_output(
    year: i32,
    success: bool,
    stdout: &str,
    stderr: &str,
) -> CalendarResult<Vec<RawRecord>> {
    let stderr = stderr.trim();

    if !success {
        let message = if stderr.is_empty() { stdout.trim() } else { stderr };
        return Err(CalendarError::Romcal(message.to_string()));
    }

    if !stderr.is_empty() {
        tracing::warn!(year, stderr = %stderr, "romcal bridge wrote to stderr");
    }

    parse_records(stdout)
}

/// Parse bridge output: a JSON array of objects. Blank output means no
/// events.
pub fn parse_records(output: &str) -> CalendarResult<Vec<RawRecord>> {
    let output = output.trim();
    if output.is_empty() {
        return Ok(Vec::new());
    }

    let payload: Value = serde_json::from_str(output).map_err(|e| {
        CalendarError::Romcal(format!("romcal bridge script did not return valid JSON: {e}"))
    })?;

    let Value::Array(items) = payload else {
        return Err(CalendarError::Romcal(
            "romcal bridge script must output a JSON array".into(),
        ));
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(RawRecord::from(map)),
            other => Err(CalendarError::Romcal(format!(
                "romcal bridge script returned a non-object event: {other}"
            ))),
        })
        .collect()
}

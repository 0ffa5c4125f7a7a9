//! The structured result document written at the end of a run.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::repo::OnlineMatch;
use crate::settings::RemoteRepo;
use crate::uid::MavenUid;

pub const DATETIME_PLACEHOLDER: &str = "{datetime}";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisInfo {
    pub online_check_enabled: bool,
    pub remote_repositories: Vec<RemoteRepo>,
}

/// One identified jar. `match_type` is `None` when the UID was selected
/// manually; the UID always carries all three components.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JarReport {
    pub jar_name: String,
    pub sha256: String,
    pub match_type: Option<OnlineMatch>,
    pub uid: MavenUid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerReport {
    pub analysis_info: AnalysisInfo,
    pub jar_results: Vec<JarReport>,
}

/// Substitute `{datetime}` in the template with the given local time,
/// formatted `yyyy-MM-dd-HH-mm-ss`.
pub fn resolve_report_path(template: &str, now: DateTime<Local>) -> PathBuf {
    let datetime = now.format("%Y-%m-%d-%H-%M-%S").to_string();
    PathBuf::from(template.replace(DATETIME_PLACEHOLDER, &datetime))
}

/// A write failure here is fatal; the analysis results would be lost.
pub fn write_report(path: &Path, report: &AnalyzerReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report file: {}", path.display()))
}

/// Early sanity check so a doomed report path fails the run before any
/// analysis work happens.
pub fn validate_report_template(template: &str) -> Result<()> {
    let path = resolve_report_path(template, Local::now());
    if path.exists() {
        anyhow::bail!("Report file '{}' already exists", path.display());
    }
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    if !parent.is_dir() {
        anyhow::bail!(
            "Parent directory '{}' for report file does not exist",
            parent.display()
        );
    }
    Ok(())
}

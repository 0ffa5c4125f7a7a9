//! Remote repository discovery from the host's Maven configuration.
//!
//! The authoritative source is `mvn help:effective-settings`, which merges
//! user, global and profile layers the same way builds do. When the Maven
//! binary is unavailable, `~/.m2/settings.xml` is parsed directly. Maven
//! Central is always appended as the final fallback repository.

use anyhow::{bail, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;

pub const MAVEN_CENTRAL_URL: &str = "https://repo1.maven.org/maven2/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepo {
    pub name: String,
    pub url: String,
}

pub fn maven_central() -> RemoteRepo {
    RemoteRepo {
        name: "central".to_string(),
        url: MAVEN_CENTRAL_URL.to_string(),
    }
}

/// Repositories from profiles that are active by default, with Maven Central
/// appended. Discovery problems degrade to Central alone; they are never
/// fatal.
pub fn discover_remote_repos(settings_file: &Path) -> Vec<RemoteRepo> {
    let mut repos = match read_settings(settings_file) {
        Ok(xml) => match parse_settings_repos(&xml) {
            Ok(repos) => repos,
            Err(err) => {
                log::warn!("Failed to parse Maven settings: {err:#}");
                Vec::new()
            }
        },
        Err(err) => {
            log::warn!("Failed to obtain Maven settings, using Maven Central only: {err:#}");
            Vec::new()
        }
    };

    let central = maven_central();
    if !repos.iter().any(|r| r.url == central.url) {
        repos.push(central);
    }
    repos
}

fn read_settings(settings_file: &Path) -> Result<Vec<u8>> {
    match effective_settings_via_mvn(settings_file) {
        Ok(xml) => Ok(xml),
        Err(err) => {
            log::debug!("'mvn help:effective-settings' failed ({err:#}), trying ~/.m2/settings.xml");
            let user_settings = dirs::home_dir()
                .context("Failed to resolve home directory")?
                .join(".m2")
                .join("settings.xml");
            std::fs::read(&user_settings)
                .with_context(|| format!("Failed to read {}", user_settings.display()))
        }
    }
}

/// Ask the host Maven installation to write its effective settings into
/// `settings_file` and read them back. The file is temporary; the repo
/// checker removes it at shutdown.
fn effective_settings_via_mvn(settings_file: &Path) -> Result<Vec<u8>> {
    let mvn = if cfg!(windows) { "mvn.cmd" } else { "mvn" };
    let output = Command::new(mvn)
        .arg("help:effective-settings")
        .arg("-DshowPasswords=true")
        .arg(format!("-Doutput={}", settings_file.display()))
        .output()
        .with_context(|| format!("Failed to execute '{mvn}'. Is it available on PATH?"))?;

    if !output.status.success() {
        bail!(
            "'{mvn} help:effective-settings' exited with {}",
            output.status
        );
    }
    std::fs::read(settings_file)
        .with_context(|| format!("Failed to read {}", settings_file.display()))
}

/// Extract `<repository>` entries from every profile that is active by
/// default.
pub fn parse_settings_repos(xml: &[u8]) -> Result<Vec<RemoteRepo>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut repos = Vec::new();

    // per-profile accumulation, committed when the profile turns out active
    let mut profile_active = false;
    let mut profile_repos: Vec<RemoteRepo> = Vec::new();
    let mut repo_id: Option<String> = None;
    let mut repo_name: Option<String> = None;
    let mut repo_url: Option<String> = None;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                stack.push(e.name().as_ref().to_vec());
                if element_path_ends_with(&stack, &[b"profiles" as &[u8], b"profile"]) {
                    profile_active = false;
                    profile_repos.clear();
                }
            }
            Ok(Event::Text(e)) => {
                let Ok(text) = e.unescape() else { continue };
                let text = text.trim().to_string();
                if element_path_ends_with(&stack, &[b"activation" as &[u8], b"activeByDefault"]) {
                    profile_active = text == "true";
                } else if element_path_ends_with(
                    &stack,
                    &[b"repositories" as &[u8], b"repository", b"id"],
                ) {
                    repo_id = Some(text);
                } else if element_path_ends_with(
                    &stack,
                    &[b"repositories" as &[u8], b"repository", b"name"],
                ) {
                    repo_name = Some(text);
                } else if element_path_ends_with(
                    &stack,
                    &[b"repositories" as &[u8], b"repository", b"url"],
                ) {
                    repo_url = Some(text);
                }
            }
            Ok(Event::End(e)) => {
                let closing = e.name().as_ref().to_vec();
                stack.pop();
                if closing == b"repository"
                    && element_path_ends_with(&stack, &[b"profile" as &[u8], b"repositories"])
                {
                    if let Some(url) = repo_url.take() {
                        let name = repo_name
                            .take()
                            .or_else(|| repo_id.take())
                            .unwrap_or_else(|| "unnamed".to_string());
                        profile_repos.push(RemoteRepo { name, url });
                    }
                    repo_id = None;
                    repo_name = None;
                } else if closing == b"profile" {
                    if profile_active {
                        repos.append(&mut profile_repos);
                    }
                    profile_repos.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => bail!("Invalid settings XML: {err}"),
            _ => {}
        }
        buf.clear();
    }
    Ok(repos)
}

fn element_path_ends_with(stack: &[Vec<u8>], suffix: &[&[u8]]) -> bool {
    stack.len() >= suffix.len()
        && stack
            .iter()
            .rev()
            .zip(suffix.iter().rev())
            .all(|(a, b)| a.as_slice() == *b)
}

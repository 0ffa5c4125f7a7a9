//! Online verification against remote Maven repositories.
//!
//! Startup work (purging the temp repository, reading the host's Maven
//! settings, probing the canary artifact) runs on a background thread so it
//! overlaps the offline analysis phase. The remote repository list is written
//! once by that thread and read-only afterwards.
//!
//! Resolved jars land in `./temp-m2` in the standard repository layout so
//! the user can inspect them; the directory is deleted again on the next run.

use anyhow::{bail, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use ureq::Agent;

use crate::jar;
use crate::settings::{self, RemoteRepo};
use crate::uid::MavenUid;

pub const TEMP_REPO_DIR: &str = "temp-m2";
pub const TEMP_SETTINGS_FILE: &str = "effective-settings.xml";

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Known-good artifact used to verify that the configured repositories are
/// reachable at all.
fn canary_uid() -> MavenUid {
    MavenUid::with_version("junit", "junit", "4.12")
}

/// Classification of a remote artifact against the local jar.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnlineMatch {
    ExactSha,
    ExactClassnames,
    SupersetClassnames,
    NoMatch,
    NotFound,
}

/// One probed UID with its classification and the repository that resolved
/// it (empty for `NotFound`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct UidCheck {
    pub uid: MavenUid,
    pub match_type: OnlineMatch,
    pub repo: String,
}

enum InitState {
    Pending(Receiver<Result<Vec<RemoteRepo>, String>>),
    Ready(Vec<RemoteRepo>),
    Failed(String),
}

pub struct RepoChecker {
    agent: Agent,
    temp_repo: PathBuf,
    settings_file: PathBuf,
    cancelled: Arc<AtomicBool>,
    init: Mutex<InitState>,
}

impl RepoChecker {
    /// Construction returns immediately; all startup I/O happens on a
    /// background thread. The first operation that needs the repository list
    /// blocks until initialization has finished.
    pub fn new() -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(HTTP_TIMEOUT))
            .build();
        let agent: Agent = config.into();

        let temp_repo = PathBuf::from(TEMP_REPO_DIR);
        let settings_file = PathBuf::from(TEMP_SETTINGS_FILE);
        let cancelled = Arc::new(AtomicBool::new(false));

        let (tx, rx) = std::sync::mpsc::channel();
        {
            let agent = agent.clone();
            let temp_repo = temp_repo.clone();
            let settings_file = settings_file.clone();
            let cancelled = Arc::clone(&cancelled);
            std::thread::spawn(move || {
                let _ = tx.send(initialize(&agent, &temp_repo, &settings_file, &cancelled));
            });
        }

        RepoChecker {
            agent,
            temp_repo,
            settings_file,
            cancelled,
            init: Mutex::new(InitState::Pending(rx)),
        }
    }

    /// The configured remote repositories, for the report header. Blocks
    /// until startup has finished; a canary failure surfaces here as a fatal
    /// error.
    pub fn remote_repos(&self) -> Result<Vec<RemoteRepo>> {
        let mut state = self.init.lock().unwrap();
        let current = std::mem::replace(&mut *state, InitState::Failed(String::new()));
        *state = match current {
            InitState::Pending(rx) => match rx.recv() {
                Ok(Ok(repos)) => InitState::Ready(repos),
                Ok(Err(message)) => InitState::Failed(message),
                Err(_) => InitState::Failed("repository setup worker died".to_string()),
            },
            ready => ready,
        };
        match &*state {
            InitState::Ready(repos) => Ok(repos.clone()),
            InitState::Failed(message) => bail!("{message}"),
            InitState::Pending(_) => unreachable!(),
        }
    }

    /// Probe each fully-specified UID. The first `ExactSha` short-circuits
    /// and is returned as the sole entry; otherwise every UID classifies as
    /// `NoMatch` (resolved, different content) or `NotFound`. Per-UID
    /// resolution faults never fail the call.
    pub fn check_with_version(
        &self,
        local_hash: &str,
        uids: &[MavenUid],
    ) -> Result<BTreeSet<UidCheck>> {
        let repos = self.remote_repos()?;
        let mut result = BTreeSet::new();

        for uid in uids {
            debug_assert!(uid.group_id.is_some() && uid.artifact_id.is_some());
            if uid.version.is_none() {
                continue;
            }
            match self.resolve_jar(&repos, uid) {
                Some((bytes, repo)) => match jar::sha256_uncompressed(&bytes) {
                    Ok(remote_hash) if remote_hash == local_hash => {
                        return Ok(BTreeSet::from([UidCheck {
                            uid: uid.clone(),
                            match_type: OnlineMatch::ExactSha,
                            repo,
                        }]));
                    }
                    Ok(_) => {
                        result.insert(UidCheck {
                            uid: uid.clone(),
                            match_type: OnlineMatch::NoMatch,
                            repo,
                        });
                    }
                    Err(err) => {
                        log::debug!("Failed to hash resolved jar for {uid}: {err:#}");
                        result.insert(UidCheck {
                            uid: uid.clone(),
                            match_type: OnlineMatch::NotFound,
                            repo: String::new(),
                        });
                    }
                },
                None => {
                    result.insert(UidCheck {
                        uid: uid.clone(),
                        match_type: OnlineMatch::NotFound,
                        repo: String::new(),
                    });
                }
            }
        }
        Ok(result)
    }

    /// All declared versions for (group, artifact), from the first repository
    /// whose `maven-metadata.xml` resolves.
    pub fn discover_versions(&self, uid: &MavenUid) -> Result<Vec<String>> {
        let repos = self.remote_repos()?;
        for repo in &repos {
            let url = join_url(&repo.url, &metadata_relative_path(uid));
            let Some(bytes) = self.fetch(&url) else {
                continue;
            };
            match parse_metadata_versions(&bytes) {
                Ok(versions) => {
                    log::debug!(
                        "Found {} versions for {uid} in repo '{}'",
                        versions.len(),
                        repo.name
                    );
                    return Ok(versions);
                }
                Err(err) => log::debug!("Invalid maven-metadata.xml from '{}': {err:#}", repo.name),
            }
        }
        log::debug!("Versions not found for {uid}");
        Ok(Vec::new())
    }

    /// For each version-less UID: discover versions, then probe the first and
    /// last listed ones. Bounded download cost; if neither matches, the
    /// operator at least learns the (group, artifact) pair exists.
    pub fn check_no_version(
        &self,
        local_hash: &str,
        uids: &[MavenUid],
    ) -> Result<BTreeMap<MavenUid, BTreeSet<UidCheck>>> {
        let mut result = BTreeMap::new();
        for uid in uids {
            debug_assert!(uid.version.is_none());
            let versions = self.discover_versions(uid)?;
            let probes: Vec<MavenUid> = probe_versions(&versions)
                .into_iter()
                .map(|version| MavenUid {
                    group_id: uid.group_id.clone(),
                    artifact_id: uid.artifact_id.clone(),
                    version: Some(version.to_string()),
                })
                .collect();
            let checks = self.check_with_version(local_hash, &probes)?;
            result.insert(uid.clone(), checks);
        }
        Ok(result)
    }

    /// Cooperative cancellation of outstanding startup work, bounded by a
    /// grace window, then temp settings cleanup.
    pub fn shutdown(&self) {
        self.cancelled.store(true, Ordering::Relaxed);

        let mut state = self.init.lock().unwrap();
        let current = std::mem::replace(&mut *state, InitState::Failed(String::new()));
        *state = match current {
            InitState::Pending(rx) => match rx.recv_timeout(SHUTDOWN_GRACE) {
                Ok(Ok(repos)) => InitState::Ready(repos),
                Ok(Err(message)) => InitState::Failed(message),
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!("Repository setup did not finish within the shutdown grace window");
                    InitState::Failed("shutdown".to_string())
                }
                Err(RecvTimeoutError::Disconnected) => InitState::Failed("shutdown".to_string()),
            },
            ready => ready,
        };
        drop(state);

        if self.settings_file.exists() {
            if let Err(err) = std::fs::remove_file(&self.settings_file) {
                log::warn!(
                    "Failed to remove temp settings file {}: {err}",
                    self.settings_file.display()
                );
            }
        }
    }

    /// Download `group:artifact:jar:version`, trying each repository in
    /// order. The jar is also written into the temp local repository for
    /// inspection. Faults are logged and reported as a miss.
    fn resolve_jar(&self, repos: &[RemoteRepo], uid: &MavenUid) -> Option<(Vec<u8>, String)> {
        let relative_path = jar_relative_path(uid)?;
        for repo in repos {
            let url = join_url(&repo.url, &relative_path);
            let Some(bytes) = self.fetch(&url) else {
                continue;
            };
            log::debug!("Jar found for {uid} in repo '{}'", repo.name);

            let local_path = self.temp_repo.join(&relative_path);
            if let Some(parent) = local_path.parent() {
                let stored = std::fs::create_dir_all(parent)
                    .and_then(|_| std::fs::write(&local_path, &bytes));
                if let Err(err) = stored {
                    log::warn!("Failed to store {} locally: {err}", local_path.display());
                }
            }
            return Some((bytes, repo.name.clone()));
        }
        log::debug!("Jar not found for {uid}");
        None
    }

    fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        match self.agent.get(url).call() {
            Ok(mut response) => {
                if response.status().as_u16() >= 400 {
                    log::debug!("GET {url} -> HTTP {}", response.status());
                    return None;
                }
                let mut bytes = Vec::new();
                let mut reader = response.body_mut().as_reader();
                match reader.read_to_end(&mut bytes) {
                    Ok(_) => Some(bytes),
                    Err(err) => {
                        log::debug!("GET {url} body read failed: {err}");
                        None
                    }
                }
            }
            Err(err) => {
                log::debug!("GET {url} failed: {err}");
                None
            }
        }
    }
}

/// Startup sequence for the background thread: purge the temp repository,
/// discover remote repositories, verify online reachability via the canary.
fn initialize(
    agent: &Agent,
    temp_repo: &std::path::Path,
    settings_file: &std::path::Path,
    cancelled: &AtomicBool,
) -> Result<Vec<RemoteRepo>, String> {
    let delete_handle = {
        let temp_repo = temp_repo.to_path_buf();
        std::thread::spawn(move || {
            let _ = std::fs::remove_dir_all(&temp_repo);
        })
    };

    let repos = settings::discover_remote_repos(settings_file);
    let _ = delete_handle.join();

    if cancelled.load(Ordering::Relaxed) {
        return Err("repository setup cancelled".to_string());
    }

    let canary = canary_uid();
    let relative_path = jar_relative_path(&canary).expect("canary uid is complete");
    let reachable = repos.iter().any(|repo| {
        let url = join_url(&repo.url, &relative_path);
        match agent.get(&url).call() {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    });
    if reachable {
        log::info!("Online repositories are reachable");
        Ok(repos)
    } else {
        Err(format!(
            "Online repositories are not reachable (failed to resolve canary artifact {canary})"
        ))
    }
}

/// The first and last entries of a version list; the declared order comes
/// straight from `maven-metadata.xml`.
pub fn probe_versions(versions: &[String]) -> Vec<&str> {
    match versions {
        [] => Vec::new(),
        [only] => vec![only.as_str()],
        [first, .., last] => vec![first.as_str(), last.as_str()],
    }
}

/// Standard repository layout path for the jar of a fully-specified UID.
pub fn jar_relative_path(uid: &MavenUid) -> Option<String> {
    let group = uid.group_id.as_deref()?;
    let artifact = uid.artifact_id.as_deref()?;
    let version = uid.version.as_deref()?;
    Some(format!(
        "{}/{artifact}/{version}/{artifact}-{version}.jar",
        group.replace('.', "/")
    ))
}

/// Standard repository layout path for artifact-level metadata.
pub fn metadata_relative_path(uid: &MavenUid) -> String {
    format!(
        "{}/{}/maven-metadata.xml",
        uid.group_id.as_deref().unwrap_or_default().replace('.', "/"),
        uid.artifact_id.as_deref().unwrap_or_default()
    )
}

fn join_url(base: &str, relative_path: &str) -> String {
    if base.ends_with('/') {
        format!("{base}{relative_path}")
    } else {
        format!("{base}/{relative_path}")
    }
}

/// `<versioning><versions><version>` entries, in declared order.
pub fn parse_metadata_versions(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut versions = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => stack.push(e.name().as_ref().to_vec()),
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(e)) => {
                let Ok(text) = e.unescape() else { continue };
                let ends_with_version_path = stack.len() >= 3
                    && stack[stack.len() - 3..]
                        .iter()
                        .map(|e| e.as_slice())
                        .eq([b"versioning" as &[u8], b"versions", b"version"]);
                if ends_with_version_path {
                    versions.push(text.trim().to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => bail!("Invalid maven-metadata.xml: {err}"),
            _ => {}
        }
        buf.clear();
    }
    Ok(versions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jar_path_follows_repository_layout() {
        let uid = MavenUid::with_version("org.apache.commons", "commons-lang3", "3.12.0");
        assert_eq!(
            jar_relative_path(&uid).unwrap(),
            "org/apache/commons/commons-lang3/3.12.0/commons-lang3-3.12.0.jar"
        );
        assert!(jar_relative_path(&MavenUid::without_version("a", "b")).is_none());
    }

    #[test]
    fn metadata_path_is_artifact_level() {
        let uid = MavenUid::without_version("org.apache.commons", "commons-lang3");
        assert_eq!(
            metadata_relative_path(&uid),
            "org/apache/commons/commons-lang3/maven-metadata.xml"
        );
    }

    #[test]
    fn url_join_handles_trailing_slash() {
        assert_eq!(join_url("https://r/", "a/b.jar"), "https://r/a/b.jar");
        assert_eq!(join_url("https://r", "a/b.jar"), "https://r/a/b.jar");
    }

    #[test]
    fn metadata_versions_parse_in_declared_order() {
        let versions = parse_metadata_versions(
            br#"<metadata>
  <groupId>junit</groupId>
  <artifactId>junit</artifactId>
  <versioning>
    <latest>4.13.2</latest>
    <release>4.13.2</release>
    <versions>
      <version>3.8.1</version>
      <version>4.12</version>
      <version>4.13.2</version>
    </versions>
    <lastUpdated>20210213164640</lastUpdated>
  </versioning>
</metadata>"#,
        )
        .unwrap();
        assert_eq!(versions, vec!["3.8.1", "4.12", "4.13.2"]);
    }

    #[test]
    fn probe_versions_selects_first_and_last() {
        let versions: Vec<String> = ["1.0", "2.0", "3.0"].iter().map(|s| s.to_string()).collect();
        assert_eq!(probe_versions(&versions), vec!["1.0", "3.0"]);

        let single = vec!["1.0".to_string()];
        assert_eq!(probe_versions(&single), vec!["1.0"]);

        assert!(probe_versions(&[]).is_empty());
    }
}

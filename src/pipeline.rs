//! The analysis pipeline.
//!
//! Phase A walks the jars serially: map the file, hash it, run the offline
//! analyzers. Phase B submits two online check tasks per jar to a shared
//! work-stealing pool as soon as that jar's offline phase is done, so network
//! latency hides behind the offline processing of later jars. Phase C
//! consolidates serially in input order, which keeps the report deterministic
//! and the interactive prompts sequential.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use memmap2::Mmap;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use crate::candidate::{AnalysisBucket, AnalyzerKind, CandidateCollector};
use crate::jar::{self, Jar, JarContents};
use crate::printer;
use crate::repo::{OnlineMatch, RepoChecker, UidCheck};
use crate::report::JarReport;
use crate::select::{self, SelectorConfig};
use crate::uid::{MavenUid, MavenUidComponent};
use crate::{classpath, jarname, manifest, pom, post, timestamp};

pub type WithVersionChecks = BTreeSet<UidCheck>;
pub type NoVersionChecks = BTreeMap<MavenUid, BTreeSet<UidCheck>>;

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub offline: bool,
    pub limit: Option<usize>,
    pub skip_not_found: bool,
    pub force_detailed_output: bool,
    pub selector: SelectorConfig,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            offline: false,
            limit: None,
            skip_not_found: false,
            force_detailed_output: false,
            selector: SelectorConfig::default(),
        }
    }
}

/// A jar that finished Phase A and may still have online checks in flight.
pub struct JarAnalysis {
    pub jar: Jar,
    pub bucket: AnalysisBucket,
    online: OnlineHandles,
}

enum OnlineHandles {
    Disabled,
    Pending {
        with_version: Receiver<Result<WithVersionChecks>>,
        no_version: Receiver<Result<NoVersionChecks>>,
    },
}

/// A jar with both online result sets joined in.
pub struct CompletedAnalysis {
    pub jar: Jar,
    pub bucket: AnalysisBucket,
    pub with_version: WithVersionChecks,
    pub no_version: NoVersionChecks,
}

/// Run all offline analyzers over one jar's contents; the post-analyzer runs
/// last against the aggregate.
pub fn analyze_offline(jar: &Jar, contents: &JarContents) -> AnalysisBucket {
    let mut collector = CandidateCollector::new();

    classpath::analyze(
        &mut collector.scoped(AnalyzerKind::ClassFilepath),
        &contents.classes,
    );
    timestamp::analyze(
        &mut collector.scoped(AnalyzerKind::ClassTimestamp),
        &contents.classes,
    );
    pom::analyze(&mut collector.scoped(AnalyzerKind::Pom), &contents.poms);
    if let Some(manifest_file) = &contents.manifest {
        manifest::analyze(&mut collector.scoped(AnalyzerKind::Manifest), manifest_file);
    }
    jarname::analyze(&mut collector.scoped(AnalyzerKind::JarFilename), &jar.name);

    let group_ids = collector.snapshot(MavenUidComponent::GroupId);
    let artifact_ids = collector.snapshot(MavenUidComponent::ArtifactId);
    post::analyze(
        &mut collector.scoped(AnalyzerKind::Post),
        &group_ids,
        &artifact_ids,
    );

    collector.into_bucket()
}

/// Drive the full pipeline. `manual_select` is consulted for jars where
/// auto-selection fails (the interactive prompt in the CLI; a closure in
/// tests).
pub fn run_analysis(
    jar_paths: &[PathBuf],
    checker: Option<&Arc<RepoChecker>>,
    options: &AnalysisOptions,
    mut manual_select: impl FnMut(&CompletedAnalysis) -> Option<MavenUid>,
) -> Result<Vec<JarReport>> {
    let limit = options.limit.unwrap_or(usize::MAX);
    let selected_paths: Vec<&PathBuf> = jar_paths.iter().take(limit).collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .build()
        .context("Failed to build worker pool")?;

    println!("Offline-Analysis started.");
    let progress = ProgressBar::new(selected_paths.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Offline-Analysis: [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let mut waiting = Vec::with_capacity(selected_paths.len());
    for path in &selected_paths {
        match analyze_one(path, checker, options, &pool) {
            Ok(analysis) => waiting.push(analysis),
            Err(err) => log::warn!("Skipping jar '{}': {err:#}", path.display()),
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    if !options.offline {
        println!("Online-Check started.");
    }

    let total = waiting.len();
    let mut reports = Vec::with_capacity(total);
    for analysis in waiting {
        let completed = complete(analysis)?;
        let auto = auto_select(&completed);
        printer::print_results(
            &completed,
            auto.as_ref(),
            options.force_detailed_output,
            options.offline,
        );

        let report = match auto {
            Some(report) => Some(report),
            None if !options.skip_not_found => {
                manual_select(&completed).map(|uid| JarReport {
                    jar_name: completed.jar.name.clone(),
                    sha256: completed.jar.sha256.clone(),
                    match_type: None,
                    uid,
                })
            }
            None => None,
        };
        reports.extend(report);
        printer::print_jar_end_separator();
    }

    println!(
        "Analysis complete (skipped {}/{}).",
        total - reports.len(),
        total
    );
    Ok(reports)
}

/// Phase A for one jar, plus Phase B submission when online checking is
/// enabled. The file is mapped once; hashing and entry enumeration share the
/// buffer.
fn analyze_one(
    path: &Path,
    checker: Option<&Arc<RepoChecker>>,
    options: &AnalysisOptions,
    pool: &rayon::ThreadPool,
) -> Result<JarAnalysis> {
    log::debug!("Analyzing jar '{}'", path.display());

    let file =
        File::open(path).with_context(|| format!("Failed to open jar: {}", path.display()))?;
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to mmap jar: {}", path.display()))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let sha256 = jar::sha256_uncompressed(&mmap[..])?;
    let jar = Jar { name, sha256 };

    let contents = jar::read_contents(&mmap[..])?;
    if contents.manifest.is_none() {
        log::warn!(
            "Did not find manifest in '{}'! Expected '{}' to exist.",
            jar.name,
            jar::MANIFEST_PATH
        );
    }

    let bucket = analyze_offline(&jar, &contents);

    let online = match checker {
        Some(checker) if !options.offline => {
            let to_check = select::select_candidates(&bucket, &options.selector);
            let (versioned, version_less): (Vec<MavenUid>, Vec<MavenUid>) =
                to_check.into_iter().partition(|uid| uid.version.is_some());

            let (with_tx, with_rx) = mpsc::channel();
            {
                let checker = Arc::clone(checker);
                let hash = jar.sha256.clone();
                pool.spawn(move || {
                    let _ = with_tx.send(checker.check_with_version(&hash, &versioned));
                });
            }

            let (no_tx, no_rx) = mpsc::channel();
            {
                let checker = Arc::clone(checker);
                let hash = jar.sha256.clone();
                pool.spawn(move || {
                    let _ = no_tx.send(checker.check_no_version(&hash, &version_less));
                });
            }

            OnlineHandles::Pending {
                with_version: with_rx,
                no_version: no_rx,
            }
        }
        _ => OnlineHandles::Disabled,
    };

    Ok(JarAnalysis { jar, bucket, online })
}

/// Phase C join for one jar: block on both online results.
fn complete(analysis: JarAnalysis) -> Result<CompletedAnalysis> {
    let (with_version, no_version) = match analysis.online {
        OnlineHandles::Disabled => (BTreeSet::new(), BTreeMap::new()),
        OnlineHandles::Pending {
            with_version,
            no_version,
        } => {
            let with_version = with_version
                .recv()
                .context("Online check worker disappeared")??;
            let no_version = no_version
                .recv()
                .context("Online check worker disappeared")??;
            (with_version, no_version)
        }
    };
    Ok(CompletedAnalysis {
        jar: analysis.jar,
        bucket: analysis.bucket,
        with_version,
        no_version,
    })
}

/// A result requires zero human judgment only when exactly one probe matched
/// by content hash.
pub fn auto_select(completed: &CompletedAnalysis) -> Option<JarReport> {
    let exact: Vec<&UidCheck> = completed
        .with_version
        .iter()
        .chain(completed.no_version.values().flatten())
        .filter(|check| check.match_type == OnlineMatch::ExactSha)
        .collect();

    match exact.as_slice() {
        [only] if only.uid.is_complete() => Some(JarReport {
            jar_name: completed.jar.name.clone(),
            sha256: completed.jar.sha256.clone(),
            match_type: Some(only.match_type),
            uid: only.uid.clone(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jar::{ClassEntry, FileBuffer};

    fn completed_with(checks: Vec<UidCheck>) -> CompletedAnalysis {
        CompletedAnalysis {
            jar: Jar {
                name: "demo.jar".to_string(),
                sha256: "aGFzaA==".to_string(),
            },
            bucket: AnalysisBucket::default(),
            with_version: checks.into_iter().collect(),
            no_version: BTreeMap::new(),
        }
    }

    fn check(version: &str, match_type: OnlineMatch) -> UidCheck {
        UidCheck {
            uid: MavenUid::with_version("org.example", "demo", version),
            match_type,
            repo: "central".to_string(),
        }
    }

    #[test]
    fn auto_select_requires_exactly_one_exact_sha() {
        assert!(auto_select(&completed_with(vec![])).is_none());

        let one = completed_with(vec![check("1.0", OnlineMatch::ExactSha)]);
        let report = auto_select(&one).unwrap();
        assert_eq!(report.match_type, Some(OnlineMatch::ExactSha));
        assert_eq!(report.uid, MavenUid::with_version("org.example", "demo", "1.0"));

        let two = completed_with(vec![
            check("1.0", OnlineMatch::ExactSha),
            check("2.0", OnlineMatch::ExactSha),
        ]);
        assert!(auto_select(&two).is_none());

        let no_match_only = completed_with(vec![
            check("1.0", OnlineMatch::NoMatch),
            check("2.0", OnlineMatch::NotFound),
        ]);
        assert!(auto_select(&no_match_only).is_none());
    }

    #[test]
    fn auto_select_sees_exact_sha_from_version_discovery() {
        let mut completed = completed_with(vec![]);
        completed.no_version.insert(
            MavenUid::without_version("org.example", "demo"),
            [check("3.0", OnlineMatch::ExactSha)].into_iter().collect(),
        );
        let report = auto_select(&completed).unwrap();
        assert_eq!(report.uid.version.as_deref(), Some("3.0"));
    }

    #[test]
    fn offline_analysis_is_deterministic() {
        let jar = Jar {
            name: "commons-lang3-3.12.0.jar".to_string(),
            sha256: "aGFzaA==".to_string(),
        };
        let contents = JarContents {
            manifest: Some(crate::manifest::Manifest::parse(
                "Bundle-SymbolicName: org.apache.commons.lang3\nBundle-Version: 3.12.0\n",
            )),
            poms: vec![FileBuffer {
                path: "META-INF/maven/org.apache.commons/commons-lang3/pom.properties".to_string(),
                content: b"groupId=org.apache.commons\nartifactId=commons-lang3\nversion=3.12.0\n"
                    .to_vec(),
            }],
            classes: vec![ClassEntry {
                path: "org/apache/commons/lang3/StringUtils.class".to_string(),
                last_modified: None,
            }],
        };

        let fingerprint = |bucket: &AnalysisBucket| -> Vec<(String, u32)> {
            MavenUidComponent::ALL
                .iter()
                .flat_map(|&c| {
                    bucket
                        .candidates(c)
                        .iter()
                        .map(|candidate| (candidate.value.clone(), candidate.score_sum))
                })
                .collect()
        };

        let first = analyze_offline(&jar, &contents);
        let second = analyze_offline(&jar, &contents);
        assert_eq!(fingerprint(&first), fingerprint(&second));

        // the pom evidence should dominate
        assert_eq!(
            first.candidates(MavenUidComponent::GroupId)[0].value,
            "org.apache.commons"
        );
        assert_eq!(
            first.candidates(MavenUidComponent::ArtifactId)[0].value,
            "commons-lang3"
        );
        assert_eq!(
            first.candidates(MavenUidComponent::Version)[0].value,
            "3.12.0"
        );
    }
}

//! Candidate accumulation and ranking.
//!
//! Analyzers emit `(component, value, score, detail)` tuples into a
//! [`CandidateCollector`]. Tuples with the same (component, value) merge into
//! one [`ValueCandidate`] whose `score_sum` is the sum over all sources. Once
//! every analyzer has run, the collector is frozen into an [`AnalysisBucket`]
//! with candidates ranked by `score_sum` and sources ranked by score.

use std::cmp::Reverse;
use std::fmt;

use crate::uid::MavenUidComponent;

/// The analyzers that can contribute candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AnalyzerKind {
    Manifest,
    JarFilename,
    Pom,
    ClassFilepath,
    ClassTimestamp,
    Post,
}

impl AnalyzerKind {
    pub fn display_name(self) -> &'static str {
        match self {
            AnalyzerKind::Manifest => "Manifest",
            AnalyzerKind::JarFilename => "Jar-Filename",
            AnalyzerKind::Pom => "Pom",
            AnalyzerKind::ClassFilepath => "Class-Filepath",
            AnalyzerKind::ClassTimestamp => "Class-Timestamp",
            AnalyzerKind::Post => "Post-Analysis",
        }
    }
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One analyzer's contribution to a candidate value. Scores run 1 (weak hint)
/// to 4 (near-certain).
#[derive(Debug, Clone)]
pub struct ValueSource {
    pub analyzer: AnalyzerKind,
    pub score: u32,
    pub detail: String,
}

/// A possible value for one UID component, with every source that proposed it.
/// Sources are append-only; `score_sum` is kept in sync.
#[derive(Debug, Clone)]
pub struct ValueCandidate {
    pub value: String,
    pub sources: Vec<ValueSource>,
    pub score_sum: u32,
}

impl ValueCandidate {
    fn new(value: String) -> Self {
        ValueCandidate {
            value,
            sources: Vec::new(),
            score_sum: 0,
        }
    }

    fn add_source(&mut self, source: ValueSource) {
        self.score_sum += source.score;
        self.sources.push(source);
    }
}

/// Mutable accumulation stage. Insertion order is preserved so that equal
/// scores rank deterministically.
#[derive(Debug, Default)]
pub struct CandidateCollector {
    group_ids: Vec<ValueCandidate>,
    artifact_ids: Vec<ValueCandidate>,
    versions: Vec<ValueCandidate>,
}

impl CandidateCollector {
    pub fn new() -> Self {
        CandidateCollector::default()
    }

    /// Merge one tuple in. Values that do not match the component pattern are
    /// dropped; scores outside 1..=4 are clamped into range.
    pub fn add(
        &mut self,
        analyzer: AnalyzerKind,
        component: MavenUidComponent,
        value: &str,
        score: u32,
        detail: String,
    ) {
        if !component.is_valid(value) {
            log::debug!(
                "{} emitted invalid {} value '{}', dropping",
                analyzer,
                component,
                value
            );
            return;
        }
        let score = score.clamp(1, 4);
        let list = self.list_mut(component);
        let index = match list.iter().position(|c| c.value == value) {
            Some(index) => index,
            None => {
                list.push(ValueCandidate::new(value.to_string()));
                list.len() - 1
            }
        };
        list[index].add_source(ValueSource {
            analyzer,
            score,
            detail,
        });
    }

    /// Collector view bound to one analyzer, handed to the analyzer functions.
    pub fn scoped(&mut self, analyzer: AnalyzerKind) -> ScopedCollector<'_> {
        ScopedCollector {
            inner: self,
            analyzer,
        }
    }

    /// Snapshot of (value, score_sum) pairs, for the post-analyzer.
    pub fn snapshot(&self, component: MavenUidComponent) -> Vec<(String, u32)> {
        self.list(component)
            .iter()
            .map(|c| (c.value.clone(), c.score_sum))
            .collect()
    }

    /// Freeze into the ranked per-component structure.
    pub fn into_bucket(mut self) -> AnalysisBucket {
        for component in MavenUidComponent::ALL {
            let list = self.list_mut(component);
            for candidate in list.iter_mut() {
                candidate.sources.sort_by_key(|s| Reverse(s.score));
            }
            list.sort_by_key(|c| Reverse(c.score_sum));
        }
        AnalysisBucket {
            group_ids: self.group_ids,
            artifact_ids: self.artifact_ids,
            versions: self.versions,
        }
    }

    fn list(&self, component: MavenUidComponent) -> &Vec<ValueCandidate> {
        match component {
            MavenUidComponent::GroupId => &self.group_ids,
            MavenUidComponent::ArtifactId => &self.artifact_ids,
            MavenUidComponent::Version => &self.versions,
        }
    }

    fn list_mut(&mut self, component: MavenUidComponent) -> &mut Vec<ValueCandidate> {
        match component {
            MavenUidComponent::GroupId => &mut self.group_ids,
            MavenUidComponent::ArtifactId => &mut self.artifact_ids,
            MavenUidComponent::Version => &mut self.versions,
        }
    }
}

/// What an analyzer sees: `add` without the analyzer tag.
pub struct ScopedCollector<'a> {
    inner: &'a mut CandidateCollector,
    analyzer: AnalyzerKind,
}

impl ScopedCollector<'_> {
    pub fn add(&mut self, component: MavenUidComponent, value: &str, score: u32, detail: String) {
        self.inner.add(self.analyzer, component, value, score, detail);
    }
}

/// Ranked candidates for one jar. Read-only after construction.
#[derive(Debug, Default)]
pub struct AnalysisBucket {
    group_ids: Vec<ValueCandidate>,
    artifact_ids: Vec<ValueCandidate>,
    versions: Vec<ValueCandidate>,
}

impl AnalysisBucket {
    pub fn candidates(&self, component: MavenUidComponent) -> &[ValueCandidate] {
        match component {
            MavenUidComponent::GroupId => &self.group_ids,
            MavenUidComponent::ArtifactId => &self.artifact_ids,
            MavenUidComponent::Version => &self.versions,
        }
    }

    pub fn is_empty(&self) -> bool {
        MavenUidComponent::ALL
            .iter()
            .all(|&c| self.candidates(c).is_empty())
    }
}

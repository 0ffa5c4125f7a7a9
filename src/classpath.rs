//! Class filepath analyzer: the package tree is weak but broad evidence for
//! groupId, and sometimes for artifactId.
//!
//! Walks the package hierarchy from the root, at each level following the
//! segment shared by most classes, as long as that segment is a valid package
//! segment and still covers at least half of all classes. The resulting
//! prefix becomes the groupId candidate; with three or more segments the last
//! one is peeled off as an artifactId hint.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::candidate::ScopedCollector;
use crate::jar::ClassEntry;
use crate::uid::MavenUidComponent;

fn package_segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

pub fn analyze(result: &mut ScopedCollector, classes: &[ClassEntry]) {
    let total = classes.len();
    if total == 0 {
        return;
    }

    let chains: Vec<Vec<&str>> = classes
        .iter()
        .map(|c| package_chain(&c.path))
        .collect();

    let mut prefix: Vec<&str> = Vec::new();
    let mut coverage = 0usize;
    loop {
        let depth = prefix.len();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for chain in &chains {
            if chain.len() > depth && chain[..depth] == prefix[..] {
                *counts.entry(chain[depth]).or_insert(0) += 1;
            }
        }
        // deterministic modal pick: highest count, then lexicographic
        let best = counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)));
        let Some((segment, count)) = best else { break };
        if count * 2 < total || !package_segment_pattern().is_match(segment) {
            break;
        }
        prefix.push(segment);
        coverage = count;
    }

    if prefix.is_empty() {
        return;
    }

    let ratio = (coverage * 100) / total;
    let score = if ratio >= 90 {
        3
    } else if ratio >= 60 {
        2
    } else {
        1
    };

    let (group_segments, artifact_hint) = if prefix.len() >= 3 {
        (&prefix[..prefix.len() - 1], Some(prefix[prefix.len() - 1]))
    } else {
        (&prefix[..], deepest_modal_segment(&chains, &prefix))
    };

    let group_id = group_segments.join(".");
    result.add(
        MavenUidComponent::GroupId,
        &group_id,
        score,
        format!("{ratio}% of classes share package prefix '{group_id}'"),
    );

    if let Some(artifact) = artifact_hint {
        result.add(
            MavenUidComponent::ArtifactId,
            artifact,
            1,
            format!("package segment below '{group_id}'"),
        );
    }
}

/// Directory components of a class path, cut off at the first segment that is
/// not a plausible package name (e.g. `META-INF`).
fn package_chain(class_path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = class_path.split('/').collect();
    segments.pop(); // the .class filename itself
    let valid = segments
        .iter()
        .take_while(|s| package_segment_pattern().is_match(s))
        .count();
    segments.truncate(valid);
    segments
}

/// The most common package segment directly below `prefix`, if any.
fn deepest_modal_segment<'a>(chains: &[Vec<&'a str>], prefix: &[&str]) -> Option<&'a str> {
    let depth = prefix.len();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for chain in chains {
        if chain.len() > depth && chain[..depth] == *prefix {
            *counts.entry(chain[depth]).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .filter(|(segment, _)| package_segment_pattern().is_match(segment))
        .map(|(segment, _)| segment)
}

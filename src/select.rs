//! Candidate selector: which (group, artifact, version) triples are worth
//! probing online.

use crate::candidate::AnalysisBucket;
use crate::uid::{MavenUid, MavenUidComponent};

#[derive(Debug, Clone, Copy)]
pub struct SelectorConfig {
    pub max_group_ids: usize,
    pub max_artifact_ids: usize,
    pub max_versions: usize,
    pub min_score: u32,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        SelectorConfig {
            max_group_ids: 2,
            max_artifact_ids: 2,
            max_versions: 2,
            min_score: 2,
        }
    }
}

/// Cartesian product of the per-component top-K candidates above the score
/// threshold. The output order puts higher-score combinations first so that
/// online checking can short-circuit early; an empty version list yields
/// version-less UIDs, which trigger version discovery.
pub fn select_candidates(bucket: &AnalysisBucket, config: &SelectorConfig) -> Vec<MavenUid> {
    let group_ids = top(bucket, MavenUidComponent::GroupId, config.max_group_ids, config);
    let artifact_ids = top(
        bucket,
        MavenUidComponent::ArtifactId,
        config.max_artifact_ids,
        config,
    );
    let versions = top(bucket, MavenUidComponent::Version, config.max_versions, config);

    let mut result: Vec<MavenUid> = Vec::new();
    for group in &group_ids {
        for artifact in &artifact_ids {
            if versions.is_empty() {
                push_unique(&mut result, MavenUid::without_version(group, artifact));
            } else {
                for version in &versions {
                    push_unique(
                        &mut result,
                        MavenUid::with_version(group, artifact, version),
                    );
                }
            }
        }
    }
    result
}

fn top(
    bucket: &AnalysisBucket,
    component: MavenUidComponent,
    max_count: usize,
    config: &SelectorConfig,
) -> Vec<String> {
    bucket
        .candidates(component)
        .iter()
        .filter(|c| c.score_sum >= config.min_score)
        .take(max_count)
        .map(|c| c.value.clone())
        .collect()
}

fn push_unique(result: &mut Vec<MavenUid>, uid: MavenUid) {
    if !result.contains(&uid) {
        result.push(uid);
    }
}

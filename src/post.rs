//! Post-analyzer: runs after the per-source analyzers and sees their
//! aggregate. Bundle symbolic names and deep package prefixes produce
//! groupIds that still contain the artifactId as their last segment; when a
//! matching artifactId candidate exists, the trimmed parent package is worth
//! proposing as a groupId of its own.

use crate::candidate::ScopedCollector;
use crate::uid::MavenUidComponent;

pub fn analyze(
    result: &mut ScopedCollector,
    group_ids: &[(String, u32)],
    artifact_ids: &[(String, u32)],
) {
    let mut derived: Vec<(String, String, String)> = Vec::new();

    for (group, _) in group_ids {
        for (artifact, _) in artifact_ids {
            let Some(trimmed) = group.strip_suffix(&format!(".{artifact}")) else {
                continue;
            };
            if trimmed.is_empty() || derived.iter().any(|(t, _, _)| t == trimmed) {
                continue;
            }
            derived.push((trimmed.to_string(), group.clone(), artifact.clone()));
        }
    }

    for (trimmed, group, artifact) in derived {
        result.add(
            MavenUidComponent::GroupId,
            &trimmed,
            2,
            format!("groupId '{group}' without artifactId '{artifact}'"),
        );
    }
}

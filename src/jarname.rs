//! Jar filename analyzer: split the stem on a version boundary.

use regex::Regex;
use std::sync::OnceLock;

use crate::candidate::ScopedCollector;
use crate::uid::MavenUidComponent;

/// Matches `<artifact><sep><version>` where the separator is `-` or `.` and
/// the version starts with a digit.
fn split_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(.+?)[-.](\d[A-Za-z0-9_.\-]*)$").unwrap())
}

pub fn analyze(result: &mut ScopedCollector, jar_name: &str) {
    let stem = jar_name
        .strip_suffix(".jar")
        .or_else(|| jar_name.strip_suffix(".JAR"))
        .unwrap_or(jar_name);

    if let Some(captures) = split_pattern().captures(stem) {
        let artifact = captures.get(1).unwrap().as_str();
        let version = captures.get(2).unwrap().as_str();
        if MavenUidComponent::Version.is_valid(version) {
            result.add(
                MavenUidComponent::ArtifactId,
                artifact,
                2,
                "jar filename".to_string(),
            );
            result.add(
                MavenUidComponent::Version,
                version,
                2,
                "jar filename".to_string(),
            );
            return;
        }
    }

    result.add(
        MavenUidComponent::ArtifactId,
        stem,
        1,
        "jar filename (no version suffix)".to_string(),
    );
}

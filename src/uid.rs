use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// The three components of a Maven coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MavenUidComponent {
    GroupId,
    ArtifactId,
    Version,
}

impl MavenUidComponent {
    pub const ALL: [MavenUidComponent; 3] = [
        MavenUidComponent::GroupId,
        MavenUidComponent::ArtifactId,
        MavenUidComponent::Version,
    ];

    /// Tag name used in pom files, also shown to the user in prompts.
    pub fn xml_tag_name(self) -> &'static str {
        match self {
            MavenUidComponent::GroupId => "groupId",
            MavenUidComponent::ArtifactId => "artifactId",
            MavenUidComponent::Version => "version",
        }
    }

    /// Maven is liberal about versions; group and artifact ids are
    /// dot-segmented identifiers.
    pub fn pattern(self) -> &'static Regex {
        static ID_PATTERN: OnceLock<Regex> = OnceLock::new();
        static VERSION_PATTERN: OnceLock<Regex> = OnceLock::new();
        match self {
            MavenUidComponent::GroupId | MavenUidComponent::ArtifactId => ID_PATTERN
                .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-.]*$").unwrap()),
            MavenUidComponent::Version => {
                VERSION_PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap())
            }
        }
    }

    pub fn is_valid(self, value: &str) -> bool {
        self.pattern().is_match(value)
    }
}

impl fmt::Display for MavenUidComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.xml_tag_name())
    }
}

/// A Maven coordinate triple. Any field may be absent; online checking
/// requires group and artifact to be present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MavenUid {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
}

impl MavenUid {
    pub fn with_version(group_id: &str, artifact_id: &str, version: &str) -> Self {
        MavenUid {
            group_id: Some(group_id.to_string()),
            artifact_id: Some(artifact_id.to_string()),
            version: Some(version.to_string()),
        }
    }

    pub fn without_version(group_id: &str, artifact_id: &str) -> Self {
        MavenUid {
            group_id: Some(group_id.to_string()),
            artifact_id: Some(artifact_id.to_string()),
            version: None,
        }
    }

    pub fn get(&self, component: MavenUidComponent) -> Option<&str> {
        match component {
            MavenUidComponent::GroupId => self.group_id.as_deref(),
            MavenUidComponent::ArtifactId => self.artifact_id.as_deref(),
            MavenUidComponent::Version => self.version.as_deref(),
        }
    }

    /// All three components present and matching their component pattern.
    pub fn is_complete(&self) -> bool {
        MavenUidComponent::ALL
            .iter()
            .all(|&c| self.get(c).is_some_and(|v| c.is_valid(v)))
    }
}

impl fmt::Display for MavenUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.group_id.as_deref().unwrap_or("?"),
            self.artifact_id.as_deref().unwrap_or("?"),
            self.version.as_deref().unwrap_or("?"),
        )
    }
}

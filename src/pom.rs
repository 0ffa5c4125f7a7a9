//! Pom analyzer: embedded `pom.xml` and `pom.properties` files are the
//! strongest offline evidence a jar carries.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::candidate::ScopedCollector;
use crate::jar::{FileBuffer, POM_PROPS, POM_XML};
use crate::uid::MavenUidComponent;

/// Coordinates read from a `pom.xml`. GroupId and version fall back to the
/// `<parent>` declaration when the project does not declare its own.
#[derive(Debug, Default, PartialEq)]
pub struct PomCoordinates {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub parent_group_id: Option<String>,
    pub parent_version: Option<String>,
}

impl PomCoordinates {
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id.as_deref().or(self.parent_group_id.as_deref())
    }

    pub fn effective_version(&self) -> Option<&str> {
        self.version.as_deref().or(self.parent_version.as_deref())
    }
}

pub fn analyze(result: &mut ScopedCollector, poms: &[FileBuffer]) {
    for pom in poms {
        let basename = pom
            .path
            .rsplit('/')
            .next()
            .unwrap_or(&pom.path)
            .to_ascii_lowercase();
        if basename == POM_XML {
            analyze_pom_xml(result, pom);
        } else if basename == POM_PROPS {
            analyze_pom_properties(result, pom);
        }
    }
}

fn analyze_pom_xml(result: &mut ScopedCollector, pom: &FileBuffer) {
    let Some(coordinates) = parse_pom_xml(&pom.content) else {
        log::debug!("Failed to parse embedded pom.xml at '{}'", pom.path);
        return;
    };

    if let Some(group_id) = coordinates.effective_group_id() {
        result.add(MavenUidComponent::GroupId, group_id, 4, pom.path.clone());
    }
    if let Some(artifact_id) = coordinates.artifact_id.as_deref() {
        result.add(MavenUidComponent::ArtifactId, artifact_id, 4, pom.path.clone());
    }
    if let Some(version) = coordinates.effective_version() {
        result.add(MavenUidComponent::Version, version, 4, pom.path.clone());
    }
}

fn analyze_pom_properties(result: &mut ScopedCollector, pom: &FileBuffer) {
    let text = String::from_utf8_lossy(&pom.content);
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let Some((key, value)) = line.split_once('=').or_else(|| line.split_once(':')) else {
            continue;
        };
        let value = value.trim();
        let component = match key.trim() {
            "groupId" => MavenUidComponent::GroupId,
            "artifactId" => MavenUidComponent::ArtifactId,
            "version" => MavenUidComponent::Version,
            _ => continue,
        };
        result.add(component, value, 4, pom.path.clone());
    }
}

/// Event-based read of the top-level and `<parent>` coordinates. Elements
/// nested deeper (dependencies, plugins) are ignored via depth tracking.
pub fn parse_pom_xml(bytes: &[u8]) -> Option<PomCoordinates> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut coordinates = PomCoordinates::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => stack.push(e.name().as_ref().to_vec()),
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(e)) => {
                let Ok(text) = e.unescape() else { continue };
                let text = text.trim().to_string();
                if text.is_empty() {
                    continue;
                }
                match path_of(&stack)[..] {
                    [b"project", b"groupId"] => coordinates.group_id = Some(text),
                    [b"project", b"artifactId"] => coordinates.artifact_id = Some(text),
                    [b"project", b"version"] => coordinates.version = Some(text),
                    [b"project", b"parent", b"groupId"] => {
                        coordinates.parent_group_id = Some(text)
                    }
                    [b"project", b"parent", b"version"] => {
                        coordinates.parent_version = Some(text)
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }
    Some(coordinates)
}

fn path_of(stack: &[Vec<u8>]) -> Vec<&[u8]> {
    stack.iter().map(|e| e.as_slice()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{AnalysisBucket, AnalyzerKind, CandidateCollector};

    fn run(path: &str, content: &[u8]) -> AnalysisBucket {
        let mut collector = CandidateCollector::new();
        let poms = vec![FileBuffer {
            path: path.to_string(),
            content: content.to_vec(),
        }];
        analyze(&mut collector.scoped(AnalyzerKind::Pom), &poms);
        collector.into_bucket()
    }

    #[test]
    fn pom_xml_yields_top_level_coordinates() {
        let bucket = run(
            "META-INF/maven/org.example/demo/pom.xml",
            br#"<?xml version="1.0"?>
<project>
  <groupId>org.example</groupId>
  <artifactId>demo</artifactId>
  <version>1.4.2</version>
  <dependencies>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <version>4.12</version>
    </dependency>
  </dependencies>
</project>"#,
        );

        assert_eq!(
            bucket.candidates(MavenUidComponent::GroupId)[0].value,
            "org.example"
        );
        assert_eq!(
            bucket.candidates(MavenUidComponent::ArtifactId)[0].value,
            "demo"
        );
        assert_eq!(
            bucket.candidates(MavenUidComponent::Version)[0].value,
            "1.4.2"
        );
        assert_eq!(bucket.candidates(MavenUidComponent::GroupId).len(), 1);
        assert_eq!(bucket.candidates(MavenUidComponent::GroupId)[0].score_sum, 4);
    }

    #[test]
    fn group_and_version_inherit_from_parent() {
        let coordinates = parse_pom_xml(
            br#"<project>
  <parent>
    <groupId>org.example.parent</groupId>
    <artifactId>parent</artifactId>
    <version>7.0</version>
  </parent>
  <artifactId>child</artifactId>
</project>"#,
        )
        .unwrap();

        assert_eq!(coordinates.effective_group_id(), Some("org.example.parent"));
        assert_eq!(coordinates.artifact_id.as_deref(), Some("child"));
        assert_eq!(coordinates.effective_version(), Some("7.0"));
    }

    #[test]
    fn own_coordinates_win_over_parent() {
        let coordinates = parse_pom_xml(
            br#"<project>
  <parent>
    <groupId>org.example.parent</groupId>
    <version>7.0</version>
  </parent>
  <groupId>org.example.child</groupId>
  <artifactId>child</artifactId>
  <version>1.0</version>
</project>"#,
        )
        .unwrap();

        assert_eq!(coordinates.effective_group_id(), Some("org.example.child"));
        assert_eq!(coordinates.effective_version(), Some("1.0"));
    }

    #[test]
    fn pom_properties_yields_all_three_fields() {
        let bucket = run(
            "META-INF/maven/junit/junit/pom.properties",
            b"#Generated by Maven\ngroupId=junit\nartifactId=junit\nversion=4.12\n",
        );

        assert_eq!(bucket.candidates(MavenUidComponent::GroupId)[0].value, "junit");
        assert_eq!(
            bucket.candidates(MavenUidComponent::ArtifactId)[0].value,
            "junit"
        );
        let versions = bucket.candidates(MavenUidComponent::Version);
        assert_eq!(versions[0].value, "4.12");
        assert_eq!(versions[0].score_sum, 4);
    }

    #[test]
    fn malformed_xml_emits_nothing() {
        let bucket = run("pom.xml", b"<project><groupId>org.x</gruopId></project>");
        assert!(bucket.is_empty());
    }
}

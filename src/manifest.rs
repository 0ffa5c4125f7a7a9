//! Jar manifest parsing and the manifest analyzer.
//!
//! The manifest format wraps logical lines at 72 bytes with a leading-space
//! continuation, separates sections with blank lines, and treats attribute
//! names case-insensitively. The first section holds the main attributes;
//! later sections are named per-entry sections.

use crate::candidate::ScopedCollector;
use crate::uid::MavenUidComponent;

#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub main: Vec<(String, String)>,
    pub sections: Vec<Vec<(String, String)>>,
}

impl Manifest {
    /// Tolerant parser: malformed lines are skipped rather than failing the
    /// whole manifest.
    pub fn parse(text: &str) -> Manifest {
        let mut manifest = Manifest::default();
        let mut current: Vec<(String, String)> = Vec::new();
        let mut in_main = true;

        for raw_line in text.split('\n') {
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);

            if line.is_empty() {
                if !current.is_empty() {
                    if in_main {
                        manifest.main = std::mem::take(&mut current);
                        in_main = false;
                    } else {
                        manifest.sections.push(std::mem::take(&mut current));
                    }
                }
                continue;
            }

            if let Some(continuation) = line.strip_prefix(' ') {
                if let Some(last) = current.last_mut() {
                    last.1.push_str(continuation);
                }
                continue;
            }

            if let Some((name, value)) = line.split_once(':') {
                current.push((name.trim().to_string(), value.trim().to_string()));
            }
        }

        if !current.is_empty() {
            if in_main {
                manifest.main = current;
            } else {
                manifest.sections.push(current);
            }
        }
        manifest
    }

    pub fn main_attribute(&self, name: &str) -> Option<&str> {
        lookup(&self.main, name)
    }

    /// The attribute from the main section or, failing that, the first named
    /// section that carries it.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.main_attribute(name)
            .or_else(|| self.sections.iter().find_map(|s| lookup(s, name)))
    }
}

fn lookup<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Map well-known manifest attributes to UID components by fixed rules.
pub fn analyze(result: &mut ScopedCollector, manifest: &Manifest) {
    if let Some(vendor_id) = manifest.attribute("Implementation-Vendor-Id") {
        result.add(
            MavenUidComponent::GroupId,
            vendor_id.trim(),
            3,
            "Implementation-Vendor-Id".to_string(),
        );
    }

    if let Some(symbolic_name) = manifest.attribute("Bundle-SymbolicName") {
        // OSGi directives like ';singleton:=true' follow the name
        let name = symbolic_name.split(';').next().unwrap_or("").trim();
        if !name.is_empty() {
            result.add(
                MavenUidComponent::GroupId,
                name,
                2,
                "Bundle-SymbolicName".to_string(),
            );
            let last_segment = name.rsplit('.').next().unwrap_or(name);
            result.add(
                MavenUidComponent::ArtifactId,
                last_segment,
                2,
                "Bundle-SymbolicName".to_string(),
            );
        }
    }

    for attribute in ["Implementation-Title", "Bundle-Name"] {
        if let Some(title) = manifest.attribute(attribute) {
            result.add(
                MavenUidComponent::ArtifactId,
                title.trim(),
                1,
                attribute.to_string(),
            );
        }
    }

    for attribute in ["Implementation-Version", "Bundle-Version"] {
        if let Some(version) = manifest.attribute(attribute) {
            let version = version.trim();
            if MavenUidComponent::Version.is_valid(version) {
                result.add(MavenUidComponent::Version, version, 3, attribute.to_string());
            }
        }
    }

    if let Some(version) = manifest.attribute("Specification-Version") {
        result.add(
            MavenUidComponent::Version,
            version.trim(),
            1,
            "Specification-Version".to_string(),
        );
    }
}

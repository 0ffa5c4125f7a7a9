//! Expansion of `--jars` arguments into the list of jar files to analyze.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Files are taken as given; directories are flattened one level, keeping
/// only `*.jar` entries (sorted by name, so the report order is stable for a
/// given argument list).
pub fn collect_jar_paths(args: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut result = Vec::new();
    for arg in args {
        if arg.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(arg)
                .with_context(|| format!("Failed to list directory: {}", arg.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && has_jar_extension(path))
                .collect();
            entries.sort();
            result.extend(entries);
        } else if arg.is_file() {
            result.push(arg.clone());
        } else {
            anyhow::bail!("No such file or directory: {}", arg.display());
        }
    }
    Ok(result)
}

fn has_jar_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "jar_identifier_scan_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ))
    }

    #[test]
    fn directories_flatten_one_level_to_jars_only() {
        let dir = temp_dir("flatten");
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("b.jar"), b"x").unwrap();
        std::fs::write(dir.join("a.jar"), b"x").unwrap();
        std::fs::write(dir.join("notes.txt"), b"x").unwrap();
        std::fs::write(dir.join("nested").join("deep.jar"), b"x").unwrap();

        let paths = collect_jar_paths(&[dir.clone()]).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.jar", "b.jar"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn explicit_files_are_taken_as_given() {
        let dir = temp_dir("explicit");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("renamed.bin");
        std::fs::write(&file, b"x").unwrap();

        let paths = collect_jar_paths(&[file.clone()]).unwrap();
        assert_eq!(paths, vec![file]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_path_is_an_error() {
        let missing = temp_dir("missing").join("nope.jar");
        assert!(collect_jar_paths(&[missing]).is_err());
    }
}

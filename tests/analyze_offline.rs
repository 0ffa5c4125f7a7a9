use jar_identifier::pipeline::{self, AnalysisOptions, CompletedAnalysis};
use jar_identifier::uid::{MavenUid, MavenUidComponent};
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "jar_identifier_it_{}_{}_{}",
        std::process::id(),
        nanos,
        name
    ))
}

fn write_jar(path: &std::path::Path, entries: &[(&str, &[u8])]) -> anyhow::Result<()> {
    use zip::write::FileOptions;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in entries {
        zip.start_file(*name, options)?;
        zip.write_all(content)?;
    }
    zip.finish()?;
    Ok(())
}

fn offline_options() -> AnalysisOptions {
    AnalysisOptions {
        offline: true,
        ..AnalysisOptions::default()
    }
}

/// Manual selection standing in for the interactive prompt: accept the top
/// offline candidates when they form a complete UID, otherwise skip the jar.
fn select_top_candidates(completed: &CompletedAnalysis) -> Option<MavenUid> {
    let top = |component| {
        completed
            .bucket
            .candidates(component)
            .first()
            .map(|c| c.value.clone())
    };
    let uid = MavenUid {
        group_id: top(MavenUidComponent::GroupId),
        artifact_id: top(MavenUidComponent::ArtifactId),
        version: top(MavenUidComponent::Version),
    };
    uid.is_complete().then_some(uid)
}

#[test]
fn pom_backed_jar_reports_and_bare_jar_is_skipped() -> anyhow::Result<()> {
    let dir = temp_dir("pom_backed");
    let junit_jar = dir.join("junit-4.12.jar");
    write_jar(
        &junit_jar,
        &[
            (
                "META-INF/maven/junit/junit/pom.properties",
                b"groupId=junit\nartifactId=junit\nversion=4.12\n",
            ),
            ("junit/framework/TestCase.class", b"bytecode"),
        ],
    )?;

    let bare_jar = dir.join("bare.jar");
    write_jar(&bare_jar, &[("com/acme/widget/Foo.class", b"bytecode")])?;

    let reports = pipeline::run_analysis(
        &[junit_jar, bare_jar],
        None,
        &offline_options(),
        select_top_candidates,
    )?;

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].jar_name, "junit-4.12.jar");
    assert_eq!(reports[0].match_type, None);
    assert_eq!(reports[0].uid, MavenUid::with_version("junit", "junit", "4.12"));
    assert!(!reports[0].sha256.is_empty());

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn report_preserves_input_order() -> anyhow::Result<()> {
    let dir = temp_dir("input_order");
    let mut paths = Vec::new();
    for name in ["c", "a", "b"] {
        let path = dir.join(format!("{name}-1.0.jar"));
        write_jar(
            &path,
            &[(
                "META-INF/maven/org.example/x/pom.properties",
                format!("groupId=org.example\nartifactId={name}\nversion=1.0\n").as_bytes(),
            )],
        )?;
        paths.push(path);
    }

    let reports =
        pipeline::run_analysis(&paths, None, &offline_options(), select_top_candidates)?;

    let names: Vec<&str> = reports.iter().map(|r| r.jar_name.as_str()).collect();
    assert_eq!(names, vec!["c-1.0.jar", "a-1.0.jar", "b-1.0.jar"]);

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn limit_caps_the_number_of_processed_jars() -> anyhow::Result<()> {
    let dir = temp_dir("limit");
    let mut paths = Vec::new();
    for i in 0..5 {
        let path = dir.join(format!("demo{i}-1.0.jar"));
        write_jar(
            &path,
            &[(
                "META-INF/maven/org.example/demo/pom.properties",
                format!("groupId=org.example\nartifactId=demo{i}\nversion=1.0\n").as_bytes(),
            )],
        )?;
        paths.push(path);
    }

    let options = AnalysisOptions {
        limit: Some(3),
        ..offline_options()
    };
    let reports = pipeline::run_analysis(&paths, None, &options, select_top_candidates)?;

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].jar_name, "demo0-1.0.jar");
    assert_eq!(reports[2].jar_name, "demo2-1.0.jar");

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn malformed_jar_is_skipped_and_analysis_continues() -> anyhow::Result<()> {
    let dir = temp_dir("malformed");
    std::fs::create_dir_all(&dir)?;

    let broken = dir.join("broken.jar");
    std::fs::write(&broken, b"this is not a zip file")?;

    let good = dir.join("good-2.0.jar");
    write_jar(
        &good,
        &[(
            "META-INF/maven/org.example/good/pom.properties",
            b"groupId=org.example\nartifactId=good\nversion=2.0\n",
        )],
    )?;

    let reports = pipeline::run_analysis(
        &[broken, good],
        None,
        &offline_options(),
        select_top_candidates,
    )?;

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].jar_name, "good-2.0.jar");

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn skip_not_found_suppresses_manual_selection() -> anyhow::Result<()> {
    let dir = temp_dir("skip_not_found");
    let jar = dir.join("mystery.jar");
    write_jar(&jar, &[("com/acme/widget/Foo.class", b"bytecode")])?;

    let options = AnalysisOptions {
        skip_not_found: true,
        ..offline_options()
    };
    let reports = pipeline::run_analysis(&[jar], None, &options, |_completed| {
        panic!("manual selection must not be consulted with --skip-not-found")
    })?;

    assert!(reports.is_empty());

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn renamed_jar_still_gets_pom_coordinates() -> anyhow::Result<()> {
    // a renamed copy keeps its embedded pom evidence, so the top candidates
    // are unaffected by the misleading filename
    let dir = temp_dir("renamed");
    let jar = dir.join("foo.jar");
    write_jar(
        &jar,
        &[
            (
                "META-INF/maven/org.apache.commons/commons-lang3/pom.properties",
                b"groupId=org.apache.commons\nartifactId=commons-lang3\nversion=3.12.0\n",
            ),
            ("org/apache/commons/lang3/StringUtils.class", b"bytecode"),
        ],
    )?;

    let reports =
        pipeline::run_analysis(&[jar], None, &offline_options(), select_top_candidates)?;

    assert_eq!(
        reports[0].uid,
        MavenUid::with_version("org.apache.commons", "commons-lang3", "3.12.0")
    );

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

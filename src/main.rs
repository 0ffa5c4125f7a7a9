use anyhow::Result;
use clap::Parser;
use jar_identifier::cli::{Cli, Commands};
use jar_identifier::pipeline::{self, AnalysisOptions};
use jar_identifier::repo::RepoChecker;
use jar_identifier::report::{self, AnalysisInfo, AnalyzerReport};
use jar_identifier::select::SelectorConfig;
use jar_identifier::{prompt, scan};
use std::sync::Arc;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            jars,
            report_file,
            offline,
            limit,
            skip_not_found,
            force_detailed_output,
        } => run_analyze(
            &jars,
            &report_file,
            AnalysisOptions {
                offline,
                limit,
                skip_not_found,
                force_detailed_output,
                selector: SelectorConfig::default(),
            },
        ),
    }
}

fn run_analyze(
    jars: &[std::path::PathBuf],
    report_template: &str,
    options: AnalysisOptions,
) -> Result<()> {
    report::validate_report_template(report_template)?;
    let jar_paths = scan::collect_jar_paths(jars)?;
    if jar_paths.is_empty() {
        anyhow::bail!("No jar files found in the given --jars arguments");
    }

    // startup work overlaps the offline phase
    let checker = if options.offline {
        println!("ONLINE ANALYSIS DISABLED! Values for jars found online cannot be auto-selected.");
        None
    } else {
        println!("Online-Check initializing...");
        Some(Arc::new(RepoChecker::new()))
    };

    let stdin = std::io::stdin();
    let analysis = pipeline::run_analysis(&jar_paths, checker.as_ref(), &options, |completed| {
        let mut input = stdin.lock();
        prompt::select_uid(&mut input, completed)
    });
    let jar_reports = match analysis {
        Ok(jar_reports) => jar_reports,
        Err(err) => {
            if let Some(checker) = &checker {
                checker.shutdown();
            }
            return Err(err);
        }
    };

    let remote_repositories = match &checker {
        Some(checker) => checker.remote_repos()?,
        None => Vec::new(),
    };
    let analyzer_report = AnalyzerReport {
        analysis_info: AnalysisInfo {
            online_check_enabled: !options.offline,
            remote_repositories,
        },
        jar_results: jar_reports,
    };

    let report_path = report::resolve_report_path(report_template, chrono::Local::now());
    println!("Writing report file: {}", report_path.display());
    report::write_report(&report_path, &analyzer_report)?;

    if let Some(checker) = checker {
        println!("Online-Check cleanup started.");
        checker.shutdown();
    }
    Ok(())
}

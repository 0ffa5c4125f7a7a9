//! Console output of per-jar analysis results.

use crate::pipeline::CompletedAnalysis;
use crate::repo::{OnlineMatch, UidCheck};
use crate::report::JarReport;
use crate::uid::MavenUidComponent;

const PAD: &str = "  ";

pub fn print_results(
    completed: &CompletedAnalysis,
    selected: Option<&JarReport>,
    force_detailed: bool,
    offline: bool,
) {
    println!("{}", completed.jar.name);
    println!("{PAD}sha256: {}", completed.jar.sha256);

    let detailed = force_detailed || selected.is_none();
    print_offline_candidates(completed, detailed);

    if !offline {
        print_online_checks(completed);
    }

    match selected {
        Some(report) => {
            let match_type = report
                .match_type
                .map(|m| format!("{m:?}"))
                .unwrap_or_else(|| "manual".to_string());
            println!("{PAD}Auto-selected: {} ({match_type})", report.uid);
        }
        None => println!("{PAD}No auto-selection possible."),
    }
}

pub fn print_jar_end_separator() {
    println!("{}", "-".repeat(60));
}

fn print_offline_candidates(completed: &CompletedAnalysis, detailed: bool) {
    for component in MavenUidComponent::ALL {
        let candidates = completed.bucket.candidates(component);
        if candidates.is_empty() {
            continue;
        }
        println!("{PAD}{component}:");
        for candidate in candidates {
            println!("{PAD}{PAD}{:>3} | {}", candidate.score_sum, candidate.value);
            if detailed {
                for source in &candidate.sources {
                    println!(
                        "{PAD}{PAD}{PAD}  {} | {} ({})",
                        source.score, source.analyzer, source.detail
                    );
                }
            }
        }
    }
}

fn print_online_checks(completed: &CompletedAnalysis) {
    if !completed.with_version.is_empty() {
        println!("{PAD}Online check:");
        for check in &completed.with_version {
            print_check(check);
        }
    }
    for (uid, checks) in &completed.no_version {
        if checks.is_empty() {
            println!("{PAD}No versions found online for {uid}");
        } else {
            println!("{PAD}Versions found online for {uid}:");
            for check in checks {
                print_check(check);
            }
        }
    }
}

fn print_check(check: &UidCheck) {
    let location = match check.match_type {
        OnlineMatch::NotFound => String::new(),
        _ => format!(" (repo: {})", check.repo),
    };
    println!("{PAD}{PAD}{:?} | {}{location}", check.match_type, check.uid);
}

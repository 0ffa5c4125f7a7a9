//! Interactive completion of a UID when auto-selection fails.
//!
//! For each component the user either types a value (validated against the
//! component pattern, re-prompting with the pattern on mismatch) or picks a
//! numbered proposal with `<n>!`. `0!` skips the jar entirely.

use std::io::BufRead;

use crate::pipeline::CompletedAnalysis;
use crate::repo::OnlineMatch;
use crate::uid::{MavenUid, MavenUidComponent};

const PAD: &str = "  ";

/// Offline candidates need this much combined evidence before they are shown
/// as proposals.
const PROPOSAL_SCORE_THRESHOLD: u32 = 4;

pub fn select_uid(input: &mut impl BufRead, completed: &CompletedAnalysis) -> Option<MavenUid> {
    println!("{PAD}Please complete missing groupId/artifactId/version info for this jar.");
    println!("{PAD}Enter the value or enter '<number>!' to select a proposal.");

    let mut selected_values = Vec::with_capacity(3);
    for component in MavenUidComponent::ALL {
        let proposals = collect_proposals(completed, component);

        println!();
        println!("{PAD}Enter {} or select from:", component.xml_tag_name());
        println!("{PAD}    0! <skip this jar>");
        for (index, proposal) in proposals.iter().enumerate() {
            println!("{PAD}    {}! {proposal}", index + 1);
        }

        match read_component(input, component, &proposals) {
            Some(value) => selected_values.push(value),
            None => {
                println!(
                    "{PAD}Skipped! Jar '{}' will not appear in the result report.",
                    completed.jar.name
                );
                return None;
            }
        }
    }

    let uid = MavenUid {
        group_id: Some(selected_values[0].clone()),
        artifact_id: Some(selected_values[1].clone()),
        version: Some(selected_values[2].clone()),
    };
    println!();
    println!("{PAD}Final values: {uid}");
    println!("{PAD}Note that any mistakes can be fixed manually in the report file.");
    Some(uid)
}

/// Ranked proposals: strong offline candidates first, then values from
/// online matches worth trusting, then the discovered (group, artifact)
/// pairs. Duplicates keep their first position.
fn collect_proposals(completed: &CompletedAnalysis, component: MavenUidComponent) -> Vec<String> {
    let mut proposals: Vec<String> = Vec::new();
    let mut push = |value: &str| {
        if !value.is_empty() && !proposals.iter().any(|p| p == value) {
            proposals.push(value.to_string());
        }
    };

    for candidate in completed.bucket.candidates(component) {
        if candidate.score_sum >= PROPOSAL_SCORE_THRESHOLD {
            push(&candidate.value);
        }
    }

    let trustworthy = |match_type: OnlineMatch| {
        matches!(
            match_type,
            OnlineMatch::ExactSha | OnlineMatch::ExactClassnames
        )
    };
    for check in &completed.with_version {
        if trustworthy(check.match_type) {
            if let Some(value) = check.uid.get(component) {
                push(value);
            }
        }
    }
    for (uid, checks) in &completed.no_version {
        if component != MavenUidComponent::Version {
            if let Some(value) = uid.get(component) {
                push(value);
            }
        }
        for check in checks {
            if trustworthy(check.match_type) {
                if let Some(value) = check.uid.get(component) {
                    push(value);
                }
            }
        }
    }
    proposals
}

/// One component's read loop; `None` means the user chose to skip the jar.
fn read_component(
    input: &mut impl BufRead,
    component: MavenUidComponent,
    proposals: &[String],
) -> Option<String> {
    loop {
        let mut line = String::new();
        if input.read_line(&mut line).is_err() || line.is_empty() {
            // EOF behaves like a skip so piped input cannot loop forever
            return None;
        }
        let entered = line.trim();

        let selected = match parse_proposal_index(entered) {
            Some(0) => return None,
            Some(index) => match proposals.get(index - 1) {
                Some(proposal) => proposal.clone(),
                None => {
                    println!("{PAD}No proposal with number {index}!");
                    continue;
                }
            },
            None => entered.to_string(),
        };

        if component.is_valid(&selected) {
            return Some(selected);
        }
        println!(
            "{PAD}Given value does not seem to be a valid {}!",
            component.xml_tag_name()
        );
        println!("{PAD}Value must match pattern: {}", component.pattern());
    }
}

fn parse_proposal_index(entered: &str) -> Option<usize> {
    entered.strip_suffix('!')?.parse().ok()
}

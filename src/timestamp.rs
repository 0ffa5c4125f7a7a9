//! Class timestamp analyzer: a build stamps most class files with the same
//! date, which is a very weak hint at a date-shaped version.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::candidate::ScopedCollector;
use crate::jar::ClassEntry;
use crate::uid::MavenUidComponent;

pub fn analyze(result: &mut ScopedCollector, classes: &[ClassEntry]) {
    let mut dates_to_occurrence: HashMap<NaiveDate, usize> = HashMap::new();
    let mut total = 0usize;

    for entry in classes {
        if let Some(timestamp) = entry.last_modified {
            *dates_to_occurrence.entry(timestamp.date()).or_insert(0) += 1;
            total += 1;
        }
    }

    let modal = dates_to_occurrence
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    let Some((date, count)) = modal else { return };

    if count <= 1 {
        return;
    }
    let ratio = (count * 100) / total;
    if ratio <= 60 {
        return;
    }

    result.add(
        MavenUidComponent::Version,
        &date.format("%Y.%m.%d").to_string(),
        1,
        format!(
            "{ratio:>3}% of classes have last-modified date: {}",
            date.format("%Y-%m-%d")
        ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{AnalysisBucket, AnalyzerKind, CandidateCollector};
    use chrono::NaiveDateTime;

    fn at(date: &str) -> Option<NaiveDateTime> {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(12, 30, 0)
    }

    fn run(timestamps: &[Option<NaiveDateTime>]) -> AnalysisBucket {
        let classes: Vec<ClassEntry> = timestamps
            .iter()
            .enumerate()
            .map(|(i, ts)| ClassEntry {
                path: format!("org/example/C{i}.class"),
                last_modified: *ts,
            })
            .collect();
        let mut collector = CandidateCollector::new();
        analyze(&mut collector.scoped(AnalyzerKind::ClassTimestamp), &classes);
        collector.into_bucket()
    }

    #[test]
    fn modal_date_becomes_version_candidate() {
        let bucket = run(&[
            at("2020-01-15"),
            at("2020-01-15"),
            at("2020-01-15"),
            at("2019-06-02"),
        ]);
        let versions = bucket.candidates(MavenUidComponent::Version);
        assert_eq!(versions[0].value, "2020.01.15");
        assert_eq!(versions[0].score_sum, 1);
        assert!(versions[0].sources[0].detail.contains("75%"));
    }

    #[test]
    fn emits_nothing_below_the_coverage_threshold() {
        let bucket = run(&[
            at("2020-01-15"),
            at("2019-06-02"),
            at("2018-03-09"),
            at("2020-01-15"),
        ]);
        // 50% is not enough
        assert!(bucket.candidates(MavenUidComponent::Version).is_empty());
    }

    #[test]
    fn emits_nothing_when_timestamps_are_absent() {
        assert!(run(&[None, None]).is_empty());
        assert!(run(&[]).is_empty());
    }

    #[test]
    fn a_single_stamped_class_is_not_enough() {
        assert!(run(&[at("2020-01-15"), None]).is_empty());
    }
}

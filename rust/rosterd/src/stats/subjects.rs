use std::collections::HashMap;

use super::{NormalizedStudentRecord, RunningMean, SubjectAverage};

/// One mean per distinct subject name, in first-seen order.
///
/// Names compare exactly: "Math", "math" and "Math " are three subjects.
pub fn aggregate_by_subject(students: &[NormalizedStudentRecord]) -> Vec<SubjectAverage> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, RunningMean)> = Vec::new();

    for student in students {
        for entry in &student.subjects {
            let name = entry.subject_name.as_str();
            let slot = *index.entry(name).or_insert_with(|| {
                groups.push((name, RunningMean::default()));
                groups.len() - 1
            });
            groups[slot].1.push(entry.score);
        }
    }

    groups
        .into_iter()
        .map(|(name, acc)| SubjectAverage {
            subject_name: name.to_string(),
            mean: acc.mean(),
            sample_count: acc.count(),
        })
        .collect()
}

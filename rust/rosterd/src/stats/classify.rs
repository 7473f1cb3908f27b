use super::{
    Classification, NormalizedStudentRecord, RunningMean, StudentClassification, StudentMean,
};

fn student_mean(student: &NormalizedStudentRecord) -> f64 {
    let mut acc = RunningMean::default();
    for s in &student.subjects {
        acc.push(s.score);
    }
    acc.mean()
}

/// Per-student means in input order, split at `threshold` (inclusive).
///
/// A student with no subjects scores `0.0`; nobody is dropped.
pub fn classify(students: &[NormalizedStudentRecord], threshold: f64) -> StudentClassification {
    let mut high_count = 0usize;
    let mut low_count = 0usize;
    let student_means = students
        .iter()
        .map(|student| {
            let mean = student_mean(student);
            let classification = if mean >= threshold {
                high_count += 1;
                Classification::High
            } else {
                low_count += 1;
                Classification::Low
            };
            StudentMean {
                student_id: student.id.clone(),
                mean,
                classification,
            }
        })
        .collect();

    StudentClassification {
        student_means,
        high_count,
        low_count,
    }
}

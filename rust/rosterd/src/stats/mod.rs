//! Academic aggregation over a roster snapshot.
//!
//! Everything in here is a pure function of its input: the caller hands in a
//! snapshot of raw student documents and gets back a freshly built
//! [`AggregateResult`]. Nothing is cached between runs.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

mod classify;
mod normalize;
mod report;
mod subjects;

pub use classify::classify;
pub use normalize::normalize;
pub use report::{chart_series, compile, render_report};
pub use subjects::aggregate_by_subject;

/// Cutoff the roster screens have always used for the high/low split.
pub const DEFAULT_THRESHOLD: f64 = 70.0;

/// One subject entry exactly as the document store returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubjectScore {
    #[serde(
        default,
        alias = "subject",
        alias = "asignatura",
        deserialize_with = "lenient_name"
    )]
    pub subject_name: Option<String>,
    #[serde(default, alias = "scoreText", alias = "promedio")]
    pub score: Option<serde_json::Value>,
}

/// Subject names arrive loosely typed too: numbers and booleans keep their
/// text form, anything else counts as absent.
fn lenient_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStudentRecord {
    #[serde(default, alias = "matricula")]
    pub id: String,
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "foto")]
    pub photo_ref: Option<String>,
    #[serde(default, alias = "asignaturas")]
    pub subjects: Option<Vec<RawSubjectScore>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSubjectScore {
    pub subject_name: String,
    /// Always finite.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedStudentRecord {
    pub id: String,
    pub name: String,
    pub subjects: Vec<NormalizedSubjectScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAverage {
    pub subject_name: String,
    pub mean: f64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    High,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentMean {
    pub student_id: String,
    pub mean: f64,
    pub classification: Classification,
}

/// Classifier output: per-student means in input order plus the tallies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentClassification {
    pub student_means: Vec<StudentMean>,
    pub high_count: usize,
    pub low_count: usize,
}

/// Immutable outcome of one aggregation run.
///
/// `high_count + low_count == student_means.len()` and `subject_averages`
/// never repeats a subject name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub subject_averages: Vec<SubjectAverage>,
    pub student_means: Vec<StudentMean>,
    pub high_count: usize,
    pub low_count: usize,
    pub threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsConfig {
    pub threshold: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Arithmetic mean that stays finite for finite inputs.
///
/// The plain sum is used whenever it is finite so exactly representable
/// inputs give the exact mean. If the sum overflows, an incremental mean
/// kept alongside it is reported instead.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RunningMean {
    sum: f64,
    incremental: f64,
    count: usize,
}

impl RunningMean {
    pub(crate) fn push(&mut self, x: f64) {
        self.count += 1;
        let n = self.count as f64;
        self.sum += x;
        self.incremental += x / n - self.incremental / n;
    }

    pub(crate) fn count(&self) -> usize {
        self.count
    }

    /// `0.0` when nothing was pushed.
    pub(crate) fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else if self.sum.is_finite() {
            self.sum / (self.count as f64)
        } else {
            self.incremental
        }
    }
}

/// Runs normalize -> {subject aggregation, classification} -> compile.
pub fn aggregate(raw: &[RawStudentRecord], config: &StatsConfig) -> AggregateResult {
    let students = normalize(raw);
    let subject_averages = aggregate_by_subject(&students);
    let classification = classify(&students, config.threshold);
    tracing::debug!(
        students = students.len(),
        subjects = subject_averages.len(),
        high = classification.high_count,
        low = classification.low_count,
        "aggregated roster snapshot"
    );
    compile(subject_averages, classification, config.threshold)
}

use serde::Serialize;

use super::{AggregateResult, StudentClassification, SubjectAverage};

pub const REPORT_TITLE: &str = "Student Statistics Report";
const SUBJECT_SECTION: &str = "Average by Subject";
const CLASSIFICATION_SECTION: &str = "Students by Average";

/// Assembles the aggregator outputs; no recomputation happens here.
pub fn compile(
    subject_averages: Vec<SubjectAverage>,
    classification: StudentClassification,
    threshold: f64,
) -> AggregateResult {
    AggregateResult {
        subject_averages,
        student_means: classification.student_means,
        high_count: classification.high_count,
        low_count: classification.low_count,
        threshold,
    }
}

/// Fixed two-decimal rendering. Never prints "-0.00".
fn fixed2(x: f64) -> String {
    let s = format!("{:.2}", x);
    if s == "-0.00" {
        "0.00".to_string()
    } else {
        s
    }
}

/// Control characters in a subject name are escaped so every entry stays
/// one physical line.
fn display_name(name: &str) -> String {
    if !name.chars().any(char::is_control) {
        return name.to_string();
    }
    name.chars()
        .map(|c| {
            if c.is_control() {
                c.escape_default().to_string()
            } else {
                c.to_string()
            }
        })
        .collect()
}

/// Integral thresholds print bare ("70"), anything else with two decimals.
fn threshold_label(t: f64) -> String {
    if t.is_finite() && t.fract() == 0.0 {
        format!("{:.0}", t + 0.0)
    } else {
        fixed2(t)
    }
}

/// Line-oriented export text. Identical results render identical bytes.
pub fn render_report(result: &AggregateResult) -> Vec<String> {
    let mut lines = Vec::with_capacity(result.subject_averages.len() + 5);
    lines.push(REPORT_TITLE.to_string());
    lines.push(SUBJECT_SECTION.to_string());
    for avg in &result.subject_averages {
        lines.push(format!("{}: {}", display_name(&avg.subject_name), fixed2(avg.mean)));
    }
    let t = threshold_label(result.threshold);
    lines.push(CLASSIFICATION_SECTION.to_string());
    lines.push(format!("High (>= {}): {}", t, result.high_count));
    lines.push(format!("Low (< {}): {}", t, result.low_count));
    lines
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieSlice {
    pub name: String,
    pub population: usize,
}

/// Series for the statistics screen: a per-subject bar chart and the
/// high/low population pie.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub population: [PieSlice; 2],
}

pub fn chart_series(result: &AggregateResult) -> ChartSeries {
    let t = threshold_label(result.threshold);
    ChartSeries {
        labels: result
            .subject_averages
            .iter()
            .map(|a| a.subject_name.clone())
            .collect(),
        values: result.subject_averages.iter().map(|a| a.mean).collect(),
        population: [
            PieSlice {
                name: format!(">= {t}"),
                population: result.high_count,
            },
            PieSlice {
                name: format!("< {t}"),
                population: result.low_count,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Classification, StudentMean};

    fn sample() -> AggregateResult {
        compile(
            vec![
                SubjectAverage {
                    subject_name: "Math".into(),
                    mean: 85.0,
                    sample_count: 2,
                },
                SubjectAverage {
                    subject_name: "Science".into(),
                    mean: 200.0 / 3.0,
                    sample_count: 3,
                },
            ],
            StudentClassification {
                student_means: vec![StudentMean {
                    student_id: "s1".into(),
                    mean: 70.0,
                    classification: Classification::High,
                }],
                high_count: 1,
                low_count: 0,
            },
            70.0,
        )
    }

    #[test]
    fn report_layout_is_fixed() {
        assert_eq!(
            render_report(&sample()),
            vec![
                "Student Statistics Report",
                "Average by Subject",
                "Math: 85.00",
                "Science: 66.67",
                "Students by Average",
                "High (>= 70): 1",
                "Low (< 70): 0",
            ]
        );
    }

    #[test]
    fn fractional_threshold_uses_two_decimals() {
        let mut r = sample();
        r.threshold = 62.5;
        let lines = render_report(&r);
        assert_eq!(lines[lines.len() - 2], "High (>= 62.50): 1");
    }

    #[test]
    fn negative_zero_mean_prints_as_zero() {
        let mut r = sample();
        r.subject_averages[0].mean = -0.001;
        assert_eq!(render_report(&r)[2], "Math: 0.00");
    }

    #[test]
    fn control_characters_in_names_are_escaped() {
        let mut r = sample();
        r.subject_averages[0].subject_name = "Ma\nth\r\t".into();
        let lines = render_report(&r);
        assert_eq!(lines[2], "Ma\\nth\\r\\t: 85.00");
        assert!(lines.iter().all(|l| !l.contains('\n') && !l.contains('\r')));
    }

    #[test]
    fn chart_series_mirrors_result() {
        let chart = chart_series(&sample());
        assert_eq!(chart.labels, vec!["Math", "Science"]);
        assert_eq!(chart.values[0], 85.0);
        assert_eq!(chart.population[0].name, ">= 70");
        assert_eq!(chart.population[0].population, 1);
        assert_eq!(chart.population[1].name, "< 70");
        assert_eq!(chart.population[1].population, 0);
    }
}

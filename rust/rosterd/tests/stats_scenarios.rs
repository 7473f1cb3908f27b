#[path = "../src/stats/mod.rs"]
mod stats;

use serde_json::json;
use stats::{
    aggregate, classify, normalize, Classification, RawStudentRecord, RawSubjectScore,
    StatsConfig,
};

fn subject(name: &str, score: serde_json::Value) -> RawSubjectScore {
    RawSubjectScore {
        subject_name: Some(name.to_string()),
        score: Some(score),
    }
}

fn student(id: &str, subjects: Option<Vec<RawSubjectScore>>) -> RawStudentRecord {
    RawStudentRecord {
        id: id.to_string(),
        name: format!("Student {id}"),
        photo_ref: None,
        subjects,
    }
}

fn default_config() -> StatsConfig {
    StatsConfig { threshold: 70.0 }
}

#[test]
fn two_students_math_and_science() {
    let raw = vec![
        student(
            "s1",
            Some(vec![subject("Math", json!("80")), subject("Science", json!("60"))]),
        ),
        student("s2", Some(vec![subject("Math", json!("90"))])),
    ];
    let r = aggregate(&raw, &default_config());

    assert_eq!(r.subject_averages.len(), 2);
    assert_eq!(r.subject_averages[0].subject_name, "Math");
    assert_eq!(r.subject_averages[0].mean, 85.0);
    assert_eq!(r.subject_averages[0].sample_count, 2);
    assert_eq!(r.subject_averages[1].subject_name, "Science");
    assert_eq!(r.subject_averages[1].mean, 60.0);

    assert_eq!(r.student_means[0].student_id, "s1");
    assert_eq!(r.student_means[0].mean, 70.0);
    assert_eq!(r.student_means[0].classification, Classification::High);
    assert_eq!(r.student_means[1].mean, 90.0);
    assert_eq!(r.student_means[1].classification, Classification::High);
    assert_eq!((r.high_count, r.low_count), (2, 0));
}

#[test]
fn absent_subjects_scores_zero_and_low() {
    let raw = vec![student("s1", None)];
    let normalized = normalize(&raw);
    assert!(normalized[0].subjects.is_empty());

    let r = aggregate(&raw, &default_config());
    assert!(r.subject_averages.is_empty());
    assert_eq!(r.student_means[0].mean, 0.0);
    assert_eq!(r.student_means[0].classification, Classification::Low);
    assert_eq!((r.high_count, r.low_count), (0, 1));
}

#[test]
fn unparsable_score_counts_as_zero() {
    let raw = vec![
        student("s1", Some(vec![subject("Math", json!("abc"))])),
        student("s2", Some(vec![subject("Math", json!("50"))])),
    ];
    let r = aggregate(&raw, &default_config());
    assert_eq!(r.subject_averages.len(), 1);
    assert_eq!(r.subject_averages[0].mean, 25.0);
    assert_eq!(r.subject_averages[0].sample_count, 2);
    assert_eq!(r.student_means[0].mean, 0.0);
}

#[test]
fn full_and_empty_marks_split_evenly() {
    let raw = vec![
        student("s1", Some(vec![subject("Math", json!(100))])),
        student("s2", Some(vec![subject("Math", json!(0))])),
    ];
    let r = aggregate(&raw, &default_config());
    assert_eq!(r.subject_averages[0].mean, 50.0);
    assert_eq!(r.student_means[0].mean, 100.0);
    assert_eq!(r.student_means[0].classification, Classification::High);
    assert_eq!(r.student_means[1].mean, 0.0);
    assert_eq!(r.student_means[1].classification, Classification::Low);
    assert_eq!((r.high_count, r.low_count), (1, 1));
}

#[test]
fn empty_snapshot_is_not_an_error() {
    assert!(normalize(&[]).is_empty());
    let c = classify(&[], 70.0);
    assert!(c.student_means.is_empty());
    assert_eq!((c.high_count, c.low_count), (0, 0));
    let r = aggregate(&[], &default_config());
    assert!(r.subject_averages.is_empty());
    assert!(r.student_means.is_empty());
}

#[test]
fn counts_always_cover_every_student() {
    let raw: Vec<RawStudentRecord> = (0..25)
        .map(|i| {
            let subjects = if i % 5 == 0 {
                None
            } else {
                Some(vec![
                    subject("Math", json!(i * 4)),
                    subject("Art", json!(format!("{}", 100 - i))),
                ])
            };
            student(&format!("s{i}"), subjects)
        })
        .collect();
    for threshold in [-1.0, 0.0, 50.0, 70.0, 1000.0] {
        let r = aggregate(&raw, &StatsConfig { threshold });
        assert_eq!(r.high_count + r.low_count, r.student_means.len());
        assert_eq!(r.student_means.len(), raw.len());
    }
}

#[test]
fn first_seen_subject_order_ignores_later_repeats() {
    let raw = vec![
        student("s1", Some(vec![subject("Science", json!("70"))])),
        student(
            "s2",
            Some(vec![
                subject("Math", json!("60")),
                subject("Science", json!("80")),
                subject("History", json!("90")),
            ]),
        ),
        student(
            "s3",
            Some(vec![subject("History", json!("10")), subject("Math", json!("20"))]),
        ),
    ];
    let r = aggregate(&raw, &default_config());
    let names: Vec<&str> = r
        .subject_averages
        .iter()
        .map(|a| a.subject_name.as_str())
        .collect();
    assert_eq!(names, vec!["Science", "Math", "History"]);
    assert_eq!(r.subject_averages[0].mean, 75.0);
    assert_eq!(r.subject_averages[1].mean, 40.0);
    assert_eq!(r.subject_averages[2].mean, 50.0);
}

#[test]
fn threshold_boundary_is_inclusive_for_any_value() {
    let raw = vec![student("s1", Some(vec![subject("Math", json!("62.5"))]))];
    let r = aggregate(&raw, &StatsConfig { threshold: 62.5 });
    assert_eq!(r.student_means[0].classification, Classification::High);
    let r = aggregate(&raw, &StatsConfig { threshold: 62.51 });
    assert_eq!(r.student_means[0].classification, Classification::Low);
}

#[test]
fn same_snapshot_gives_same_result() {
    let raw = vec![
        student("s1", Some(vec![subject("Math", json!("81.3")), subject("", json!(null))])),
        student("s2", Some(vec![subject("math", json!(77))])),
    ];
    let a = aggregate(&raw, &default_config());
    let b = aggregate(&raw, &default_config());
    assert_eq!(a, b);
    assert_eq!(a.subject_averages.len(), 3);
}

#[test]
fn score_text_contributes_its_leading_number() {
    let raw = vec![
        student("s1", Some(vec![subject("Math", json!("80abc"))])),
        student("s2", Some(vec![subject("Math", json!("85%"))])),
        student("s3", Some(vec![subject("Math", json!("72,5"))])),
        student("s4", Some(vec![subject("Math", json!("abc"))])),
    ];
    let r = aggregate(&raw, &default_config());
    let means: Vec<f64> = r.student_means.iter().map(|m| m.mean).collect();
    assert_eq!(means, vec![80.0, 85.0, 72.0, 0.0]);
    assert_eq!(r.subject_averages[0].mean, (80.0 + 85.0 + 72.0) / 4.0);
    assert_eq!((r.high_count, r.low_count), (3, 1));
}

#[test]
fn huge_scores_keep_finite_means() {
    let raw = vec![
        student("s1", Some(vec![subject("Math", json!("1e308"))])),
        student(
            "s2",
            Some(vec![subject("Math", json!("1e308")), subject("Art", json!("1e308"))]),
        ),
    ];
    let r = aggregate(&raw, &default_config());
    assert_eq!(r.subject_averages[0].mean, 1e308);
    assert_eq!(r.student_means[1].mean, 1e308);
    let report = stats::render_report(&r);
    assert!(report.iter().all(|l| !l.contains("inf")));
}

use serde_json::Value;

use super::{NormalizedStudentRecord, NormalizedSubjectScore, RawStudentRecord};

/// Parses the longest decimal prefix of `s` after leading whitespace:
/// optional sign, digits with an optional fraction, optional exponent.
/// `"80abc"` gives 80, `"72,5"` gives 72, `"abc"` gives nothing.
fn leading_decimal(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let b = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if end < b.len() && (b[end] == b'+' || b[end] == b'-') {
        end += 1;
    }
    let int_start = end;
    end = digits_from(end);
    let mut mantissa_digits = end - int_start;
    if end < b.len() && b[end] == b'.' {
        let frac_end = digits_from(end + 1);
        let frac_digits = frac_end - (end + 1);
        if mantissa_digits > 0 || frac_digits > 0 {
            mantissa_digits += frac_digits;
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }
    if end < b.len() && (b[end] == b'e' || b[end] == b'E') {
        let mut exp = end + 1;
        if exp < b.len() && (b[exp] == b'+' || b[exp] == b'-') {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    // Only ASCII was scanned, so `end` is a char boundary.
    s[..end].parse::<f64>().ok()
}

/// Single coercion policy for untrusted score fields.
///
/// Strings contribute their leading decimal number, JSON numbers are taken
/// as-is. Anything else, including text without a numeric prefix and
/// non-finite values, becomes `0.0`.
pub fn coerce_score(raw: Option<&Value>) -> f64 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => leading_decimal(s),
        _ => None,
    };
    match parsed {
        // `+ 0.0` folds a parsed "-0" into positive zero.
        Some(v) if v.is_finite() => v + 0.0,
        _ => 0.0,
    }
}

pub fn normalize(raw: &[RawStudentRecord]) -> Vec<NormalizedStudentRecord> {
    raw.iter()
        .map(|rec| NormalizedStudentRecord {
            id: rec.id.clone(),
            name: rec.name.clone(),
            subjects: rec
                .subjects
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|s| NormalizedSubjectScore {
                    subject_name: s.subject_name.clone().unwrap_or_default(),
                    score: coerce_score(s.score.as_ref()),
                })
                .collect(),
        })
        .collect()
}

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts `"42"` as well as `42` for identifier fields. Anything that is not a
/// string or a number (objects, arrays, booleans) is treated as absent so that the
/// element can be reported as missing the field instead of failing the whole payload.
pub fn opt_string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        Value::Null => None,
        other => {
            log::debug!("Ignoring non-scalar identifier {}", other);
            None
        }
    })
}

/// Accepts integers, floats (rounded) and numeric strings; `null`, `"N/A"` and
/// unparseable values become `None`.
pub fn opt_lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
                None
            } else {
                let parsed = trimmed.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64);
                if parsed.is_none() {
                    log::debug!("Ignoring non-numeric value '{}'", trimmed);
                }
                parsed
            }
        }
        Value::Null => None,
        other => {
            log::debug!("Ignoring non-numeric value {}", other);
            None
        }
    })
}

use crate::domain::model::Aggregation;
use serde_json::{Number, Value};
use std::collections::HashMap;

/// Count how often each value of `field` occurs across the dataset.
///
/// Array-valued fields count every non-null element once. Records that are not
/// objects, lack the field, or hold `null` contribute nothing. The result is
/// ordered by descending count (ties keep first-seen order) and truncated to
/// [`Aggregation::MAX_KEYS`] entries.
pub fn aggregate(dataset: Option<&Value>, field: &str) -> Aggregation {
    let Some(dataset) = dataset else {
        tracing::warn!("Dataset is absent, '{}' aggregates to nothing", field);
        return Aggregation::default();
    };

    let Some(records) = dataset.as_array() else {
        tracing::warn!("Dataset is not an array, '{}' aggregates to nothing", field);
        return Aggregation::default();
    };

    let mut counter = FrequencyCounter::default();

    for record in records {
        let Some(value) = record.as_object().and_then(|obj| obj.get(field)) else {
            continue;
        };

        match value {
            Value::Array(items) => {
                for item in items {
                    counter.add(item);
                }
            }
            scalar => counter.add(scalar),
        }
    }

    let aggregation = counter.into_top(Aggregation::MAX_KEYS);
    tracing::debug!("Aggregated '{}': {:?}", field, aggregation.entries);
    aggregation
}

/// Key under which a value is counted; `None` for null.
pub fn value_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(number_key(n)),
        other => Some(other.to_string()),
    }
}

fn number_key(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) => float_key(f),
        None => n.to_string(),
    }
}

/// Same notation as JavaScript's `String(number)`: plain decimals between 1e-6
/// and 1e21, exponent form (`1e+21`, `1.5e-7`) outside that range.
fn float_key(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    if (1e-6..1e21).contains(&f.abs()) {
        // Display 不用指數，6.0 印成 "6"
        return f.to_string();
    }

    let exponent = format!("{:e}", f);
    match exponent.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{}e+{}", mantissa, power),
        _ => exponent,
    }
}

/// Keys that read as canonical array indices (`0`, `7`, `2016`, below `u32::MAX`, no leading zeros).
fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse::<u32>().ok().filter(|index| *index != u32::MAX)
}

#[derive(Default)]
struct FrequencyCounter {
    index: HashMap<String, usize>,
    counts: Vec<(String, u64)>,
}

impl FrequencyCounter {
    fn add(&mut self, value: &Value) {
        let Some(key) = value_key(value) else {
            return;
        };

        match self.index.get(&key) {
            Some(&slot) => self.counts[slot].1 += 1,
            None => {
                self.index.insert(key.clone(), self.counts.len());
                self.counts.push((key, 1));
            }
        }
    }

    fn into_top(mut self, limit: usize) -> Aggregation {
        // 先依物件屬性列舉順序排列：陣列索引由小到大在前，其餘維持首次出現順序
        self.counts.sort_by_key(|(key, _)| match array_index(key) {
            Some(index) => (0, index),
            None => (1, 0),
        });
        // sort_by 是穩定排序，同數量保留上面的順序
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts.truncate(limit);
        Aggregation {
            entries: self.counts,
        }
    }
}

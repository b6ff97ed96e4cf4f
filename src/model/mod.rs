//! Observable records and record sets
//!
//! `Record` is a single object with named JSON attributes, `RecordSet` an
//! ordered list of records keyed by their `id` attribute. Both fire typed
//! events on mutation so that listeners (the mirror engine among them) can
//! react synchronously.

mod event;
mod record;
mod record_set;

pub use event::{EventKind, Handler, Listeners, Options};
pub use record::Record;
pub use record_set::RecordSet;

use std::cmp::Ordering;

use serde_json::Value;

/// Total order over JSON values used for comparator sorting.
///
/// Values of different types order as null < bool < number < string < array < object.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

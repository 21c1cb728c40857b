use crate::models::CarDoc;
use regex::Regex;
use serde_json::{Number, Value};
use std::sync::LazyLock;

static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").expect("static regex")
});

/// Reads a stored price as a float. Numbers pass through; strings are read up
/// to the end of their leading numeric prefix ("19.99 USD" is 19.99).
pub fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => FLOAT_PREFIX
            .find(s.trim_start())
            .and_then(|m| m.as_str().parse::<f64>().ok()),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

/// Rewrites `price` as a JSON number, or null when it cannot be read as one.
pub fn normalize_price(car: &mut CarDoc) {
    let price = car
        .get("price")
        .and_then(parse_price)
        .and_then(Number::from_f64)
        .map_or(Value::Null, Value::Number);
    car.insert("price".to_string(), price);
}

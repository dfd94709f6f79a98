//! Field-presence checks for the `orders` collection.
//!
//! Orders are the only validated documents. Presence follows JavaScript
//! truthiness: `null`, `false`, `0`, `""` and a missing field are all absent.

use serde_json::Value;
use thiserror::Error;

use crate::store::Document;

/// The collection whose inserts and updates are validated.
pub const ORDERS: &str = "orders";

/// Why an order was rejected.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum OrderError {
    #[error("missing required field `{0}`")]
    Missing(&'static str),

    #[error("`lessonIDs` must be a non-empty list")]
    NoLessons,

    #[error("update must set at least one field")]
    EmptyUpdate,
}

/// Checks a new order: `name`, `phoneNumber` and `spaces` present, and
/// `lessonIDs` a non-empty array.
pub fn validate_new(order: &Document) -> Result<(), OrderError> {
    for field in ["name", "phoneNumber"] {
        if !truthy(order.get(field)) {
            return Err(OrderError::Missing(field));
        }
    }
    match order.get("lessonIDs") {
        Some(Value::Array(ids)) if !ids.is_empty() => {}
        Some(Value::Array(_)) => return Err(OrderError::NoLessons),
        Some(v) if truthy(Some(v)) => return Err(OrderError::NoLessons),
        _ => return Err(OrderError::Missing("lessonIDs")),
    }
    if !truthy(order.get("spaces")) {
        return Err(OrderError::Missing("spaces"));
    }
    Ok(())
}

/// Checks an order update: it must name at least one field.
pub fn validate_update(fields: &Document) -> Result<(), OrderError> {
    if fields.is_empty() {
        return Err(OrderError::EmptyUpdate);
    }
    Ok(())
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn valid() -> Value {
        json!({
            "name": "Ada",
            "phoneNumber": "07700900000",
            "lessonIDs": ["65f0c0ffee0000000000beef"],
            "spaces": 2,
        })
    }

    #[test]
    fn accepts_a_complete_order() {
        assert_eq!(validate_new(&order(valid())), Ok(()));
    }

    #[test]
    fn rejects_each_missing_field() {
        for field in ["name", "phoneNumber", "lessonIDs", "spaces"] {
            let mut body = order(valid());
            body.remove(field);
            assert_eq!(validate_new(&body), Err(OrderError::Missing(field)), "{field}");
        }
    }

    #[test]
    fn falsy_values_count_as_missing() {
        let mut body = order(valid());
        body.insert("name".into(), json!(""));
        assert_eq!(validate_new(&body), Err(OrderError::Missing("name")));

        let mut body = order(valid());
        body.insert("spaces".into(), json!(0));
        assert_eq!(validate_new(&body), Err(OrderError::Missing("spaces")));

        let mut body = order(valid());
        body.insert("phoneNumber".into(), Value::Null);
        assert_eq!(validate_new(&body), Err(OrderError::Missing("phoneNumber")));
    }

    #[test]
    fn lesson_ids_must_be_a_non_empty_list() {
        let mut body = order(valid());
        body.insert("lessonIDs".into(), json!([]));
        assert_eq!(validate_new(&body), Err(OrderError::NoLessons));

        body.insert("lessonIDs".into(), json!("65f0c0ffee0000000000beef"));
        assert_eq!(validate_new(&body), Err(OrderError::NoLessons));
    }

    #[test]
    fn messages_name_the_field() {
        assert_eq!(OrderError::Missing("spaces").to_string(), "missing required field `spaces`");
        assert_eq!(OrderError::NoLessons.to_string(), "`lessonIDs` must be a non-empty list");
    }

    #[test]
    fn updates_need_a_field() {
        assert_eq!(validate_update(&Document::new()), Err(OrderError::EmptyUpdate));
        assert_eq!(validate_update(&order(json!({ "spaces": 2 }))), Ok(()));
    }
}

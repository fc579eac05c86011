//! Canonical order records and the order validator
//!
//! [`Order::validate`] turns one raw, loosely-typed record (from a file, an
//! HTTP body or LLM output) into a canonical [`Order`], or a
//! [`ValidationFailure`] listing every violated constraint.
//!
//! Coercion per field:
//!
//! | field           | accepted                                    | constraint          |
//! |-----------------|---------------------------------------------|---------------------|
//! | `order_id`      | integer, whole float, integer text          |                     |
//! | `customer_name` | text                                        | not blank           |
//! | `email`         | text                                        | `local@domain.tld`  |
//! | `price`         | number, numeric text                        | `> 0`               |
//! | `is_priority`   | boolean, 0/1, yes/no text; absent -> false  |                     |
//! | `items`         | list of line items; absent -> empty         | each item valid     |

pub use crate::core::error::ROOT_FIELD;

use crate::core::error::{FieldError, ValidationFailure};
use crate::core::validation::coerce::{self, optional, required};
use crate::core::validation::validators::{email, ensure, non_empty, positive};
use crate::core::validation::{ErrorCollector, Validate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One product line within an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_name: String,
    pub sku: String,
    /// Not constrained to be positive
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl LineItem {
    /// Validate one raw line item, collecting every error
    pub fn validate(raw: &Value) -> Result<LineItem, Vec<FieldError>> {
        let Some(fields) = raw.as_object() else {
            return Err(vec![FieldError::type_mismatch(
                ROOT_FIELD,
                "Input should be a valid object",
            )]);
        };

        let mut errors = ErrorCollector::new();

        let item_name = errors.take(
            required(fields, "item_name", coerce::text)
                .and_then(|name| non_empty()("item_name", &name).map(|_| name)),
        );
        let sku = errors.take(required(fields, "sku", coerce::text));
        let quantity = errors.take(required(fields, "quantity", coerce::integer));
        let product_id = errors.take(optional(fields, "product_id", coerce::integer));
        let price = errors.take(optional(fields, "price", coerce::float));
        let image_url = errors.take(optional(fields, "image_url", coerce::text));

        match (item_name, sku, quantity, product_id, price, image_url) {
            (
                Some(item_name),
                Some(sku),
                Some(quantity),
                Some(product_id),
                Some(price),
                Some(image_url),
            ) if errors.is_empty() => Ok(LineItem {
                item_name,
                sku,
                quantity,
                product_id,
                price,
                image_url,
            }),
            _ => Err(errors.into_errors()),
        }
    }
}

/// The canonical, validated order record
///
/// Holds for every value of this type: `price > 0`, `email` is a valid
/// address and `customer_name` is not blank. Never mutated after
/// validation; corrections go through [`Order::validate`] again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: i64,
    pub customer_name: String,
    pub email: String,
    pub price: f64,
    #[serde(default)]
    pub is_priority: bool,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

/// A field whose canonical value differs from what the input carried
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coercion {
    pub field: String,
    /// `None` when the field was absent and a default was applied
    pub input: Option<Value>,
    pub output: Value,
}

/// A canonical order together with the coercions applied to reach it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderReport {
    pub order: Order,
    pub coercions: Vec<Coercion>,
}

impl Order {
    /// Validate one raw record into a canonical order
    pub fn validate(raw: &Value) -> Result<Order, ValidationFailure> {
        Self::validate_with_report(raw).map(|report| report.order)
    }

    /// Validate and also report which fields were coerced or defaulted
    pub fn validate_with_report(raw: &Value) -> Result<OrderReport, ValidationFailure> {
        let Some(fields) = raw.as_object() else {
            return Err(ValidationFailure::new(
                raw.clone(),
                vec![FieldError::type_mismatch(
                    ROOT_FIELD,
                    "Input should be a valid object",
                )],
            ));
        };

        let mut errors = ErrorCollector::new();

        let order_id = errors.take(required(fields, "order_id", coerce::integer));
        let customer_name = errors.take(
            required(fields, "customer_name", coerce::text)
                .and_then(|name| non_empty()("customer_name", &name).map(|_| name)),
        );
        let email_address = errors.take(
            required(fields, "email", coerce::text)
                .and_then(|addr| email()("email", &addr).map(|_| addr)),
        );
        let price = errors.take(
            required(fields, "price", coerce::float)
                .and_then(|price| ensure("price", price, positive())),
        );
        let is_priority = errors.take(
            optional(fields, "is_priority", coerce::boolean).map(|flag| flag.unwrap_or(false)),
        );
        let items = validate_items(fields, &mut errors);

        let order = match (order_id, customer_name, email_address, price, is_priority, items) {
            (
                Some(order_id),
                Some(customer_name),
                Some(email),
                Some(price),
                Some(is_priority),
                Some(items),
            ) if errors.is_empty() => Order {
                order_id,
                customer_name,
                email,
                price,
                is_priority,
                items,
            },
            _ => return Err(ValidationFailure::new(raw.clone(), errors.into_errors())),
        };

        let coercions = order.coercions_from(fields);
        Ok(OrderReport { order, coercions })
    }

    /// Total quantity across all line items
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Compare the canonical form against the raw fields it came from
    fn coercions_from(&self, fields: &Map<String, Value>) -> Vec<Coercion> {
        let canonical = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => return Vec::new(),
        };

        canonical
            .into_iter()
            .filter_map(|(field, output)| {
                let input = fields.get(&field).filter(|v| !v.is_null()).cloned();
                if input.as_ref() == Some(&output) {
                    None
                } else {
                    Some(Coercion {
                        field,
                        input,
                        output,
                    })
                }
            })
            .collect()
    }
}

impl Validate for Order {
    fn validate(raw: &Value) -> Result<Self, ValidationFailure> {
        Order::validate(raw)
    }
}

/// Validate the `items` list; absent or `null` is an empty order
fn validate_items(
    fields: &Map<String, Value>,
    errors: &mut ErrorCollector,
) -> Option<Vec<LineItem>> {
    let raw_items = match fields.get("items") {
        None | Some(Value::Null) => return Some(Vec::new()),
        Some(Value::Array(raw_items)) => raw_items,
        Some(_) => {
            errors.push(FieldError::type_mismatch(
                "items",
                "Input should be a valid list",
            ));
            return None;
        }
    };

    let mut items = Vec::with_capacity(raw_items.len());
    let mut all_valid = true;
    for (index, raw_item) in raw_items.iter().enumerate() {
        match LineItem::validate(raw_item) {
            Ok(item) => items.push(item),
            Err(item_errors) => {
                all_valid = false;
                for error in item_errors {
                    errors.push(FieldError::nested("items", index, error));
                }
            }
        }
    }

    all_valid.then_some(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::FieldErrorKind;
    use serde_json::json;

    fn alice() -> Value {
        json!({
            "order_id": 101,
            "customer_name": "Alice",
            "email": "alice@example.com",
            "price": 49.99,
            "is_priority": true,
            "items": [
                {"item_name": "Customer Support Auto-Responder", "sku": "CS-001", "quantity": 1}
            ]
        })
    }

    #[test]
    fn test_valid_record_has_no_errors() {
        let order = Order::validate(&alice()).expect("valid order");
        assert_eq!(order.order_id, 101);
        assert_eq!(order.customer_name, "Alice");
        assert!(order.is_priority);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].sku, "CS-001");
    }

    #[test]
    fn test_text_order_id_is_coerced_and_priority_defaults() {
        let raw = json!({
            "order_id": "101",
            "customer_name": "Alice",
            "email": "alice@example.com",
            "price": 49.99
        });
        let report = Order::validate_with_report(&raw).expect("valid order");
        assert_eq!(report.order.order_id, 101);
        assert!(!report.order.is_priority);
        assert!(report.order.items.is_empty());

        let fields: Vec<&str> = report.coercions.iter().map(|c| c.field.as_str()).collect();
        assert!(fields.contains(&"order_id"));
        assert!(fields.contains(&"is_priority"));
        assert!(!fields.contains(&"price"));
        assert!(!fields.contains(&"email"));

        let priority = report
            .coercions
            .iter()
            .find(|c| c.field == "is_priority")
            .unwrap();
        assert_eq!(priority.input, None);
        assert_eq!(priority.output, json!(false));
    }

    #[test]
    fn test_bad_email_and_negative_price_give_exactly_two_errors() {
        let raw = json!({
            "order_id": 102,
            "customer_name": "Bob",
            "email": "not-an-email",
            "price": -5
        });
        let failure = Order::validate(&raw).unwrap_err();
        assert_eq!(failure.errors.len(), 2);
        assert_eq!(failure.errors[0].field, "email");
        assert_eq!(failure.errors[1].field, "price");
        assert!(
            failure
                .errors
                .iter()
                .all(|e| e.kind == FieldErrorKind::ConstraintViolation)
        );
        assert_eq!(failure.input, raw);
    }

    #[test]
    fn test_zero_price_is_rejected() {
        let mut raw = alice();
        raw["price"] = json!(0);
        let failure = Order::validate(&raw).unwrap_err();
        assert!(failure.has_error_for("price"));
    }

    #[test]
    fn test_missing_customer_name() {
        let mut raw = alice();
        raw.as_object_mut().unwrap().remove("customer_name");
        let failure = Order::validate(&raw).unwrap_err();
        let error = failure.errors_for("customer_name").next().unwrap();
        assert_eq!(error.kind, FieldErrorKind::FieldMissing);
    }

    #[test]
    fn test_all_errors_are_reported_at_once() {
        let raw = json!({
            "order_id": true,
            "email": 42,
            "price": "free",
            "is_priority": "sometimes",
            "items": "three routers"
        });
        let failure = Order::validate(&raw).unwrap_err();
        let fields: Vec<&str> = failure.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["order_id", "customer_name", "email", "price", "is_priority", "items"]
        );
    }

    #[test]
    fn test_nested_item_errors_carry_index() {
        let mut raw = alice();
        raw["items"] = json!([
            {"item_name": "Router", "sku": "R-1", "quantity": 2},
            {"item_name": "", "quantity": "two"}
        ]);
        let failure = Order::validate(&raw).unwrap_err();
        let fields: Vec<&str> = failure.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["items.1.item_name", "items.1.sku", "items.1.quantity"]);
        assert!(
            failure
                .errors
                .iter()
                .all(|e| e.kind == FieldErrorKind::NestedItemError)
        );
    }

    #[test]
    fn test_non_object_item() {
        let mut raw = alice();
        raw["items"] = json!([42]);
        let failure = Order::validate(&raw).unwrap_err();
        assert_eq!(failure.errors[0].field, "items.0");
    }

    #[test]
    fn test_non_object_record() {
        let failure = Order::validate(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(failure.errors.len(), 1);
        assert_eq!(failure.errors[0].field, ROOT_FIELD);
    }

    #[test]
    fn test_optional_line_item_fields() {
        let mut raw = alice();
        raw["items"] = json!([{
            "item_name": "Sales Lead Qualification Bot",
            "sku": "SL-001",
            "quantity": "3",
            "product_id": 2,
            "price": "899.00",
            "image_url": "https://example.com/sl.svg"
        }]);
        let order = Order::validate(&raw).unwrap();
        let item = &order.items[0];
        assert_eq!(item.quantity, 3);
        assert_eq!(item.product_id, Some(2));
        assert_eq!(item.price, Some(899.0));
        assert_eq!(order.total_quantity(), 3);
    }

    #[test]
    fn test_negative_quantity_is_accepted() {
        let mut raw = alice();
        raw["items"] = json!([{"item_name": "Router", "sku": "R-1", "quantity": -1}]);
        assert!(Order::validate(&raw).is_ok());
    }

    #[test]
    fn test_revalidating_canonical_order_is_identity() {
        let raw = json!({
            "order_id": "7",
            "customer_name": "Carol",
            "email": "carol@example.org",
            "price": "120",
            "is_priority": "yes",
            "items": [{"item_name": "Router", "sku": "R-1", "quantity": "2"}]
        });
        let first = Order::validate(&raw).unwrap();
        let reserialized = serde_json::to_value(&first).unwrap();
        let report = Order::validate_with_report(&reserialized).unwrap();
        assert_eq!(report.order, first);
        assert!(report.coercions.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let mut raw = alice();
        raw["coupon"] = json!("SPRING");
        assert!(Order::validate(&raw).is_ok());
    }

    #[test]
    fn test_priority_accepts_short_and_float_flags() {
        for (flag, expected) in [
            (json!("t"), true),
            (json!("y"), true),
            (json!(1.0), true),
            (json!("n"), false),
        ] {
            let mut raw = alice();
            raw["is_priority"] = flag;
            assert_eq!(Order::validate(&raw).unwrap().is_priority, expected);
        }
    }
}

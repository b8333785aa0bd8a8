//! Integration test: infer schemas from shape descriptions and validate
//! decoded payloads end to end.

use covenant_schema::{
    schema_for, FieldDescriptor, FieldType, SchemaNode, SchemaRegistry, Shape, ShapeDescriptor,
    ValidationMode, Validator,
};
use proptest::prelude::*;
use serde_json::{json, Value};

struct Address;

impl Shape for Address {
    fn describe() -> ShapeDescriptor {
        ShapeDescriptor::new("Address")
            .field(FieldDescriptor::new("street", FieldType::String).tag("minLength", "1"))
            .field(
                FieldDescriptor::new("postal_code", FieldType::String)
                    .rename("postalCode")
                    .tag("pattern", "^[0-9]{5}$")
                    .tag("patternDescription", "a five-digit postal code"),
            )
    }
}

struct Order;

impl Shape for Order {
    fn describe() -> ShapeDescriptor {
        ShapeDescriptor::new("Order")
            .doc("A customer order.")
            .field(
                FieldDescriptor::new("id", FieldType::String)
                    .tag("format", "uuid")
                    .tag("readOnly", "true"),
            )
            .field(
                FieldDescriptor::new("quantity", FieldType::Integer)
                    .tag("minimum", "1")
                    .tag("maximum", "100"),
            )
            .field(FieldDescriptor::new("note", FieldType::optional(FieldType::String)))
            .field(
                FieldDescriptor::new("tags", FieldType::array(FieldType::String))
                    .omit_empty()
                    .tag("uniqueItems", "true")
                    .tag("maxItems", "3"),
            )
            .field(FieldDescriptor::new("ship_to", FieldType::object::<Address>()).rename("shipTo"))
            .field(
                FieldDescriptor::new("credit_card", FieldType::String)
                    .rename("creditCard")
                    .omit_empty()
                    .tag("dependentRequired", "billingAddress"),
            )
            .field(
                FieldDescriptor::new("billing_address", FieldType::String)
                    .rename("billingAddress")
                    .omit_empty(),
            )
            .field(FieldDescriptor::new("internal_cost", FieldType::Number).ignored())
    }
}

struct Metadata;

impl Shape for Metadata {
    fn describe() -> ShapeDescriptor {
        ShapeDescriptor::new("Metadata")
            .additional_properties(true)
            .field(FieldDescriptor::new("source", FieldType::String))
    }
}

fn order() -> SchemaNode {
    schema_for::<Order>().unwrap().as_ref().clone()
}

fn valid_order() -> Value {
    json!({
        "quantity": 2,
        "note": null,
        "tags": ["gift"],
        "shipTo": {"street": "1 Main St", "postalCode": "12345"}
    })
}

fn locations(errors: &[covenant_core::ErrorDetail]) -> Vec<&str> {
    errors.iter().map(|e| e.location.as_str()).collect()
}

#[test]
fn test_valid_payload_has_no_errors() {
    let errors = Validator::default().validate(&order(), &valid_order(), "request.body");
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn test_unknown_field_is_reported() {
    let mut body = valid_order();
    body["x"] = json!(1);
    let errors = Validator::default().validate(&order(), &body, "request.body");
    assert_eq!(locations(&errors), vec!["request.body.x"]);
}

#[test]
fn test_permissive_shape_accepts_unknown_field() {
    let metadata = schema_for::<Metadata>().unwrap();
    let body = json!({"source": "import", "x": 1});
    let errors = Validator::default().validate(&metadata, &body, "request.body");
    assert!(errors.is_empty(), "{errors:?}");

    let errors = Validator::default().validate(&metadata, &json!({"x": 1}), "request.body");
    assert_eq!(locations(&errors), vec!["request.body.source"]);
}

#[test]
fn test_ignored_field_is_unknown() {
    let mut body = valid_order();
    body["internal_cost"] = json!(1.5);
    let errors = Validator::default().validate(&order(), &body, "request.body");
    assert_eq!(locations(&errors), vec!["request.body.internal_cost"]);
}

#[test]
fn test_nested_errors_carry_full_location() {
    let body = json!({
        "quantity": 0,
        "note": 7,
        "tags": ["a", "a", "b", "c"],
        "shipTo": {"street": "", "postalCode": "ABCDE"}
    });
    let errors = Validator::default().validate(&order(), &body, "request.body");
    assert_eq!(
        locations(&errors),
        vec![
            "request.body.quantity",
            "request.body.note",
            "request.body.tags",
            "request.body.tags",
            "request.body.shipTo.street",
            "request.body.shipTo.postalCode",
        ]
    );
    assert_eq!(errors[1].message, "expected string or null");
    assert_eq!(errors[5].message, "expected string to be a five-digit postal code");
}

#[test]
fn test_missing_required_fields() {
    let errors = Validator::default().validate(&order(), &json!({}), "request.body");
    assert_eq!(
        locations(&errors),
        vec!["request.body.quantity", "request.body.note", "request.body.shipTo"]
    );
}

#[test]
fn test_read_only_required_in_responses() {
    let response = Validator::default().with_mode(ValidationMode::Response);
    let errors = response.validate(&order(), &valid_order(), "response.body");
    assert_eq!(locations(&errors), vec!["response.body.id"]);
}

#[test]
fn test_dependent_required() {
    let mut body = valid_order();
    body["creditCard"] = json!("4111111111111111");
    let errors = Validator::default().validate(&order(), &body, "request.body");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("billingAddress"));

    body["billingAddress"] = json!("1 Main St");
    assert!(Validator::default().validate(&order(), &body, "request.body").is_empty());
}

#[test]
fn test_rendered_schema_reflects_inference() {
    let rendered = order().to_value();
    assert_eq!(rendered["type"], "object");
    assert_eq!(rendered["additionalProperties"], json!(false));
    assert_eq!(rendered["properties"]["note"]["type"], json!(["string", "null"]));
    assert_eq!(rendered["properties"]["shipTo"]["properties"]["postalCode"]["pattern"], "^[0-9]{5}$");
    assert_eq!(rendered["dependentRequired"]["creditCard"], json!(["billingAddress"]));
    assert!(rendered["properties"].get("internal_cost").is_none());
}

#[test]
fn test_registry_instances_are_independent() {
    let a = SchemaRegistry::new();
    let b = SchemaRegistry::new();
    a.infer::<Order>().unwrap();
    assert_eq!(a.builds(), 1);
    assert_eq!(b.builds(), 0);
    assert!(b.is_empty());
}

proptest! {
    #[test]
    fn prop_quantity_bounds(quantity in -1000i64..1000) {
        let mut body = valid_order();
        body["quantity"] = json!(quantity);
        let errors = Validator::default().validate(&order(), &body, "request.body");
        let in_range = (1..=100).contains(&quantity);
        prop_assert_eq!(errors.is_empty(), in_range);
        if !in_range {
            prop_assert_eq!(errors.len(), 1);
            prop_assert_eq!(errors[0].location.as_str(), "request.body.quantity");
        }
    }

    #[test]
    fn prop_unknown_keys_each_reported(keys in proptest::collection::btree_set("[a-z]{6,10}", 1..5)) {
        let declared = order();
        let mut body = valid_order();
        let mut unknown = 0;
        for key in keys.iter().filter(|k| declared.property(k).is_none()) {
            body[key.as_str()] = json!(true);
            unknown += 1;
        }
        let errors = Validator::default().validate(&declared, &body, "request.body");
        prop_assert_eq!(errors.len(), unknown);
        prop_assert!(errors.iter().all(|e| e.message == "unexpected property"));
    }
}

//! Property tests over the envelope codec: round-trip fidelity and
//! classification exclusivity.

use acpkit_protocol::jsonrpc::{MessageKind, classify};
use acpkit_protocol::{Envelope, parse_envelope, serialize_envelope};
use proptest::prelude::*;
use serde_json::{Value, json};

fn arb_json_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 _/.-]{0,24}".prop_map(Value::from),
    ]
}

fn arb_params() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-zA-Z][a-zA-Z0-9]{0,8}", arb_json_scalar(), 0..4)
        .prop_map(|map| Value::Object(map.into_iter().collect()))
}

fn arb_id() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9-]{1,16}".prop_map(Value::from),
    ]
}

fn arb_method() -> impl Strategy<Value = String> {
    "[a-z_]{1,10}(/[a-z_]{1,10})?"
}

prop_compose! {
    fn arb_request()(id in arb_id(), method in arb_method(), params in arb_params()) -> Value {
        json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
    }
}

prop_compose! {
    fn arb_notification()(method in arb_method(), params in arb_params()) -> Value {
        json!({"jsonrpc": "2.0", "method": method, "params": params})
    }
}

prop_compose! {
    fn arb_response()(id in arb_id(), success in any::<bool>(), body in arb_params()) -> Value {
        if success {
            json!({"jsonrpc": "2.0", "id": id, "result": body})
        } else {
            json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32603, "message": "boom", "data": body}})
        }
    }
}

fn arb_envelope() -> impl Strategy<Value = Value> {
    prop_oneof![arb_request(), arb_notification(), arb_response()]
}

proptest! {
    /// serialize(parse(E)) equals E up to whitespace and key ordering.
    #[test]
    fn round_trip_preserves_value(wire in arb_envelope()) {
        let text = serde_json::to_string(&wire).unwrap();
        let envelope = parse_envelope(&text).unwrap();
        let reserialized = serialize_envelope(&envelope).unwrap();
        let round_tripped: Value = serde_json::from_str(&reserialized).unwrap();
        prop_assert_eq!(round_tripped, wire);
    }

    /// Exactly one classifier matches every well-formed envelope.
    #[test]
    fn classification_is_exclusive(wire in arb_envelope()) {
        let kind = classify(&wire).expect("generated envelope must classify");
        let object = wire.as_object().unwrap();
        let has_method = object.contains_key("method");
        let has_id = object.contains_key("id");
        match kind {
            MessageKind::Request => {
                prop_assert!(has_method && has_id);
            }
            MessageKind::Notification => {
                prop_assert!(has_method && !has_id);
            }
            MessageKind::Response => {
                prop_assert!(!has_method && has_id);
                prop_assert!(
                    object.contains_key("result") ^ object.contains_key("error")
                );
            }
        }
    }

    /// Decoding dispatches to the variant matching the classification.
    #[test]
    fn decode_matches_classification(wire in arb_envelope()) {
        let kind = classify(&wire).unwrap();
        let envelope = Envelope::from_value(wire).unwrap();
        let matches = matches!(
            (kind, &envelope),
            (MessageKind::Request, Envelope::Request(_))
                | (MessageKind::Response, Envelope::Response(_))
                | (MessageKind::Notification, Envelope::Notification(_))
        );
        prop_assert!(matches);
    }
}

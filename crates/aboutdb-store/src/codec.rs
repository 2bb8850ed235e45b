//! Scalar value codec.
//!
//! Text encodes as its UTF-8 bytes with no length prefix; the length travels
//! in the [`Pointer`](aboutdb_types::Pointer). Integers encode as 4 bytes,
//! big-endian two's complement.

use aboutdb_types::{FieldValue, Scalar, ScalarKind};
use serde_json::Value;
use tracing::trace;

use crate::error::{StoreError, StoreResult};

/// Width of an encoded integer.
pub const INTEGER_WIDTH: usize = 4;

/// Encode a scalar into its binary representation.
pub fn encode(value: &Scalar) -> Vec<u8> {
    let bytes = match value {
        Scalar::Text(s) => s.as_bytes().to_vec(),
        Scalar::Integer(i) => i.to_be_bytes().to_vec(),
    };
    trace!(%value, len = bytes.len(), "encoded");
    bytes
}

/// Decode bytes previously produced by [`encode`] for a value of `kind`.
pub fn decode(kind: ScalarKind, bytes: &[u8]) -> StoreResult<Scalar> {
    match kind {
        ScalarKind::Text => std::str::from_utf8(bytes)
            .map(|s| Scalar::Text(s.to_string()))
            .map_err(|e| StoreError::UnsupportedType(format!("invalid UTF-8 text: {e}"))),
        ScalarKind::Integer => {
            let raw: [u8; INTEGER_WIDTH] = bytes.try_into().map_err(|_| {
                StoreError::UnsupportedType(format!(
                    "integer requires {INTEGER_WIDTH} bytes, got {}",
                    bytes.len()
                ))
            })?;
            Ok(Scalar::Integer(i32::from_be_bytes(raw)))
        }
    }
}

/// Classify a dynamically typed JSON value as a field value.
///
/// Strings and integers that fit in an `i32` become scalars; arrays of those
/// become multi-values. Anything else is [`StoreError::UnsupportedType`].
pub fn field_value_from_json(value: &Value) -> StoreResult<FieldValue> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(scalar_from_json)
            .collect::<StoreResult<Vec<_>>>()
            .map(FieldValue::Multi),
        other => scalar_from_json(other).map(FieldValue::Scalar),
    }
}

fn scalar_from_json(value: &Value) -> StoreResult<Scalar> {
    match value {
        Value::String(s) => Ok(Scalar::Text(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .map(Scalar::Integer)
            .ok_or_else(|| StoreError::UnsupportedType(format!("number {n}"))),
        Value::Null => Err(StoreError::UnsupportedType("null".into())),
        Value::Bool(b) => Err(StoreError::UnsupportedType(format!("bool {b}"))),
        Value::Array(_) => Err(StoreError::UnsupportedType("nested array".into())),
        Value::Object(_) => Err(StoreError::UnsupportedType("object".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn text_is_raw_utf8() {
        assert_eq!(encode(&Scalar::text("héllo")), "héllo".as_bytes());
    }

    #[test]
    fn integer_is_four_bytes_big_endian() {
        assert_eq!(encode(&Scalar::Integer(1)), vec![0, 0, 0, 1]);
        assert_eq!(encode(&Scalar::Integer(-1)), vec![0xff, 0xff, 0xff, 0xff]);
        assert_eq!(encode(&Scalar::Integer(0x0102_0304)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn empty_text_roundtrips() {
        let bytes = encode(&Scalar::text(""));
        assert!(bytes.is_empty());
        assert_eq!(decode(ScalarKind::Text, &bytes).unwrap(), Scalar::text(""));
    }

    #[test]
    fn integer_decode_requires_exact_width() {
        let err = decode(ScalarKind::Integer, &[0, 1]).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedType(_)));
        let err = decode(ScalarKind::Integer, &[0, 0, 0, 0, 1]).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedType(_)));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = decode(ScalarKind::Text, &[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedType(_)));
    }

    // -----------------------------------------------------------------------
    // JSON classification
    // -----------------------------------------------------------------------

    #[test]
    fn json_scalars_and_lists() {
        assert_eq!(
            field_value_from_json(&json!("a")).unwrap(),
            FieldValue::from("a")
        );
        assert_eq!(field_value_from_json(&json!(7)).unwrap(), FieldValue::from(7));
        assert_eq!(
            field_value_from_json(&json!(["a", 2])).unwrap(),
            FieldValue::Multi(vec![Scalar::text("a"), Scalar::Integer(2)])
        );
    }

    #[test]
    fn json_unsupported_types() {
        for v in [
            json!(1.5),
            json!(true),
            json!(null),
            json!({"k": 1}),
            json!([["nested"]]),
            json!(i64::MAX),
        ] {
            let err = field_value_from_json(&v).unwrap_err();
            assert!(matches!(err, StoreError::UnsupportedType(_)), "{v}");
        }
    }

    proptest! {
        #[test]
        fn integer_roundtrip(i in any::<i32>()) {
            let v = Scalar::Integer(i);
            prop_assert_eq!(decode(ScalarKind::Integer, &encode(&v)).unwrap(), v);
        }

        #[test]
        fn text_roundtrip(s in ".*") {
            let v = Scalar::Text(s);
            prop_assert_eq!(decode(ScalarKind::Text, &encode(&v)).unwrap(), v);
        }
    }
}

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Reserved field naming an object's schema. Always indexed.
pub const SCHEMA_FIELD: &str = "*schema";

/// Implicit field added to every resolved [`Document`], holding its identity.
pub const ID_FIELD: &str = "_id";

/// Type tag of a scalar value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    /// UTF-8 text, variable length.
    Text,
    /// 32-bit signed integer, fixed 4-byte encoding.
    Integer,
}

impl ScalarKind {
    /// Column type used for this kind in a relational index table.
    pub fn sql_type(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
        }
    }
}

impl FromStr for ScalarKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "str" | "string" => Ok(Self::Text),
            "integer" | "int" => Ok(Self::Integer),
            _ => Err(TypeError::UnknownKind(s.to_string())),
        }
    }
}

/// A single stored value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i32),
    Text(String),
}

impl Scalar {
    /// Create a text scalar.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// The type tag of this value.
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Text(_) => ScalarKind::Text,
            Self::Integer(_) => ScalarKind::Integer,
        }
    }

    /// Borrow the text content, if this is a text scalar.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Integer(_) => None,
        }
    }

    /// The integer content, if this is an integer scalar.
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Text(_) => None,
        }
    }

    /// Convert this value to the given kind.
    ///
    /// Any scalar converts to text (integers in decimal). Text converts to an
    /// integer only when it parses as an `i32`.
    pub fn coerce(&self, kind: ScalarKind) -> Result<Scalar, TypeError> {
        match (self, kind) {
            (Self::Text(s), ScalarKind::Text) => Ok(Self::Text(s.clone())),
            (Self::Integer(i), ScalarKind::Text) => Ok(Self::Text(i.to_string())),
            (Self::Integer(i), ScalarKind::Integer) => Ok(Self::Integer(*i)),
            (Self::Text(s), ScalarKind::Integer) => {
                s.trim()
                    .parse::<i32>()
                    .map(Self::Integer)
                    .map_err(|_| TypeError::Conversion {
                        value: s.clone(),
                        expected: kind.to_string(),
                    })
            }
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "'{s}'"),
            Self::Integer(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

/// A value written into a field: one scalar or an ordered list of scalars.
///
/// The shape is chosen by the caller; the store never infers it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(Scalar),
    Multi(Vec<Scalar>),
}

impl FieldValue {
    /// The scalar elements of this value, in order.
    ///
    /// A single scalar is a one-element sequence.
    pub fn elements(&self) -> &[Scalar] {
        match self {
            Self::Scalar(s) => std::slice::from_ref(s),
            Self::Multi(items) => items,
        }
    }

    /// Returns `true` for the multi-valued shape.
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Multi(_))
    }
}

impl From<Scalar> for FieldValue {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Scalar(value.into())
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        Self::Multi(items.into_iter().map(Into::into).collect())
    }
}

/// A field value as returned by a read, with references resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    Scalar(Scalar),
    Multi(Vec<Scalar>),
    Object(Document),
}

impl ResolvedValue {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_multi(&self) -> Option<&[Scalar]> {
        match self {
            Self::Multi(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Document> {
        match self {
            Self::Object(doc) => Some(doc),
            _ => None,
        }
    }
}

impl From<FieldValue> for ResolvedValue {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Scalar(s) => Self::Scalar(s),
            FieldValue::Multi(items) => Self::Multi(items),
        }
    }
}

impl PartialEq<FieldValue> for ResolvedValue {
    fn eq(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (Self::Scalar(a), FieldValue::Scalar(b)) => a == b,
            (Self::Multi(a), FieldValue::Multi(b)) => a == b,
            _ => false,
        }
    }
}

/// A fully resolved object: field name to value, plus the implicit
/// [`ID_FIELD`] naming the object's identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Document {
    fields: BTreeMap<String, ResolvedValue>,
}

impl Document {
    /// Create a document holding only its identity field.
    pub fn new(identity: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(
            ID_FIELD.to_string(),
            ResolvedValue::Scalar(Scalar::text(identity)),
        );
        Self { fields }
    }

    /// The identity this document was resolved from.
    pub fn id(&self) -> &str {
        self.fields
            .get(ID_FIELD)
            .and_then(ResolvedValue::as_scalar)
            .and_then(Scalar::as_text)
            .unwrap_or_default()
    }

    pub fn get(&self, field: &str) -> Option<&ResolvedValue> {
        self.fields.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: ResolvedValue) {
        self.fields.insert(field.into(), value);
    }

    /// Number of fields, including the identity field.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResolvedValue)> {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Scalar
    // -----------------------------------------------------------------------

    #[test]
    fn scalar_kinds() {
        assert_eq!(Scalar::from("x").kind(), ScalarKind::Text);
        assert_eq!(Scalar::from(7).kind(), ScalarKind::Integer);
    }

    #[test]
    fn coerce_integer_to_text() {
        let s = Scalar::Integer(42).coerce(ScalarKind::Text).unwrap();
        assert_eq!(s, Scalar::text("42"));
    }

    #[test]
    fn coerce_numeric_text_to_integer() {
        let s = Scalar::text(" 1024 ").coerce(ScalarKind::Integer).unwrap();
        assert_eq!(s, Scalar::Integer(1024));
    }

    #[test]
    fn coerce_non_numeric_text_fails() {
        let err = Scalar::text("abc").coerce(ScalarKind::Integer).unwrap_err();
        assert!(matches!(err, TypeError::Conversion { .. }));
    }

    #[test]
    fn kind_from_str() {
        assert_eq!("TEXT".parse::<ScalarKind>().unwrap(), ScalarKind::Text);
        assert_eq!("int".parse::<ScalarKind>().unwrap(), ScalarKind::Integer);
        assert!("float".parse::<ScalarKind>().is_err());
    }

    #[test]
    fn sql_types() {
        assert_eq!(ScalarKind::Text.sql_type(), "TEXT");
        assert_eq!(ScalarKind::Integer.sql_type(), "INTEGER");
    }

    // -----------------------------------------------------------------------
    // FieldValue
    // -----------------------------------------------------------------------

    #[test]
    fn scalar_field_has_one_element() {
        let v = FieldValue::from("a");
        assert_eq!(v.elements(), &[Scalar::text("a")]);
        assert!(!v.is_multi());
    }

    #[test]
    fn multi_field_keeps_order() {
        let v = FieldValue::from(vec!["b", "a"]);
        assert!(v.is_multi());
        assert_eq!(v.elements(), &[Scalar::text("b"), Scalar::text("a")]);
    }

    // -----------------------------------------------------------------------
    // Document
    // -----------------------------------------------------------------------

    #[test]
    fn document_carries_identity() {
        let doc = Document::new("A");
        assert_eq!(doc.id(), "A");
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn resolved_compares_with_field_value() {
        let r = ResolvedValue::Multi(vec![Scalar::text("a")]);
        assert_eq!(r, FieldValue::from(vec!["a"]));
        assert_ne!(r, FieldValue::from("a"));
    }

    #[test]
    fn document_serializes_as_map() {
        let mut doc = Document::new("A");
        doc.insert("n", ResolvedValue::Scalar(Scalar::Integer(1)));
        doc.insert("tags", ResolvedValue::Multi(vec!["x".into()]));
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json, serde_json::json!({"_id": "A", "n": 1, "tags": ["x"]}));
    }
}

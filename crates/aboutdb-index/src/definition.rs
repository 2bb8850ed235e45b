use std::fmt;
use std::sync::Arc;

use aboutdb_types::{Scalar, ScalarKind};

use crate::error::{IndexError, IndexResult};

/// Pure function deriving the indexed value from a stored element.
pub type Extractor = Arc<dyn Fn(&Scalar) -> Scalar + Send + Sync>;

/// A rule mapping a (schema, field) pair to a derived value table.
///
/// A definition without a schema is schema-independent: it sees writes of
/// its source field on every object.
#[derive(Clone)]
pub struct IndexDefinition {
    schema: Option<String>,
    name: String,
    source_field: String,
    extractor: Option<Extractor>,
    value_type: ScalarKind,
}

impl IndexDefinition {
    /// An index over `name` on objects of `schema`. The source field
    /// defaults to `name`.
    pub fn for_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(Some(schema.into()), name.into())
    }

    /// A schema-independent index over the field `name`.
    pub fn global(name: impl Into<String>) -> Self {
        Self::new(None, name.into())
    }

    fn new(schema: Option<String>, name: String) -> Self {
        Self {
            schema,
            source_field: name.clone(),
            name,
            extractor: None,
            value_type: ScalarKind::Text,
        }
    }

    /// Read values from `field` instead of the field named like the index.
    pub fn source_field(mut self, field: impl Into<String>) -> Self {
        self.source_field = field.into();
        self
    }

    /// Derive the indexed value with `f` before coercion.
    pub fn extractor<F>(mut self, f: F) -> Self
    where
        F: Fn(&Scalar) -> Scalar + Send + Sync + 'static,
    {
        self.extractor = Some(Arc::new(f));
        self
    }

    /// Type of the indexed column. Defaults to text.
    pub fn value_type(mut self, kind: ScalarKind) -> Self {
        self.value_type = kind;
        self
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> &str {
        &self.source_field
    }

    pub fn kind(&self) -> ScalarKind {
        self.value_type
    }

    pub fn has_extractor(&self) -> bool {
        self.extractor.is_some()
    }

    /// Name of the backing table.
    ///
    /// `FIELD` for schema-independent definitions, `SCHEMA_NAME` otherwise,
    /// uppercased with everything but `A-Z` and `_` removed. Names in the
    /// `SQLITE_` namespace are refused on every backend.
    pub fn table_name(&self) -> IndexResult<String> {
        let raw = match &self.schema {
            None => self.source_field.to_uppercase(),
            Some(schema) => format!("{}_{}", schema.to_uppercase(), self.name.to_uppercase()),
        };
        let table: String = raw
            .chars()
            .filter(|c| c.is_ascii_uppercase() || *c == '_')
            .collect();
        if table.is_empty() || table.chars().all(|c| c == '_') || table.starts_with("SQLITE_") {
            return Err(IndexError::InvalidIndexName(raw));
        }
        Ok(table)
    }

    /// Whether a write of `field` on an object of `schema` feeds this index.
    pub fn handles(&self, schema: Option<&str>, field: &str) -> bool {
        self.source_field == field
            && match &self.schema {
                None => true,
                Some(own) => schema == Some(own.as_str()),
            }
    }

    /// Whether this is the schema-independent index of `field`.
    pub fn handles_field(&self, field: &str) -> bool {
        self.schema.is_none() && self.source_field == field
    }

    /// Whether a lookup of (`schema`, `name`) addresses this index exactly.
    pub fn answers(&self, schema: Option<&str>, name: &str) -> bool {
        self.schema.as_deref() == schema && self.name == name
    }

    /// Extract and coerce one stored element into an index value.
    pub fn derive(&self, element: &Scalar) -> IndexResult<Scalar> {
        let extracted = match &self.extractor {
            Some(f) => f(element),
            None => element.clone(),
        };
        self.coerce(&extracted)
    }

    /// Coerce a value to this index's value type.
    pub fn coerce(&self, value: &Scalar) -> IndexResult<Scalar> {
        value
            .coerce(self.value_type)
            .map_err(|_| IndexError::IndexValueTypeMismatch {
                index: self.name.clone(),
                expected: self.value_type,
                value: value.to_string(),
            })
    }
}

impl fmt::Debug for IndexDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexDefinition")
            .field("schema", &self.schema)
            .field("name", &self.name)
            .field("source_field", &self.source_field)
            .field("extractor", &self.extractor.is_some())
            .field("value_type", &self.value_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_field_defaults_to_name() {
        let def = IndexDefinition::for_schema("Entry", "tags");
        assert_eq!(def.field(), "tags");
        assert_eq!(def.kind(), ScalarKind::Text);
    }

    // -----------------------------------------------------------------------
    // Table names
    // -----------------------------------------------------------------------

    #[test]
    fn schema_table_names() {
        let def = IndexDefinition::for_schema("Entry", "taken_ts");
        assert_eq!(def.table_name().unwrap(), "ENTRY_TAKEN_TS");
        let def = IndexDefinition::for_schema("Entry", "date").source_field("taken_ts");
        assert_eq!(def.table_name().unwrap(), "ENTRY_DATE");
    }

    #[test]
    fn global_table_name_uses_field() {
        assert_eq!(
            IndexDefinition::global("*schema").table_name().unwrap(),
            "SCHEMA"
        );
        let def = IndexDefinition::global("by_tag").source_field("tags");
        assert_eq!(def.table_name().unwrap(), "TAGS");
    }

    #[test]
    fn non_letters_are_stripped() {
        let def = IndexDefinition::for_schema("Photo-2", "size (px)");
        assert_eq!(def.table_name().unwrap(), "PHOTO_SIZEPX");
    }

    #[test]
    fn empty_table_name_is_invalid() {
        let err = IndexDefinition::global("123").table_name().unwrap_err();
        assert!(matches!(err, IndexError::InvalidIndexName(_)));
        let err = IndexDefinition::global("_").table_name().unwrap_err();
        assert!(matches!(err, IndexError::InvalidIndexName(_)));
    }

    #[test]
    fn sqlite_namespace_is_invalid() {
        let err = IndexDefinition::global("sqlite_stat").table_name().unwrap_err();
        assert!(matches!(err, IndexError::InvalidIndexName(_)));
        let err = IndexDefinition::for_schema("sqlite", "x").table_name().unwrap_err();
        assert!(matches!(err, IndexError::InvalidIndexName(_)));
        // Keywords are ordinary names.
        assert_eq!(IndexDefinition::global("order").table_name().unwrap(), "ORDER");
    }

    // -----------------------------------------------------------------------
    // Matching
    // -----------------------------------------------------------------------

    #[test]
    fn schema_definition_handles_only_its_schema() {
        let def = IndexDefinition::for_schema("Entry", "tags");
        assert!(def.handles(Some("Entry"), "tags"));
        assert!(!def.handles(Some("Variant"), "tags"));
        assert!(!def.handles(None, "tags"));
        assert!(!def.handles(Some("Entry"), "title"));
        assert!(!def.handles_field("tags"));
    }

    #[test]
    fn global_definition_handles_every_schema() {
        let def = IndexDefinition::global("tags");
        assert!(def.handles(None, "tags"));
        assert!(def.handles(Some("Entry"), "tags"));
        assert!(def.handles_field("tags"));
    }

    #[test]
    fn answers_by_index_name() {
        let def = IndexDefinition::for_schema("Entry", "date").source_field("taken_ts");
        assert!(def.answers(Some("Entry"), "date"));
        assert!(!def.answers(Some("Entry"), "taken_ts"));
        assert!(!def.answers(None, "date"));
    }

    // -----------------------------------------------------------------------
    // Derivation
    // -----------------------------------------------------------------------

    #[test]
    fn derive_applies_extractor() {
        let def = IndexDefinition::for_schema("Entry", "date")
            .source_field("taken_ts")
            .extractor(|v| {
                let s = v.as_text().unwrap_or_default();
                Scalar::text(s.chars().take(10).collect::<String>())
            });
        let derived = def.derive(&Scalar::text("2017-04-08 10:00:00")).unwrap();
        assert_eq!(derived, Scalar::text("2017-04-08"));
    }

    #[test]
    fn derive_coerces_to_value_type() {
        let def = IndexDefinition::global("width").value_type(ScalarKind::Integer);
        assert_eq!(def.derive(&Scalar::text("1024")).unwrap(), Scalar::Integer(1024));
        let err = def.derive(&Scalar::text("wide")).unwrap_err();
        assert!(matches!(err, IndexError::IndexValueTypeMismatch { .. }));
    }

    #[test]
    fn debug_hides_extractor_body() {
        let def = IndexDefinition::global("x").extractor(|v| v.clone());
        let debug = format!("{def:?}");
        assert!(debug.contains("extractor: true"));
    }
}

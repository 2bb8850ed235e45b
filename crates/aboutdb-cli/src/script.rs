//! Line-oriented scripts for `aboutdb run`.
//!
//! One statement per line; blank lines and lines starting with `#` are
//! skipped. A schema argument of `-` means schema-independent.
//!
//! ```text
//! index Entry date field=taken_ts prefix=10
//! index - width type=integer
//! store A *schema Entry
//! store A title my title for A
//! store-int F1 width 1024
//! store-list A tags a b
//! link A file F1
//! get A
//! lookup Entry tags b
//! delete A
//! ```

use aboutdb_sdk::{IndexDefinition, Scalar, ScalarKind};
use anyhow::{anyhow, bail, Context};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexSpec {
    pub schema: Option<String>,
    pub name: String,
    pub field: Option<String>,
    pub kind: ScalarKind,
    /// Index only the first `n` characters of text values.
    pub prefix: Option<usize>,
}

impl IndexSpec {
    pub fn to_definition(&self) -> IndexDefinition {
        let mut def = match &self.schema {
            Some(schema) => IndexDefinition::for_schema(schema.as_str(), self.name.as_str()),
            None => IndexDefinition::global(self.name.as_str()),
        };
        if let Some(field) = &self.field {
            def = def.source_field(field.as_str());
        }
        if let Some(n) = self.prefix {
            def = def.extractor(move |v: &Scalar| match v {
                Scalar::Text(s) => Scalar::text(s.chars().take(n).collect::<String>()),
                other => other.clone(),
            });
        }
        def.value_type(self.kind)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    Index(IndexSpec),
    Store {
        identity: String,
        field: String,
        value: Scalar,
    },
    StoreList {
        identity: String,
        field: String,
        values: Vec<Scalar>,
    },
    Link {
        identity: String,
        field: String,
        target: String,
    },
    Get(String),
    Delete(String),
    Lookup {
        schema: Option<String>,
        name: String,
        value: String,
    },
}

/// Split off `n` whitespace-separated words; the remainder is trimmed.
fn words(line: &str, n: usize) -> Option<(Vec<&str>, &str)> {
    let mut rest = line.trim_start();
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        if rest.is_empty() {
            return None;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        out.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    Some((out, rest.trim_end()))
}

fn schema_arg(s: &str) -> Option<String> {
    (s != "-").then(|| s.to_string())
}

impl Statement {
    /// Parse one script line. `Ok(None)` for blanks and comments.
    pub fn parse(line: &str) -> anyhow::Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let (head, rest) = words(line, 1).ok_or_else(|| anyhow!("empty statement"))?;
        let stmt = match head[0] {
            "index" => Self::Index(parse_index(rest)?),
            "store" => {
                let (w, value) = words(rest, 2)
                    .ok_or_else(|| anyhow!("usage: store <id> <field> <text>"))?;
                Self::Store {
                    identity: w[0].into(),
                    field: w[1].into(),
                    value: Scalar::text(value),
                }
            }
            "store-int" => {
                let (w, value) = words(rest, 2)
                    .ok_or_else(|| anyhow!("usage: store-int <id> <field> <int>"))?;
                let n: i32 = value
                    .parse()
                    .with_context(|| format!("not a 32-bit integer: {value:?}"))?;
                Self::Store {
                    identity: w[0].into(),
                    field: w[1].into(),
                    value: Scalar::Integer(n),
                }
            }
            "store-list" => {
                let (w, values) = words(rest, 2)
                    .ok_or_else(|| anyhow!("usage: store-list <id> <field> <item>..."))?;
                Self::StoreList {
                    identity: w[0].into(),
                    field: w[1].into(),
                    values: values.split_whitespace().map(Scalar::text).collect(),
                }
            }
            "link" => match words(rest, 3) {
                Some((w, "")) => Self::Link {
                    identity: w[0].into(),
                    field: w[1].into(),
                    target: w[2].into(),
                },
                _ => bail!("usage: link <id> <field> <target>"),
            },
            "get" => match words(rest, 1) {
                Some((w, "")) => Self::Get(w[0].into()),
                _ => bail!("usage: get <id>"),
            },
            "delete" => match words(rest, 1) {
                Some((w, "")) => Self::Delete(w[0].into()),
                _ => bail!("usage: delete <id>"),
            },
            "lookup" => {
                let (w, value) = words(rest, 2)
                    .ok_or_else(|| anyhow!("usage: lookup <schema|-> <name> <value>"))?;
                Self::Lookup {
                    schema: schema_arg(w[0]),
                    name: w[1].into(),
                    value: value.to_string(),
                }
            }
            other => bail!("unknown statement {other:?}"),
        };
        Ok(Some(stmt))
    }
}

fn parse_index(rest: &str) -> anyhow::Result<IndexSpec> {
    let (w, options) = words(rest, 2).ok_or_else(|| {
        anyhow!("usage: index <schema|-> <name> [field=F] [type=text|integer] [prefix=N]")
    })?;
    let mut spec = IndexSpec {
        schema: schema_arg(w[0]),
        name: w[1].into(),
        field: None,
        kind: ScalarKind::Text,
        prefix: None,
    };
    for option in options.split_whitespace() {
        let (key, value) = option
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got {option:?}"))?;
        match key {
            "field" => spec.field = Some(value.into()),
            "type" => spec.kind = value.parse()?,
            "prefix" => {
                spec.prefix = Some(
                    value
                        .parse()
                        .with_context(|| format!("bad prefix length {value:?}"))?,
                )
            }
            _ => bail!("unknown index option {key:?}"),
        }
    }
    Ok(spec)
}

/// Parse a whole script into `(line number, statement)` pairs.
pub fn parse_script(text: &str) -> anyhow::Result<Vec<(usize, Statement)>> {
    let mut out = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let stmt = Statement::parse(line).with_context(|| format!("line {}", n + 1))?;
        out.extend(stmt.map(|s| (n + 1, s)));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Statement {
        Statement::parse(line).unwrap().unwrap()
    }

    #[test]
    fn blanks_and_comments_skipped() {
        assert_eq!(Statement::parse("").unwrap(), None);
        assert_eq!(Statement::parse("   # note").unwrap(), None);
    }

    #[test]
    fn store_keeps_rest_of_line() {
        assert_eq!(
            parse("store A title   my title for A "),
            Statement::Store {
                identity: "A".into(),
                field: "title".into(),
                value: Scalar::text("my title for A"),
            }
        );
    }

    #[test]
    fn store_int_and_list() {
        assert_eq!(
            parse("store-int F1 width 1024"),
            Statement::Store {
                identity: "F1".into(),
                field: "width".into(),
                value: Scalar::Integer(1024),
            }
        );
        assert_eq!(
            parse("store-list A tags a b"),
            Statement::StoreList {
                identity: "A".into(),
                field: "tags".into(),
                values: vec![Scalar::text("a"), Scalar::text("b")],
            }
        );
        assert!(Statement::parse("store-int F1 width wide").is_err());
    }

    #[test]
    fn index_options() {
        let Statement::Index(spec) = parse("index Entry date field=taken_ts prefix=10") else {
            panic!("expected index statement");
        };
        assert_eq!(spec.schema.as_deref(), Some("Entry"));
        assert_eq!(spec.field.as_deref(), Some("taken_ts"));
        assert_eq!(spec.prefix, Some(10));

        let def = spec.to_definition();
        assert_eq!(def.field(), "taken_ts");
        assert_eq!(def.table_name().unwrap(), "ENTRY_DATE");
        assert!(def.has_extractor());

        let Statement::Index(spec) = parse("index - width type=integer") else {
            panic!("expected index statement");
        };
        assert_eq!(spec.schema, None);
        assert_eq!(spec.kind, ScalarKind::Integer);
        assert!(Statement::parse("index Entry date colour=red").is_err());
    }

    #[test]
    fn link_requires_exact_arity() {
        assert!(Statement::parse("link A file").is_err());
        assert!(Statement::parse("link A file F1 extra").is_err());
        assert_eq!(
            parse("link A file F1"),
            Statement::Link {
                identity: "A".into(),
                field: "file".into(),
                target: "F1".into(),
            }
        );
    }

    #[test]
    fn lookup_schema_dash_is_global() {
        assert_eq!(
            parse("lookup - width 1024"),
            Statement::Lookup {
                schema: None,
                name: "width".into(),
                value: "1024".into(),
            }
        );
    }

    #[test]
    fn script_errors_name_line() {
        let err = parse_script("get A\nfrobnicate\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
        let script = parse_script("# only\nget A\n").unwrap();
        assert_eq!(script, vec![(2, Statement::Get("A".into()))]);
    }
}

use std::io::{self, Write};

use aboutdb_sdk::{AboutDb, Document, FieldValue, IndexRow, ResolvedValue, Scalar, StoreConfig};
use anyhow::Context;
use colored::Colorize;
use serde_json::json;

use crate::cli::*;
use crate::script::{parse_script, Statement};

/// The sample photo catalogue: two entries sharing a tag, one linked variant.
const DEMO_SCRIPT: &str = "\
index Entry taken_ts
index Entry date field=taken_ts prefix=10
index Entry tags

store A *schema Entry
store A title my title for A
store A taken_ts 2017-04-08 10:00:00
store F1 *schema Variant
store F1 variant original
store F1 mimetype image/jpeg
store F1 width 1024
store F1 height 768
store F1 filename /home/johan/test.jpg
link A file F1
store-list A tags a b

store B *schema Entry
store B title my title for B
store B taken_ts 2017-04-08 10:00:00
store-list B tags b c
";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };
    let mut printer = Printer::new(io::stdout().lock(), cli.format);
    match cli.command {
        Command::Demo => cmd_demo(config, &mut printer),
        Command::Run(args) => cmd_run(config, args, &mut printer),
    }
}

fn cmd_demo<W: Write>(config: StoreConfig, printer: &mut Printer<W>) -> anyhow::Result<()> {
    let mut db = AboutDb::open(config)?;
    printer.quiet = true;
    run_script(&mut db, DEMO_SCRIPT, printer)?;
    printer.quiet = false;

    printer.heading("object")?;
    execute(&mut db, &Statement::Get("A".into()), printer)?;

    printer.heading("index tables")?;
    let engine = db.index_engine();
    for def in engine.definitions() {
        printer.table(&def.table_name()?, &engine.rows(def)?)?;
    }

    printer.heading("lookups")?;
    for tag in ["a", "b"] {
        let lookup = Statement::Lookup {
            schema: Some("Entry".into()),
            name: "tags".into(),
            value: tag.into(),
        };
        execute(&mut db, &lookup, printer)?;
    }
    Ok(())
}

fn cmd_run<W: Write>(
    config: StoreConfig,
    args: RunArgs,
    printer: &mut Printer<W>,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.script)
        .with_context(|| format!("reading {}", args.script.display()))?;
    let mut db = AboutDb::open(config)?;
    run_script(&mut db, &text, printer)?;
    printer.summary(&db)
}

pub fn run_script<W: Write>(
    db: &mut AboutDb,
    text: &str,
    printer: &mut Printer<W>,
) -> anyhow::Result<()> {
    for (line, stmt) in parse_script(text)? {
        execute(db, &stmt, printer).with_context(|| format!("line {line}"))?;
    }
    Ok(())
}

pub fn execute<W: Write>(
    db: &mut AboutDb,
    stmt: &Statement,
    printer: &mut Printer<W>,
) -> anyhow::Result<()> {
    match stmt {
        Statement::Index(spec) => {
            let filled = db.define_index(spec.to_definition())?;
            printer.ack(&format!("index {} ({filled} existing rows)", spec.name))
        }
        Statement::Store { identity, field, value } => {
            db.store(identity, field, value.clone())?;
            printer.ack(&format!("store {identity}.{field}"))
        }
        Statement::StoreList { identity, field, values } => {
            db.store(identity, field, FieldValue::Multi(values.clone()))?;
            printer.ack(&format!("store {identity}.{field}"))
        }
        Statement::Link { identity, field, target } => {
            db.link(identity, field, target)?;
            printer.ack(&format!("link {identity}.{field} -> {target}"))
        }
        Statement::Delete(identity) => {
            db.delete(identity)?;
            printer.ack(&format!("delete {identity}"))
        }
        Statement::Get(identity) => {
            let doc = db.get(identity)?;
            printer.document(&doc)
        }
        Statement::Lookup { schema, name, value } => {
            let hits: Vec<String> = match schema {
                Some(schema) => db.lookup(schema, name, value.as_str())?.collect(),
                None => db.lookup_any(name, value.as_str())?.collect(),
            };
            printer.lookup(schema.as_deref(), name, value, &hits)
        }
    }
}

/// Renders command results as colored text or one JSON value per line.
pub struct Printer<W> {
    out: W,
    format: OutputFormat,
    /// Suppress write acknowledgements.
    pub quiet: bool,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format, quiet: false }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn json(&mut self, value: serde_json::Value) -> anyhow::Result<()> {
        writeln!(self.out, "{value}")?;
        Ok(())
    }

    fn heading(&mut self, title: &str) -> anyhow::Result<()> {
        if self.format == OutputFormat::Text {
            writeln!(self.out, "\n{}", format!("== {title} ==").bold())?;
        }
        Ok(())
    }

    fn ack(&mut self, what: &str) -> anyhow::Result<()> {
        if self.quiet || self.format == OutputFormat::Json {
            return Ok(());
        }
        writeln!(self.out, "{} {what}", "✓".green())?;
        Ok(())
    }

    fn document(&mut self, doc: &Document) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => self.json(serde_json::to_value(doc)?),
            OutputFormat::Text => {
                writeln!(self.out, "{}", doc.id().yellow().bold())?;
                write_fields(&mut self.out, doc, 1)?;
                Ok(())
            }
        }
    }

    fn lookup(
        &mut self,
        schema: Option<&str>,
        name: &str,
        value: &str,
        hits: &[String],
    ) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => self.json(json!({
                "schema": schema,
                "index": name,
                "value": value,
                "hits": hits,
            })),
            OutputFormat::Text => {
                let scope = schema.unwrap_or("*");
                let found = if hits.is_empty() {
                    "(none)".dimmed().to_string()
                } else {
                    hits.join(", ").yellow().to_string()
                };
                writeln!(self.out, "{}.{name} = {value:?} -> {found}", scope.cyan())?;
                Ok(())
            }
        }
    }

    fn table(&mut self, table: &str, rows: &[IndexRow]) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => self.json(json!({
                "table": table,
                "rows": rows
                    .iter()
                    .map(|r| json!({ "id": r.id, "identity": r.identity, "value": r.value }))
                    .collect::<Vec<_>>(),
            })),
            OutputFormat::Text => {
                writeln!(self.out, "{}", table.cyan().bold())?;
                for row in rows {
                    writeln!(self.out, "  {:>3}  {:<8} {}", row.id, row.identity, row.value)?;
                }
                Ok(())
            }
        }
    }

    fn summary(&mut self, db: &AboutDb) -> anyhow::Result<()> {
        if self.format == OutputFormat::Json {
            return Ok(());
        }
        writeln!(
            self.out,
            "{} objects, {} chunks, {} bytes used",
            db.identities().count().to_string().bold(),
            db.chunk_count(),
            db.bytes_used(),
        )?;
        Ok(())
    }
}

fn write_fields<W: Write>(out: &mut W, doc: &Document, depth: usize) -> io::Result<()> {
    let pad = "  ".repeat(depth);
    for (field, value) in doc.iter() {
        match value {
            ResolvedValue::Object(inner) => {
                writeln!(out, "{pad}{}: -> {}", field.bold(), inner.id().yellow())?;
                write_fields(out, inner, depth + 1)?;
            }
            ResolvedValue::Scalar(s) => writeln!(out, "{pad}{}: {s}", field.bold())?,
            ResolvedValue::Multi(items) => {
                let items: Vec<String> = items.iter().map(Scalar::to_string).collect();
                writeln!(out, "{pad}{}: [{}]", field.bold(), items.join(", "))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_lines(out: Vec<u8>) -> Vec<serde_json::Value> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    // ----------------------------------------------------------------
    // Demo
    // ----------------------------------------------------------------

    #[test]
    fn demo_json_output() {
        let mut printer = Printer::new(Vec::new(), OutputFormat::Json);
        cmd_demo(StoreConfig::default(), &mut printer).unwrap();
        let lines = json_lines(printer.into_inner());

        let a = &lines[0];
        assert_eq!(a["_id"], "A");
        assert_eq!(a["tags"], json!(["a", "b"]));
        assert_eq!(a["file"]["_id"], "F1");
        assert_eq!(a["file"]["width"], "1024");

        let tables: Vec<&str> = lines
            .iter()
            .filter_map(|l| l["table"].as_str())
            .collect();
        assert_eq!(tables, vec!["SCHEMA", "ENTRY_TAKEN_TS", "ENTRY_DATE", "ENTRY_TAGS"]);
        let date = lines.iter().find(|l| l["table"] == "ENTRY_DATE").unwrap();
        assert_eq!(date["rows"][0]["value"], "2017-04-08");

        let hits: Vec<&serde_json::Value> = lines.iter().filter(|l| l["hits"].is_array()).collect();
        assert_eq!(hits[0]["hits"], json!(["A"]));
        assert_eq!(hits[1]["hits"], json!(["A", "B"]));
    }

    #[test]
    fn demo_text_output_mentions_objects() {
        let mut printer = Printer::new(Vec::new(), OutputFormat::Text);
        cmd_demo(StoreConfig::default(), &mut printer).unwrap();
        let text = String::from_utf8(printer.into_inner()).unwrap();
        assert!(text.contains("ENTRY_TAGS"));
        assert!(text.contains("my title for A"));
        assert!(!text.contains("store A.title"));
    }

    // ----------------------------------------------------------------
    // Scripts
    // ----------------------------------------------------------------

    #[test]
    fn script_against_integer_index() {
        let mut db = AboutDb::in_memory().unwrap();
        let mut printer = Printer::new(Vec::new(), OutputFormat::Json);
        let script = "\
index - width type=integer
store-int F1 width 1024
store F2 width 768
lookup - width 768
";
        run_script(&mut db, script, &mut printer).unwrap();
        let lines = json_lines(printer.into_inner());
        assert_eq!(
            lines,
            vec![json!({"schema": null, "index": "width", "value": "768", "hits": ["F2"]})]
        );
    }

    #[test]
    fn script_error_reports_line() {
        let mut db = AboutDb::in_memory().unwrap();
        let mut printer = Printer::new(Vec::new(), OutputFormat::Json);
        let err = run_script(&mut db, "store A x 1\nget B\n", &mut printer).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
        assert!(db.contains("A"));
    }

    #[test]
    fn run_reads_script_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.adb");
        std::fs::write(&path, "store A *schema Entry\ndelete A\n").unwrap();

        let mut printer = Printer::new(Vec::new(), OutputFormat::Text);
        cmd_run(StoreConfig::default(), RunArgs { script: path }, &mut printer).unwrap();
        let text = String::from_utf8(printer.into_inner()).unwrap();
        assert!(text.contains("delete A"));
        assert!(text.contains("chunks"));
    }
}

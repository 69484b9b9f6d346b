//! Export command - write extraction results as JSON, CSV or a summary sheet.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use serde_json::{Map, Value};
use tracing::warn;

use docket_core::models::{fields, FieldMap, PersistedRecord};

use super::GlobalArgs;

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: ExportFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ExportFormat {
    /// Object keyed by filename
    Json,
    /// One row per processed document
    Csv,
    /// Fixed invoice columns with US dates
    Summary,
}

/// Summary sheet columns and the keys each one reads, canonical key first.
const SUMMARY_COLUMNS: [(&str, &[&str]); 7] = [
    ("Invoice Number", &[fields::INVOICE_NUMBER]),
    ("Amount", &[fields::AMOUNT]),
    ("Date", &[fields::DATE]),
    ("Due Date", &[fields::DUE_DATE]),
    ("Terms", &["terms"]),
    ("Sold To", &[fields::CUSTOMER, "sold_to"]),
    ("Mail To", &[fields::VENDOR, "bill_to"]),
];

pub async fn run(args: ExportArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let pipeline = global.open_pipeline()?;
    let records = pipeline.records()?;

    let content = match args.format {
        ExportFormat::Json => format_json(&records)?,
        ExportFormat::Csv => format_csv(&records)?,
        ExportFormat::Summary => format_summary(&records)?,
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &content)?;
            println!(
                "{} Exported {} records to {}",
                style("✓").green(),
                records.len(),
                path.display()
            );
        }
        None => print!("{}", content),
    }

    Ok(())
}

/// Field map of a record, `None` for failed attempts or undecodable rows.
fn record_fields(record: &PersistedRecord) -> Option<FieldMap> {
    match record.result()? {
        Ok(result) => Some(result.fields),
        Err(e) => {
            warn!(file = %record.filename, error = %e, "skipping undecodable record");
            None
        }
    }
}

fn format_json(records: &[PersistedRecord]) -> anyhow::Result<String> {
    let export: Map<String, Value> = records
        .iter()
        .map(|r| {
            let fields = record_fields(r).map(Value::Object).unwrap_or(Value::Null);
            (r.filename.clone(), fields)
        })
        .collect();

    let mut content = serde_json::to_string_pretty(&export)?;
    content.push('\n');
    Ok(content)
}

fn format_csv(records: &[PersistedRecord]) -> anyhow::Result<String> {
    let rows: Vec<(&str, FieldMap)> = records
        .iter()
        .filter_map(|r| record_fields(r).map(|f| (r.filename.as_str(), f)))
        .collect();

    let columns: BTreeSet<&str> = rows
        .iter()
        .flat_map(|(_, fields)| fields.keys().map(String::as_str))
        .collect();

    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["filename"];
    header.extend(columns.iter().copied());
    wtr.write_record(&header)?;

    for (filename, fields) in &rows {
        let mut row = vec![filename.to_string()];
        row.extend(columns.iter().map(|c| cell(fields.get(*c))));
        wtr.write_record(&row)?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_summary(records: &[PersistedRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["File"];
    header.extend(SUMMARY_COLUMNS.iter().map(|(column, _)| *column));
    wtr.write_record(&header)?;

    for record in records {
        let Some(fields) = record_fields(record) else {
            continue;
        };
        let mut row = vec![record.filename.clone()];
        row.extend(SUMMARY_COLUMNS.iter().map(|(_, keys)| {
            let value = keys.iter().find_map(|k| fields.get(*k).filter(|v| !is_blank(v)));
            us_date(cell(value))
        }));
        wtr.write_record(&row)?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Rewrite an ISO `YYYY-MM-DD` date as `MM/DD/YYYY`; anything else is kept.
fn us_date(value: String) -> String {
    match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        Ok(date) => date.format("%m/%d/%Y").to_string(),
        Err(_) => value,
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::ExtractionResult;
    use serde_json::json;

    fn record(filename: &str, fields: Option<Value>) -> PersistedRecord {
        let json_data = fields.map(|f| {
            let result = ExtractionResult::primary(f.as_object().cloned().unwrap());
            serde_json::to_string(&result).unwrap()
        });
        PersistedRecord {
            filename: filename.to_string(),
            json_data,
            status: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_json_export_keeps_failed_as_null() {
        let records = vec![
            record("a.pdf", Some(json!({"amount": "1.00"}))),
            record("b.pdf", None),
        ];
        let value: Value = serde_json::from_str(&format_json(&records).unwrap()).unwrap();
        assert_eq!(value, json!({"a.pdf": {"amount": "1.00"}, "b.pdf": null}));
    }

    #[test]
    fn test_csv_union_of_columns() {
        let records = vec![
            record("a.pdf", Some(json!({"amount": "1.00", "date": "1/5/2024"}))),
            record("b.pdf", None),
            record("c.pdf", Some(json!({"amount": 2.5, "vendor": "Acme, Inc"}))),
        ];
        let csv = format_csv(&records).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "filename,amount,date,vendor",
                "a.pdf,1.00,1/5/2024,",
                "c.pdf,2.5,,\"Acme, Inc\"",
            ]
        );
    }

    #[test]
    fn test_summary_fixed_columns() {
        let records = vec![
            record(
                "a.pdf",
                Some(json!({
                    "invoice_number": "042",
                    "amount": 120.0,
                    "date": "2024-01-05",
                    "due_date": "1/20/2024",
                    "customer": "Initech",
                    "bill_to": "Acme, Inc",
                    "currency": "USD",
                })),
            ),
            record("b.pdf", None),
            record("c.pdf", Some(json!({"sold_to": "Globex", "customer": "", "terms": "Net 30"}))),
        ];
        let csv = format_summary(&records).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "File,Invoice Number,Amount,Date,Due Date,Terms,Sold To,Mail To",
                "a.pdf,042,120.0,01/05/2024,1/20/2024,,Initech,\"Acme, Inc\"",
                "c.pdf,,,,,Net 30,Globex,",
            ]
        );
    }

    #[test]
    fn test_us_date_only_rewrites_iso_dates() {
        assert_eq!(us_date("2024-12-31".to_string()), "12/31/2024");
        assert_eq!(us_date("12/31/2024".to_string()), "12/31/2024");
        assert_eq!(us_date("INV-2024-001".to_string()), "INV-2024-001");
    }
}

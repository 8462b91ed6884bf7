use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use log::info;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Transaction, TransactionSet};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced while turning an input file into a [`TransactionSet`].
///
/// Loading is fail-fast: the first malformed cell aborts the run so type
/// errors never leak into the summary computations. There are no retries.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}, column '{column}': {message}")]
    MalformedCell {
        row: usize,
        column: &'static str,
        message: String,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON: {0}")]
    Json(String),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a transaction dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – delimited text with a header row naming the columns
///   `Account Type`, `Region`, `Transaction To`, `Credit`, `Debit` and
///   optionally `Date` (matched case-insensitively)
/// * `.json` – records-oriented array of objects with the same fields,
///   the default `df.to_json(orient='records')` shape
pub fn load_file(path: &Path) -> Result<TransactionSet, DataLoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        other => Err(DataLoadError::UnsupportedExtension(other.to_string())),
    }?;

    info!(
        "loaded {} transactions from {} (dates: {})",
        dataset.len(),
        path.display(),
        dataset.has_dates
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Column positions of the required fields within the CSV header row.
struct HeaderIndex {
    account_type: usize,
    region: usize,
    beneficiary: usize,
    credit: usize,
    debit: usize,
    date: Option<usize>,
}

impl HeaderIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, DataLoadError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or(DataLoadError::MissingColumn(name))
        };

        Ok(HeaderIndex {
            account_type: find("Account Type")?,
            region: find("Region")?,
            beneficiary: find("Transaction To")?,
            credit: find("Credit")?,
            debit: find("Debit")?,
            date: headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case("Date")),
        })
    }
}

fn load_csv(path: &Path) -> Result<TransactionSet, DataLoadError> {
    let file = fs::File::open(path).map_err(|source| DataLoadError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);
    let columns = HeaderIndex::from_headers(reader.headers()?)?;

    let mut transactions = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        transactions.push(parse_csv_row(&record, &columns, row)?);
    }

    Ok(TransactionSet::from_transactions(
        transactions,
        columns.date.is_some(),
    ))
}

fn parse_csv_row(
    record: &StringRecord,
    columns: &HeaderIndex,
    row: usize,
) -> Result<Transaction, DataLoadError> {
    let field = |idx: usize| record.get(idx).unwrap_or("").trim();

    let date = match columns.date {
        Some(idx) => {
            let raw = field(idx);
            let parsed = parse_date_cell(raw).ok_or_else(|| DataLoadError::MalformedCell {
                row,
                column: "Date",
                message: format!("'{raw}' is not a recognised calendar date"),
            })?;
            Some(parsed)
        }
        None => None,
    };

    Ok(Transaction {
        account_type: field(columns.account_type).to_string(),
        region: field(columns.region).to_string(),
        beneficiary: field(columns.beneficiary).to_string(),
        credit: parse_amount(field(columns.credit), row, "Credit")?,
        debit: parse_amount(field(columns.debit), row, "Debit")?,
        date,
    })
}

/// Parse a monetary cell.  Bank exports often carry currency symbols and
/// thousands separators ("$1,234.50"); an empty cell means no flow on that
/// side and parses as zero.
fn parse_amount(raw: &str, row: usize, column: &'static str) -> Result<f64, DataLoadError> {
    let cleaned = raw.replace(['$', ','], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Ok(0.0);
    }

    let value: f64 = cleaned
        .parse()
        .map_err(|_| DataLoadError::MalformedCell {
            row,
            column,
            message: format!("'{raw}' is not a number"),
        })?;

    if !value.is_finite() || value < 0.0 {
        return Err(DataLoadError::MalformedCell {
            row,
            column,
            message: format!("'{raw}' is not a non-negative amount"),
        });
    }
    Ok(value)
}

/// Accepted date shapes: `2023-01-31`, `31/01/2023`, `31 Jan 2023`, and ISO
/// datetimes (time-of-day discarded).
fn parse_date_cell(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%d/%m/%Y") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%d %b %Y") {
        return Some(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    None
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   {
///     "Account Type": "Retail",
///     "Region": "North",
///     "Transaction To": "Apex Bank",
///     "Credit": 1200.0,
///     "Debit": 0.0,
///     "Date": "2023-01-31"
///   },
///   ...
/// ]
/// ```
///
/// The `Date` key is optional, but must then be absent from every row.
fn load_json(path: &Path) -> Result<TransactionSet, DataLoadError> {
    let text = fs::read_to_string(path).map_err(|source| DataLoadError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let root: JsonValue =
        serde_json::from_str(&text).map_err(|e| DataLoadError::Json(e.to_string()))?;

    let records = root
        .as_array()
        .ok_or_else(|| DataLoadError::Json("expected a top-level array of objects".to_string()))?;

    let mut transactions = Vec::with_capacity(records.len());
    let mut dated_rows = 0usize;

    for (row, value) in records.iter().enumerate() {
        let obj = value
            .as_object()
            .ok_or_else(|| DataLoadError::Json(format!("row {row} is not an object")))?;

        let date = match json_field(obj, "Date").filter(|v| !v.is_null()) {
            Some(v) => {
                let raw = v.as_str().ok_or_else(|| DataLoadError::MalformedCell {
                    row,
                    column: "Date",
                    message: "expected a date string".to_string(),
                })?;
                let parsed =
                    parse_date_cell(raw).ok_or_else(|| DataLoadError::MalformedCell {
                        row,
                        column: "Date",
                        message: format!("'{raw}' is not a recognised calendar date"),
                    })?;
                dated_rows += 1;
                Some(parsed)
            }
            None => None,
        };

        transactions.push(Transaction {
            account_type: json_string(obj, row, "Account Type")?,
            region: json_string(obj, row, "Region")?,
            beneficiary: json_string(obj, row, "Transaction To")?,
            credit: json_amount(obj, row, "Credit")?,
            debit: json_amount(obj, row, "Debit")?,
            date,
        });
    }

    if dated_rows > 0 && dated_rows < transactions.len() {
        return Err(DataLoadError::Json(
            "'Date' is present on some rows but not all".to_string(),
        ));
    }

    let has_dates = !transactions.is_empty() && dated_rows == transactions.len();
    Ok(TransactionSet::from_transactions(transactions, has_dates))
}

/// Case-insensitive key lookup, so `"region"` works as well as `"Region"`.
fn json_field<'a>(
    obj: &'a serde_json::Map<String, JsonValue>,
    name: &str,
) -> Option<&'a JsonValue> {
    obj.get(name).or_else(|| {
        obj.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}

fn json_string(
    obj: &serde_json::Map<String, JsonValue>,
    row: usize,
    name: &'static str,
) -> Result<String, DataLoadError> {
    json_field(obj, name)
        .ok_or(DataLoadError::MissingColumn(name))?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DataLoadError::MalformedCell {
            row,
            column: name,
            message: "expected a string".to_string(),
        })
}

fn json_amount(
    obj: &serde_json::Map<String, JsonValue>,
    row: usize,
    name: &'static str,
) -> Result<f64, DataLoadError> {
    let value = json_field(obj, name)
        .ok_or(DataLoadError::MissingColumn(name))?
        .as_f64()
        .ok_or_else(|| DataLoadError::MalformedCell {
            row,
            column: name,
            message: "expected a number".to_string(),
        })?;

    if !value.is_finite() || value < 0.0 {
        return Err(DataLoadError::MalformedCell {
            row,
            column: name,
            message: format!("{value} is not a non-negative amount"),
        });
    }
    Ok(value)
}

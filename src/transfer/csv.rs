//! CSV codec for task lists.
//!
//! One row per task, one column per current-schema field. Scalar arrays are
//! `;`-joined inside a quoted cell, structured values are JSON text, and
//! quotes are escaped by doubling.

use serde_json::{Map, Value};

use crate::board::error::TransferError;
use crate::core::task::Task;

/// Column order of an export. Import reads whatever order the header gives.
pub const COLUMNS: &[&str] = &[
    "id",
    "title",
    "description",
    "notes",
    "date_due",
    "date_captured",
    "date_updated",
    "date_closed",
    "status",
    "tags",
    "priority",
    "section",
    "deleted",
    "version",
    "status_attrib",
    "subtasks",
];

/// Columns whose value is opaque structure, always written as JSON text.
const JSON_COLUMNS: &[&str] = &["subtasks"];
const NUMERIC_COLUMNS: &[&str] = &["priority", "version"];
const NULLABLE_COLUMNS: &[&str] = &[
    "date_due",
    "date_captured",
    "date_updated",
    "date_closed",
    "status_attrib",
];

pub fn export_csv(tasks: &[Task]) -> Result<String, TransferError> {
    let mut out = COLUMNS.join(",");
    out.push('\n');

    for task in tasks {
        let value = serde_json::to_value(task)?;
        let cells: Vec<String> = COLUMNS
            .iter()
            .map(|col| encode_cell(col, value.get(*col).unwrap_or(&Value::Null)))
            .collect::<Result<_, _>>()?;
        out.push_str(&cells.join(","));
        out.push('\n');
    }

    Ok(out)
}

fn encode_cell(column: &str, value: &Value) -> Result<String, TransferError> {
    if JSON_COLUMNS.contains(&column) {
        return Ok(quote(&serde_json::to_string(value)?, true));
    }
    let (text, force_quotes) = match value {
        Value::Null => (String::new(), false),
        Value::String(s) => (s.clone(), false),
        Value::Bool(b) => (b.to_string(), false),
        Value::Number(n) => (n.to_string(), false),
        Value::Array(items) if items.is_empty() => (String::new(), false),
        Value::Array(items) if items.iter().all(Value::is_string) => {
            let joined = items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(";");
            (joined, true)
        }
        other => (serde_json::to_string(other)?, true),
    };
    Ok(quote(&text, force_quotes))
}

fn quote(s: &str, force: bool) -> String {
    if force || s.contains([',', '"', '\n', '\r', ';']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Decode CSV text into raw task records keyed by the header row.
///
/// Any malformed row aborts the whole import.
pub fn import_csv(text: &str) -> Result<Vec<Value>, TransferError> {
    let mut rows = parse_rows(text.trim_start_matches('\u{feff}'))?.into_iter();
    let Some((_, header)) = rows.next() else {
        return Ok(Vec::new());
    };
    let header: Vec<String> = header.into_iter().map(|h| h.trim().to_string()).collect();

    let mut records = Vec::new();
    for (line, cells) in rows {
        if cells.len() == 1 && cells[0].trim().is_empty() {
            continue;
        }
        if cells.len() != header.len() {
            return Err(TransferError::Csv {
                line,
                reason: format!("expected {} fields, found {}", header.len(), cells.len()),
            });
        }
        let mut record = Map::new();
        for (key, cell) in header.iter().zip(cells) {
            record.insert(key.clone(), decode_cell(key, cell, line)?);
        }
        records.push(Value::Object(record));
    }

    Ok(records)
}

fn decode_cell(key: &str, cell: String, line: usize) -> Result<Value, TransferError> {
    match key {
        "tags" => Ok(Value::Array(
            cell.split(';')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| Value::String(t.to_string()))
                .collect(),
        )),
        "subtasks" if cell.trim().is_empty() => Ok(Value::Array(Vec::new())),
        "subtasks" => serde_json::from_str(&cell).map_err(|e| TransferError::Csv {
            line,
            reason: format!("subtasks is not valid JSON: {e}"),
        }),
        "deleted" => Ok(match cell.trim().to_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" | "" => Value::Bool(false),
            _ => Value::String(cell),
        }),
        k if NUMERIC_COLUMNS.contains(&k) => Ok(match cell.trim().parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) if cell.trim().is_empty() => Value::Null,
            Err(_) => Value::String(cell),
        }),
        k if NULLABLE_COLUMNS.contains(&k) && cell.trim().is_empty() => Ok(Value::Null),
        _ => Ok(Value::String(cell)),
    }
}

/// Split CSV text into rows of cells, tracking the line each row starts on.
/// Quoted cells may span lines.
fn parse_rows(text: &str) -> Result<Vec<(usize, Vec<String>)>, TransferError> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_start = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(ch);
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            // Blanks between a separator and the opening quote are dropped.
            '"' if field.trim_start_matches([' ', '\t']).is_empty() => {
                field.clear();
                in_quotes = true;
            }
            '"' => {
                return Err(TransferError::Csv {
                    line,
                    reason: "stray quote inside unquoted field".to_string(),
                });
            }
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                row.push(std::mem::take(&mut field));
                rows.push((row_start, std::mem::take(&mut row)));
                line += 1;
                row_start = line;
            }
            _ => field.push(ch),
        }
    }

    if in_quotes {
        return Err(TransferError::Csv {
            line: row_start,
            reason: "unterminated quoted field".to_string(),
        });
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push((row_start, row));
    }

    Ok(rows)
}

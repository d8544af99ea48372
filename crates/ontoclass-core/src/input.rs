//! Input table readers.
//!
//! App tables carry one record per row. Skill tables carry a serialized list
//! of `{name, description}` objects per row in the `raw_skill` column; that
//! list is either JSON or a Python literal (single quotes, `None`, `True`).

use crate::error::InputError;
use serde::Deserialize;
use std::path::Path;

/// One software application to classify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRecord {
    pub name: String,
    pub tagline: String,
    pub description: String,
}

/// One skill extracted from a `raw_skill` cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillRecord {
    pub name: String,
    pub description: String,
    /// 1-based data row the skill came from
    pub source_row: usize,
}

#[derive(Deserialize)]
struct RawSkill {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

/// Read app records from columns `Name`, `Tagline`, `Description`.
pub fn read_app_records(path: &Path) -> Result<Vec<AppRecord>, InputError> {
    let mut reader = open(path)?;
    let columns = column_indices(&mut reader, path, &["Name", "Tagline", "Description"])?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|source| read_error(path, source))?;
        let cell = |i: usize| row.get(columns[i]).unwrap_or("").to_string();
        records.push(AppRecord {
            name: cell(0),
            tagline: cell(1),
            description: cell(2),
        });
    }
    tracing::debug!(count = records.len(), "Read app records");
    Ok(records)
}

/// Read skill records from the `raw_skill` column.
///
/// A row whose list cannot be parsed is skipped with a warning.
pub fn read_skill_records(path: &Path) -> Result<Vec<SkillRecord>, InputError> {
    let mut reader = open(path)?;
    let columns = column_indices(&mut reader, path, &["raw_skill"])?;

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|source| read_error(path, source))?;
        let cell = row.get(columns[0]).unwrap_or("");
        match parse_skill_list(cell, index + 1) {
            Ok(skills) => records.extend(skills),
            Err(e) => tracing::warn!("{e}; skipping row"),
        }
    }
    tracing::debug!(count = records.len(), "Read skill records");
    Ok(records)
}

/// Parse one `raw_skill` cell into skill records.
pub fn parse_skill_list(cell: &str, row: usize) -> Result<Vec<SkillRecord>, InputError> {
    let raw: Vec<RawSkill> = match serde_json::from_str(cell) {
        Ok(raw) => raw,
        Err(_) => {
            let json = python_literal_to_json(cell)
                .map_err(|message| InputError::SkillList { row, message })?;
            serde_json::from_str(&json).map_err(|e| InputError::SkillList {
                row,
                message: e.to_string(),
            })?
        }
    };

    Ok(raw
        .into_iter()
        .map(|skill| SkillRecord {
            name: skill.name,
            description: skill.description.unwrap_or_default(),
            source_row: row,
        })
        .collect())
}

/// Rewrite a Python literal (lists, dicts, strings, numbers, `None`,
/// `True`, `False`) as JSON text.
fn python_literal_to_json(input: &str) -> Result<String, String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                let mut value = String::new();
                let mut closed = false;
                while let Some(ch) = chars.next() {
                    match ch {
                        '\\' => match chars.next() {
                            Some('n') => value.push('\n'),
                            Some('t') => value.push('\t'),
                            Some('r') => value.push('\r'),
                            Some('x') => value.push(hex_escape(&mut chars, 2)?),
                            Some('u') => value.push(hex_escape(&mut chars, 4)?),
                            Some('U') => value.push(hex_escape(&mut chars, 8)?),
                            Some(other) => value.push(other),
                            None => return Err("unterminated escape".into()),
                        },
                        ch if ch == c => {
                            closed = true;
                            break;
                        }
                        ch => value.push(ch),
                    }
                }
                if !closed {
                    return Err("unterminated string".into());
                }
                out.push_str(&serde_json::Value::String(value).to_string());
            }
            ']' | '}' => {
                // Python allows a trailing comma before a closing bracket
                let trimmed = out.trim_end().len();
                out.truncate(trimmed);
                if out.ends_with(',') {
                    out.pop();
                }
                out.push(c);
            }
            c if c.is_ascii_digit() || c == '-' || c == '.' => {
                let mut literal = String::from(c);
                while let Some(&next) = chars.peek() {
                    let exponent_sign =
                        (next == '+' || next == '-') && literal.ends_with(|ch| ch == 'e' || ch == 'E');
                    if next.is_ascii_alphanumeric() || next == '.' || next == '_' || exponent_sign {
                        literal.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(&number_literal(&literal)?);
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match word.as_str() {
                    "None" => out.push_str("null"),
                    "True" => out.push_str("true"),
                    "False" => out.push_str("false"),
                    other => return Err(format!("unexpected identifier '{other}'")),
                }
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Decode the `digits` hex digits of a `\x`, `\u` or `\U` escape.
fn hex_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    digits: usize,
) -> Result<char, String> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.chars().count() != digits {
        return Err("truncated escape".into());
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("invalid escape '{hex}'"))
}

/// Python number text (`1e5`, `1_000`, `.5`, `3.`) as JSON number text.
fn number_literal(literal: &str) -> Result<String, String> {
    let cleaned = literal.replace('_', "");
    if let Ok(int) = cleaned.parse::<i64>() {
        return Ok(int.to_string());
    }
    cleaned
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(|n| n.to_string())
        .ok_or_else(|| format!("unexpected number '{literal}'"))
}

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>, InputError> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| read_error(path, source))
}

fn column_indices(
    reader: &mut csv::Reader<std::fs::File>,
    path: &Path,
    names: &[&str],
) -> Result<Vec<usize>, InputError> {
    let headers = reader
        .headers()
        .map_err(|source| read_error(path, source))?
        .clone();
    names
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|h| h.trim().trim_start_matches('\u{feff}') == *name)
                .ok_or_else(|| InputError::MissingColumn((*name).to_string()))
        })
        .collect()
}

fn read_error(path: &Path, source: csv::Error) -> InputError {
    InputError::Read {
        path: path.to_path_buf(),
        source,
    }
}

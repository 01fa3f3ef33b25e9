use std::collections::HashMap;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::error::{HaushaltError, Result};
use crate::models::StatementRow;

// ---------------------------------------------------------------------------
// Encoding & delimiter detection
// ---------------------------------------------------------------------------

const DETECT_PREFIX_BYTES: usize = 10_000;
const ENCODING_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Guess the encoding from the first ~10 KB. Low-confidence guesses fall
/// back to UTF-8; `decode` handles the second-stage Windows-1252 fallback.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let prefix = &bytes[..bytes.len().min(DETECT_PREFIX_BYTES)];
    let (charset, confidence, _) = chardet::detect(prefix);
    if confidence < ENCODING_CONFIDENCE_THRESHOLD {
        return "utf-8".to_string();
    }
    chardet::charset2encoding(&charset).to_string()
}

pub fn decode(bytes: &[u8], encoding: &str) -> String {
    let enc = encoding_rs::Encoding::for_label(encoding.as_bytes()).unwrap_or(encoding_rs::UTF_8);
    let (text, _, had_errors) = enc.decode(bytes);
    // Statements from older banking portals are usually Windows-1252 when
    // they are not valid UTF-8.
    if had_errors && enc == encoding_rs::UTF_8 {
        let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
        return text.trim_start_matches('\u{feff}').to_string();
    }
    text.trim_start_matches('\u{feff}').to_string()
}

const DELIMITER_CANDIDATES: [char; 4] = [';', ',', '\t', '|'];

/// Count candidate delimiters over the first 5 lines; most frequent wins,
/// semicolon when nothing is found.
pub fn detect_delimiter(lines: &[&str]) -> char {
    let mut best = ';';
    let mut best_count = 0usize;
    for cand in DELIMITER_CANDIDATES {
        let count: usize = lines.iter().take(5).map(|l| l.matches(cand).count()).sum();
        if count > best_count {
            best = cand;
            best_count = count;
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Header & own-account detection
// ---------------------------------------------------------------------------

const HEADER_KEYWORDS: [&str; 10] = [
    "buchungsdatum",
    "datum",
    "betrag",
    "empf\u{e4}nger",
    "verwendungszweck",
    "date",
    "amount",
    "payee",
    "description",
    "transaction",
];

/// The header row is the first line containing at least two header keywords.
/// Bank exports put free-form metadata above it.
pub fn find_header_row(lines: &[&str]) -> Option<usize> {
    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        let hits = HEADER_KEYWORDS.iter().filter(|k| lower.contains(*k)).count();
        if hits >= 2 {
            return Some(i);
        }
    }
    None
}

const ACCOUNT_KEYWORDS: [&str; 4] = ["girokonto", "iban", "kontonummer", "account"];

fn iban_pattern() -> Regex {
    Regex::new(r"[A-Z]{2}[0-9]{2}[A-Z0-9]{4,30}").unwrap()
}

/// Scan the preamble (first 20 lines) for the statement's own account
/// identifier, e.g. "Girokonto;DE89370400440532013000".
pub fn find_own_iban(lines: &[&str]) -> Option<String> {
    let pattern = iban_pattern();
    for line in lines.iter().take(20) {
        let lower = line.to_lowercase();
        if !ACCOUNT_KEYWORDS.iter().any(|k| lower.contains(k)) {
            continue;
        }
        let upper = line.to_uppercase();
        if let Some(m) = pattern.find(&upper) {
            return Some(m.as_str().to_string());
        }
        // "IBAN: DE..." with the token after a separator
        if let Some(idx) = line.find(|c| c == ':' || c == ';' || c == '=') {
            let candidate = line[idx + 1..]
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .to_uppercase();
            if let Some(m) = pattern.find(&candidate) {
                if m.start() == 0 {
                    return Some(m.as_str().to_string());
                }
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Date,
    Amount,
    Payee,
    Memo,
    CounterIban,
    TxType,
    Account,
}

const ALL_FIELDS: [Field; 7] = [
    Field::Date,
    Field::Amount,
    Field::Payee,
    Field::Memo,
    Field::CounterIban,
    Field::TxType,
    Field::Account,
];

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Amount => "amount",
            Field::Payee => "payee",
            Field::Memo => "memo",
            Field::CounterIban => "counter_iban",
            Field::TxType => "type",
            Field::Account => "account",
        }
    }
}

/// Header synonyms of German bank exports (Comdirect, ING, Sparkasse, DKB...).
fn standard_synonyms(field: Field) -> &'static [&'static str] {
    match field {
        Field::Date => &[
            "Buchungsdatum",
            "Datum",
            "Buchungstag",
            "Wertstellung",
            "Wertstellungsdatum",
            "Valutadatum",
            "Date",
        ],
        Field::Amount => &[
            "Betrag (\u{20ac})",
            "Betrag",
            "Umsatz",
            "Amount",
            "Betrag in EUR",
            "Betrag in \u{20ac}",
        ],
        Field::Payee => &[
            "Zahlungsempf\u{e4}nger*in",
            "Zahlungsempf\u{e4}nger",
            "Empf\u{e4}nger",
            "Empf\u{e4}nger*in",
            "Zahlungsempf\u{e4}nger/in",
            "Name",
            "Auftraggeber",
            "Beg\u{fc}nstigter",
        ],
        Field::Memo => &[
            "Verwendungszweck",
            "Verwendungszweck/Zweck",
            "Zweck",
            "Buchungstext",
            "Buchungstext/Verwendungszweck",
            "Text",
            "Bemerkung",
            "Notiz",
        ],
        Field::CounterIban => &[
            "IBAN",
            "Gegenkonto",
            "Kontonummer",
            "Empf\u{e4}nger IBAN",
            "Zahlungsempf\u{e4}nger IBAN",
        ],
        Field::TxType => &[
            "Umsatztyp",
            "Art",
            "Typ",
            "Transaction Type",
            "Buchungsart",
            "Transaktionstyp",
        ],
        Field::Account => &["Konto", "Kontonummer", "Von Konto", "Eigenes Konto"],
    }
}

/// Fallback synonyms for English-language exports.
fn alternative_synonyms(field: Field) -> &'static [&'static str] {
    match field {
        Field::Date => &["Transaction Date", "Date", "Datum", "Buchungsdatum"],
        Field::Amount => &["Amount", "Betrag", "Umsatz", "Value"],
        Field::Payee => &["Payee", "Recipient", "Name", "Description", "Payee Name"],
        Field::Memo => &["Description", "Memo", "Note", "Reference", "Details"],
        Field::CounterIban => &["Account", "Account Number", "IBAN"],
        Field::TxType => &["Type", "Category", "Transaction Type"],
        Field::Account => &["Account", "From Account"],
    }
}

#[derive(Debug, Clone)]
pub struct MappedColumn {
    pub header: String,
    pub index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: HashMap<Field, MappedColumn>,
}

impl ColumnMap {
    pub fn get(&self, field: Field) -> Option<&MappedColumn> {
        self.columns.get(&field)
    }

    pub fn value<'r>(&self, field: Field, record: &'r csv::StringRecord) -> Option<&'r str> {
        self.get(field).and_then(|col| record.get(col.index))
    }
}

/// Resolve each semantic field against the actual headers: the German
/// synonym set first, then the English one; per synonym an exact
/// case-insensitive match beats a substring match in either direction.
/// The first match per field wins.
pub fn map_columns(headers: &csv::StringRecord) -> ColumnMap {
    let lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let mut columns = HashMap::new();

    for synonym_set in [standard_synonyms, alternative_synonyms] {
        for field in ALL_FIELDS {
            if columns.contains_key(&field) {
                continue;
            }
            'synonyms: for synonym in synonym_set(field) {
                let s = synonym.to_lowercase();
                if let Some(i) = lower.iter().position(|h| *h == s) {
                    columns.insert(field, mapped(headers, i));
                    break 'synonyms;
                }
                let substring = lower
                    .iter()
                    .position(|h| !h.is_empty() && (h.contains(&s) || s.contains(h.as_str())));
                if let Some(i) = substring {
                    columns.insert(field, mapped(headers, i));
                    break 'synonyms;
                }
            }
        }
    }

    ColumnMap { columns }
}

fn mapped(headers: &csv::StringRecord, index: usize) -> MappedColumn {
    MappedColumn {
        header: headers.get(index).unwrap_or("").trim().to_string(),
        index,
    }
}

// ---------------------------------------------------------------------------
// Field normalizers
// ---------------------------------------------------------------------------

const DATE_FORMATS: [&str; 8] = [
    "%d.%m.%Y",
    "%d.%m.%y",
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d/%m/%y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d-%m-%y",
];

/// Try the known date formats in order. `None` means "no date": the row is
/// skipped by the extractor, it is not a file-level error.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS.iter().find_map(|fmt| {
        let date = NaiveDate::parse_from_str(raw, fmt).ok()?;
        // chrono accepts "24" for %Y; two-digit years belong to the %y formats
        if fmt.contains("%Y") && date.year() < 1000 {
            return None;
        }
        Some(date)
    })
}

/// Lenient amount parsing: unparsable input is 0.0. Callers that need to
/// distinguish "bad value" from "zero" use `parse_amount_strict`.
pub fn parse_amount(raw: &str) -> f64 {
    parse_amount_strict(raw).unwrap_or(0.0)
}

/// `None` means the value was present but not numeric; empty input is 0.0.
/// Handles "1.234,56", "1,234.56", "-85,40", "(12.00)", "€ 45,90".
pub fn parse_amount_strict(raw: &str) -> Option<f64> {
    let s: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '\u{20ac}' | '$' | '\u{a3}' | ' '))
        .collect();
    if s.is_empty() {
        return Some(0.0);
    }

    let negative = s.starts_with('-') || s.starts_with('(');
    let s = s
        .trim_start_matches(|c| c == '-' || c == '(')
        .trim_end_matches(')');

    let cleaned = match (s.rfind(','), s.rfind('.')) {
        // Both present: whichever comes later is the decimal separator.
        (Some(comma), Some(dot)) => {
            if comma > dot {
                s.replace('.', "").replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        // Lone comma: decimal separator only with 1-2 digits after it,
        // otherwise a thousands separator ("1,234").
        (Some(comma), None) => {
            let fraction = s.len() - comma - 1;
            if s.matches(',').count() == 1 && (1..=2).contains(&fraction) {
                s.replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        // Lone dot is always decimal.
        _ => s.to_string(),
    };

    let value: f64 = cleaned.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Collapse all runs of whitespace to single spaces.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// ATM withdrawals carry verbose type strings; everything else keeps its
/// first token ("Lastschrift Einzug" -> "Lastschrift").
pub fn normalize_tx_type(raw: &str) -> String {
    if raw.to_lowercase().contains("geldautomat") {
        return "Geldautomat".to_string();
    }
    raw.split_whitespace().next().unwrap_or("").to_string()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Split a signed amount into (debit, credit): negative amounts are debits
/// (Soll), everything else is a credit (Haben).
pub fn split_amount(amount: f64) -> (f64, f64) {
    if amount < 0.0 {
        (round2(-amount), 0.0)
    } else {
        (0.0, round2(amount))
    }
}

// ---------------------------------------------------------------------------
// Statement parsing
// ---------------------------------------------------------------------------

/// Per-file state produced by detection and mapping, fixed for the rest of
/// the file's processing.
#[derive(Debug, Clone)]
pub struct ParseContext {
    pub encoding: String,
    pub delimiter: char,
    pub header_row: usize,
    pub columns: ColumnMap,
    pub own_iban: Option<String>,
}

#[derive(Debug)]
pub struct Statement {
    pub context: ParseContext,
    pub rows: Vec<StatementRow>,
    /// Rows without a parseable date (plus unreadable records).
    pub skipped_rows: usize,
    /// Amounts that fell back to 0.0 because the raw value was not numeric.
    pub amount_warnings: usize,
}

pub fn file_label(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string()
}

pub fn parse_statement(path: &Path) -> Result<Statement> {
    let bytes = std::fs::read(path)?;
    parse_bytes(&bytes, &file_label(path))
}

pub fn parse_bytes(bytes: &[u8], name: &str) -> Result<Statement> {
    let encoding = detect_encoding(bytes);
    let text = decode(bytes, &encoding);
    let lines: Vec<&str> = text.lines().collect();

    let delimiter = detect_delimiter(&lines);
    let own_iban = find_own_iban(&lines);
    let header_row = find_header_row(&lines)
        .ok_or_else(|| HaushaltError::HeaderNotFound(name.to_string()))?;

    // Everything from the header line on is tabular data.
    let body = lines[header_row..].join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = map_columns(&headers);
    for field in [Field::Date, Field::Amount] {
        if columns.get(field).is_none() {
            return Err(HaushaltError::MissingColumn {
                file: name.to_string(),
                column: field.name(),
            });
        }
    }

    let mut rows = Vec::new();
    let mut skipped_rows = 0usize;
    let mut amount_warnings = 0usize;

    for record in reader.records() {
        let Ok(record) = record else {
            skipped_rows += 1;
            continue;
        };

        let date = match columns.value(Field::Date, &record).and_then(parse_date) {
            Some(d) => d,
            None => {
                skipped_rows += 1;
                continue;
            }
        };

        let raw_amount = columns.value(Field::Amount, &record).unwrap_or("");
        let amount = match parse_amount_strict(raw_amount) {
            Some(v) => v,
            None => {
                amount_warnings += 1;
                0.0
            }
        };
        let (debit, credit) = split_amount(amount);

        let payee = columns.value(Field::Payee, &record).unwrap_or("");
        let memo = columns.value(Field::Memo, &record).unwrap_or("");
        let description = normalize_text(&format!("{payee} {memo}"));

        let tx_type = normalize_tx_type(columns.value(Field::TxType, &record).unwrap_or(""));
        let counter_iban = columns
            .value(Field::CounterIban, &record)
            .unwrap_or("")
            .trim()
            .to_string();
        let account = match columns.value(Field::Account, &record) {
            Some(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => own_iban.clone().unwrap_or_default(),
        };

        rows.push(StatementRow {
            date,
            tx_type,
            description,
            debit,
            credit,
            account,
            counter_iban,
        });
    }

    Ok(Statement {
        context: ParseContext {
            encoding,
            delimiter,
            header_row,
            columns,
            own_iban,
        },
        rows,
        skipped_rows,
        amount_warnings,
    })
}

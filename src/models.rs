use chrono::NaiveDate;

/// Canonical booking record as stored in the `transactions` table.
/// Debit (Soll) and credit (Haben) are both non-negative; exactly one of
/// them is nonzero for any row produced by the importer.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Option<i64>,
    /// ISO date (YYYY-MM-DD), the storage format.
    pub date: String,
    pub tx_type: String,
    pub description: String,
    pub debit: f64,
    pub credit: f64,
    pub category: String,
    pub subcategory: Option<String>,
    pub account: String,
    pub counter_iban: String,
    pub manually_edited: bool,
}

/// A keyword -> category rule. Keywords are unique; rule precedence is
/// insertion order (lowest id wins when several keywords match).
#[derive(Debug, Clone)]
pub struct KeywordRule {
    pub id: Option<i64>,
    pub keyword: String,
    pub category: String,
}

/// Intermediate representation of one statement row after column mapping
/// and normalization, before categorization and DB insert.
#[derive(Debug, Clone)]
pub struct StatementRow {
    pub date: NaiveDate,
    pub tx_type: String,
    pub description: String,
    pub debit: f64,
    pub credit: f64,
    pub account: String,
    pub counter_iban: String,
}

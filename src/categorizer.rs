use regex::Regex;
use rusqlite::Connection;

use crate::error::Result;
use crate::models::KeywordRule;
use crate::parser::normalize_text;

/// Whole-word keyword matcher, compiled once per batch. Rules keep their
/// insertion order; the first matching keyword wins.
pub struct Categorizer {
    rules: Vec<(Regex, String)>,
    fallback: String,
}

impl Categorizer {
    pub fn new(rules: &[KeywordRule], fallback: &str) -> Self {
        let compiled = rules
            .iter()
            .filter_map(|rule| {
                let pattern = format!(r"\b{}\b", regex::escape(&rule.keyword.to_lowercase()));
                Regex::new(&pattern)
                    .ok()
                    .map(|re| (re, rule.category.clone()))
            })
            .collect();
        Self {
            rules: compiled,
            fallback: fallback.to_string(),
        }
    }

    pub fn from_db(conn: &Connection, fallback: &str) -> Result<Self> {
        Ok(Self::new(&load_rules(conn)?, fallback))
    }

    /// Case-insensitive whole-word match: "miete" matches "Miete Januar"
    /// but not "Vermieter".
    pub fn categorize(&self, description: &str) -> String {
        let haystack = description.to_lowercase();
        for (re, category) in &self.rules {
            if re.is_match(&haystack) {
                return category.clone();
            }
        }
        self.fallback.clone()
    }
}

pub fn load_rules(conn: &Connection) -> Result<Vec<KeywordRule>> {
    let mut stmt = conn.prepare("SELECT id, keyword, category FROM keyword_rules ORDER BY id")?;
    let rules = stmt
        .query_map([], |row| {
            Ok(KeywordRule {
                id: Some(row.get(0)?),
                keyword: row.get(1)?,
                category: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rules)
}

pub struct ResyncResult {
    pub updated: usize,
    pub unchanged: usize,
    pub skipped_manual: usize,
}

/// Re-run the categorizer over the stored ledger. Rows with the
/// manually_edited flag set are never touched.
pub fn resync_categories(conn: &Connection, categorizer: &Categorizer) -> Result<ResyncResult> {
    let mut stmt =
        conn.prepare("SELECT id, description, category FROM transactions WHERE manually_edited = 0")?;
    let rows: Vec<(i64, String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut updated = 0usize;
    let mut unchanged = 0usize;
    for (id, description, current) in &rows {
        let category = categorizer.categorize(&normalize_text(description));
        if category != *current {
            conn.execute(
                "UPDATE transactions SET category = ?1 WHERE id = ?2",
                rusqlite::params![category, id],
            )?;
            updated += 1;
        } else {
            unchanged += 1;
        }
    }

    let skipped_manual: i64 = conn.query_row(
        "SELECT count(*) FROM transactions WHERE manually_edited = 1",
        [],
        |r| r.get(0),
    )?;

    Ok(ResyncResult {
        updated,
        unchanged,
        skipped_manual: skipped_manual as usize,
    })
}

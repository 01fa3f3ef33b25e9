use std::path::{Path, PathBuf};

use colored::Colorize;
use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::categorizer::Categorizer;
use crate::db::is_unique_violation;
use crate::error::Result;
use crate::models::StatementRow;
use crate::parser::{file_label, parse_statement};

#[derive(Debug)]
pub struct FileReport {
    pub file: String,
    pub imported: usize,
    pub skipped: usize,
    /// Rows without a parseable date.
    pub errors: usize,
    pub amount_warnings: usize,
}

pub struct InboxReport {
    pub files: Vec<FileReport>,
    pub failed: usize,
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn signature_exists(conn: &Connection, date: &str, row: &StatementRow) -> Result<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT 1 FROM transactions \
         WHERE date = ?1 AND description = ?2 AND debit = ?3 AND credit = ?4 \
         AND account = ?5 AND counter_iban = ?6",
    )?;
    Ok(stmt.exists(rusqlite::params![
        date,
        row.description,
        row.debit,
        row.credit,
        row.account,
        row.counter_iban
    ])?)
}

/// Import a single statement file. All accepted rows of a file commit
/// together or not at all; duplicates (by signature) are skipped and
/// counted, never an error.
pub fn import_file(
    conn: &mut Connection,
    file_path: &Path,
    categorizer: &Categorizer,
) -> Result<FileReport> {
    let statement = parse_statement(file_path)?;
    let checksum = compute_checksum(file_path)?;

    let tx = conn.transaction()?;
    let mut imported = 0usize;
    let mut skipped = 0usize;

    for row in &statement.rows {
        let date = row.date.format("%Y-%m-%d").to_string();
        if signature_exists(&tx, &date, row)? {
            skipped += 1;
            continue;
        }
        let category = categorizer.categorize(&row.description);
        let result = tx.execute(
            "INSERT INTO transactions \
             (date, tx_type, description, debit, credit, category, account, counter_iban) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                date,
                row.tx_type,
                row.description,
                row.debit,
                row.credit,
                category,
                row.account,
                row.counter_iban
            ],
        );
        match result {
            Ok(_) => imported += 1,
            // the unique signature index is authoritative
            Err(e) if is_unique_violation(&e) => skipped += 1,
            Err(e) => return Err(e.into()),
        }
    }

    tx.execute(
        "INSERT INTO imports (filename, record_count, imported_count, skipped_count, error_count, checksum) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            file_label(file_path),
            statement.rows.len() as i64,
            imported as i64,
            skipped as i64,
            statement.skipped_rows as i64,
            checksum
        ],
    )?;
    tx.commit()?;

    Ok(FileReport {
        file: file_label(file_path),
        imported,
        skipped,
        errors: statement.skipped_rows,
        amount_warnings: statement.amount_warnings,
    })
}

fn inbox_files(inbox: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(inbox)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

fn finish_file(file_path: &Path, inbox: &Path, archive: bool) -> Result<()> {
    if archive {
        let archive_dir = inbox.join("imported");
        std::fs::create_dir_all(&archive_dir)?;
        let target = archive_dir.join(file_path.file_name().unwrap_or_default());
        std::fs::rename(file_path, target)?;
    } else {
        std::fs::remove_file(file_path)?;
    }
    Ok(())
}

/// Process every *.csv in the inbox, sequentially. A failed file is
/// reported and left in place for manual inspection; the run continues
/// with the next one.
pub fn import_inbox(
    conn: &mut Connection,
    inbox: &Path,
    archive: bool,
    categorizer: &Categorizer,
) -> Result<InboxReport> {
    let mut files = Vec::new();
    let mut failed = 0usize;

    for path in inbox_files(inbox)? {
        match import_file(conn, &path, categorizer) {
            Ok(report) => {
                println!(
                    "{} {}: {} imported, {} skipped, {} rows without date",
                    "ok".green().bold(),
                    report.file,
                    report.imported,
                    report.skipped,
                    report.errors
                );
                if report.amount_warnings > 0 {
                    eprintln!(
                        "{} {}: {} amounts could not be parsed and were stored as 0.00",
                        "warn".yellow().bold(),
                        report.file,
                        report.amount_warnings
                    );
                }
                finish_file(&path, inbox, archive)?;
                files.push(report);
            }
            Err(e) => {
                eprintln!("{} {}: {e}", "error".red().bold(), file_label(&path));
                failed += 1;
            }
        }
    }

    Ok(InboxReport { files, failed })
}

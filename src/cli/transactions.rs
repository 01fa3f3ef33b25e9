use comfy_table::{Cell, Table};

use crate::categorizer::Categorizer;
use crate::db::{get_connection, is_unique_violation};
use crate::error::{HaushaltError, Result};
use crate::fmt::money;
use crate::models::Transaction;
use crate::parser::{normalize_text, parse_amount_strict, parse_date, split_amount};
use crate::settings::load_settings;

pub fn add(
    date: &str,
    amount: &str,
    description: &str,
    category: Option<&str>,
    account: Option<&str>,
) -> Result<()> {
    let settings = load_settings();
    let conn = get_connection(&settings.db_path())?;

    let date = parse_date(date)
        .ok_or_else(|| HaushaltError::Other(format!("'{date}' is not a recognized date")))?;
    let amount = parse_amount_strict(amount)
        .ok_or_else(|| HaushaltError::Other(format!("'{amount}' is not a recognized amount")))?;
    let (debit, credit) = split_amount(amount);
    let description = normalize_text(description);

    let category = match category {
        Some(c) => c.to_string(),
        None => Categorizer::from_db(&conn, &settings.fallback_category)?.categorize(&description),
    };

    let result = conn.execute(
        "INSERT INTO transactions (date, description, debit, credit, category, account) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            date.format("%Y-%m-%d").to_string(),
            description,
            debit,
            credit,
            category,
            account.unwrap_or("")
        ],
    );
    match result {
        Ok(_) => {
            println!("Added: {} {} ({category})", date.format("%d.%m.%Y"), money(credit - debit));
            Ok(())
        }
        Err(e) if is_unique_violation(&e) => Err(HaushaltError::Other(
            "An identical transaction already exists".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

pub fn list(month: Option<&str>, category: Option<&str>, limit: usize) -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;

    let mut sql = String::from(
        "SELECT id, date, tx_type, description, debit, credit, category, subcategory, \
         account, counter_iban, manually_edited FROM transactions WHERE 1=1",
    );
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    if let Some(month) = month {
        sql.push_str(" AND date LIKE ?");
        params.push(Box::new(format!("{month}%")));
    }
    if let Some(category) = category {
        sql.push_str(" AND category = ?");
        params.push(Box::new(category.to_string()));
    }
    sql.push_str(" ORDER BY date DESC, id DESC LIMIT ?");
    params.push(Box::new(limit as i64));

    let mut stmt = conn.prepare(&sql)?;
    let rows: Vec<Transaction> = stmt
        .query_map(
            rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
            |row| {
                Ok(Transaction {
                    id: Some(row.get(0)?),
                    date: row.get(1)?,
                    tx_type: row.get(2)?,
                    description: row.get(3)?,
                    debit: row.get(4)?,
                    credit: row.get(5)?,
                    category: row.get(6)?,
                    subcategory: row.get(7)?,
                    account: row.get(8)?,
                    counter_iban: row.get(9)?,
                    manually_edited: row.get(10)?,
                })
            },
        )?
        .filter_map(|r| r.ok())
        .collect();

    let mut table = Table::new();
    table.set_header(vec![
        "ID",
        "Datum",
        "Beschreibung",
        "Soll",
        "Haben",
        "Kategorie",
        "Unterkategorie",
        "Konto",
        "",
    ]);
    for t in rows {
        table.add_row(vec![
            Cell::new(t.id.unwrap_or_default()),
            Cell::new(t.date),
            Cell::new(t.description),
            Cell::new(if t.debit != 0.0 { money(t.debit) } else { String::new() }),
            Cell::new(if t.credit != 0.0 { money(t.credit) } else { String::new() }),
            Cell::new(t.category),
            Cell::new(t.subcategory.unwrap_or_default()),
            Cell::new(t.account),
            Cell::new(if t.manually_edited { "edited" } else { "" }),
        ]);
    }
    println!("Transactions\n{table}");
    Ok(())
}

pub fn edit(
    id: i64,
    category: Option<&str>,
    subcategory: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;

    let exists: bool = conn
        .prepare("SELECT 1 FROM transactions WHERE id = ?1")?
        .exists([id])?;
    if !exists {
        return Err(HaushaltError::Other(format!("No transaction with ID {id}")));
    }
    if category.is_none() && subcategory.is_none() && description.is_none() {
        return Err(HaushaltError::Other(
            "Nothing to change: pass --category, --subcategory or --description".to_string(),
        ));
    }

    if let Some(category) = category {
        conn.execute(
            "UPDATE transactions SET category = ?1 WHERE id = ?2",
            rusqlite::params![category, id],
        )?;
    }
    if let Some(subcategory) = subcategory {
        conn.execute(
            "UPDATE transactions SET subcategory = ?1 WHERE id = ?2",
            rusqlite::params![subcategory, id],
        )?;
    }
    if let Some(description) = description {
        conn.execute(
            "UPDATE transactions SET description = ?1 WHERE id = ?2",
            rusqlite::params![normalize_text(description), id],
        )?;
    }
    // manual edits are shielded from category re-sync
    conn.execute(
        "UPDATE transactions SET manually_edited = 1 WHERE id = ?1",
        [id],
    )?;

    println!("Updated transaction {id}");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;
    let affected = conn.execute("DELETE FROM transactions WHERE id = ?1", [id])?;
    if affected == 0 {
        return Err(HaushaltError::Other(format!("No transaction with ID {id}")));
    }
    println!("Deleted transaction {id}");
    Ok(())
}

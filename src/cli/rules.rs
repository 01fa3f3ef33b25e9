use comfy_table::{Cell, Table};

use crate::db::{get_connection, is_unique_violation};
use crate::error::{HaushaltError, Result};
use crate::settings::load_settings;

pub fn add(keyword: &str, category: &str) -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;

    let result = conn.execute(
        "INSERT INTO keyword_rules (keyword, category) VALUES (?1, ?2)",
        rusqlite::params![keyword, category],
    );
    match result {
        Ok(_) => {
            println!("Added rule: '{keyword}' \u{2192} {category}");
            Ok(())
        }
        Err(e) if is_unique_violation(&e) => Err(HaushaltError::Other(format!(
            "A rule for keyword '{keyword}' already exists"
        ))),
        Err(e) => Err(e.into()),
    }
}

pub fn list() -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;
    let mut stmt =
        conn.prepare("SELECT id, keyword, category FROM keyword_rules ORDER BY id")?;
    let rows: Vec<(i64, String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .filter_map(|r| r.ok())
        .collect();

    let mut table = Table::new();
    table.set_header(vec!["ID", "Keyword", "Category"]);
    for (id, keyword, category) in rows {
        table.add_row(vec![Cell::new(id), Cell::new(keyword), Cell::new(category)]);
    }
    println!("Rules\n{table}");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = get_connection(&load_settings().db_path())?;

    let row: std::result::Result<(String, String), _> = conn.query_row(
        "SELECT keyword, category FROM keyword_rules WHERE id = ?1",
        [id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    );

    match row {
        Err(_) => Err(HaushaltError::Other(format!("No rule with ID {id}"))),
        Ok((keyword, category)) => {
            conn.execute("DELETE FROM keyword_rules WHERE id = ?1", [id])?;
            println!("Deleted rule {id}: '{keyword}' \u{2192} {category}");
            Ok(())
        }
    }
}

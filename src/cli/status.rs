use crate::db::get_connection;
use crate::error::Result;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Inbox:      {}", settings.inbox_path().display());
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let conn = get_connection(&db_path)?;

        let transactions: i64 =
            conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))?;
        let manual: i64 = conn.query_row(
            "SELECT count(*) FROM transactions WHERE manually_edited = 1",
            [],
            |r| r.get(0),
        )?;
        let rules: i64 = conn.query_row("SELECT count(*) FROM keyword_rules", [], |r| r.get(0))?;
        let imports: i64 = conn.query_row("SELECT count(*) FROM imports", [], |r| r.get(0))?;
        let last_import: Option<String> = conn
            .query_row(
                "SELECT import_date FROM imports ORDER BY id DESC LIMIT 1",
                [],
                |r| r.get(0),
            )
            .unwrap_or(None);

        println!();
        println!("Transactions:     {transactions}");
        println!("Manually edited:  {manual}");
        println!("Keyword rules:    {rules}");
        println!("Imported files:   {imports}");
        if let Some(last) = last_import {
            println!("Last import:      {last}");
        }
    } else {
        println!();
        println!("Database not found. Run `haushalt init` to set up.");
    }

    Ok(())
}

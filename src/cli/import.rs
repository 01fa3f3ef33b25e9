use std::path::PathBuf;

use crate::categorizer::Categorizer;
use crate::db::get_connection;
use crate::error::Result;
use crate::importer::{import_file, import_inbox};
use crate::settings::load_settings;

pub fn run(file: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let mut conn = get_connection(&settings.db_path())?;
    let categorizer = Categorizer::from_db(&conn, &settings.fallback_category)?;

    match file {
        Some(file) => {
            // explicit files are not moved or deleted
            let report = import_file(&mut conn, &PathBuf::from(file), &categorizer)?;
            println!(
                "{} imported, {} skipped (duplicates), {} rows without date",
                report.imported, report.skipped, report.errors
            );
            if report.amount_warnings > 0 {
                eprintln!(
                    "{} amounts could not be parsed and were stored as 0.00",
                    report.amount_warnings
                );
            }
        }
        None => {
            let inbox = settings.inbox_path();
            let report = import_inbox(
                &mut conn,
                &inbox,
                settings.archive_imported,
                &categorizer,
            )?;
            let imported: usize = report.files.iter().map(|f| f.imported).sum();
            let skipped: usize = report.files.iter().map(|f| f.skipped).sum();
            println!(
                "{} file(s) processed: {} imported, {} skipped",
                report.files.len(),
                imported,
                skipped
            );
            if report.failed > 0 {
                println!("{} file(s) failed and were left in {}", report.failed, inbox.display());
            }
        }
    }

    Ok(())
}

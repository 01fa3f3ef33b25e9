use crate::categorizer::{resync_categories, Categorizer};
use crate::db::get_connection;
use crate::error::Result;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let conn = get_connection(&settings.db_path())?;
    let categorizer = Categorizer::from_db(&conn, &settings.fallback_category)?;
    let result = resync_categories(&conn, &categorizer)?;
    println!(
        "{} updated, {} unchanged, {} manually edited rows untouched",
        result.updated, result.unchanged, result.skipped_manual
    );
    Ok(())
}

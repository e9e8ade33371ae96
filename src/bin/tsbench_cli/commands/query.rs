use anyhow::Result;

use crate::context::Context;

/// Run a query against a database of the store
pub fn execute(context: &mut Context, database: &str, query: &str) -> Result<()> {
    let records = context.bench()?.query(database, query)?;

    let formatted = context.formatter().format_records(&records)?;
    println!("{}", formatted);

    Ok(())
}

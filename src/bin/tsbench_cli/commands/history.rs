use anyhow::Result;

use crate::context::Context;
use crate::utils::error::CliError;

/// Print the averages of past runs
pub fn execute(context: &mut Context, report_db: Option<&str>) -> Result<()> {
    let database = report_db
        .map(str::to_string)
        .unwrap_or_else(|| context.base_config().report_database.clone());

    let history = context.bench()?.past_averages(&database).map_err(CliError::from)?;

    let formatted = context.formatter().format_history(history.as_ref())?;
    println!("{}", formatted);

    Ok(())
}

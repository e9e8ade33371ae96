use anyhow::Result;
use log::info;

use crate::client::BenchClient;
use crate::context::Context;

/// Ask a tsbench server to run a benchmark and print the report
pub fn execute(context: &mut Context, url: &str, points: Option<usize>, batch_sizes: Option<&str>) -> Result<()> {
    let client = BenchClient::new(url);

    let report = context.runtime().block_on(async {
        client.check_connection().await?;
        info!("Connected to {}", url);
        client.fetch_report(points, batch_sizes).await
    })?;

    let formatted = context.formatter().format_report(&report)?;
    println!("{}", formatted);

    Ok(())
}

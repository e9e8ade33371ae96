mod app;
mod context;
mod commands;
mod formatters;
mod utils;
mod client;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}

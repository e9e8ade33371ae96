use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Cannot reach server: {0}")]
    Connection(String),

    #[error("Benchmark failed: {0}")]
    Bench(#[from] tsbench::BenchError),
}

pub mod run;
pub mod history;
pub mod query;
pub mod remote;

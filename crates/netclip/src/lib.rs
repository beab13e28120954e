#![forbid(unsafe_code)]

mod cli;
pub mod client;
pub mod config;
pub mod credentials;
pub mod input;
mod logging;

pub use cli::{Outcome, VERSION, run};

pub mod arena;
pub mod builder;
pub mod chooser;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exitcode;
pub mod ops;
pub mod session;
pub mod ui;
pub mod util;

pub mod brew;
pub mod config;
pub mod taste;

pub mod config;
pub mod extract;
pub mod info;
pub mod worker;

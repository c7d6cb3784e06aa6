pub mod bot;
pub mod config;
pub mod counter;
pub mod platform;
pub mod rate_limit;
pub mod tests;
pub mod tickets;
pub mod transcript;

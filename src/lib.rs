pub mod config;
pub mod credentials;
pub mod display;
pub mod fallback;
pub mod form;
pub mod manager;
pub mod models;
pub mod repository;
pub mod stats;
pub mod store;
pub mod use_cases;

#[cfg(test)]
mod test_support;

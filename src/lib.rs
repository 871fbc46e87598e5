// Library exports for the binary and integration tests
pub mod calendar;
pub mod config;
pub mod door;
pub mod error;
pub mod history;
pub mod logging;
pub mod monitor;
pub mod renderer;
pub mod report;
pub mod store;
pub mod summary;
pub mod timefmt;

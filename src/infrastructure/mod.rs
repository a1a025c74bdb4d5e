pub mod backoff;
pub mod db;
pub mod event_bus;
pub mod logging;

pub mod clock;
pub mod config;
pub mod day;
pub mod error;
pub mod model;
pub mod storage;
pub mod task_store;
pub mod timeline;

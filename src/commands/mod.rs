pub mod bucket;
pub mod config_stats;
pub mod evaluate;
pub mod truncate;

pub mod config;
pub mod html_table;
pub mod http_client;
pub mod logging;
pub mod mapping;
pub mod merge;
pub mod normalize;
pub mod penalty;
pub mod pipeline;
pub mod retry;
pub mod roster;
pub mod scrape;
pub mod stats;
pub mod table;

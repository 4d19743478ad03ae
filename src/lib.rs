pub mod attendance;
pub mod config;
pub mod discover;
pub mod error;
pub mod marker;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod table;

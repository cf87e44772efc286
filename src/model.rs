pub mod feed_game;
pub mod game;
pub mod schedule;
pub mod sync_log;

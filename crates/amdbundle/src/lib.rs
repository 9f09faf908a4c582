pub mod app;
pub mod domain;
pub mod infra;
pub mod ui;

pub fn init(level: tracing_subscriber::filter::LevelFilter) {
    infra::logging::init(level);
}

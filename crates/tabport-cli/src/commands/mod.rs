pub mod dispatch;
pub mod export;
pub mod export_config;
pub mod import;
pub mod maintenance;
pub mod tables;

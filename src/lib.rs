pub mod api;
pub mod app;
pub mod config;
pub mod export;
pub mod pipeline;
pub mod services;
pub mod session;
pub mod workbook;

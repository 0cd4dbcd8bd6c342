pub mod api;
pub mod app;
pub mod aqi;
pub mod config;
pub mod countries;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod location;
pub mod logging;
pub mod models;
pub mod ui;

pub mod actions;
pub mod api;
pub mod assets;
pub mod config;
pub mod duration;
pub mod models;
pub mod notifications;
pub mod portfolio;
pub mod prices;
pub mod state;
pub mod tasks;

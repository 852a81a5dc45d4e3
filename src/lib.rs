pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod render;
pub mod tracking;
pub mod transform;
pub mod workers;

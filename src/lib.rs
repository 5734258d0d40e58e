//! REST API for managing events and their attendees.

pub mod config;
pub mod db;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
pub mod validators;

//! API endpoint handlers, one module per resource.

pub mod auth;
pub mod health;
pub mod health_data;
pub mod patients;
pub mod suggestions;
pub mod tasks;
pub mod users;

//! Features layer - domain slices, each with models, services and HTTP surface

pub mod auth;
pub mod files;
pub mod moderation;
pub mod ratings;
pub mod reports;
pub mod users;

//! Violation ledger, ban authority and the moderation gateway.

pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

pub use middleware::require_not_banned;
pub use routes::routes;
pub use services::{BanService, ModerationGateway, ViolationService};

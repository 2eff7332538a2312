mod ban_service;
mod moderation_gateway;
mod violation_service;

pub use ban_service::BanService;
pub use moderation_gateway::ModerationGateway;
pub use violation_service::ViolationService;

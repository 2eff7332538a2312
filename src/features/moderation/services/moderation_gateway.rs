use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::moderation::services::BanService;

/// Single entry point for "may this user act?"
pub struct ModerationGateway {
    ban_service: Arc<BanService>,
}

impl ModerationGateway {
    pub fn new(ban_service: Arc<BanService>) -> Self {
        Self { ban_service }
    }

    pub async fn check_not_banned(&self, user_id: Uuid) -> Result<()> {
        if self.ban_service.is_banned(user_id).await? {
            return Err(AppError::Forbidden(
                "You are banned and cannot perform this action".to_string(),
            ));
        }

        Ok(())
    }
}

//! Modules layer - Infrastructure components for external integrations
//!
//! Contains clients and adapters for object storage and outbound email.

pub mod notification;
pub mod storage;

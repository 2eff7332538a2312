// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Admin role - reviews reports and issues sanctions
pub const ROLE_ADMIN: &str = "admin";

/// Regular member - uploads, rates and reports content
pub const ROLE_USER: &str = "user";

// =============================================================================
// RATINGS
// =============================================================================

/// Lowest accepted rating value
pub const MIN_RATING: i64 = 1;

/// Highest accepted rating value
pub const MAX_RATING: i64 = 5;

/// Fractional digits kept for rating values and aggregates
pub const RATING_SCALE: u32 = 2;

// =============================================================================
// MODERATION
// =============================================================================

/// Maximum length of a report reason
pub const MAX_REPORT_REASON_LEN: u64 = 1000;

/// Prior violations after which the next violation earns a temporary ban
pub const TEMPORARY_BAN_THRESHOLD: i64 = 2;

/// Length of a temporary ban, in calendar months
pub const TEMPORARY_BAN_MONTHS: u32 = 1;

/// Admin notification emails in flight at once per report
pub const MAX_CONCURRENT_NOTIFICATIONS: usize = 8;

mod ban;
mod violation;

pub use ban::{Ban, BanStatus, Sanction};
pub use violation::{UserViolation, ViolationType};

mod report;

pub use report::{
    validate_reason, AdminAction, Report, ReportStatus, ReportTarget, ReviewPlan,
};

pub mod queue_item;
pub mod work_report;

pub use queue_item::{FailureSummary, ItemState, QueueItem, ReportReceipt};
pub use work_report::{ReportStatus, WorkReport, WorkReportPayload};

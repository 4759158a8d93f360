pub mod issue_tracker;
pub mod review;
pub mod version_control;

pub use issue_tracker::IssueTrackerService;
pub use review::ReviewPublisher;
pub use version_control::{VcsError, VersionControlService};

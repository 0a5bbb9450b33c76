// Notification policy: which events fire, and at what priority

mod grouping;
mod suppression;

pub use grouping::{GroupingPolicy, GroupingState, PriorityLevel};
pub use suppression::{SuppressionPolicy, SuppressionReason};

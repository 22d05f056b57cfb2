pub mod progress;
pub mod request;
pub mod response;

pub use progress::SyncProgress;
pub use request::SyncAllRequest;
pub use response::{SyncAction, SyncAllSummary, SyncOneResult};

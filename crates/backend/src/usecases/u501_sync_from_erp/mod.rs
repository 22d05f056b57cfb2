pub mod erp_api_client;
pub mod erp_models;
pub mod executor;
pub mod mapping;
pub mod progress_tracker;

pub use erp_api_client::{ErpApiClient, ErpSource, UnconfiguredErp};
pub use executor::{SyncExecutor, SyncOptions};
pub use progress_tracker::ProgressTracker;

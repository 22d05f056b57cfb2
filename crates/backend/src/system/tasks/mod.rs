pub mod dispatcher;
pub mod scheduler;

pub use dispatcher::TaskDispatcher;
pub use scheduler::ScheduledSyncWorker;

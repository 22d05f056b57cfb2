pub mod executor;

pub use executor::{dispatch_approved, LoggingSender, NotificationSender};

// Aggregate handlers
pub mod a001_repair_order;
pub mod a002_notification_queue;
pub mod a004_order_relation;

// Dashboard handlers
pub mod d400_order_stats;

// UseCase handlers
pub mod usecases;

pub mod session;
pub mod tasks;

pub mod a001_repair_order;
pub mod a002_notification_queue;
pub mod a003_activity_log;
pub mod a004_order_relation;
pub mod common;

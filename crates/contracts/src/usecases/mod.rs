pub mod u501_sync_from_erp;
pub mod u502_spreadsheet_sync;
pub mod u503_dispatch_notifications;

pub mod due_date;
pub mod repository;
pub mod service;

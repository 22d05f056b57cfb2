pub mod executor;

pub use executor::{export_csv, import_csv};

// File I/O operations: input tables in, run artifacts out.

pub mod artifacts;
pub mod csv;
pub mod error;
pub mod table;
pub mod xlsx;

pub use error::IoError;
pub use table::{load_table, TableFormat};

pub mod manager;
pub mod models;
pub mod repository;
#[cfg(test)]
pub(crate) mod test_support;

pub use manager::{DatabaseError, DatabaseManager};
pub use repository::{Repository, SortOrder, Table};

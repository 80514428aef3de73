//! Project persistence adapters implementing the
//! [`ProjectStore`](conclave_application::ProjectStore) port.

mod json_file_store;

pub use json_file_store::JsonFileProjectStore;

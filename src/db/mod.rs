pub mod docstore;

pub use docstore::{DocumentStore, StoreError};

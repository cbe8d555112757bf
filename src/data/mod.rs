//! Generic data access: read negotiation, store contracts, data source

pub mod read;
pub mod source;
pub mod store;

pub use read::{ReadOptions, ReadOptionsBuilder, ReadResult, ReadResultBuilder};
pub use source::{GenericDataSource, MediaData, Related};
pub use store::{DataStore, InMemoryDataStore, InMemoryStoreManager, StoreManager};

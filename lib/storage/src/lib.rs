pub mod store;
pub mod snapshot;

pub use store::SchoolStore;
pub use snapshot::SnapshotFile;

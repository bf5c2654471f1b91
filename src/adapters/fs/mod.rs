pub mod cover_storage;

pub use cover_storage::CoverStorage as FsCoverStorage;

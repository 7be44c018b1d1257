//! Device storage adapters for the session

pub mod profile_cache;

pub use profile_cache::KvProfileCache;

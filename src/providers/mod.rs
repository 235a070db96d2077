pub mod caching;
pub mod directory;
pub mod http;
pub mod tables;
pub mod util;

pub use caching::{CachingLoader, load_dataset};
pub use directory::DirectorySource;
pub use http::HttpSource;

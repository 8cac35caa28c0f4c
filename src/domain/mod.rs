pub mod item;
pub mod request;

pub use item::{normalize_extension, FetchedImage, Locator, RetrievedItem, DEFAULT_EXTENSION};
pub use request::{RetrievalRequest, DEFAULT_MAX_LIMIT, DEFAULT_MIN_LIMIT};

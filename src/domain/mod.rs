pub mod catalog;
pub mod error;
pub mod media;
pub mod record;
pub mod summary;

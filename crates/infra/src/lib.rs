//! Infrastructure layer: storage, image bytes, external classifier service.

pub mod classifier;
pub mod image_store;
pub mod records;
pub mod store;

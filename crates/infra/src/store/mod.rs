//! In-memory repositories shared by the API.

pub mod product_store;
pub mod user_store;

pub use product_store::{InMemoryProductStore, ProductStore};
pub use user_store::{InMemoryUserStore, UserStore};

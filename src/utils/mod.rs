pub mod cache;
pub mod image;
pub mod middleware;
pub mod pagination;
pub mod serde_helpers;
pub mod slug;
pub mod templates;
pub mod validation;

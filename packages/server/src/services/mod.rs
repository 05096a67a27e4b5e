//! The cross-store coordinator and the components it drives.

pub mod coordinator;
pub mod error;
pub mod identity;
pub mod listing;
pub mod photo;
pub mod review;

pub use coordinator::Coordinator;
pub use error::{ServiceError, ServiceResult};

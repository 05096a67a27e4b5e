pub mod listing;
pub mod photo;
pub mod review;
pub mod shared;

pub mod listing;
pub mod listing_photo;
pub mod review;

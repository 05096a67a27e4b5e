pub mod health;
pub mod listing;
pub mod moderation;
pub mod photo;
pub mod review;

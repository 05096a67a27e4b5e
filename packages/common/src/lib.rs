//! Shared building blocks for the listing service.
//!
//! The only resident today is the blob storage layer used for listing photos.

pub mod storage;

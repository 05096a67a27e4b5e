mod health;
mod listing;
mod postgres;

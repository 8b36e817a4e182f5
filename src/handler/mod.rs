pub mod admin;
pub mod analysis;
pub mod auth;
pub mod installer;
pub mod users;

pub mod auth;
pub mod bookmarks;
pub mod home;
pub mod preferences;
pub mod profile;
pub mod recipes;

pub mod auth;
pub mod courses;
pub mod health;
pub mod password;
pub mod schools;
pub mod users;

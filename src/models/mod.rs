pub mod auth;
pub mod membership;
pub mod nutrition;
pub mod trainer;
pub mod user;
pub mod week;
pub mod workout;

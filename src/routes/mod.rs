pub mod auth;
pub mod health;
pub mod memberships;
pub mod nutrition;
pub mod trainers;
pub mod users;
pub mod workouts;

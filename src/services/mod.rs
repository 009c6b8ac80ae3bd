pub mod auth;
pub mod calendar;
pub mod membership;
pub mod nutrition;
pub mod plan_store;
pub mod trainer;
pub mod workout;

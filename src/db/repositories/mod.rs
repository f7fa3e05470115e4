pub mod calculation;
pub mod user;

pub mod prelude;

pub mod calculations;
pub mod users;

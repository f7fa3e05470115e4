pub use super::calculations::Entity as Calculations;
pub use super::users::Entity as Users;

pub use super::resumes::Entity as Resumes;
pub use super::users::Entity as Users;

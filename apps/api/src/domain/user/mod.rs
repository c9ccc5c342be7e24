// User domain module
// Users are plain records persisted through UserRepository; only the id is a value object

pub mod value_objects;

pub use value_objects::UserId;

pub mod resource;
pub mod showcase;
pub mod user;

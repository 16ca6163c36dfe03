pub mod catalog;
pub mod establishments;
pub mod health;
pub mod people;
pub mod prescriptions;
pub mod sessions;

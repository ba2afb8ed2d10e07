pub mod admin;
pub mod auth;
pub mod events;
pub mod forms;
pub mod submissions;

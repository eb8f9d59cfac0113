pub mod admin;
pub mod chat;
pub mod quote;
pub mod service;

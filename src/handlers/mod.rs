// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod favorite;
pub mod property;

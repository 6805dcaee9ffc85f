// src/models/mod.rs

pub mod favorite;
pub mod filter;
pub mod property;
pub mod user;

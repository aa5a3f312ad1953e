// lib.rs
pub mod cli;
pub mod config;
pub mod crawler;
pub mod events;
pub mod models;
pub mod render;
pub mod store;

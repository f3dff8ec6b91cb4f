//! HTTP handlers. Each handler parses its parameters, calls one service
//! method and wraps the result in [`crate::ApiResponse`].

pub mod common;
pub mod departments;
pub mod health;
pub mod purchases;
pub mod suppliers;

//! HTTP request handlers

pub mod auth;
pub mod object;
pub mod pages;
pub mod service;

pub use auth::*;
pub use object::*;
pub use pages::*;
pub use service::*;

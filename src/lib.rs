//! Library exports for the image-articles service
//!
//! Upload images to object storage and browse the articles an external
//! analysis backend generates from them. The modules are exposed for the
//! binary, for tests, and for embedding the router elsewhere.

pub mod backend;
pub mod config;
pub mod error;
pub mod handler;
pub mod keygen;
pub mod model;
pub mod normalizer;
pub mod pagination;
pub mod retry;
pub mod route;
pub mod state;
pub mod storage;
pub mod validator;

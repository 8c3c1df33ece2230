// Pageforest - backend document store for a small wiki: a page forest with
// token sessions, role-gated mutation, recursive delete, and substring
// search over one durable JSON document.

// HTTP surface - named query/mutation dispatch
pub mod api;

// Application state - store + sessions behind one writer lock
pub mod app_state;

// Request identity and role gates
pub mod auth;

// Environment-driven configuration
pub mod config;

// Domain models and wire views
pub mod models;

// Page tree service - CRUD, cascade delete, search
pub mod pages;

// Ephemeral token -> user sessions
pub mod session;

// Slug normalization
pub mod slug;

// Durable JSON store with atomic flush
pub mod store;

// Common utilities
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};

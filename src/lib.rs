//! Vivaria - multi-tenant research-data platform, authorization core
//!
//! This library derives effective per-(user, project) permissions from
//! team-scoped RBAC and explicit share grants. It exposes all modules
//! for testing purposes.

pub mod authz;
pub mod entities;
pub mod errors;
pub mod settings;
pub mod store;

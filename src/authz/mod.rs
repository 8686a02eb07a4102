//! Authorization resolution for project-scoped resources.
//!
//! Effective permissions on a project come from three independent,
//! overlapping sources:
//! - team-scoped RBAC (roles assigned within the project's owning team),
//! - a direct per-user share on the project,
//! - per-team shares on the project for any team the user belongs to.
//!
//! Sources are OR-combined: a share can add capabilities but never remove
//! ones granted elsewhere. The module only reads grant state; turning a
//! `false` flag into an HTTP 403 is the caller's business.
//!
//! Entry points: [`resolve`] for one project, [`resolve_many`] for list
//! views (a bounded number of batched fetches instead of one round trip
//! per project), and [`has_permission`] for checks that are not tied to a
//! concrete project instance. All of them take the request-scoped
//! [`PermissionCache`] by `&mut`; allocate one per inbound request and
//! drop it at request end.

pub mod bulk;
pub mod cache;
pub mod rbac;
pub mod resolver;
pub mod types;

pub use bulk::resolve_many;
pub use cache::PermissionCache;
pub use rbac::has_permission;
pub use resolver::resolve;
pub use types::EffectivePermissionSet;

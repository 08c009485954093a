//! pgschema-core - declarative schema migration for PostgreSQL
//!
//! This crate implements the plan pipeline:
//! - Introspect a live schema into an IR ([`inspect`])
//! - Realize desired DDL in a disposable database ([`provider`])
//! - Fingerprint the IR to detect drift ([`fingerprint`])
//! - Diff two IRs into ordered, typed changes ([`diff`])
//! - Rewrite unsafe changes into online-safe step sequences ([`rewrite`])
//! - Group steps into an executable [`plan::Plan`]
//! - Apply plans with drift detection and wait monitoring ([`apply`])
//!
//! The [`pipeline`] module wires the pieces together for the `plan` verb;
//! [`apply`] covers the `apply` verb. The CLI crate owns flag parsing and
//! output routing.

pub mod apply;
pub mod connect;
pub mod diff;
pub mod dump;
pub mod error;
pub mod fingerprint;
pub mod ignore;
pub mod inspect;
pub mod ir;
pub mod pipeline;
pub mod plan;
pub mod provider;
pub mod rewrite;
pub mod sqlgen;
pub mod version;
pub mod wait;

pub use apply::{ApplyOptions, apply};
pub use connect::ConnectConfig;
pub use diff::{Diff, DiffKind, Operation, diff_irs};
pub use error::{Error, Result};
pub use fingerprint::Fingerprint;
pub use ignore::IgnoreConfig;
pub use inspect::Inspector;
pub use ir::Ir;
pub use pipeline::{PlanRequest, build_plan};
pub use plan::{ExecutionGroup, Plan, SqlFormat, Step};
pub use version::{PGSCHEMA_VERSION, PLAN_FORMAT_VERSION};

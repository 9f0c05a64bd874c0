//! Signpost redirects humans to dynamically placed services by name.
//!
//! It sits at the edge in front of a service registry. A request for
//! `grafana.service.consul` is looked up in the directory and answered with
//! a 307 to the single instance, or a listing page when there are several.
//! Operators can also pin hostnames (and hostname/path pairs) to fixed
//! targets with custom routes, including `$arg$` templating.
//!
//! # Architecture
//!
//! - [`address`] -- Parsing Consul-style service hostnames.
//! - [`routes`] -- The custom route table and its URL templating.
//! - [`directory`] -- The [`ServiceDirectory`](directory::ServiceDirectory)
//!   trait with Consul catalog and DNS SRV backends.
//! - [`engine`] -- The redirect decision sequence.
//! - [`rewrite`] -- Output URL construction.
//! - [`pages`] -- HTML listing, help and error bodies.
//! - [`handler`] -- The Axum fallback that turns decisions into responses.
//! - [`server`] -- Axum server setup, shared state, HTTP client, and
//!   graceful shutdown.
//! - [`config`] -- The immutable [`RouterConfig`](config::RouterConfig) and
//!   route table loading and validation.
//! - [`cli`] / [`cmd`] -- Command-line parsing and subcommands.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML routes file support _(enabled by default)_ |
//! | `toml` | TOML routes file support |

// Binary crate: public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod address;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod handler;
pub mod logging;
pub mod pages;
pub mod rewrite;
pub mod routes;
pub mod server;

//! # SWAPI Proxy
//!
//! A caching search-and-detail proxy in front of the public Star Wars API.
//!
//! Clients search people or films by name, page through the results, open
//! detail pages whose cross-references (a film's characters, a person's
//! films) are resolved to names, and read aggregate usage metrics.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────────┐   ┌─────────────┐
//! │  HTTP /  │──▶│  Use cases │──▶│ Repositories │──▶│ SwapiClient │──▶ upstream
//! │   CLI    │   │            │   └──────────────┘   └──────┬──────┘
//! └────┬─────┘   └─────┬──────┘                             │
//!      │               ▼                                    ▼
//!      │         ┌────────────┐                      ┌────────────┐
//!      │         │QueryLogger │──▶ query_logs        │ CacheStore │
//!      │         └────────────┘         │            └────────────┘
//!      │                                ▼                   ▲
//!      └──────────────────────────▶ MetricsService ─────────┘
//!                                   (metrics:latest)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! swapi init                        # create database
//! swapi search films hope           # one-off search
//! swapi film 1                      # film details
//! swapi serve                       # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy and outcome mapping |
//! | [`query`] | Search query value and search type |
//! | [`models`] | Entities, URL id extraction, response views |
//! | [`cache`] | TTL key/value store (memory, SQLite) |
//! | [`client`] | Cached upstream API client |
//! | [`repository`] | Person/film repositories |
//! | [`query_log`] | Per-search logging |
//! | [`usecases`] | Search and detail use cases |
//! | [`metrics`] | Metrics aggregation and snapshot |
//! | [`search`] | Request validation and pagination |
//! | [`context`] | Shared resources and per-request wiring |
//! | [`server`] | HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod metrics;
pub mod migrate;
pub mod models;
pub mod query;
pub mod query_log;
pub mod repository;
pub mod search;
pub mod server;
pub mod usecases;

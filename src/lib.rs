//! # valsearch
//!
//! Keeps a local full-text index of a remote paginated collection and serves
//! ranked search over it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Remote pages │──▶│  Ingestion   │──▶│ SQLite FTS5  │
//! │  (reqwest)   │   │ normalize +  │   │ RecordIndex  │
//! └──────────────┘   │   upsert     │   └──────┬───────┘
//!                    └──────▲───────┘          │
//!                           │                  ▼
//!                    ┌──────┴───────┐   ┌──────────────┐
//!                    │     Sync     │   │    Query     │
//!                    │ Coordinator  │   │   Service    │
//!                    └──────▲───────┘   └──────▲───────┘
//!                           │  GET /sync       │  GET /?q=
//!                           └──────── HTTP ────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! valsearch init                 # create the index table
//! valsearch sync                 # one full pass in the foreground
//! valsearch search "fetch"       # query from the terminal
//! valsearch serve                # HTTP server on $PORT (default 3000)
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`db`] | SQLite pool |
//! | [`models`] | Record and remote page types |
//! | [`normalize`] | Name normalizer |
//! | [`index`] | Full-text record index |
//! | [`remote`] | Remote page fetching |
//! | [`ingest`] | Ingestion pipeline |
//! | [`clock`] | Time source |
//! | [`sync`] | Single-flight, freshness-gated sync coordinator |
//! | [`query`] | Query service |
//! | [`view`] | Search page HTML |
//! | [`server`] | HTTP server |
//! | [`error`] | Error types |

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod query;
pub mod remote;
pub mod server;
pub mod sync;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

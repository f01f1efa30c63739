//! # Depot
//!
//! Client for the hosted data store backing CivicDesk.
//!
//! The store exposes two surfaces:
//! - A PostgREST-style row API (`/rest/v1/{table}`) with `eq` column
//!   filters, `order` sorting, and `Prefer` headers for representation
//!   and exact counts.
//! - A storage-bucket API (`/storage/v1/object/...`) for complaint photos,
//!   with stable public URLs.
//!
//! All durable state lives behind these two surfaces. The client is a thin
//! `reqwest` wrapper with no retries and no caching; single-row operations
//! are consistent on the store side, but there is no multi-row transaction
//! boundary, so cross-table sequences (status write + counter write) are
//! independent round trips.

pub mod client;
pub mod models;

pub use client::{Depot, DepotError};

//! # Bonus Admin
//!
//! Admin HTTP API for the deposit bonus feature: the singleton settings
//! record, bonus tiers, manual balance adjustment and a bonus preview.
//!
//! ## Quick Start
//! ```bash
//! cargo run --bin bonus-admin
//! ```
//!
//! ## Endpoints
//! - `GET /health` - Liveness with basic counters
//! - `GET /metrics` - Prometheus metrics
//! - `GET|PUT /settings` - Read / partially update settings
//! - `POST /tiers`, `PUT|DELETE /tiers/{tier}` - Manage tiers by position or id
//! - `GET /stats` - Bonus totals
//! - `GET /users` - Bonus recipients by balance
//! - `PUT /users/{id}/adjust` - Manual balance adjustment
//! - `GET /users/{id}/transactions` - Audit trail
//! - `POST /deposits` - Record a deposit and credit its bonus
//! - `GET /calculate` - Bonus preview

pub mod config;
mod error;
mod handlers;
pub mod metrics;
mod middleware;
mod response;
mod router;
mod state;
pub mod store;

pub use config::Config;
pub use error::Error;
pub use router::create as create_router;
pub use state::AppState;

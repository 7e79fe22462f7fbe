//! # Gantry Gateway
//!
//! `gantry-gateway` is the REST API gateway for the Gantry platform. It
//! authenticates HTTP callers, applies role-based authorization, converts
//! requests into request/reply messages on the backend bus, and renders the
//! component graphs stored with builds back into JSON views for clients.

pub mod api;
pub mod authz;
pub mod bus;
pub mod cli;
pub mod metrics;
pub mod store;
pub mod views;

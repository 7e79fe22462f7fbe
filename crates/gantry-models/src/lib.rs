//! # Gantry Models
//!
//! `gantry-models` defines the data structures exchanged between the Gantry
//! gateway and its backend data services, together with their input
//! validation. The structures are plain serde types; persistence lives behind
//! the remote data services reached over the message bus.

pub mod models;

//! # Infrastructure Layer
//!
//! Adapters behind the application's ports.
//!
//! - [`persistence`]: repositories, acceptance unit and event store
//! - [`reference_data`]: catalog gateway

pub mod persistence;
pub mod reference_data;

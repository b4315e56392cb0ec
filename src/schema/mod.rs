//! Record store document schema
//!
//! This module defines the flat document shape the hosted record store keeps
//! for each measurement, and the adapter that coerces those loosely typed
//! documents into closed [`HealthRecord`](crate::types::HealthRecord) values
//! before they reach the aggregation core.

mod adapter;
mod document;

pub use adapter::*;
pub use document::*;

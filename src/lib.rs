//! Two-symbol price ratio monitor.
//!
//! Streams MEXC deals for two symbols, pairs their latest prices, and alerts
//! the operator over Telegram when `A / B` leaves a band that the operator
//! can adjust at runtime.

pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod notify;

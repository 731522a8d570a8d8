//! API Routes
//!
//! Route handlers organized by functionality.

pub mod activities;
pub mod chart;
pub mod export;
pub mod health;
pub mod reload;
pub mod teams;

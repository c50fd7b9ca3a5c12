//! smart-loss: position-management decision engine for crypto portfolios
//!
//! This library provides the core components for:
//! - Technical indicators over candle windows
//! - Per-symbol historical metric store with bounded, expiring series
//! - Portfolio risk budget, admission control and position sizing
//! - Hold/sell decision cascade with confidence and urgency
//! - Urgency-driven order execution with a paper engine
//! - Portfolio orchestration cycles
//! - Structured logging and Prometheus metrics

pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod execution;
pub mod history;
pub mod indicators;
pub mod market;
pub mod portfolio;
pub mod risk;
pub mod telemetry;

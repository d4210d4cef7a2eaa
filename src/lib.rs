//! LMSR Probability Engine - Library Root
//!
//! Turns market maker state (funding and position balances) into
//! per-market outcome probabilities, with optional conditioning on
//! assumed outcomes and previews of staged trades.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;

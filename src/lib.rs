//! Terminal time tracker for work split between departments. One department's timer runs at a
//! time; every day keeps its own timers, and history is never thrown away.

pub mod cli;
pub mod config;
pub mod storage;
pub mod tracker;
pub mod utils;

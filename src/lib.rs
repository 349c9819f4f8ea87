//! Ball-by-ball live match state for Twenty20 cricket, built from Cricsheet match JSON.

pub mod archive;
pub mod coerce;
pub mod config;
pub mod corpus;
pub mod http_client;
pub mod live_state;
pub mod match_info;
pub mod table;

pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ordering;
pub mod routes;
pub mod state;

#[cfg(test)]
pub mod testing;

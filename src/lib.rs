//! Study Assistant Backend Library
//!
//! Credential and session lifecycle for the study assistant: token issuance,
//! verification, rotation and the HTTP surface around them.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

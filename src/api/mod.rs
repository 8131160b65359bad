//! API clients for Strava and GitHub

pub mod client;
pub mod github;

pub use client::StravaClient;
pub use github::GithubClient;

mod annotations;
mod client;
mod links;
mod provider;
mod rate_gate;
mod types;
mod workflow_names;


pub use provider::{FetchSettings, GitHubProvider};

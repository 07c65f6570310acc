pub mod github;

pub use github::{FetchSettings, GitHubProvider};

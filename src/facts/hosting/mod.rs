mod client;
mod provider;

pub use provider::{DEFAULT_API_URL, GitHubSource};

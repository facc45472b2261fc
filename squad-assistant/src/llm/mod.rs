// Squad recommendation gateway: prompt construction, Claude streaming client,
// and response validation.

pub mod client;
pub mod prompt;
pub mod recommendation;

mod composite;
mod cookie;
mod header;
mod types;

pub use composite::CompositeTransport;
pub use cookie::CookieTransport;
pub use header::{DEFAULT_TOKEN_PREFIX, HeaderTransport};
pub use types::Transport;

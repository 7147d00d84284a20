// Gateway module for authenticated requests - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod client;
mod observer;
mod request;
mod response;

// Public re-exports - the ONLY way to access gateway functionality
pub use client::Gateway;
pub use observer::{AuthObserver, LogOnlyObserver};
pub use request::ApiRequest;
pub use response::ApiOutcome;

// Gateway module for utils - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod errors;
mod logger;

// Public re-exports - the ONLY way to access utils functionality
pub use errors::{ApiError, ApiResult};
pub use logger::{init_logger, log_debug, log_error, log_info, log_warn};

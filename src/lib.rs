pub mod api;
pub mod app;
pub mod cli;
pub mod constants;
pub mod gateway;
pub mod session;
pub mod utils;

pub use api::{AuthApi, EmployeesApi, FormsApi};
pub use app::{load_config, AppContext, Config};
pub use gateway::{ApiOutcome, ApiRequest, AuthObserver, Gateway};
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};
pub use utils::{ApiError, ApiResult};

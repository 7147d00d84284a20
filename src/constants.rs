/// Constants module to avoid magic strings in the codebase

// Network Configuration
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const JSON_CONTENT_TYPE: &str = "application/json";

// User endpoints
pub const LOGIN_PATH: &str = "/api/users/login/";
pub const REGISTER_PATH: &str = "/api/users/register/";
pub const PROFILE_PATH: &str = "/api/users/profile/";
pub const CHANGE_PASSWORD_PATH: &str = "/api/users/change-password/";
pub const TOKEN_REFRESH_PATH: &str = "/api/users/token/refresh/";

// Employee endpoints
pub const FORMS_PATH: &str = "/api/employees/forms/";
pub const RECORDS_PATH: &str = "/api/employees/records/";

// Credential storage keys
pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_KEY: &str = "user";

// Files
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const CREDENTIALS_FILE_NAME: &str = "credentials.toml";
pub const LOCAL_CONFIG_PATH: &str = ".staffdesk/config.toml";
pub const ENV_PREFIX: &str = "STAFFDESK_";

/// Exit code used when the session has expired and a fresh login is needed
pub const EXIT_AUTH_REQUIRED: i32 = 2;

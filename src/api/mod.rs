// Gateway module for the typed API - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod auth;
mod employees;
mod forms;
mod types;

// Public re-exports - the ONLY way to access API functionality
pub use auth::AuthApi;
pub use employees::EmployeesApi;
pub use forms::FormsApi;
pub use types::{
    BulkDeleteResponse, ChangePasswordRequest, DeleteResponse, DynamicForm, Employee,
    EmployeeQuery, FieldOrder, FieldType, FormField, FormQuery, MessageResponse, NewEmployee,
    ProfileUpdate, RegisterRequest, RegisterResponse, SearchField, TokenPair, UserProfile,
};

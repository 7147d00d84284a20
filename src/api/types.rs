use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::gateway::{ApiOutcome, ApiRequest};
use crate::utils::{ApiError, ApiResult};

/// Decode a gateway result that must carry JSON
pub(crate) fn expect_json<T: DeserializeOwned>(
    outcome: Option<ApiOutcome>,
) -> ApiResult<Option<T>> {
    outcome.map(|outcome| outcome.into_json()).transpose()
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Access/refresh token pair issued on login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Account details of the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Anything else the server sends along
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// "First Last", falling back to the username
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            self.username.clone()
        } else {
            full
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

impl RegisterRequest {
    /// Checks the server would reject anyway, done before any network call
    pub fn validate(&self) -> ApiResult<()> {
        if self.password != self.password2 {
            return Err(ApiError::Invalid("Passwords do not match".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub user: UserProfile,
    pub tokens: TokenPair,
    #[serde(default)]
    pub message: Option<String>,
}

/// Partial profile update, absent fields are left alone
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub new_password2: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> ApiResult<()> {
        if self.new_password != self.new_password2 {
            return Err(ApiError::Invalid("New passwords do not match".into()));
        }
        Ok(())
    }
}

/// Plain `{"message": ...}` acknowledgement
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

/// Input widget a form field renders as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Password,
    Email,
    Textarea,
    Checkbox,
    Radio,
    Select,
}

impl FieldType {
    /// Whether the field picks from a fixed list of options
    pub fn has_options(&self) -> bool {
        matches!(self, FieldType::Checkbox | FieldType::Radio | FieldType::Select)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Password => "password",
            FieldType::Email => "email",
            FieldType::Textarea => "textarea",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::Select => "select",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub label: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// A user-defined form; employee records are filled against one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FormField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DynamicForm {
    /// Fields sorted by their display order
    pub fn ordered_fields(&self) -> Vec<&FormField> {
        let mut fields: Vec<&FormField> = self.fields.iter().collect();
        fields.sort_by_key(|field| field.order);
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOrder {
    pub field_id: i64,
    pub order: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReorderRequest<'a> {
    pub field_orders: &'a [FieldOrder],
}

/// Filters for listing forms
#[derive(Debug, Clone, Default)]
pub struct FormQuery {
    pub search: Option<String>,
    pub ordering: Option<String>,
}

impl FormQuery {
    pub(crate) fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        if let Some(search) = &self.search {
            request = request.query("search", search.as_str());
        }
        if let Some(ordering) = &self.ordering {
            request = request.query("ordering", ordering.as_str());
        }
        request
    }
}

// ---------------------------------------------------------------------------
// Employee records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub form: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_name: Option<String>,
    #[serde(default)]
    pub form_fields: Vec<FormField>,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body for creating or replacing an employee record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub form: i64,
    pub data: Map<String, Value>,
}

/// Filters for listing employee records
#[derive(Debug, Clone, Default)]
pub struct EmployeeQuery {
    /// Free text matched against every field value
    pub search: Option<String>,
    pub form_id: Option<i64>,
    pub ordering: Option<String>,
    /// Per-field filters as `(label, value)`
    pub fields: Vec<(String, String)>,
}

impl EmployeeQuery {
    pub(crate) fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        if let Some(search) = &self.search {
            request = request.query("search", search.as_str());
        }
        if let Some(form_id) = self.form_id {
            request = request.query("form_id", form_id.to_string());
        }
        if let Some(ordering) = &self.ordering {
            request = request.query("ordering", ordering.as_str());
        }
        for (label, value) in &self.fields {
            // The server maps underscores back to spaces
            request = request.query(format!("field_{}", label.replace(' ', "_")), value.as_str());
        }
        request
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct BulkDeleteRequest<'a> {
    pub ids: &'a [i64],
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BulkDeleteResponse {
    #[serde(default)]
    pub message: String,
    pub deleted_count: u64,
}

/// A field label that can be used in `EmployeeQuery::fields`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchField {
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchFieldsResponse {
    #[serde(default)]
    pub fields: Vec<SearchField>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_form_decodes_server_shape() {
        let form: DynamicForm = serde_json::from_value(json!({
            "id": 3,
            "name": "Onboarding",
            "description": null,
            "fields": [
                {"id": 11, "label": "Start date", "field_type": "date", "is_required": true,
                 "options": null, "order": 1, "placeholder": null, "default_value": null},
                {"id": 10, "label": "Team", "field_type": "select", "is_required": false,
                 "options": ["Ops", "Eng"], "order": 0, "placeholder": "", "default_value": "Ops"}
            ],
            "created_by": 1,
            "created_by_username": "ada",
            "created_at": "2024-05-02T10:00:00.123456Z",
            "updated_at": "2024-05-02T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(form.fields.len(), 2);
        let ordered: Vec<&str> = form.ordered_fields().iter().map(|f| f.label.as_str()).collect();
        assert_eq!(ordered, vec!["Team", "Start date"]);
        assert!(form.fields[1].field_type.has_options());
    }

    #[test]
    fn test_new_form_omits_server_fields() {
        let form = DynamicForm {
            id: None,
            name: "Exit interview".into(),
            description: None,
            fields: vec![],
            created_by: None,
            created_by_username: None,
            created_at: None,
            updated_at: None,
        };
        assert_eq!(
            serde_json::to_value(&form).unwrap(),
            json!({"name": "Exit interview", "fields": []})
        );
    }

    #[test]
    fn test_employee_query_pairs() {
        let query = EmployeeQuery {
            search: Some("ada".into()),
            form_id: Some(3),
            ordering: None,
            fields: vec![("Start date".into(), "2024".into())],
        };
        let request = query.apply(ApiRequest::get("/api/employees/records/"));
        assert_eq!(
            request.query,
            vec![
                ("search".to_string(), "ada".to_string()),
                ("form_id".to_string(), "3".to_string()),
                ("field_Start_date".to_string(), "2024".to_string()),
            ]
        );

        let empty = EmployeeQuery::default().apply(ApiRequest::get("/api/employees/records/"));
        assert!(empty.query.is_empty());
    }

    #[test]
    fn test_password_checks() {
        let mut register = RegisterRequest {
            username: "ada".into(),
            password: "one".into(),
            password2: "two".into(),
            ..Default::default()
        };
        assert!(matches!(register.validate(), Err(ApiError::Invalid(_))));
        register.password2 = "one".into();
        assert!(register.validate().is_ok());

        let change = ChangePasswordRequest {
            old_password: "old".into(),
            new_password: "a".into(),
            new_password2: "b".into(),
        };
        assert!(change.validate().is_err());
    }

    #[test]
    fn test_profile_display_name() {
        let mut profile: UserProfile =
            serde_json::from_value(json!({"username": "ada", "email": "ada@example.com"})).unwrap();
        assert_eq!(profile.display_name(), "ada");

        profile.first_name = Some("Ada".into());
        profile.last_name = Some("Lovelace".into());
        assert_eq!(profile.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_profile_update_skips_absent_fields() {
        let update = ProfileUpdate {
            phone: Some("555-0100".into()),
            ..Default::default()
        };
        assert!(!update.is_empty());
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"phone": "555-0100"}));
        assert!(ProfileUpdate::default().is_empty());
    }
}

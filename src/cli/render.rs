use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use crate::api::{DynamicForm, Employee, SearchField, UserProfile};
use crate::gateway::AuthObserver;
use crate::utils::ApiError;

/// Prints the "please log in again" notice when the session can't be refreshed
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalObserver;

impl AuthObserver for TerminalObserver {
    fn on_auth_required(&self) {
        eprintln!(
            "{} your session has expired, run {} to sign in again",
            "[LOGIN]".yellow().bold(),
            "staffdesk login <username>".bold()
        );
    }
}

/// Human readable message for an API failure
///
/// Structured bodies are flattened: a plain string is used as is, then
/// `detail`, then `message`, otherwise one `field: error, error` line per key.
pub fn describe_error(error: &ApiError) -> String {
    match error {
        ApiError::Rejected { body, .. } => describe_body(body),
        other => other.to_string(),
    }
}

fn describe_body(body: &Value) -> String {
    match body {
        Value::String(message) => message.clone(),
        Value::Object(map) => {
            for key in ["detail", "message"] {
                if let Some(value) = map.get(key) {
                    return value_text(value);
                }
            }
            if map.is_empty() {
                return "An error occurred".to_string();
            }
            map.iter()
                .map(|(key, value)| format!("{}: {}", key, value_text(value)))
                .collect::<Vec<_>>()
                .join("\n")
        }
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join("\n"),
        _ => "An error occurred".to_string(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(message: impl std::fmt::Display) {
    println!("{} {}", "[OK]".green(), message);
}

pub fn print_profile(user: &UserProfile) {
    println!("{}", user.display_name().bold());
    println!("  username: {}", user.username);
    println!("  email:    {}", user.email);
    if let Some(phone) = user.phone.as_deref().filter(|p| !p.is_empty()) {
        println!("  phone:    {}", phone);
    }
    if let Some(address) = user.address.as_deref().filter(|a| !a.is_empty()) {
        println!("  address:  {}", address);
    }
}

pub fn print_forms(forms: &[DynamicForm]) {
    if forms.is_empty() {
        println!("No forms yet.");
        return;
    }
    for form in forms {
        println!(
            "  {:>5}  {}  {}",
            form.id.map(|id| id.to_string()).unwrap_or_default().cyan(),
            form.name.bold(),
            format!("({} fields)", form.fields.len()).dimmed()
        );
    }
}

pub fn print_form(form: &DynamicForm) {
    println!(
        "{} {}",
        form.name.bold(),
        form.id.map(|id| format!("#{}", id)).unwrap_or_default().cyan()
    );
    if let Some(description) = form.description.as_deref().filter(|d| !d.is_empty()) {
        println!("  {}", description);
    }
    for field in form.ordered_fields() {
        let required = if field.is_required { "*".red().to_string() } else { " ".to_string() };
        let options = field
            .options
            .as_ref()
            .filter(|_| field.field_type.has_options())
            .map(|opts| {
                let labels: Vec<String> = opts.iter().map(value_text).collect();
                format!(" [{}]", labels.join(" | "))
            })
            .unwrap_or_default();
        println!(
            "  {:>3}{} {:<24} {}{}",
            field.order,
            required,
            field.label,
            field.field_type.to_string().dimmed(),
            options
        );
    }
}

pub fn print_employees(employees: &[Employee]) {
    if employees.is_empty() {
        println!("No employees found.");
        return;
    }
    for employee in employees {
        let preview = employee
            .data
            .iter()
            .take(3)
            .map(|(label, value)| format!("{}: {}", label, value_text(value)))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  {:>5}  {:<20} {}",
            employee.id.map(|id| id.to_string()).unwrap_or_default().cyan(),
            employee.form_name.as_deref().unwrap_or("-"),
            preview
        );
    }
}

pub fn print_employee(employee: &Employee) {
    println!(
        "Employee {} {}",
        employee.id.map(|id| format!("#{}", id)).unwrap_or_default().cyan(),
        employee.form_name.as_deref().unwrap_or_default().dimmed()
    );
    for (label, value) in &employee.data {
        println!("  {:<24} {}", label, value_text(value));
    }
    if let Some(created_at) = employee.created_at {
        println!("  {}", format!("created {}", created_at.format("%Y-%m-%d %H:%M")).dimmed());
    }
}

pub fn print_search_fields(fields: &[SearchField]) {
    for field in fields {
        println!("  {:<24} {}", field.label, field.field_type.to_string().dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rejected(body: Value) -> ApiError {
        ApiError::Rejected { status: 400, body }
    }

    #[test]
    fn test_detail_wins() {
        let err = rejected(json!({"detail": "Not found.", "code": "x"}));
        assert_eq!(describe_error(&err), "Not found.");
    }

    #[test]
    fn test_message_used_when_no_detail() {
        let err = rejected(json!({"message": "Nope"}));
        assert_eq!(describe_error(&err), "Nope");
    }

    #[test]
    fn test_field_errors_one_per_line() {
        let err = rejected(json!({
            "email": ["Enter a valid email address."],
            "password": ["Too short.", "Too common."]
        }));
        assert_eq!(
            describe_error(&err),
            "email: Enter a valid email address.\npassword: Too short., Too common."
        );
    }

    #[test]
    fn test_plain_string_body() {
        assert_eq!(describe_error(&rejected(json!("boom"))), "boom");
    }

    #[test]
    fn test_other_errors_use_display() {
        let err = ApiError::Status { status: 503 };
        assert_eq!(describe_error(&err), "Request failed with status 503");
    }
}

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::api::FieldOrder;

#[derive(Parser, Debug)]
#[command(name = "staffdesk")]
#[command(version)]
#[command(about = "Manage dynamic forms and employee records from the terminal", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API origin, overrides the configured one
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print raw JSON instead of a summary
    #[arg(long, global = true)]
    pub json: bool,

    /// Keep credentials in memory only; nothing is read from or saved to disk
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    Init,
    /// Sign in and store the session
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(long, env = "STAFFDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Register(RegisterArgs),
    /// Forget the stored session
    Logout,
    /// Show configuration and session state
    Status,
    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        command: Option<ProfileCommand>,
    },
    /// Count forms and employees
    Dashboard,
    /// Manage forms
    Forms {
        #[command(subcommand)]
        command: FormsCommand,
    },
    /// Manage employee records
    Employees {
        #[command(subcommand)]
        command: EmployeesCommand,
    },
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    pub username: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
    /// Password confirmation
    #[arg(long)]
    pub password2: String,
    #[arg(long, default_value = "")]
    pub first_name: String,
    #[arg(long, default_value = "")]
    pub last_name: String,
    #[arg(long, default_value = "")]
    pub phone: String,
    #[arg(long, default_value = "")]
    pub address: String,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Show your profile (default)
    Show,
    /// Update profile fields
    Update {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// Change your password
    ChangePassword {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
        /// New password again
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum FormsCommand {
    /// List your forms
    List {
        #[arg(long)]
        search: Option<String>,
        /// Field to order by, prefix with - for descending
        #[arg(long)]
        ordering: Option<String>,
    },
    /// Show one form with its fields
    Show { id: i64 },
    /// Create a form from a JSON document (- for stdin)
    Create { file: PathBuf },
    /// Replace a form from a JSON document (- for stdin)
    Update { id: i64, file: PathBuf },
    /// Delete a form
    Delete { id: i64 },
    /// Reorder fields, e.g. `reorder 3 12=0 10=1`
    Reorder {
        id: i64,
        #[arg(required = true, value_parser = parse_field_order)]
        orders: Vec<FieldOrder>,
    },
}

#[derive(Subcommand, Debug)]
pub enum EmployeesCommand {
    /// List employee records
    List {
        /// Match against any field value
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        form_id: Option<i64>,
        #[arg(long)]
        ordering: Option<String>,
        /// Filter on one field, LABEL=VALUE; repeatable
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },
    /// Show one record
    Show { id: i64 },
    /// Create a record from a JSON object of field values (- for stdin)
    Create {
        #[arg(long)]
        form: i64,
        file: PathBuf,
    },
    /// Replace a record's values from a JSON object (- for stdin)
    Update {
        id: i64,
        #[arg(long)]
        form: i64,
        file: PathBuf,
    },
    /// Delete a record
    Delete { id: i64 },
    /// Delete several records at once
    BulkDelete {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// List field labels usable with `list --field`
    SearchFields {
        #[arg(long)]
        form_id: Option<i64>,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected LABEL=VALUE, got {:?}", raw)),
    }
}

fn parse_field_order(raw: &str) -> Result<FieldOrder, String> {
    let (field_id, order) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD_ID=ORDER, got {:?}", raw))?;
    let field_id = field_id
        .trim()
        .parse()
        .map_err(|_| format!("invalid field id {:?}", field_id))?;
    let order = order
        .trim()
        .parse()
        .map_err(|_| format!("invalid order {:?}", order))?;
    Ok(FieldOrder { field_id, order })
}

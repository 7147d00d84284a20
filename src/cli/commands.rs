use anyhow::{Context, Result};
use colored::Colorize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::io::{self, BufRead, Read, Write};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::args::{Cli, Commands, EmployeesCommand, FormsCommand, ProfileCommand, RegisterArgs};
use super::render::{self, TerminalObserver};
use crate::api::{
    ChangePasswordRequest, DynamicForm, EmployeeQuery, FormQuery, NewEmployee, ProfileUpdate,
    RegisterRequest, UserProfile,
};
use crate::app::{init_config, AppContext, Config};
use crate::constants::EXIT_AUTH_REQUIRED;
use crate::utils::{log_error, ApiError};

/// The gateway returned no result because the session could not be refreshed
#[derive(Debug, Error)]
#[error("Session expired, sign in again with `staffdesk login`")]
pub struct SessionExpired;

fn require<T>(value: Option<T>) -> Result<T> {
    value.ok_or_else(|| SessionExpired.into())
}

/// Handle a parsed command line
pub async fn handle_command(cli: &Cli, config: Config) -> Result<()> {
    if let Commands::Init = cli.command {
        let (path, created) = init_config(cli.config.clone())?;
        if created {
            render::print_success(format!("Created default configuration at {}", path.display()));
        } else {
            println!("Configuration already exists at {}", path.display());
        }
        return Ok(());
    }

    let observer = Arc::new(TerminalObserver);
    let ctx = if cli.ephemeral {
        AppContext::ephemeral(config, observer)?
    } else {
        AppContext::new(config, observer)?
    };

    match &cli.command {
        Commands::Init => Ok(()),
        Commands::Login { username, password } => {
            let password = match password {
                Some(p) => p.clone(),
                None => prompt_password()?,
            };
            login(&ctx, cli.json, username, &password).await
        }
        Commands::Register(args) => register(&ctx, cli.json, args).await,
        Commands::Logout => {
            ctx.auth.sign_out()?;
            render::print_success("Logged out successfully");
            Ok(())
        }
        Commands::Status => {
            show_status(&ctx);
            Ok(())
        }
        Commands::Profile { command } => {
            profile(&ctx, cli.json, command.as_ref().unwrap_or(&ProfileCommand::Show)).await
        }
        Commands::Dashboard => dashboard(&ctx, cli.json).await,
        Commands::Forms { command } => forms(&ctx, cli.json, command).await,
        Commands::Employees { command } => employees(&ctx, cli.json, command).await,
    }
}

/// Print a failure and pick the process exit code
pub fn report_error(error: &anyhow::Error) -> i32 {
    if error.downcast_ref::<SessionExpired>().is_some() {
        // The observer already told the user what to do
        return EXIT_AUTH_REQUIRED;
    }

    match error.downcast_ref::<ApiError>() {
        Some(api_error) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), render::describe_error(api_error));
        }
        None => {
            log_error("❌", format!("{:#}", error));
            eprintln!("{} {:#}", "[ERROR]".red().bold(), error);
        }
    }
    1
}

async fn login(ctx: &AppContext, json: bool, username: &str, password: &str) -> Result<()> {
    let user = require(ctx.auth.sign_in(username, password).await?)?;
    if json {
        return render::print_json(&user);
    }
    render::print_success(format!("Login successful! Welcome, {}", user.username));
    Ok(())
}

async fn register(ctx: &AppContext, json: bool, args: &RegisterArgs) -> Result<()> {
    let request = RegisterRequest {
        username: args.username.clone(),
        email: args.email.clone(),
        password: args.password.clone(),
        password2: args.password2.clone(),
        first_name: args.first_name.clone(),
        last_name: args.last_name.clone(),
        phone: args.phone.clone(),
        address: args.address.clone(),
    };
    let user = require(ctx.auth.sign_up(&request).await?)?;
    if json {
        return render::print_json(&user);
    }
    render::print_success(format!("Registration successful! Welcome, {}", user.username));
    Ok(())
}

fn show_status(ctx: &AppContext) {
    println!("staffdesk status:");
    println!("  API:         {}", ctx.config.api.base_url);
    match &ctx.credentials_path {
        Some(path) => println!("  Credentials: {}", path.display()),
        None => println!("  Credentials: in memory (--ephemeral)"),
    }

    let credentials = ctx.session.credentials();
    let mark = |present: bool| if present { "[OK]".green() } else { "[--]".dimmed() };
    println!("  {} access token", mark(credentials.access_token.is_some()));
    println!("  {} refresh token", mark(credentials.refresh_token.is_some()));

    match ctx.session.cached_user::<UserProfile>() {
        Some(user) => println!("  Signed in as {}", user.username.bold()),
        None => println!("  Not signed in"),
    }
}

async fn profile(ctx: &AppContext, json: bool, command: &ProfileCommand) -> Result<()> {
    match command {
        ProfileCommand::Show => {
            let user = require(ctx.auth.refresh_cached_user().await?)?;
            if json {
                return render::print_json(&user);
            }
            render::print_profile(&user);
        }
        ProfileCommand::Update {
            email,
            first_name,
            last_name,
            phone,
            address,
        } => {
            let update = ProfileUpdate {
                email: email.clone(),
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                phone: phone.clone(),
                address: address.clone(),
            };
            if update.is_empty() {
                return Err(ApiError::Invalid("Nothing to update".into()).into());
            }
            let user = require(ctx.auth.update_profile(&update).await?)?;
            ctx.session.cache_user(&user)?;
            if json {
                return render::print_json(&user);
            }
            render::print_success("Profile updated successfully!");
        }
        ProfileCommand::ChangePassword { old, new, confirm } => {
            let request = ChangePasswordRequest {
                old_password: old.clone(),
                new_password: new.clone(),
                new_password2: confirm.clone(),
            };
            let response = require(ctx.auth.change_password(&request).await?)?;
            render::print_success(
                response
                    .message
                    .unwrap_or_else(|| "Password changed successfully!".to_string()),
            );
        }
    }
    Ok(())
}

/// Load both lists concurrently and show their sizes
async fn dashboard(ctx: &AppContext, json: bool) -> Result<()> {
    let form_query = FormQuery::default();
    let employee_query = EmployeeQuery::default();
    let (forms, employees) = futures::try_join!(
        ctx.forms.list(&form_query),
        ctx.employees.list(&employee_query)
    )?;

    let forms = require(forms)?;
    let employees = require(employees)?;

    if json {
        return render::print_json(&serde_json::json!({
            "total_forms": forms.len(),
            "total_employees": employees.len(),
        }));
    }

    println!("Dashboard");
    println!("  Forms:     {}", forms.len().to_string().bold());
    println!("  Employees: {}", employees.len().to_string().bold());
    Ok(())
}

async fn forms(ctx: &AppContext, json: bool, command: &FormsCommand) -> Result<()> {
    match command {
        FormsCommand::List { search, ordering } => {
            let query = FormQuery {
                search: search.clone(),
                ordering: ordering.clone(),
            };
            let forms = require(ctx.forms.list(&query).await?)?;
            if json {
                return render::print_json(&forms);
            }
            render::print_forms(&forms);
        }
        FormsCommand::Show { id } => {
            let form = require(ctx.forms.get(*id).await?)?;
            if json {
                return render::print_json(&form);
            }
            render::print_form(&form);
        }
        FormsCommand::Create { file } => {
            let form: DynamicForm = read_json_input(file)?;
            let created = require(ctx.forms.create(&form).await?)?;
            if json {
                return render::print_json(&created);
            }
            render::print_success(format!(
                "Form \"{}\" created with id {}",
                created.name,
                created.id.unwrap_or_default()
            ));
        }
        FormsCommand::Update { id, file } => {
            let form: DynamicForm = read_json_input(file)?;
            let updated = require(ctx.forms.update(*id, &form).await?)?;
            if json {
                return render::print_json(&updated);
            }
            render::print_success(format!("Form \"{}\" updated", updated.name));
        }
        FormsCommand::Delete { id } => {
            let confirmation = require(ctx.forms.delete(*id).await?)?;
            render::print_success(confirmation.message);
        }
        FormsCommand::Reorder { id, orders } => {
            let form = require(ctx.forms.reorder_fields(*id, orders).await?)?;
            if json {
                return render::print_json(&form);
            }
            render::print_form(&form);
        }
    }
    Ok(())
}

async fn employees(ctx: &AppContext, json: bool, command: &EmployeesCommand) -> Result<()> {
    match command {
        EmployeesCommand::List {
            search,
            form_id,
            ordering,
            fields,
        } => {
            let query = EmployeeQuery {
                search: search.clone(),
                form_id: *form_id,
                ordering: ordering.clone(),
                fields: fields.clone(),
            };
            let employees = require(ctx.employees.list(&query).await?)?;
            if json {
                return render::print_json(&employees);
            }
            render::print_employees(&employees);
        }
        EmployeesCommand::Show { id } => {
            let employee = require(ctx.employees.get(*id).await?)?;
            if json {
                return render::print_json(&employee);
            }
            render::print_employee(&employee);
        }
        EmployeesCommand::Create { form, file } => {
            let employee = NewEmployee {
                form: *form,
                data: read_json_input::<Map<String, Value>>(file)?,
            };
            let created = require(ctx.employees.create(&employee).await?)?;
            if json {
                return render::print_json(&created);
            }
            render::print_success(format!(
                "Employee #{} created",
                created.id.unwrap_or_default()
            ));
        }
        EmployeesCommand::Update { id, form, file } => {
            let employee = NewEmployee {
                form: *form,
                data: read_json_input::<Map<String, Value>>(file)?,
            };
            let updated = require(ctx.employees.update(*id, &employee).await?)?;
            if json {
                return render::print_json(&updated);
            }
            render::print_success(format!("Employee #{} updated", id));
        }
        EmployeesCommand::Delete { id } => {
            let confirmation = require(ctx.employees.delete(*id).await?)?;
            render::print_success(confirmation.message);
        }
        EmployeesCommand::BulkDelete { ids } => {
            let response = require(ctx.employees.bulk_delete(ids).await?)?;
            render::print_success(format!("{} employees deleted", response.deleted_count));
        }
        EmployeesCommand::SearchFields { form_id } => {
            let fields = require(ctx.employees.search_fields(*form_id).await?)?;
            if json {
                return render::print_json(&fields);
            }
            render::print_search_fields(&fields);
        }
    }
    Ok(())
}

/// Read a JSON document from a file, or stdin for `-`
fn read_json_input<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn prompt_password() -> Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("No password given");
    }
    Ok(password)
}

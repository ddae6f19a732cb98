//! Role impersonation preview command.

use anyhow::{Context, Result, bail};
use rowscope_engine::{ImpersonationRole, wrap_with_role_impersonation};
use serde::Serialize;
use serde_json::Value;

use crate::output::{self, Format};
use crate::{OutputFormat, RequestArgs, RoleKind};

use super::request;

/// A statement wrapped to run as a role.
#[derive(Serialize)]
struct ImpersonateOutput {
    role: ImpersonationRole,
    claims: Value,
    sql: String,
}

fn role(kind: RoleKind, user_id: Option<String>, custom_role: Option<String>) -> Result<ImpersonationRole> {
    let role = match kind {
        RoleKind::Anon => ImpersonationRole::Anon,
        RoleKind::ServiceRole => ImpersonationRole::ServiceRole,
        RoleKind::Authenticated => ImpersonationRole::Authenticated {
            user_id: user_id
                .filter(|id| !id.trim().is_empty())
                .context("--user-id is required for the authenticated role")?,
        },
        RoleKind::Custom => ImpersonationRole::Custom {
            role: custom_role
                .filter(|role| !role.trim().is_empty())
                .context("--custom-role is required for a custom role")?,
        },
    };
    Ok(role)
}

fn wrap(args: &RequestArgs, role: ImpersonationRole) -> Result<ImpersonateOutput> {
    let request = request::load(args)?;
    let sql = request::estimator(args).build_statement(&request);
    if sql.is_empty() {
        bail!("no table selected: pass --table-id and --table, or --request");
    }

    Ok(ImpersonateOutput {
        claims: role.claims(),
        sql: wrap_with_role_impersonation(&sql, &role),
        role,
    })
}

/// Run the impersonate command.
pub fn run(
    args: &RequestArgs,
    kind: RoleKind,
    user_id: Option<String>,
    custom_role: Option<String>,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let role = role(kind, user_id, custom_role)?;
    output::status(&format!("Running as role '{}'", role.role_name()), quiet);
    let output = wrap(args, role)?;

    match Format::from(format) {
        Format::Json => output::print_json(&output)?,
        Format::Table => println!("{}", output.sql),
    }

    Ok(())
}

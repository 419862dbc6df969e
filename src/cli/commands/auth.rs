//! Auth CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use console::Term;

use crate::cli::context::AppContext;
use crate::cli::display::{action_success, action_warning, output, CommandOutput, DetailView};
use crate::domain::models::{Access, AuthState, User};

#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Sign in and store the session token
    Signin {
        /// Username or email
        username: String,
        /// Password (prompted when omitted)
        #[arg(long, env = "ICONESIGN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Re-check the stored session against the backend
    Status,
    /// Forget the stored session
    Signout,
}

#[derive(Debug, serde::Serialize)]
pub struct SessionOutput {
    pub authenticated: bool,
    pub access: Access,
    pub user: Option<User>,
    #[serde(skip)]
    pub message: String,
}

impl SessionOutput {
    fn new(state: AuthState, message: impl Into<String>) -> Self {
        Self {
            authenticated: state.is_authenticated,
            access: Access::evaluate(&state),
            user: state.user,
            message: message.into(),
        }
    }
}

impl CommandOutput for SessionOutput {
    fn to_human(&self) -> String {
        let Some(user) = &self.user else {
            return action_warning(&self.message);
        };
        let mut lines = vec![action_success(&self.message)];
        let view = DetailView::new(&user.display_name())
            .field("Username", &user.username)
            .field("Email", &user.email)
            .field_opt("Company", user.company_name.as_deref())
            .field("Role", &user.role)
            .field(
                "Credentials",
                if user.has_credentials {
                    "configured"
                } else {
                    "missing (contact your administrator)"
                },
            );
        lines.push(view.render());
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn prompt_password() -> Result<String> {
    let term = Term::stderr();
    term.write_str("Password: ")
        .context("Failed to write prompt")?;
    term.read_secure_line().context("Failed to read password")
}

pub async fn execute(args: AuthArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let service = ctx.auth_service()?;

    match args.command {
        AuthCommands::Signin { username, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password()?,
            };
            let state = service.sign_in(&username, &password).await?;
            let name = state
                .user
                .as_ref()
                .map_or_else(|| username.clone(), User::display_name);
            output(&SessionOutput::new(state, format!("Signed in as {name}")), json_mode);
        }

        AuthCommands::Status => {
            let state = service.check_auth().await?;
            let message = if state.is_authenticated {
                "Session is valid"
            } else {
                "Not signed in. Run 'iconesign auth signin <username>'."
            };
            output(&SessionOutput::new(state, message), json_mode);
        }

        AuthCommands::Signout => {
            service.sign_out()?;
            output(
                &SessionOutput::new(AuthState::default(), "Signed out"),
                json_mode,
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(has_credentials: bool) -> User {
        User {
            id: 1,
            username: "amira".to_string(),
            email: "amira@example.tn".to_string(),
            first_name: "Amira".to_string(),
            last_name: "Ben Salah".to_string(),
            company_name: Some("Icone".to_string()),
            role: "USER".to_string(),
            has_credentials,
        }
    }

    #[test]
    fn test_session_output_json_reports_access() {
        let out = SessionOutput::new(
            AuthState::authenticated(user(false), "tok".to_string()),
            "ok",
        );
        let json = out.to_json();
        assert_eq!(json["authenticated"], true);
        assert_eq!(json["access"], "credentials_missing");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_signed_out_human_output() {
        colored::control::set_override(false);
        let out = SessionOutput::new(AuthState::default(), "Signed out");
        assert_eq!(out.to_human(), "! Signed out");
    }
}

//! Login, logout, self-registration and password recovery

use super::{autofill_address, detail, id_text};
use crate::context::Context;
use anyhow::{Context as _, Result};
use clap::Args;
use comercio_api_client::endpoints::auth::ResetPassword;
use comercio_api_client::endpoints::users::UserDraft;
use comercio_cli::output::Status;
use comercio_core::guard::{Access, Route, authorize};
use comercio_core::session::{self, RoleRef};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct Identity<'a> {
    user_id: Option<&'a str>,
    roles: &'a [RoleRef],
    admin_access: bool,
}

pub async fn login(ctx: &Context, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };

    let client = ctx.open(&Route::Root)?;
    let session = ctx
        .change(
            "Logging in...",
            &format!("Logged in as {email}"),
            client.auth().login(email, &password),
        )
        .await?;
    session
        .save(ctx.store())
        .context("Failed to store the session")?;

    let admin_access = authorize(&ctx.session_state()?, &Route::Menu) == Access::Allow;
    if !admin_access {
        Status::warning("Your roles do not give access to the admin screens");
    }

    ctx.emit(
        &Identity {
            user_id: session.user_id.as_deref(),
            roles: &session.roles,
            admin_access,
        },
        || {},
    )
}

fn prompt_password() -> Result<String> {
    let term = console::Term::stderr();
    term.write_str("Password: ")?;
    term.read_secure_line()
        .context("Failed to read the password")
}

pub fn logout(ctx: &Context) -> Result<()> {
    session::logout(ctx.store())?;
    info!("Logged out");
    ctx.emit(&serde_json::json!({ "logged_out": true }), || {
        Status::success("Logged out");
    })
}

pub fn whoami(ctx: &Context) -> Result<()> {
    let state = ctx.session_state()?;
    let session = state.require()?;
    let admin_access = authorize(&state, &Route::Menu) == Access::Allow;

    let identity = Identity {
        user_id: session.user_id.as_deref(),
        roles: &session.roles,
        admin_access,
    };
    ctx.emit(&identity, || {
        let roles = session
            .roles()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        detail(
            "Session",
            &[
                ("User", session.user_id.clone().unwrap_or_default()),
                ("Roles", roles),
                (
                    "Admin access",
                    if admin_access { "yes" } else { "no" }.to_string(),
                ),
            ],
        );
    })
}

/// Self-registration form
#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    /// Full name
    #[arg(long)]
    pub name: Option<String>,
    /// Login e-mail
    #[arg(long)]
    pub email: Option<String>,
    /// Password, at least 8 characters
    #[arg(long, env = "COMERCIO_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// CPF
    #[arg(long)]
    pub cpf: Option<String>,
    /// Nickname
    #[arg(long)]
    pub apelido: Option<String>,
    /// Phone
    #[arg(long)]
    pub telefone: Option<String>,
    /// Street; looked up from the CEP when left out
    #[arg(long)]
    pub rua: Option<String>,
    /// House number
    #[arg(long)]
    pub numero: Option<String>,
    /// Postal code
    #[arg(long)]
    pub cep: Option<String>,
    /// Address complement
    #[arg(long)]
    pub complemento: Option<String>,
    /// Neighborhood id; matched from the CEP when left out
    #[arg(long)]
    pub bairro: Option<i64>,
}

pub async fn register(ctx: &Context, mut args: RegisterArgs) -> Result<()> {
    // the CEP lookup needs a session; without one the address is sent as typed
    if let Ok(lookup) = ctx.open(&Route::CepLookup) {
        autofill_address(
            ctx,
            &lookup,
            args.cep.as_deref(),
            &mut args.rua,
            &mut args.bairro,
        )
        .await?;
    }

    let client = ctx.open(&Route::Register)?;
    let draft = UserDraft {
        name: args.name.unwrap_or_default(),
        email: args.email.unwrap_or_default(),
        password: args.password.unwrap_or_default(),
        cpf: args.cpf.unwrap_or_default(),
        apelido: args.apelido,
        telefone: args.telefone,
        rua: args.rua,
        numero: args.numero,
        cep: args.cep,
        complemento: args.complemento,
        bairro_id: args.bairro,
        roles: Vec::new(),
    };

    let user = ctx
        .change(
            "Creating account...",
            "Account created, you can now log in",
            client.users().register(&draft),
        )
        .await?;
    ctx.emit(&user, || {
        println!("  id {}", id_text(user.id));
    })
}

pub async fn forgot_password(ctx: &Context, email: &str) -> Result<()> {
    let client = ctx.open(&Route::RecoverPassword)?;
    let message = ctx
        .fetch("Requesting reset link...", client.auth().forgot_password(email))
        .await?;
    ctx.emit(&serde_json::json!({ "message": message }), || {
        Status::success(&message);
    })
}

/// Password reset form
#[derive(Args, Debug, Clone)]
pub struct ResetArgs {
    /// Token from the reset e-mail
    #[arg(long)]
    pub token: String,
    /// Account e-mail
    #[arg(long)]
    pub email: String,
    /// New password
    #[arg(long, env = "COMERCIO_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// New password, typed again
    #[arg(long)]
    pub password_confirmation: String,
}

pub async fn reset_password(ctx: &Context, args: ResetArgs) -> Result<()> {
    let client = ctx.open(&Route::RecoverPassword)?;
    let request = ResetPassword {
        token: args.token,
        email: args.email,
        password: args.password,
        password_confirmation: args.password_confirmation,
    };
    let message = ctx
        .fetch("Resetting password...", client.auth().reset_password(&request))
        .await?;
    ctx.emit(&serde_json::json!({ "message": message }), || {
        Status::success(&message);
    })
}

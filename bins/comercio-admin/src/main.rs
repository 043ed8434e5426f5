//! Comércio Assim admin CLI
//!
//! Manages the marketplace records (fairs, stalls, associations,
//! organizations, meetings, users and locations) against the backend API.

use clap::{Parser, Subcommand};
use comercio_api_client::ApiError;
use comercio_cli::output::{OutputFormat, Status};
use comercio_core::error::exit_codes;
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;

use commands::associacoes::AssociacoesCommand;
use commands::bairros::BairrosCommand;
use commands::bancas::BancasCommand;
use commands::cidades::CidadesCommand;
use commands::estados::EstadosCommand;
use commands::feiras::FeirasCommand;
use commands::ocs::OcsCommand;
use commands::reunioes::ReunioesCommand;
use commands::session::{RegisterArgs, ResetArgs};
use commands::usuarios::UsuariosCommand;
use context::{Context, Options, Settings};

/// Administration CLI for the Comércio Assim marketplace
#[derive(Parser)]
#[command(name = "comercio-admin")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format; defaults to the configured one
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Configuration file
    #[arg(short, long, global = true, env = "COMERCIO_CONFIG")]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the configuration
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        /// Account e-mail
        email: String,
        /// Password; prompted for when left out
        #[arg(long, env = "COMERCIO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in identity
    Whoami,

    /// Create an account without logging in
    Register(RegisterArgs),

    /// Ask for a password reset link
    ForgotPassword {
        /// Account e-mail
        email: String,
    },

    /// Set a new password with a reset token
    ResetPassword(ResetArgs),

    /// Look up an address by postal code
    Cep {
        /// Postal code, with or without the dash
        cep: String,
        /// Match the neighborhood among this city's
        #[arg(long)]
        cidade: Option<i64>,
    },

    /// Manage associations
    #[command(subcommand)]
    Associacoes(AssociacoesCommand),

    /// Manage neighborhoods
    #[command(subcommand)]
    Bairros(BairrosCommand),

    /// Manage stalls
    #[command(subcommand)]
    Bancas(BancasCommand),

    /// Manage cities
    #[command(subcommand)]
    Cidades(CidadesCommand),

    /// Browse states
    #[command(subcommand)]
    Estados(EstadosCommand),

    /// Manage fairs
    #[command(subcommand)]
    Feiras(FeirasCommand),

    /// Manage social control organizations
    #[command(subcommand)]
    Ocs(OcsCommand),

    /// Manage meetings
    #[command(subcommand)]
    Reunioes(ReunioesCommand),

    /// Manage users
    #[command(subcommand)]
    Usuarios(UsuariosCommand),
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("comercio_admin=debug,comercio_api_client=debug,comercio_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

async fn dispatch(ctx: &Context, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login { email, password } => {
            commands::session::login(ctx, &email, password).await
        }
        Commands::Logout => commands::session::logout(ctx),
        Commands::Whoami => commands::session::whoami(ctx),
        Commands::Register(args) => commands::session::register(ctx, args).await,
        Commands::ForgotPassword { email } => {
            commands::session::forgot_password(ctx, &email).await
        }
        Commands::ResetPassword(args) => commands::session::reset_password(ctx, args).await,
        Commands::Cep { cep, cidade } => commands::cep::run(ctx, &cep, cidade).await,
        Commands::Associacoes(cmd) => commands::associacoes::run(ctx, cmd).await,
        Commands::Bairros(cmd) => commands::bairros::run(ctx, cmd).await,
        Commands::Bancas(cmd) => commands::bancas::run(ctx, cmd).await,
        Commands::Cidades(cmd) => commands::cidades::run(ctx, cmd).await,
        Commands::Estados(cmd) => commands::estados::run(ctx, cmd).await,
        Commands::Feiras(cmd) => commands::feiras::run(ctx, cmd).await,
        Commands::Ocs(cmd) => commands::ocs::run(ctx, cmd).await,
        Commands::Reunioes(cmd) => commands::reunioes::run(ctx, cmd).await,
        Commands::Usuarios(cmd) => commands::usuarios::run(ctx, cmd).await,
    }
}

/// The error the user should hear about, and the exit code it maps to
enum Cause<'a> {
    Api(&'a ApiError),
    Core(&'a comercio_core::Error),
    Other,
}

fn cause(err: &anyhow::Error) -> Cause<'_> {
    for e in err.chain() {
        if let Some(api) = e.downcast_ref::<ApiError>() {
            return match api {
                ApiError::Core(core) => Cause::Core(core),
                other => Cause::Api(other),
            };
        }
        if let Some(core) = e.downcast_ref::<comercio_core::Error>() {
            return Cause::Core(core);
        }
    }
    Cause::Other
}

fn exit_code(cause: &Cause<'_>) -> i32 {
    match cause {
        Cause::Api(api) => match api {
            ApiError::InvalidInput(_) | ApiError::Rejected(_) | ApiError::Validation { .. } => {
                exit_codes::VALIDATION_ERROR
            }
            ApiError::Unauthenticated
            | ApiError::Unauthorized { .. }
            | ApiError::Forbidden { .. } => exit_codes::SESSION_ERROR,
            ApiError::Config(_) | ApiError::InvalidUrl(_) => exit_codes::CONFIG_ERROR,
            ApiError::Request(_) | ApiError::ApiResponse { .. } | ApiError::NotFound { .. } => {
                exit_codes::REMOTE_ERROR
            }
            _ => exit_codes::FAILURE,
        },
        Cause::Core(core) => core.exit_code(),
        Cause::Other => exit_codes::FAILURE,
    }
}

/// Transport failures and server crashes are not worth showing verbatim
fn message(err: &anyhow::Error, cause: &Cause<'_>) -> String {
    match cause {
        Cause::Api(api) if matches!(api, ApiError::Request(_)) => {
            warn!(error = %api, "Request failed");
            "Could not reach the server, check your connection and the API URL".to_string()
        }
        Cause::Api(api) if api.is_server_error() => {
            warn!(error = %api, "Server error");
            "The server failed to handle the request, try again later".to_string()
        }
        Cause::Api(api) => api.user_message(),
        Cause::Core(core) => core.message.clone(),
        Cause::Other => format!("{err:#}"),
    }
}

fn report(err: &anyhow::Error, format: OutputFormat) -> i32 {
    let cause = cause(err);
    let code = exit_code(&cause);
    let message = message(err, &cause);
    let fields = match &cause {
        Cause::Api(api) => api.field_messages(),
        _ => Vec::new(),
    };
    let detail = match &cause {
        Cause::Core(core) => Some(core.to_report()),
        _ => None,
    };
    let suggestion = detail.as_ref().and_then(|d| d.suggestion.clone());

    if format.is_json() {
        let body = json!({
            "error": {
                "message": message,
                "exit_code": code,
                "fields": fields
                    .iter()
                    .map(|(field, msg)| json!({ "field": field, "message": msg }))
                    .collect::<Vec<_>>(),
                "suggestion": suggestion,
                "detail": detail,
            }
        });
        eprintln!("{body}");
        return code;
    }

    eprintln!("{} {}", "Error:".red().bold(), message);
    for (field, msg) in &fields {
        Status::field(field, msg);
    }
    if let Some(context) = detail.as_ref().and_then(|d| d.context.as_deref()) {
        eprintln!("  {}", context.dimmed());
    }
    if let Some(suggestion) = suggestion {
        eprintln!("  {} {}", "→".dimmed(), suggestion.dimmed());
    }
    code
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let options = Options {
        config: cli.config,
        api_url: cli.api_url,
        format: cli.format,
    };

    // Logs follow the resolved format, so the config is read before tracing starts
    let settings = match Settings::resolve(&options) {
        Ok(settings) => settings,
        Err(e) => {
            let format = cli.format.unwrap_or_default();
            init_tracing(cli.verbose, format.is_json());
            return exit(report(&e, format));
        }
    };
    let format = settings.format;
    init_tracing(cli.verbose, format.is_json());

    let ctx = match Context::build(&options, settings) {
        Ok(ctx) => ctx,
        Err(e) => return exit(report(&e, format)),
    };

    match dispatch(&ctx, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => exit(report(&e, ctx.format)),
    }
}

fn exit(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

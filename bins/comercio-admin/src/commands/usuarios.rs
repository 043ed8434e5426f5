//! Users, roles and presidents

use super::{autofill_address, delete_row, detail, id_text, listing};
use crate::context::Context;
use anyhow::Result;
use clap::{Args, Subcommand};
use comercio_api_client::endpoints::users::{UserDraft, UserEdit};
use comercio_api_client::models::User;
use comercio_cli::output::{Status, Table};
use comercio_core::documents::format_cpf;
use comercio_core::guard::{Resource, Route};
use serde_json::json;

const RESOURCE: Resource = Resource::Usuarios;

#[derive(Subcommand, Debug)]
pub enum UsuariosCommand {
    /// List every user
    List,
    /// Show one user
    Show { id: i64 },
    /// Create a user
    Create(UserArgs),
    /// Edit a user; fields left out keep their value
    Edit {
        id: i64,
        #[command(flatten)]
        fields: UserArgs,
    },
    /// Delete a user
    Delete { id: i64 },
    /// Users eligible to preside an association
    Presidents,
    /// Roles a user can be given
    Roles,
    /// Check whether an e-mail or CPF is already registered
    Exists {
        /// E-mail to look for
        #[arg(long, required_unless_present = "cpf")]
        email: Option<String>,
        /// CPF to look for
        #[arg(long)]
        cpf: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct UserArgs {
    /// Full name
    #[arg(long)]
    pub name: Option<String>,
    /// Login e-mail
    #[arg(long)]
    pub email: Option<String>,
    /// Password, at least 8 characters; left unchanged on edit when blank
    #[arg(long)]
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
    /// Role id (repeatable)
    #[arg(long = "role")]
    pub roles: Vec<u32>,
}

fn table(users: &[User]) {
    let mut table = Table::new(["ID", "Name", "E-mail", "Roles"]);
    for u in users {
        table.row([
            id_text(u.id),
            u.name.clone(),
            u.email().to_string(),
            u.role_names(),
        ]);
    }
    listing(&table, "user", "users");
}

fn show(u: &User) {
    let cpf = u.cpf.as_deref().unwrap_or_default();
    let address = u
        .endereco
        .as_ref()
        .map(|e| format!("{}, {} {}", e.rua, e.numero, e.cep))
        .or_else(|| {
            u.rua.as_ref().map(|rua| {
                format!(
                    "{rua}, {} {}",
                    u.numero.as_deref().unwrap_or_default(),
                    u.cep.as_deref().unwrap_or_default()
                )
            })
        })
        .unwrap_or_default();

    detail(
        &format!("User {}", id_text(u.id)),
        &[
            ("Name", u.name.clone()),
            ("Nickname", u.apelido.clone().unwrap_or_default()),
            ("E-mail", u.email().to_string()),
            ("Phone", u.telefone().unwrap_or_default().to_string()),
            ("CPF", format_cpf(cpf).unwrap_or_else(|| cpf.to_string())),
            ("Address", address),
            ("Roles", u.role_names()),
        ],
    );
}

pub async fn run(ctx: &Context, command: UsuariosCommand) -> Result<()> {
    match command {
        UsuariosCommand::List => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            let users = ctx.fetch("Loading users...", client.users().list()).await?;
            ctx.emit(&users, || table(&users))
        }
        UsuariosCommand::Show { id } => {
            let client = ctx.open(&Route::Detail(RESOURCE, id))?;
            let user = ctx.fetch("Loading user...", client.users().get(id)).await?;
            ctx.emit(&user, || show(&user))
        }
        UsuariosCommand::Create(mut args) => {
            let client = ctx.open(&Route::Create(RESOURCE))?;
            autofill_address(
                ctx,
                &client,
                args.cep.as_deref(),
                &mut args.rua,
                &mut args.bairro,
            )
            .await?;
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
                roles: args.roles,
            };
            let user = ctx
                .change(
                    "Creating user...",
                    "User created",
                    client.users().create(&draft),
                )
                .await?;
            ctx.emit(&user, || show(&user))
        }
        UsuariosCommand::Edit { id, fields } => {
            let client = ctx.open(&Route::Edit(RESOURCE, id))?;
            let edit = UserEdit {
                name: fields.name,
                email: fields.email,
                password: fields.password,
                telefone: fields.telefone,
                cpf: fields.cpf,
                rua: fields.rua,
                numero: fields.numero,
                cep: fields.cep,
                bairro_id: fields.bairro,
                roles: Some(fields.roles),
            };
            let user = ctx
                .change(
                    "Saving user...",
                    "User updated",
                    client.users().edit(id, &edit),
                )
                .await?;
            ctx.emit(&user, || show(&user))
        }
        UsuariosCommand::Delete { id } => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            delete_row(ctx, &client.users(), id, "user", table).await
        }
        UsuariosCommand::Presidents => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            let presidents = ctx
                .fetch("Loading presidents...", client.users().presidents())
                .await?;
            ctx.emit(&presidents, || {
                let mut table = Table::new(["ID", "Name", "E-mail"]);
                for p in &presidents {
                    table.row([p.id.to_string(), p.name.clone(), p.email.clone()]);
                }
                listing(&table, "president", "presidents");
            })
        }
        UsuariosCommand::Roles => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            let roles = ctx.fetch("Loading roles...", client.users().roles()).await?;
            ctx.emit(&roles, || {
                let mut table = Table::new(["ID", "Name"]);
                for r in &roles {
                    table.row([r.id.to_string(), r.nome.clone()]);
                }
                listing(&table, "role", "roles");
            })
        }
        UsuariosCommand::Exists { email, cpf } => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            let users = client.users();
            let email_taken = match &email {
                Some(e) => Some(ctx.fetch("Checking e-mail...", users.email_exists(e)).await?),
                None => None,
            };
            let cpf_taken = match &cpf {
                Some(c) => Some(ctx.fetch("Checking CPF...", users.cpf_exists(c)).await?),
                None => None,
            };
            ctx.emit(&json!({ "email": email_taken, "cpf": cpf_taken }), || {
                for (label, taken) in [("E-mail", email_taken), ("CPF", cpf_taken)] {
                    match taken {
                        Some(true) => Status::warning(&format!("{label} is already registered")),
                        Some(false) => Status::success(&format!("{label} is available")),
                        None => {}
                    }
                }
            })
        }
    }
}

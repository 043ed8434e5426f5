//! Social control organizations and their farmers

use super::{autofill_address, delete_row, detail, id_text, ids_text, listing};
use crate::context::Context;
use anyhow::Result;
use clap::{Args, Subcommand};
use comercio_api_client::endpoints::ocs::{OcsDraft, OcsEdit};
use comercio_api_client::models::{Ocs, User};
use comercio_cli::output::{Status, Table};
use comercio_core::documents::format_cnpj;
use comercio_core::guard::{Resource, Route};
use serde_json::json;

const RESOURCE: Resource = Resource::Ocs;

#[derive(Subcommand, Debug)]
pub enum OcsCommand {
    /// List every organization
    List,
    /// Show one organization
    Show { id: i64 },
    /// Farmers taking part in an organization
    Participantes { id: i64 },
    /// Create an organization
    Create(OcsArgs),
    /// Edit an organization; fields left out keep their value
    Edit {
        id: i64,
        #[command(flatten)]
        fields: OcsArgs,
    },
    /// Delete an organization
    Delete { id: i64 },
    /// Attach a farmer to an organization
    Link {
        /// Farmer user id
        user: i64,
        /// Organization id
        #[arg(long)]
        ocs: i64,
    },
    /// Detach a farmer from its organization
    Unlink {
        /// Farmer user id
        user: i64,
    },
    /// Check whether an e-mail or CNPJ is already registered
    Exists {
        /// E-mail to look for
        #[arg(long, required_unless_present = "cnpj")]
        email: Option<String>,
        /// CNPJ to look for
        #[arg(long)]
        cnpj: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct OcsArgs {
    /// Name
    #[arg(long)]
    pub nome: Option<String>,
    /// CNPJ
    #[arg(long)]
    pub cnpj: Option<String>,
    /// Contact e-mail
    #[arg(long)]
    pub email: Option<String>,
    /// Contact phone
    #[arg(long)]
    pub telefone: Option<String>,
    /// Street; looked up from the CEP when left out
    #[arg(long)]
    pub rua: Option<String>,
    /// Number
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
    /// Association id
    #[arg(long)]
    pub associacao: Option<i64>,
    /// Farmer user id (repeatable)
    #[arg(long = "agricultor")]
    pub agricultores: Vec<i64>,
}

fn cnpj_text(cnpj: &str) -> String {
    format_cnpj(cnpj).unwrap_or_else(|| cnpj.to_string())
}

fn table(list: &[Ocs]) {
    let mut table = Table::new(["ID", "Name", "CNPJ", "E-mail"]);
    for o in list {
        table.row([
            id_text(o.id),
            o.nome.clone(),
            cnpj_text(&o.cnpj),
            o.email().unwrap_or_default().to_string(),
        ]);
    }
    listing(&table, "organization", "organizations");
}

fn members(users: &[User]) {
    let mut table = Table::new(["ID", "Name", "E-mail"]);
    for u in users {
        table.row([id_text(u.id), u.name.clone(), u.email().to_string()]);
    }
    listing(&table, "farmer", "farmers");
}

fn show(o: &Ocs) {
    let address = o
        .endereco
        .as_ref()
        .map(|e| format!("{}, {} {}", e.rua, e.numero, e.cep))
        .or_else(|| {
            o.rua.as_ref().map(|rua| {
                format!(
                    "{rua}, {} {}",
                    o.numero.as_deref().unwrap_or_default(),
                    o.cep.as_deref().unwrap_or_default()
                )
            })
        })
        .unwrap_or_default();
    let association = o
        .associacao
        .as_ref()
        .map(|a| a.nome.clone())
        .unwrap_or_else(|| id_text(o.associacao_id));

    detail(
        &format!("Organization {}", id_text(o.id)),
        &[
            ("Name", o.nome.clone()),
            ("CNPJ", cnpj_text(&o.cnpj)),
            ("E-mail", o.email().unwrap_or_default().to_string()),
            ("Phone", o.telefone().unwrap_or_default().to_string()),
            ("Address", address),
            ("Association", association),
            ("Farmers", ids_text(&o.agricultores_id)),
        ],
    );
}

pub async fn run(ctx: &Context, command: OcsCommand) -> Result<()> {
    match command {
        OcsCommand::List => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            let list = ctx
                .fetch("Loading organizations...", client.ocs().list())
                .await?;
            ctx.emit(&list, || table(&list))
        }
        OcsCommand::Show { id } => {
            let client = ctx.open(&Route::Detail(RESOURCE, id))?;
            let ocs = ctx
                .fetch("Loading organization...", client.ocs().get(id))
                .await?;
            ctx.emit(&ocs, || show(&ocs))
        }
        OcsCommand::Participantes { id } => {
            let client = ctx.open(&Route::OcsParticipantes(id))?;
            let users = ctx
                .fetch("Loading farmers...", client.ocs().participantes(id))
                .await?;
            ctx.emit(&users, || members(&users))
        }
        OcsCommand::Create(mut args) => {
            let client = ctx.open(&Route::Create(RESOURCE))?;
            autofill_address(
                ctx,
                &client,
                args.cep.as_deref(),
                &mut args.rua,
                &mut args.bairro,
            )
            .await?;
            let draft = OcsDraft {
                nome: args.nome.unwrap_or_default(),
                cnpj: args.cnpj.unwrap_or_default(),
                email: args.email.unwrap_or_default(),
                telefone: args.telefone.unwrap_or_default(),
                rua: args.rua.unwrap_or_default(),
                numero: args.numero.unwrap_or_default(),
                cep: args.cep.unwrap_or_default(),
                complemento: args.complemento,
                bairro_id: args.bairro,
                associacao_id: args.associacao,
                agricultores_id: args.agricultores,
            };
            let ocs = ctx
                .change(
                    "Creating organization...",
                    "Organization created",
                    client.ocs().create(&draft),
                )
                .await?;
            ctx.emit(&ocs, || show(&ocs))
        }
        OcsCommand::Edit { id, fields } => {
            let client = ctx.open(&Route::Edit(RESOURCE, id))?;
            let edit = OcsEdit {
                nome: fields.nome,
                cnpj: fields.cnpj,
                email: fields.email,
                telefone: fields.telefone,
                rua: fields.rua,
                numero: fields.numero,
                cep: fields.cep,
                complemento: fields.complemento,
                bairro_id: fields.bairro,
                associacao_id: fields.associacao,
                agricultores_id: Some(fields.agricultores),
            };
            let ocs = ctx
                .change(
                    "Saving organization...",
                    "Organization updated",
                    client.ocs().edit(id, &edit),
                )
                .await?;
            ctx.emit(&ocs, || show(&ocs))
        }
        OcsCommand::Delete { id } => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            delete_row(ctx, &client.ocs(), id, "organization", table).await
        }
        OcsCommand::Link { user, ocs } => {
            let client = ctx.open(&Route::OcsParticipantes(ocs))?;
            ctx.change(
                "Linking farmer...",
                "Farmer linked",
                client.ocs().link_agricultor(user, ocs),
            )
            .await?;
            ctx.emit(&json!({ "user_id": user, "organizacao_id": ocs }), || {})
        }
        OcsCommand::Unlink { user } => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            ctx.change(
                "Unlinking farmer...",
                "Farmer unlinked",
                client.ocs().unlink_agricultor(user),
            )
            .await?;
            ctx.emit(&json!({ "user_id": user }), || {})
        }
        OcsCommand::Exists { email, cnpj } => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            let api = client.ocs();
            let email_taken = match &email {
                Some(e) => Some(ctx.fetch("Checking e-mail...", api.email_exists(e)).await?),
                None => None,
            };
            let cnpj_taken = match &cnpj {
                Some(c) => Some(ctx.fetch("Checking CNPJ...", api.cnpj_exists(c)).await?),
                None => None,
            };
            ctx.emit(&json!({ "email": email_taken, "cnpj": cnpj_taken }), || {
                for (label, taken) in [("E-mail", email_taken), ("CNPJ", cnpj_taken)] {
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

//! Associations

use super::{autofill_address, delete_row, detail, id_text, ids_text, listing};
use crate::context::Context;
use anyhow::Result;
use clap::{Args, Subcommand};
use comercio_api_client::endpoints::associacoes::{AssociacaoDraft, AssociacaoEdit};
use comercio_api_client::models::Associacao;
use comercio_cli::output::Table;
use comercio_core::guard::{Resource, Route};

const RESOURCE: Resource = Resource::Associacoes;

#[derive(Subcommand, Debug)]
pub enum AssociacoesCommand {
    /// List every association
    List,
    /// Show one association
    Show { id: i64 },
    /// Create an association
    Create(AssociacaoArgs),
    /// Edit an association; fields left out keep their value
    Edit {
        id: i64,
        #[command(flatten)]
        fields: AssociacaoArgs,
    },
    /// Delete an association
    Delete { id: i64 },
}

#[derive(Args, Debug, Clone)]
pub struct AssociacaoArgs {
    /// Name
    #[arg(long)]
    pub nome: Option<String>,
    /// Contact e-mail
    #[arg(long)]
    pub email: Option<String>,
    /// Contact phone
    #[arg(long)]
    pub telefone: Option<String>,
    /// Foundation date, dd/mm/yyyy
    #[arg(long)]
    pub data_fundacao: Option<String>,
    /// Street; looked up from the CEP when left out
    #[arg(long)]
    pub rua: Option<String>,
    /// Number
    #[arg(long)]
    pub numero: Option<String>,
    /// Postal code
    #[arg(long)]
    pub cep: Option<String>,
    /// Neighborhood id; matched from the CEP when left out
    #[arg(long)]
    pub bairro: Option<i64>,
    /// President user id (repeatable)
    #[arg(long = "presidente")]
    pub presidentes: Vec<i64>,
    /// Secretary user id (repeatable)
    #[arg(long = "secretario")]
    pub secretarios: Vec<i64>,
}

fn table(associacoes: &[Associacao]) {
    let mut table = Table::new(["ID", "Name", "E-mail", "Phone"]);
    for a in associacoes {
        table.row([
            id_text(a.id),
            a.nome.clone(),
            a.email().unwrap_or_default().to_string(),
            a.telefone().unwrap_or_default().to_string(),
        ]);
    }
    listing(&table, "association", "associations");
}

fn show(a: &Associacao) {
    let address = a
        .endereco
        .as_ref()
        .map(|e| format!("{}, {} {}", e.rua, e.numero, e.cep))
        .unwrap_or_default();
    let presidentes = a
        .presidentes
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    detail(
        &format!("Association {}", id_text(a.id)),
        &[
            ("Name", a.nome.clone()),
            ("Founded", a.data_fundacao.clone().unwrap_or_default()),
            ("E-mail", a.email().unwrap_or_default().to_string()),
            ("Phone", a.telefone().unwrap_or_default().to_string()),
            ("Address", address),
            ("Neighborhood", id_text(a.bairro_id())),
            ("Presidents", presidentes),
            ("Secretaries", ids_text(&a.secretarios_id)),
        ],
    );
}

pub async fn run(ctx: &Context, command: AssociacoesCommand) -> Result<()> {
    match command {
        AssociacoesCommand::List => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            let list = ctx
                .fetch("Loading associations...", client.associacoes().list())
                .await?;
            ctx.emit(&list, || table(&list))
        }
        AssociacoesCommand::Show { id } => {
            let client = ctx.open(&Route::Detail(RESOURCE, id))?;
            let associacao = ctx
                .fetch("Loading association...", client.associacoes().get(id))
                .await?;
            ctx.emit(&associacao, || show(&associacao))
        }
        AssociacoesCommand::Create(mut args) => {
            let client = ctx.open(&Route::Create(RESOURCE))?;
            autofill_address(
                ctx,
                &client,
                args.cep.as_deref(),
                &mut args.rua,
                &mut args.bairro,
            )
            .await?;
            let draft = AssociacaoDraft {
                nome: args.nome.unwrap_or_default(),
                email: args.email.unwrap_or_default(),
                telefone: args.telefone.unwrap_or_default(),
                data_fundacao: args.data_fundacao.unwrap_or_default(),
                rua: args.rua.unwrap_or_default(),
                numero: args.numero.unwrap_or_default(),
                cep: args.cep.unwrap_or_default(),
                bairro_id: args.bairro,
                presidentes_id: args.presidentes,
                secretarios_id: args.secretarios,
            };
            let associacao = ctx
                .change(
                    "Creating association...",
                    "Association created",
                    client.associacoes().create(&draft),
                )
                .await?;
            ctx.emit(&associacao, || show(&associacao))
        }
        AssociacoesCommand::Edit { id, fields } => {
            let client = ctx.open(&Route::Edit(RESOURCE, id))?;
            let edit = AssociacaoEdit {
                nome: fields.nome,
                email: fields.email,
                telefone: fields.telefone,
                data_fundacao: fields.data_fundacao,
                rua: fields.rua,
                numero: fields.numero,
                cep: fields.cep,
                bairro_id: fields.bairro,
                presidentes_id: Some(fields.presidentes),
                secretarios_id: Some(fields.secretarios),
            };
            let associacao = ctx
                .change(
                    "Saving association...",
                    "Association updated",
                    client.associacoes().edit(id, &edit),
                )
                .await?;
            ctx.emit(&associacao, || show(&associacao))
        }
        AssociacoesCommand::Delete { id } => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            delete_row(ctx, &client.associacoes(), id, "association", table).await
        }
    }
}

//! Cities and their neighborhoods

use super::{bairros, delete_row, detail, id_text, listing};
use crate::context::Context;
use anyhow::Result;
use clap::{Args, Subcommand};
use comercio_api_client::endpoints::cidades::{CidadeDraft, CidadeEdit};
use comercio_api_client::models::Cidade;
use comercio_cli::output::Table;
use comercio_core::guard::{Resource, Route};

const RESOURCE: Resource = Resource::Cidades;

#[derive(Subcommand, Debug)]
pub enum CidadesCommand {
    /// List every city
    List,
    /// Show one city
    Show { id: i64 },
    /// Search cities by name
    Search { query: String },
    /// Neighborhoods of one city
    Bairros { id: i64 },
    /// Create a city
    Create(CidadeArgs),
    /// Edit a city; fields left out keep their value
    Edit {
        id: i64,
        #[command(flatten)]
        fields: CidadeArgs,
    },
    /// Delete a city
    Delete { id: i64 },
}

#[derive(Args, Debug, Clone)]
pub struct CidadeArgs {
    /// Name
    #[arg(long)]
    pub nome: Option<String>,
    /// State id
    #[arg(long)]
    pub estado: Option<i64>,
}

fn state_of(c: &Cidade) -> String {
    c.estado
        .as_ref()
        .map(|e| e.sigla.clone())
        .unwrap_or_else(|| id_text(c.estado_id))
}

fn table(cidades: &[Cidade]) {
    let mut table = Table::new(["ID", "Name", "State"]);
    for c in cidades {
        table.row([id_text(c.id), c.nome.clone(), state_of(c)]);
    }
    listing(&table, "city", "cities");
}

fn show(c: &Cidade) {
    detail(
        &format!("City {}", id_text(c.id)),
        &[
            ("Name", c.nome.clone()),
            ("State", state_of(c)),
            (
                "Neighborhoods",
                c.bairros
                    .iter()
                    .map(|b| b.nome.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        ],
    );
}

pub async fn run(ctx: &Context, command: CidadesCommand) -> Result<()> {
    match command {
        CidadesCommand::List => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            let cidades = ctx
                .fetch("Loading cities...", client.cidades().list())
                .await?;
            ctx.emit(&cidades, || table(&cidades))
        }
        CidadesCommand::Show { id } => {
            let client = ctx.open(&Route::Detail(RESOURCE, id))?;
            let cidade = ctx
                .fetch("Loading city...", client.cidades().get(id))
                .await?;
            ctx.emit(&cidade, || show(&cidade))
        }
        CidadesCommand::Search { query } => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            let cidades = ctx
                .fetch("Searching cities...", client.cidades().search(&query))
                .await?;
            ctx.emit(&cidades, || table(&cidades))
        }
        CidadesCommand::Bairros { id } => {
            let client = ctx.open(&Route::CidadeBairros(id))?;
            let list = ctx
                .fetch("Loading neighborhoods...", client.cidades().bairros(id))
                .await?;
            ctx.emit(&list, || bairros::table(&list))
        }
        CidadesCommand::Create(args) => {
            let client = ctx.open(&Route::Create(RESOURCE))?;
            let draft = CidadeDraft {
                nome: args.nome.unwrap_or_default(),
                estado_id: args.estado,
            };
            let cidade = ctx
                .change(
                    "Creating city...",
                    "City created",
                    client.cidades().create(&draft),
                )
                .await?;
            ctx.emit(&cidade, || show(&cidade))
        }
        CidadesCommand::Edit { id, fields } => {
            let client = ctx.open(&Route::Edit(RESOURCE, id))?;
            let edit = CidadeEdit {
                nome: fields.nome,
                estado_id: fields.estado,
            };
            let cidade = ctx
                .change(
                    "Saving city...",
                    "City updated",
                    client.cidades().edit(id, &edit),
                )
                .await?;
            ctx.emit(&cidade, || show(&cidade))
        }
        CidadesCommand::Delete { id } => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            delete_row(ctx, &client.cidades(), id, "city", table).await
        }
    }
}

//! Neighborhoods

use super::{delete_row, detail, id_text, listing};
use crate::context::Context;
use anyhow::Result;
use clap::{Args, Subcommand};
use comercio_api_client::endpoints::bairros::{BairroDraft, BairroEdit};
use comercio_api_client::models::Bairro;
use comercio_cli::output::Table;
use comercio_core::guard::{Resource, Route};

const RESOURCE: Resource = Resource::Bairros;

#[derive(Subcommand, Debug)]
pub enum BairrosCommand {
    /// List every neighborhood
    List,
    /// Show one neighborhood
    Show { id: i64 },
    /// Create a neighborhood
    Create(BairroArgs),
    /// Edit a neighborhood; fields left out keep their value
    Edit {
        id: i64,
        #[command(flatten)]
        fields: BairroArgs,
    },
    /// Delete a neighborhood
    Delete { id: i64 },
}

#[derive(Args, Debug, Clone)]
pub struct BairroArgs {
    /// Name
    #[arg(long)]
    pub nome: Option<String>,
    /// City id
    #[arg(long)]
    pub cidade: Option<i64>,
}

pub fn table(bairros: &[Bairro]) {
    let mut table = Table::new(["ID", "Name", "City"]);
    for b in bairros {
        table.row([b.id.to_string(), b.nome.clone(), id_text(b.cidade_id)]);
    }
    listing(&table, "neighborhood", "neighborhoods");
}

fn show(b: &Bairro) {
    detail(
        &format!("Neighborhood {}", b.id),
        &[("Name", b.nome.clone()), ("City", id_text(b.cidade_id))],
    );
}

pub async fn run(ctx: &Context, command: BairrosCommand) -> Result<()> {
    match command {
        BairrosCommand::List => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            let bairros = ctx
                .fetch("Loading neighborhoods...", client.bairros().list())
                .await?;
            ctx.emit(&bairros, || table(&bairros))
        }
        BairrosCommand::Show { id } => {
            let client = ctx.open(&Route::Detail(RESOURCE, id))?;
            let bairro = ctx
                .fetch("Loading neighborhood...", client.bairros().get(id))
                .await?;
            ctx.emit(&bairro, || show(&bairro))
        }
        BairrosCommand::Create(args) => {
            let client = ctx.open(&Route::Create(RESOURCE))?;
            let draft = BairroDraft {
                nome: args.nome.unwrap_or_default(),
                cidade_id: args.cidade,
            };
            let bairro = ctx
                .change(
                    "Creating neighborhood...",
                    "Neighborhood created",
                    client.bairros().create(&draft),
                )
                .await?;
            ctx.emit(&bairro, || show(&bairro))
        }
        BairrosCommand::Edit { id, fields } => {
            let client = ctx.open(&Route::Edit(RESOURCE, id))?;
            let edit = BairroEdit {
                nome: fields.nome,
                cidade_id: fields.cidade,
            };
            let bairro = ctx
                .change(
                    "Saving neighborhood...",
                    "Neighborhood updated",
                    client.bairros().edit(id, &edit),
                )
                .await?;
            ctx.emit(&bairro, || show(&bairro))
        }
        BairrosCommand::Delete { id } => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            delete_row(ctx, &client.bairros(), id, "neighborhood", table).await
        }
    }
}

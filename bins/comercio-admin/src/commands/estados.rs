//! States (read-only)

use super::listing;
use crate::context::Context;
use anyhow::Result;
use clap::Subcommand;
use comercio_cli::output::Table;
use comercio_core::guard::{Resource, Route};

#[derive(Subcommand, Debug)]
pub enum EstadosCommand {
    /// List every state
    List,
}

pub async fn run(ctx: &Context, command: EstadosCommand) -> Result<()> {
    match command {
        EstadosCommand::List => {
            let client = ctx.open(&Route::List(Resource::Estados))?;
            let estados = ctx
                .fetch("Loading states...", client.estados().list())
                .await?;
            ctx.emit(&estados, || {
                let mut table = Table::new(["ID", "UF", "Name"]);
                for e in &estados {
                    table.row([e.id.to_string(), e.sigla.clone(), e.nome.clone()]);
                }
                listing(&table, "state", "states");
            })
        }
    }
}

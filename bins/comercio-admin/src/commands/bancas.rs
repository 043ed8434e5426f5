//! Stalls

use super::{delete_row, detail, id_text, listing};
use crate::context::Context;
use anyhow::Result;
use clap::{Args, Subcommand};
use comercio_api_client::endpoints::bancas::{BancaDraft, BancaEdit};
use comercio_api_client::models::Banca;
use comercio_cli::output::Table;
use comercio_core::guard::{Resource, Route};

const RESOURCE: Resource = Resource::Bancas;

#[derive(Subcommand, Debug)]
pub enum BancasCommand {
    /// List every stall
    List,
    /// Show one stall
    Show { id: i64 },
    /// Look up a stall owner by farmer id
    Agricultor { id: i64 },
    /// Create a stall
    Create(BancaArgs),
    /// Edit a stall; fields left out keep their value
    Edit {
        id: i64,
        #[command(flatten)]
        fields: BancaArgs,
    },
    /// Delete a stall
    Delete { id: i64 },
}

#[derive(Args, Debug, Clone)]
pub struct BancaArgs {
    /// Name
    #[arg(long)]
    pub nome: Option<String>,
    /// Description
    #[arg(long)]
    pub descricao: Option<String>,
    /// Opening time, HH:MM
    #[arg(long)]
    pub abertura: Option<String>,
    /// Closing time, HH:MM
    #[arg(long)]
    pub fechamento: Option<String>,
    /// Minimum order value
    #[arg(long)]
    pub preco_minimo: Option<f64>,
    /// Whether the stall delivers
    #[arg(long)]
    pub entrega: Option<bool>,
    /// Fair id
    #[arg(long)]
    pub feira: Option<i64>,
    /// Farmer user id
    #[arg(long)]
    pub agricultor: Option<i64>,
    /// PIX key
    #[arg(long)]
    pub pix: Option<String>,
}

fn join<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

pub fn table(bancas: &[Banca]) {
    let mut table = Table::new(["ID", "Name", "Hours", "Min. price", "Delivery"]);
    for b in bancas {
        table.row([
            b.id.to_string(),
            b.nome.clone(),
            format!("{}-{}", b.horario_abertura, b.horario_fechamento),
            format!("{:.2}", b.preco_minimo),
            yes_no(b.entrega),
        ]);
    }
    listing(&table, "stall", "stalls");
}

fn show(b: &Banca) {
    let fair = b
        .feira
        .as_ref()
        .map(|f| f.nome.clone())
        .unwrap_or_else(|| id_text(b.feira_id));
    let farmer = b
        .agricultor
        .as_ref()
        .map(|a| a.name.clone())
        .unwrap_or_else(|| id_text(b.agricultor_id));

    detail(
        &format!("Stall {}", b.id),
        &[
            ("Name", b.nome.clone()),
            ("Description", b.descricao.clone()),
            (
                "Hours",
                format!("{}-{}", b.horario_abertura, b.horario_fechamento),
            ),
            ("Min. price", format!("{:.2}", b.preco_minimo)),
            ("Delivery", yes_no(b.entrega)),
            ("PIX", b.pix.clone().unwrap_or_default()),
            ("Fair", fair),
            ("Farmer", farmer),
            (
                "Products",
                join(b.produtos.iter().map(|p| p.nome.as_str())),
            ),
            (
                "Payment",
                join(b.formas_pagamento.iter().map(|p| p.nome.as_str())),
            ),
            (
                "Delivers to",
                join(b.bairros_info_entrega.iter().map(|n| n.nome.as_str())),
            ),
        ],
    );
}

pub async fn run(ctx: &Context, command: BancasCommand) -> Result<()> {
    match command {
        BancasCommand::List => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            let bancas = ctx
                .fetch("Loading stalls...", client.bancas().list())
                .await?;
            ctx.emit(&bancas, || table(&bancas))
        }
        BancasCommand::Show { id } => {
            let client = ctx.open(&Route::Detail(RESOURCE, id))?;
            let banca = ctx.fetch("Loading stall...", client.bancas().get(id)).await?;
            ctx.emit(&banca, || show(&banca))
        }
        BancasCommand::Agricultor { id } => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            let farmer = ctx
                .fetch("Loading farmer...", client.bancas().agricultor(id))
                .await?;
            ctx.emit(&farmer, || {
                detail(
                    &format!("Farmer {}", farmer.id),
                    &[("Name", farmer.name.clone())],
                );
            })
        }
        BancasCommand::Create(args) => {
            let client = ctx.open(&Route::Create(RESOURCE))?;
            let draft = BancaDraft {
                nome: args.nome.unwrap_or_default(),
                descricao: args.descricao.unwrap_or_default(),
                horario_abertura: args.abertura.unwrap_or_default(),
                horario_fechamento: args.fechamento.unwrap_or_default(),
                preco_minimo: args.preco_minimo.unwrap_or_default(),
                entrega: args.entrega.unwrap_or_default(),
                feira_id: args.feira,
                agricultor_id: args.agricultor,
                pix: args.pix,
            };
            let banca = ctx
                .change(
                    "Creating stall...",
                    "Stall created",
                    client.bancas().create(&draft),
                )
                .await?;
            ctx.emit(&banca, || show(&banca))
        }
        BancasCommand::Edit { id, fields } => {
            let client = ctx.open(&Route::Edit(RESOURCE, id))?;
            let edit = BancaEdit {
                nome: fields.nome,
                descricao: fields.descricao,
                horario_abertura: fields.abertura,
                horario_fechamento: fields.fechamento,
                preco_minimo: fields.preco_minimo,
                entrega: fields.entrega,
                feira_id: fields.feira,
                agricultor_id: fields.agricultor,
                pix: fields.pix,
            };
            let banca = ctx
                .change(
                    "Saving stall...",
                    "Stall updated",
                    client.bancas().edit(id, &edit),
                )
                .await?;
            ctx.emit(&banca, || show(&banca))
        }
        BancasCommand::Delete { id } => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            delete_row(ctx, &client.bancas(), id, "stall", table).await
        }
    }
}

//! Meetings

use super::{delete_row, detail, id_text, listing};
use crate::context::Context;
use anyhow::Result;
use clap::{Args, Subcommand};
use comercio_api_client::endpoints::reunioes::{ReuniaoDraft, ReuniaoEdit};
use comercio_api_client::models::{Participante, Reuniao};
use comercio_cli::output::Table;
use comercio_core::guard::{Resource, Route};

const RESOURCE: Resource = Resource::Reunioes;

#[derive(Subcommand, Debug)]
pub enum ReunioesCommand {
    /// List every meeting
    List,
    /// Show one meeting
    Show { id: i64 },
    /// Schedule a meeting
    Create(ReuniaoArgs),
    /// Edit a meeting; fields left out keep their value
    Edit {
        id: i64,
        #[command(flatten)]
        fields: ReuniaoArgs,
    },
    /// Delete a meeting
    Delete { id: i64 },
}

#[derive(Args, Debug, Clone)]
pub struct ReuniaoArgs {
    /// Title
    #[arg(long)]
    pub titulo: Option<String>,
    /// Agenda
    #[arg(long)]
    pub pauta: Option<String>,
    /// Date, dd/mm/yyyy
    #[arg(long)]
    pub data: Option<String>,
    /// Kind of meeting
    #[arg(long)]
    pub tipo: Option<String>,
    /// Status
    #[arg(long)]
    pub status: Option<String>,
    /// Attendee user id (repeatable)
    #[arg(long = "participante")]
    pub participantes: Vec<i64>,
    /// Association holding the meeting
    #[arg(long)]
    pub associacao: Option<i64>,
    /// Organization holding the meeting
    #[arg(long)]
    pub organizacao: Option<i64>,
}

fn owner(r: &Reuniao) -> String {
    match (r.associacao_id, r.organizacao_id) {
        (Some(id), _) => format!("association {id}"),
        (None, Some(id)) => format!("organization {id}"),
        (None, None) => String::new(),
    }
}

fn table(reunioes: &[Reuniao]) {
    let mut table = Table::new(["ID", "Title", "Date", "Kind", "Status"]);
    for r in reunioes {
        table.row([
            id_text(r.id),
            r.titulo.clone(),
            r.data.clone(),
            r.tipo.clone(),
            r.status.clone().unwrap_or_default(),
        ]);
    }
    listing(&table, "meeting", "meetings");
}

fn show(r: &Reuniao) {
    let attendees = r
        .participantes
        .iter()
        .map(|p| p.id.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    detail(
        &format!("Meeting {}", id_text(r.id)),
        &[
            ("Title", r.titulo.clone()),
            ("Agenda", r.pauta.clone()),
            ("Date", r.data.clone()),
            ("Kind", r.tipo.clone()),
            ("Status", r.status.clone().unwrap_or_default()),
            ("Held by", owner(r)),
            ("Attendees", attendees),
            ("Minutes", r.ata.join(", ")),
        ],
    );
}

pub async fn run(ctx: &Context, command: ReunioesCommand) -> Result<()> {
    match command {
        ReunioesCommand::List => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            let list = ctx
                .fetch("Loading meetings...", client.reunioes().list())
                .await?;
            ctx.emit(&list, || table(&list))
        }
        ReunioesCommand::Show { id } => {
            let client = ctx.open(&Route::Detail(RESOURCE, id))?;
            let reuniao = ctx
                .fetch("Loading meeting...", client.reunioes().get(id))
                .await?;
            ctx.emit(&reuniao, || show(&reuniao))
        }
        ReunioesCommand::Create(args) => {
            let client = ctx.open(&Route::Create(RESOURCE))?;
            let draft = ReuniaoDraft {
                titulo: args.titulo.unwrap_or_default(),
                pauta: args.pauta.unwrap_or_default(),
                data: args.data.unwrap_or_default(),
                tipo: args.tipo.unwrap_or_default(),
                status: args.status,
                participantes: args
                    .participantes
                    .into_iter()
                    .map(|id| Participante { id })
                    .collect(),
                associacao_id: args.associacao,
                organizacao_id: args.organizacao,
            };
            let reuniao = ctx
                .change(
                    "Scheduling meeting...",
                    "Meeting scheduled",
                    client.reunioes().create(&draft),
                )
                .await?;
            ctx.emit(&reuniao, || show(&reuniao))
        }
        ReunioesCommand::Edit { id, fields } => {
            let client = ctx.open(&Route::Edit(RESOURCE, id))?;
            if fields.associacao.is_some() || fields.organizacao.is_some() {
                tracing::warn!(id, "Meeting owner cannot be changed; ignoring");
            }
            let edit = ReuniaoEdit {
                titulo: fields.titulo,
                pauta: fields.pauta,
                data: fields.data,
                tipo: fields.tipo,
                status: fields.status,
                participantes: Some(fields.participantes),
            };
            let reuniao = ctx
                .change(
                    "Saving meeting...",
                    "Meeting updated",
                    client.reunioes().edit(id, &edit),
                )
                .await?;
            ctx.emit(&reuniao, || show(&reuniao))
        }
        ReunioesCommand::Delete { id } => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            delete_row(ctx, &client.reunioes(), id, "meeting", table).await
        }
    }
}

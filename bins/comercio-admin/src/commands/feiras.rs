//! Fairs, their stalls and cover images

use super::{bancas, delete_row, detail, id_text, listing};
use crate::context::Context;
use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use comercio_api_client::endpoints::feiras::{FeiraDraft, FeiraEdit, ImageUpload};
use comercio_api_client::models::Feira;
use comercio_cli::output::{Status, Table};
use comercio_core::guard::{Resource, Route};
use comercio_core::schedule::OperatingHours;
use serde_json::json;
use std::path::PathBuf;

const RESOURCE: Resource = Resource::Feiras;

#[derive(Subcommand, Debug)]
pub enum FeirasCommand {
    /// List every fair
    List,
    /// Show one fair
    Show { id: i64 },
    /// Stalls of one fair
    Bancas { id: i64 },
    /// Create a fair
    Create {
        #[command(flatten)]
        fields: FeiraArgs,
        /// Cover image file
        #[arg(long)]
        imagem: Option<PathBuf>,
    },
    /// Edit a fair; fields left out keep their value
    Edit {
        id: i64,
        #[command(flatten)]
        fields: FeiraArgs,
    },
    /// Delete a fair
    Delete { id: i64 },
    /// Save the cover image to a file
    Image {
        id: i64,
        /// Destination file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Remove the cover image
    RemoveImage { id: i64 },
}

#[derive(Args, Debug, Clone)]
pub struct FeiraArgs {
    /// Name
    #[arg(long)]
    pub nome: Option<String>,
    /// Description
    #[arg(long)]
    pub descricao: Option<String>,
    /// Opening hours as DAY=HH:MM-HH:MM, e.g. sabado=07:00-13:00 (repeatable)
    #[arg(long = "horario")]
    pub horarios: Vec<String>,
    /// Organizing association id
    #[arg(long)]
    pub associacao: Option<i64>,
    /// Neighborhood id
    #[arg(long)]
    pub bairro: Option<i64>,
}

impl FeiraArgs {
    fn hours(&self) -> Result<OperatingHours> {
        Ok(OperatingHours::parse_entries(&self.horarios)?)
    }
}

fn table(feiras: &[Feira]) {
    let mut table = Table::new(["ID", "Name", "Hours", "Neighborhood"]);
    for f in feiras {
        table.row([
            f.id.to_string(),
            f.nome.clone(),
            f.horarios_funcionamento.summary(),
            id_text(f.bairro_id),
        ]);
    }
    listing(&table, "fair", "fairs");
}

fn show(f: &Feira) {
    detail(
        &format!("Fair {}", f.id),
        &[
            ("Name", f.nome.clone()),
            ("Description", f.descricao.clone()),
            ("Location", f.localizacao.clone().unwrap_or_default()),
            ("Hours", f.horarios_funcionamento.summary()),
            ("Association", id_text(f.associacao_id)),
            ("Neighborhood", id_text(f.bairro_id)),
            ("Image", f.imagem.clone().unwrap_or_default()),
        ],
    );
}

pub async fn run(ctx: &Context, command: FeirasCommand) -> Result<()> {
    match command {
        FeirasCommand::List => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            let feiras = ctx.fetch("Loading fairs...", client.feiras().list()).await?;
            ctx.emit(&feiras, || table(&feiras))
        }
        FeirasCommand::Show { id } => {
            let client = ctx.open(&Route::Detail(RESOURCE, id))?;
            let feira = ctx.fetch("Loading fair...", client.feiras().get(id)).await?;
            ctx.emit(&feira, || show(&feira))
        }
        FeirasCommand::Bancas { id } => {
            let client = ctx.open(&Route::FeiraBancas(id))?;
            let list = ctx
                .fetch("Loading stalls...", client.feiras().bancas(id))
                .await?;
            ctx.emit(&list, || bancas::table(&list))
        }
        FeirasCommand::Create { fields, imagem } => {
            let client = ctx.open(&Route::Create(RESOURCE))?;
            let draft = FeiraDraft {
                horarios_funcionamento: fields.hours()?,
                nome: fields.nome.unwrap_or_default(),
                descricao: fields.descricao.unwrap_or_default(),
                associacao_id: fields.associacao,
                bairro_id: fields.bairro,
            };
            let image = match imagem {
                Some(path) => {
                    let bytes = std::fs::read(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "imagem".to_string());
                    Some(ImageUpload::from_file(name, bytes))
                }
                None => None,
            };
            let feira = ctx
                .change(
                    "Creating fair...",
                    "Fair created",
                    client.feiras().create(&draft, image),
                )
                .await?;
            ctx.emit(&feira, || show(&feira))
        }
        FeirasCommand::Edit { id, fields } => {
            let client = ctx.open(&Route::Edit(RESOURCE, id))?;
            let hours = fields.hours()?;
            let edit = FeiraEdit {
                nome: fields.nome,
                descricao: fields.descricao,
                horarios_funcionamento: Some(hours),
                associacao_id: fields.associacao,
                bairro_id: fields.bairro,
            };
            let feira = ctx
                .change(
                    "Saving fair...",
                    "Fair updated",
                    client.feiras().edit(id, &edit),
                )
                .await?;
            ctx.emit(&feira, || show(&feira))
        }
        FeirasCommand::Delete { id } => {
            let client = ctx.open(&Route::List(RESOURCE))?;
            delete_row(ctx, &client.feiras(), id, "fair", table).await
        }
        FeirasCommand::Image { id, output } => {
            let client = ctx.open(&Route::Detail(RESOURCE, id))?;
            let image = ctx
                .fetch("Downloading image...", client.feiras().image(id))
                .await?;
            std::fs::write(&output, &image.bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            ctx.emit(
                &json!({
                    "path": output,
                    "mime_type": image.mime_type,
                    "size": image.bytes.len(),
                }),
                || {
                    Status::success(&format!(
                        "Saved {} ({}, {} bytes)",
                        output.display(),
                        image.mime_type,
                        image.bytes.len()
                    ));
                },
            )
        }
        FeirasCommand::RemoveImage { id } => {
            let client = ctx.open(&Route::Edit(RESOURCE, id))?;
            ctx.change(
                "Removing image...",
                "Image removed",
                client.feiras().remove_image(id),
            )
            .await?;
            ctx.emit(&json!({ "removed": true }), || {})
        }
    }
}

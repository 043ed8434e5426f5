//! CLI command implementations

pub mod associacoes;
pub mod bairros;
pub mod bancas;
pub mod cep;
pub mod cidades;
pub mod estados;
pub mod feiras;
pub mod ocs;
pub mod reunioes;
pub mod session;
pub mod usuarios;

use crate::context::Context;
use anyhow::Result;
use comercio_api_client::endpoints::cep::match_bairro;
use comercio_api_client::endpoints::{Listing, delete_and_refresh};
use comercio_api_client::AdminClient;
use comercio_cli::output::{Status, Table, format_count};
use console::{Alignment, measure_text_width, pad_str};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::warn;

/// Print label/value pairs of one record
pub fn detail(title: &str, fields: &[(&str, String)]) {
    Status::header(title);
    let width = fields
        .iter()
        .map(|(label, _)| measure_text_width(label))
        .max()
        .unwrap_or_default();
    for (label, value) in fields {
        let value = if value.is_empty() { "-" } else { value };
        println!(
            "  {}  {value}",
            pad_str(label, width, Alignment::Left, None).dimmed()
        );
    }
}

/// Print a listing, or a note when it is empty
pub fn listing(table: &Table, singular: &str, plural: &str) {
    if table.is_empty() {
        Status::info(&format!("No {plural} found"));
        return;
    }
    table.print();
    println!();
    println!("{}", format_count(table.len(), singular, plural).dimmed());
}

/// Delete a record and show what is left
pub async fn delete_row<L, F>(
    ctx: &Context,
    api: &L,
    id: i64,
    label: &str,
    render: F,
) -> Result<()>
where
    L: Listing,
    L::Item: Serialize,
    F: FnOnce(&[L::Item]),
{
    let remaining = ctx
        .change(
            &format!("Deleting {label} {id}..."),
            &format!("Deleted {label} {id}"),
            delete_and_refresh(api, id),
        )
        .await?;
    ctx.emit(&remaining, || render(&remaining))
}

/// Optional id as text
pub fn id_text(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

/// Join ids for display
pub fn ids_text(ids: &[i64]) -> String {
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
}

/// Street and neighborhood taken from the postal code
///
/// Fields already given are kept. A failed lookup of the CEP or of the
/// neighborhoods leaves the field untouched; the form's own validation
/// reports what is still missing.
pub async fn autofill_address(
    ctx: &Context,
    client: &AdminClient,
    cep: Option<&str>,
    rua: &mut Option<String>,
    bairro_id: &mut Option<i64>,
) -> Result<()> {
    let Some(cep) = cep.filter(|c| !c.trim().is_empty()) else {
        return Ok(());
    };
    if rua.is_some() && bairro_id.is_some() {
        return Ok(());
    }

    let address = match ctx.fetch("Looking up CEP...", client.cep().lookup(cep)).await {
        Ok(address) => address,
        Err(e) => {
            warn!(error = %e, "CEP lookup failed, address left as typed");
            return Ok(());
        }
    };

    if rua.is_none() && !address.logradouro.is_empty() {
        *rua = Some(address.logradouro.clone());
    }
    if bairro_id.is_none() {
        match ctx
            .fetch("Loading neighborhoods...", client.bairros().list())
            .await
        {
            Ok(bairros) => *bairro_id = match_bairro(&address, &bairros).map(|b| b.id),
            Err(e) => warn!(error = %e, "Neighborhood lookup failed, left as typed"),
        }
    }
    Ok(())
}

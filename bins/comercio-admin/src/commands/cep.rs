//! Postal code lookup

use super::detail;
use crate::context::Context;
use anyhow::Result;
use comercio_api_client::endpoints::cep::match_bairro;
use comercio_core::guard::Route;
use serde_json::json;

pub async fn run(ctx: &Context, cep: &str, cidade: Option<i64>) -> Result<()> {
    let client = ctx.open(&Route::CepLookup)?;
    let address = ctx
        .fetch("Looking up CEP...", client.cep().lookup(cep))
        .await?;

    let bairro = match cidade {
        Some(id) => {
            let bairros = ctx
                .fetch("Loading neighborhoods...", client.cidades().bairros(id))
                .await?;
            match_bairro(&address, &bairros).cloned()
        }
        None => None,
    };

    ctx.emit(&json!({ "address": address, "bairro": bairro }), || {
        detail(
            &format!("CEP {}", address.cep),
            &[
                ("Street", address.logradouro.clone()),
                ("Complement", address.complemento.clone()),
                ("Neighborhood", address.bairro.clone()),
                ("City", address.localidade.clone()),
                ("State", address.uf.clone()),
                (
                    "Matched id",
                    bairro
                        .as_ref()
                        .map(|b| format!("{} ({})", b.id, b.nome))
                        .unwrap_or_default(),
                ),
            ],
        );
    })
}

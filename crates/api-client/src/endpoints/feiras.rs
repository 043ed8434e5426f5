//! Fair endpoints
//!
//! Fairs are created with a multipart form so a cover image can travel with
//! the record; the weekly schedule goes along as a JSON-encoded text field.
//! Updates are plain JSON.

use crate::client::AdminClient;
use crate::endpoints::{check, envelope, pick, record};
use crate::error::ApiResult;
use crate::models::{Banca, Feira};
use comercio_core::schedule::OperatingHours;
use comercio_core::validation::{ValidationResult, Validator};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

/// Fairs API interface
#[derive(Clone)]
pub struct FeirasApi {
    client: AdminClient,
}

impl FeirasApi {
    /// Create a new fairs API interface
    pub(crate) fn new(client: AdminClient) -> Self {
        Self { client }
    }

    /// List every fair
    ///
    /// GET /api/feiras/
    #[instrument(skip(self))]
    pub async fn list(&self) -> ApiResult<Vec<Feira>> {
        let body: Value = self.client.get("/api/feiras/").await?;
        envelope(body, "feiras")
    }

    /// Get one fair
    ///
    /// GET /api/feiras/{id}
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> ApiResult<Feira> {
        let body: Value = self.client.get(&format!("/api/feiras/{id}")).await?;
        envelope(body, "feira")
    }

    /// Create a fair, optionally with a cover image
    ///
    /// POST /api/feiras (multipart)
    #[instrument(skip(self, draft, image), fields(nome = %draft.nome))]
    pub async fn create(&self, draft: &FeiraDraft, image: Option<ImageUpload>) -> ApiResult<Feira> {
        check(draft.validate())?;
        let form = draft.to_form(image)?;
        let body: Value = self.client.post_multipart("/api/feiras", form).await?;
        record(body, "feira")
    }

    /// Replace a fair's fields
    ///
    /// PATCH /api/feiras/{id}
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: i64, update: &FeiraDraft) -> ApiResult<Feira> {
        check(update.validate())?;
        let body: Value = self
            .client
            .patch(&format!("/api/feiras/{id}"), update)
            .await?;
        record(body, "feira")
    }

    /// Fetch the fair, fill blanks in `edit` from it, and send the result
    pub async fn edit(&self, id: i64, edit: &FeiraEdit) -> ApiResult<Feira> {
        let current = self.get(id).await?;
        self.update(id, &edit.resolve(&current)).await
    }

    /// Delete a fair
    ///
    /// The backend refuses with 400 and an explanatory `error` text (for
    /// example while stalls are still attached); that text is kept in the
    /// returned error as-is.
    ///
    /// DELETE /api/feiras/{id}
    #[instrument(skip(self))]
    pub async fn remove(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&format!("/api/feiras/{id}")).await
    }

    /// Stalls of one fair
    ///
    /// GET /api/feiras/{id}/bancas
    #[instrument(skip(self))]
    pub async fn bancas(&self, id: i64) -> ApiResult<Vec<Banca>> {
        let body: Value = self
            .client
            .get(&format!("/api/feiras/{id}/bancas"))
            .await?;
        envelope(body, "bancas")
    }

    /// Download the cover image
    ///
    /// GET /api/feiras/{id}/imagem
    #[instrument(skip(self))]
    pub async fn image(&self, id: i64) -> ApiResult<FeiraImage> {
        let (bytes, mime_type) = self
            .client
            .get_bytes(&format!("/api/feiras/{id}/imagem"))
            .await?;
        debug!(size = bytes.len(), mime = %mime_type, "Image downloaded");
        Ok(FeiraImage { bytes, mime_type })
    }

    /// Delete the cover image
    ///
    /// DELETE /api/feiras/{id}/imagem
    #[instrument(skip(self))]
    pub async fn remove_image(&self, id: i64) -> ApiResult<()> {
        self.client
            .delete(&format!("/api/feiras/{id}/imagem"))
            .await
    }
}

impl_listing!(FeirasApi, Feira);

/// Image file to attach to a fair
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// File name sent with the part
    pub file_name: String,
    /// Raw file content
    pub bytes: Vec<u8>,
    /// MIME type, e.g. `image/png`
    pub mime: String,
}

impl ImageUpload {
    /// Guess the MIME type from the file extension
    #[must_use]
    pub fn from_file(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let mime = match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            _ => "application/octet-stream",
        };
        Self {
            file_name,
            bytes,
            mime: mime.to_string(),
        }
    }
}

/// Cover image as downloaded
#[derive(Debug, Clone)]
pub struct FeiraImage {
    /// Raw content
    pub bytes: Vec<u8>,
    /// Content type reported by the server
    pub mime_type: String,
}

/// Fair form, used for both creation and updates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeiraDraft {
    /// Name
    pub nome: String,
    /// Description
    pub descricao: String,
    /// Weekly schedule
    pub horarios_funcionamento: OperatingHours,
    /// Organizing association
    pub associacao_id: Option<i64>,
    /// Neighborhood where the fair happens
    pub bairro_id: Option<i64>,
}

impl FeiraDraft {
    /// Check that the form is complete and the schedule is sane
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        Validator::new()
            .required("nome", &self.nome)
            .required("descricao", &self.descricao)
            .required_id("bairro_id", self.bairro_id)
            .custom("horarios_funcionamento", || {
                if self.horarios_funcionamento.is_empty() {
                    return Some("At least one day is required".to_string());
                }
                self.horarios_funcionamento.validate().err().map(|e| e.message)
            })
            .validate()
    }

    fn to_form(&self, image: Option<ImageUpload>) -> ApiResult<Form> {
        let mut form = Form::new()
            .text("nome", self.nome.clone())
            .text("descricao", self.descricao.clone())
            .text(
                "horarios_funcionamento",
                serde_json::to_string(&self.horarios_funcionamento)?,
            );
        if let Some(id) = self.associacao_id {
            form = form.text("associacao_id", id.to_string());
        }
        if let Some(id) = self.bairro_id {
            form = form.text("bairro_id", id.to_string());
        }
        if let Some(image) = image {
            let part = Part::bytes(image.bytes)
                .file_name(image.file_name)
                .mime_str(&image.mime)?;
            form = form.part("imagem", part);
        }
        Ok(form)
    }
}

/// Fair edit form
#[derive(Debug, Clone, Default)]
pub struct FeiraEdit {
    /// New name
    pub nome: Option<String>,
    /// New description
    pub descricao: Option<String>,
    /// New schedule; replaces the whole week when given
    pub horarios_funcionamento: Option<OperatingHours>,
    /// New association
    pub associacao_id: Option<i64>,
    /// New neighborhood
    pub bairro_id: Option<i64>,
}

impl FeiraEdit {
    /// Merge the form with the stored fair
    #[must_use]
    pub fn resolve(&self, current: &Feira) -> FeiraDraft {
        FeiraDraft {
            nome: pick(self.nome.as_ref(), &current.nome),
            descricao: pick(self.descricao.as_ref(), &current.descricao),
            horarios_funcionamento: match &self.horarios_funcionamento {
                Some(h) if !h.is_empty() => h.clone(),
                _ => current.horarios_funcionamento.clone(),
            },
            associacao_id: self.associacao_id.or(current.associacao_id),
            bairro_id: self.bairro_id.or(current.bairro_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comercio_core::schedule::{DayHours, Weekday};

    fn hours() -> OperatingHours {
        OperatingHours::new().with(Weekday::Sabado, DayHours::parse("07:00", "13:00").unwrap())
    }

    #[test]
    fn test_draft_requires_schedule() {
        let draft = FeiraDraft {
            nome: "Feira do Centro".into(),
            descricao: "Produtos orgânicos".into(),
            bairro_id: Some(1),
            ..FeiraDraft::default()
        };
        assert_eq!(
            draft.validate().first().unwrap().field,
            "horarios_funcionamento"
        );

        let draft = FeiraDraft {
            horarios_funcionamento: OperatingHours::new()
                .with(Weekday::Domingo, DayHours::parse("12:00", "08:00").unwrap()),
            ..draft
        };
        assert!(!draft.validate().is_valid());
    }

    #[test]
    fn test_update_body_shape() {
        let draft = FeiraDraft {
            nome: "Feira do Centro".into(),
            descricao: "Produtos orgânicos".into(),
            horarios_funcionamento: hours(),
            associacao_id: Some(1),
            bairro_id: Some(2),
        };
        let body = serde_json::to_value(&draft).unwrap();
        assert_eq!(
            body["horarios_funcionamento"],
            serde_json::json!({"sábado": ["07:00", "13:00"]})
        );
        assert_eq!(body["bairro_id"], 2);
    }

    #[test]
    fn test_resolve_keeps_schedule() {
        let current = Feira {
            id: 4,
            nome: "Feira do Centro".into(),
            descricao: "Produtos orgânicos".into(),
            horarios_funcionamento: hours(),
            bairro_id: Some(2),
            ..Feira::default()
        };
        let update = FeiraEdit {
            descricao: Some("Orgânicos e artesanato".into()),
            ..FeiraEdit::default()
        }
        .resolve(&current);

        assert_eq!(update.nome, "Feira do Centro");
        assert_eq!(update.descricao, "Orgânicos e artesanato");
        assert_eq!(update.horarios_funcionamento, hours());
    }

    #[test]
    fn test_resolve_keeps_half_filled_days() {
        let current: Feira = serde_json::from_value(serde_json::json!({
            "id": 4,
            "nome": "Feira do Centro",
            "descricao": "Produtos orgânicos",
            "horarios_funcionamento": {"sábado": ["07:00", "13:00"], "domingo": ["08:00", ""]},
            "bairro_id": 2
        }))
        .unwrap();

        let update = FeiraEdit {
            descricao: Some("nova".into()),
            ..FeiraEdit::default()
        }
        .resolve(&current);
        let body = serde_json::to_value(&update).unwrap();

        assert_eq!(
            body["horarios_funcionamento"],
            serde_json::json!({"sábado": ["07:00", "13:00"], "domingo": ["08:00", ""]})
        );
    }

    #[test]
    fn test_resolve_with_only_partial_days_still_validates() {
        let current: Feira = serde_json::from_value(serde_json::json!({
            "id": 4,
            "nome": "Feira do Centro",
            "descricao": "Produtos orgânicos",
            "horarios_funcionamento": {"domingo": ["08:00", ""]},
            "bairro_id": 2
        }))
        .unwrap();

        let update = FeiraEdit {
            nome: Some("Feira Nova".into()),
            ..FeiraEdit::default()
        }
        .resolve(&current);

        assert!(update.validate().is_valid());
        assert_eq!(update.horarios_funcionamento, current.horarios_funcionamento);
    }

    #[test]
    fn test_image_mime_guess() {
        assert_eq!(ImageUpload::from_file("capa.PNG", vec![]).mime, "image/png");
        assert_eq!(ImageUpload::from_file("foto.jpeg", vec![]).mime, "image/jpeg");
        assert_eq!(
            ImageUpload::from_file("sem-extensao", vec![]).mime,
            "application/octet-stream"
        );
    }

    #[test]
    fn test_form_builds_with_image() {
        let draft = FeiraDraft {
            nome: "Feira".into(),
            descricao: "d".into(),
            horarios_funcionamento: hours(),
            associacao_id: None,
            bairro_id: Some(2),
        };
        let image = ImageUpload::from_file("capa.png", vec![0x89, 0x50]);
        assert!(draft.to_form(Some(image)).is_ok());
    }
}

//! Client behavior against an in-process mock backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::Router;
use comercio_api_client::endpoints::bairros::{BairroDraft, BairroEdit};
use comercio_api_client::endpoints::delete_and_refresh;
use comercio_api_client::endpoints::ocs::OcsDraft;
use comercio_api_client::endpoints::users::{UserDraft, UserEdit};
use comercio_api_client::{AdminClient, ApiError, ClientConfig, Rejection};
use comercio_core::session::{MemoryStore, SessionState};
use serde_json::{Value, json};

/// One request as the backend saw it.
#[derive(Debug, Clone)]
struct Hit {
    method: Method,
    path: String,
    authorization: Option<String>,
    body: Value,
}

/// Canned replies keyed by method and path, plus a log of every request.
#[derive(Clone, Default)]
struct Backend {
    routes: Arc<Mutex<HashMap<(Method, String), (StatusCode, Value)>>>,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl Backend {
    fn reply(self, method: Method, path: &str, status: StatusCode, body: Value) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), (status, body));
        self
    }

    fn hits(&self) -> Vec<Hit> {
        self.hits.lock().unwrap().clone()
    }

    fn count(&self, method: &Method) -> usize {
        self.hits().iter().filter(|h| &h.method == method).count()
    }
}

async fn handle(
    State(backend): State<Backend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    backend.hits.lock().unwrap().push(Hit {
        method: method.clone(),
        path: path.clone(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    let reply = backend.routes.lock().unwrap().get(&(method, path)).cloned();
    match reply {
        Some((status, body)) => (status, Json(body)).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"}))).into_response(),
    }
}

/// Serve the backend on a random port and return its base URL.
async fn serve(backend: &Backend) -> String {
    let app = Router::new().fallback(handle).with_state(backend.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn client_for(backend: &Backend) -> AdminClient {
    let url = serve(backend).await;
    let config = ClientConfig::development()
        .with_base_url(url.clone())
        .with_cep_url(format!("{url}/ws"));
    AdminClient::with_config(config)
        .unwrap()
        .with_token("1|secret")
}

fn user_draft() -> UserDraft {
    UserDraft {
        name: "Ana Souza".into(),
        email: "ana@example.com".into(),
        password: "segredo123".into(),
        cpf: "529.982.247-25".into(),
        bairro_id: Some(1),
        roles: vec![3],
        ..UserDraft::default()
    }
}

#[tokio::test]
async fn test_duplicate_email_is_refused_without_posting() {
    let backend = Backend::default().reply(
        Method::GET,
        "/api/users",
        StatusCode::OK,
        json!({"users": [{"id": 1, "name": "Ana", "email": "ANA@example.com", "cpf": "11144477735"}]}),
    );
    let client = client_for(&backend).await;

    let err = client.users().create(&user_draft()).await.unwrap_err();

    assert_eq!(err.rejection(), Some(Rejection::EmailTaken));
    assert_eq!(backend.count(&Method::POST), 0);
    assert_eq!(backend.count(&Method::GET), 1);
}

#[tokio::test]
async fn test_duplicate_cpf_is_refused() {
    let backend = Backend::default().reply(
        Method::GET,
        "/api/users",
        StatusCode::OK,
        json!({"users": [{"id": 1, "name": "Bia", "email": "bia@example.com", "cpf": "52998224725"}]}),
    );
    let client = client_for(&backend).await;

    let err = client.users().create(&user_draft()).await.unwrap_err();

    assert_eq!(err.rejection(), Some(Rejection::CpfTaken));
    assert_eq!(backend.count(&Method::POST), 0);
}

#[tokio::test]
async fn test_invalid_cpf_makes_no_request() {
    let backend = Backend::default();
    let client = client_for(&backend).await;
    let draft = UserDraft {
        cpf: "123.456.789-00".into(),
        ..user_draft()
    };

    let err = client.users().create(&draft).await.unwrap_err();

    assert_eq!(err.rejection(), Some(Rejection::InvalidCpf));
    assert!(backend.hits().is_empty());
}

#[tokio::test]
async fn test_create_user_posts_with_bearer() {
    let backend = Backend::default()
        .reply(Method::GET, "/api/users", StatusCode::OK, json!({"users": []}))
        .reply(
            Method::POST,
            "/api/users",
            StatusCode::CREATED,
            json!({"user": {"id": 9, "name": "Ana Souza", "email": "ana@example.com"}}),
        );
    let client = client_for(&backend).await;

    let user = client.users().create(&user_draft()).await.unwrap();

    assert_eq!(user.id, Some(9));
    let hits = backend.hits();
    assert_eq!(hits.len(), 2);
    assert!(
        hits.iter()
            .all(|h| h.authorization.as_deref() == Some("Bearer 1|secret"))
    );
    assert_eq!(hits[1].body["cpf"], "529.982.247-25");
    assert_eq!(hits[1].body["roles"], json!([3]));
}

#[tokio::test]
async fn test_ocs_invalid_cnpj_is_refused_before_listing() {
    let backend = Backend::default();
    let client = client_for(&backend).await;
    let draft = OcsDraft {
        nome: "OCS Serra".into(),
        cnpj: "11.222.333/0001-00".into(),
        email: "ocs@example.com".into(),
        associacao_id: Some(1),
        ..OcsDraft::default()
    };

    let err = client.ocs().create(&draft).await.unwrap_err();

    assert_eq!(err.rejection(), Some(Rejection::InvalidCnpj));
    assert!(backend.hits().is_empty());
}

#[tokio::test]
async fn test_delete_then_refetch() {
    let backend = Backend::default()
        .reply(
            Method::DELETE,
            "/api/bairros/4",
            StatusCode::OK,
            json!({"message": "Bairro removido"}),
        )
        .reply(
            Method::GET,
            "/api/bairros",
            StatusCode::OK,
            json!({"bairros": [{"id": 1, "nome": "Centro", "cidade_id": 1}]}),
        );
    let client = client_for(&backend).await;

    let remaining = delete_and_refresh(&client.bairros(), 4).await.unwrap();

    assert_eq!(remaining.len(), 1);
    let hits = backend.hits();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].method, Method::DELETE);
    assert_eq!(hits[1].method, Method::GET);
}

#[tokio::test]
async fn test_failed_delete_skips_refetch() {
    let backend = Backend::default().reply(
        Method::DELETE,
        "/api/bairros/4",
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"message": "Server Error"}),
    );
    let client = client_for(&backend).await;

    let err = delete_and_refresh(&client.bairros(), 4).await.unwrap_err();

    assert!(err.is_server_error());
    assert_eq!(backend.hits().len(), 1);
}

#[tokio::test]
async fn test_edit_sends_stored_values_for_blank_fields() {
    let backend = Backend::default()
        .reply(
            Method::GET,
            "/api/users/7",
            StatusCode::OK,
            json!({"user": {
                "id": 7,
                "name": "Ana",
                "contato": {"email": "ana@example.com", "telefone": "87999990000"},
                "endereco": {"rua": "Rua A", "numero": "10", "cep": "55290000", "bairro_id": 2},
                "roles": [{"id": 3, "nome": "agricultor"}]
            }}),
        )
        .reply(
            Method::PATCH,
            "/api/users/7",
            StatusCode::OK,
            json!({"user": {"id": 7, "name": "Ana Souza"}}),
        );
    let client = client_for(&backend).await;
    let edit = UserEdit {
        name: Some("Ana Souza".into()),
        password: Some("   ".into()),
        ..UserEdit::default()
    };

    client.users().edit(7, &edit).await.unwrap();

    let patch = backend
        .hits()
        .into_iter()
        .find(|h| h.method == Method::PATCH)
        .unwrap();
    assert_eq!(patch.body["name"], "Ana Souza");
    assert_eq!(patch.body["email"], "ana@example.com");
    assert_eq!(patch.body["rua"], "Rua A");
    assert_eq!(patch.body["bairro_id"], 2);
    assert_eq!(patch.body["roles"], json!([3]));
    assert!(patch.body.get("password").is_none());
}

#[tokio::test]
async fn test_edit_bairro_keeps_city() {
    let backend = Backend::default()
        .reply(
            Method::GET,
            "/api/bairros/5",
            StatusCode::OK,
            json!({"bairro": {"id": 5, "nome": "Centro", "cidade_id": 2}}),
        )
        .reply(
            Method::PATCH,
            "/api/bairros/5",
            StatusCode::OK,
            json!({"bairro": {"id": 5, "nome": "Centro Histórico", "cidade_id": 2}}),
        );
    let client = client_for(&backend).await;

    let bairro = client
        .bairros()
        .edit(
            5,
            &BairroEdit {
                nome: Some("Centro Histórico".into()),
                cidade_id: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(bairro.nome, "Centro Histórico");
    let patch = backend.hits().pop().unwrap();
    assert_eq!(patch.body, json!({"nome": "Centro Histórico", "cidade_id": 2}));
}

#[tokio::test]
async fn test_login_session_can_be_stored() {
    let backend = Backend::default().reply(
        Method::POST,
        "/api/sanctum/token",
        StatusCode::OK,
        json!({"token": "5|abc", "user": {"id": "12", "roles": [{"id": 1, "nome": "administrador"}]}}),
    );
    let url = serve(&backend).await;
    let client = AdminClient::with_config(ClientConfig::development().with_base_url(url)).unwrap();

    let session = client
        .auth()
        .login("admin@example.com", "segredo123")
        .await
        .unwrap();
    let store = MemoryStore::new();
    session.save(&store).unwrap();

    let SessionState::Active(loaded) = SessionState::load(&store).unwrap() else {
        panic!("session was not stored");
    };
    assert_eq!(loaded.token, "5|abc");
    assert_eq!(loaded.user_id.as_deref(), Some("12"));
    assert_eq!(loaded.role_ids(), vec![1]);

    let hit = &backend.hits()[0];
    assert!(hit.authorization.is_none());
    assert_eq!(hit.body["device_name"], "WEB");
}

#[tokio::test]
async fn test_bad_credentials_keep_server_message() {
    let backend = Backend::default().reply(
        Method::POST,
        "/api/sanctum/token",
        StatusCode::UNAUTHORIZED,
        json!({"message": "Credenciais inválidas"}),
    );
    let url = serve(&backend).await;
    let client = AdminClient::with_config(ClientConfig::development().with_base_url(url)).unwrap();

    let err = client
        .auth()
        .login("admin@example.com", "errada123")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert_eq!(err.user_message(), "Credenciais inválidas");
}

#[tokio::test]
async fn test_unprocessable_maps_field_messages() {
    let backend = Backend::default().reply(
        Method::POST,
        "/api/bairros",
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({
            "message": "The given data was invalid.",
            "errors": {"nome": ["O nome já está em uso.", "outro"]}
        }),
    );
    let client = client_for(&backend).await;
    let draft = BairroDraft {
        nome: "Centro".into(),
        cidade_id: Some(1),
    };

    let err = client.bairros().create(&draft).await.unwrap_err();

    assert!(matches!(err, ApiError::Validation { .. }));
    assert_eq!(
        err.field_messages(),
        vec![("nome".to_string(), "O nome já está em uso.".to_string())]
    );
}

#[tokio::test]
async fn test_feira_delete_refusal_keeps_backend_text() {
    let backend = Backend::default().reply(
        Method::DELETE,
        "/api/feiras/3",
        StatusCode::BAD_REQUEST,
        json!({"error": "A feira possui bancas vinculadas"}),
    );
    let client = client_for(&backend).await;

    let err = client.feiras().remove(3).await.unwrap_err();

    assert!(err.is_client_error());
    assert_eq!(err.user_message(), "A feira possui bancas vinculadas");
}

#[tokio::test]
async fn test_cep_lookup_and_unknown_code() {
    let backend = Backend::default()
        .reply(
            Method::GET,
            "/ws/55290000/json/",
            StatusCode::OK,
            json!({
                "cep": "55290-000",
                "logradouro": "Rua Santo Antônio",
                "complemento": "",
                "bairro": "Heliópolis",
                "localidade": "Garanhuns",
                "uf": "PE"
            }),
        )
        .reply(
            Method::GET,
            "/ws/99999999/json/",
            StatusCode::OK,
            json!({"erro": "true"}),
        );
    let client = client_for(&backend).await;

    let address = client.cep().lookup("55290-000").await.unwrap();
    assert_eq!(address.localidade, "Garanhuns");
    assert_eq!(address.uf, "PE");

    let err = client.cep().lookup("99999-999").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));

    assert!(backend.hits().iter().all(|h| h.authorization.is_none()));
}

#[tokio::test]
async fn test_protected_call_without_token() {
    let backend = Backend::default();
    let url = serve(&backend).await;
    let client = AdminClient::with_config(ClientConfig::development().with_base_url(url)).unwrap();

    let err = client.feiras().list().await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthenticated));
    assert!(backend.hits().is_empty());
}

//! Shared harness for router-level tests: an in-memory store, a renderer
//! stub that counts its calls and a signed-in administrator.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode},
    Router,
};
use clinica::{
    api::create_router,
    config::Config,
    db::MemoryStore,
    services::{DocumentRenderer, PrescriptionDocument, TemplateKind},
    state::AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

pub const ORGANIZATION: &str = "CV";
pub const ADMIN_EMAIL: &str = "admin@vida.example";
pub const ADMIN_PASSWORD: &str = "s3cret-pass";

/// Records every render request and answers with a tiny fake PDF, or with a
/// renderer failure once `failing` is set.
#[derive(Default)]
pub struct StubRenderer {
    pub calls: AtomicUsize,
    pub last_kind: std::sync::Mutex<Option<TemplateKind>>,
    pub failing: AtomicBool,
}

#[async_trait]
impl DocumentRenderer for StubRenderer {
    async fn render(
        &self,
        kind: TemplateKind,
        document: &PrescriptionDocument,
    ) -> clinica::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_kind.lock() {
            *last = Some(kind);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(clinica::Error::Dependency(
                "renderer exited with exit status: 1: /opt/render/wkhtmltopdf: permission denied"
                    .to_string(),
            ));
        }
        Ok(format!("%PDF-1.4 {}", document.emission_date).into_bytes())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub renderer: Arc<StubRenderer>,
    pub establishment_id: Uuid,
    pub token: String,
    router: Router,
}

impl TestApp {
    async fn start() -> anyhow::Result<Self> {
        let renderer = Arc::new(StubRenderer::default());
        let state = AppState::with_parts(
            Config::for_tests(),
            Arc::new(MemoryStore::new()),
            renderer.clone(),
        );
        let router = create_router(state.clone());

        let mut app = Self {
            state,
            renderer,
            establishment_id: Uuid::nil(),
            token: String::new(),
            router,
        };
        app.sign_in_administrator().await?;
        Ok(app)
    }

    /// Seeds an establishment and an administrator, then signs in through
    /// `POST /sessions`.
    async fn sign_in_administrator(&mut self) -> anyhow::Result<()> {
        let establishment = self
            .state
            .establishments
            .create(serde_json::from_value(establishment_body("Clinica Vida", ORGANIZATION))?)
            .await?;
        self.establishment_id = establishment.establishment.id;

        self.state
            .professionals
            .create(serde_json::from_value(json!({
                "name": "Ana Admin",
                "email": ADMIN_EMAIL,
                "cpf": "000.000.000-00",
                "phone": "5581900000000",
                "role": "ADMINISTRATOR",
                "password": ADMIN_PASSWORD,
                "boundedTo": "ESTABLISHMENT",
                "establishmentBounded": self.establishment_id,
            }))?)
            .await?;

        let (status, _headers, body) = self
            .send(
                Method::POST,
                "/sessions",
                Some(json!({
                    "organization": ORGANIZATION,
                    "email": ADMIN_EMAIL,
                    "password": ADMIN_PASSWORD,
                })),
                &[],
                false,
            )
            .await?;
        assert_status(status, StatusCode::CREATED, "sign in");
        self.token = body["accessToken"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("no accessToken in {body}"))?
            .to_string();
        Ok(())
    }

    /// Authenticated JSON request.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Value)> {
        self.send(method, path, body, &[], true).await
    }

    pub async fn request_with_extra_headers(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: &[(&str, &str)],
    ) -> anyhow::Result<(StatusCode, HeaderMap, Value)> {
        self.send(method, path, body, extra_headers, true).await
    }

    /// JSON request without the bearer token.
    pub async fn request_anonymous(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Value)> {
        self.send(method, path, body, &[], false).await
    }

    /// Authenticated request returning the raw body bytes.
    pub async fn request_bytes(
        &self,
        method: Method,
        path: &str,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Vec<u8>)> {
        let request = self.build(method, path, None, &[], true)?;
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, headers, bytes.to_vec()))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: &[(&str, &str)],
        authenticated: bool,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Value)> {
        let request = self.build(method, path, body, extra_headers, authenticated)?;
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Ok((status, headers, value))
    }

    fn build(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: &[(&str, &str)],
        authenticated: bool,
    ) -> anyhow::Result<Request<Body>> {
        let mut builder = Request::builder().method(method).uri(path);
        if authenticated {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        }
        let mut request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };
        // Extra headers override the defaults, including the bearer token.
        for (name, value) in extra_headers {
            request.headers_mut().insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }
        Ok(request)
    }

    pub fn render_calls(&self) -> usize {
        self.renderer.calls.load(Ordering::SeqCst)
    }

    pub fn fail_renders(&self) {
        self.renderer.failing.store(true, Ordering::SeqCst);
    }
}

pub async fn with_test_app<F>(f: F) -> anyhow::Result<()>
where
    F: for<'a> FnOnce(&'a TestApp) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>,
{
    let app = TestApp::start().await?;
    f(&app).await
}

pub fn assert_status(actual: StatusCode, expected: StatusCode, label: &str) {
    assert_eq!(actual, expected, "{label}: unexpected status {actual}");
}

/// Minimal valid establishment payload.
pub fn establishment_body(name: &str, abbreviation: &str) -> Value {
    json!({
        "name": name,
        "abbreviation": abbreviation,
        "cnpj": format!("cnpj-{abbreviation}"),
        "establishmentType": "CLINIC",
        "mainPhone": "5581333300000",
        "email": format!("{}@example.com", abbreviation.to_lowercase()),
        "targetCustomer": "MIXED",
    })
}

/// Minimal valid customer payload bound to `establishment`.
pub fn customer_body(name: &str, establishment: Uuid) -> Value {
    json!({
        "name": name,
        "isPatient": true,
        "isResponsible": false,
        "isTutor": false,
        "establishmentBounded": establishment,
    })
}

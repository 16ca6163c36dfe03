//! Shared application state

use crate::{
    auth::AuthManager,
    config::Config,
    db::{MemoryStore, PostgresStore, Store},
    services::{
        CommandRenderer, CustomerService, DocumentRenderer, EstablishmentService,
        EstablishmentTypeService, MedicineService, PetService, PrescriptionService,
        ProfessionalService, RegionalDocumentTypeService, SessionService, UnitService,
    },
    Result,
};
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub auth: Arc<AuthManager>,
    pub establishments: Arc<EstablishmentService>,
    pub units: Arc<UnitService>,
    pub professionals: Arc<ProfessionalService>,
    pub customers: Arc<CustomerService>,
    pub pets: Arc<PetService>,
    pub medicines: Arc<MedicineService>,
    pub establishment_types: Arc<EstablishmentTypeService>,
    pub regional_document_types: Arc<RegionalDocumentTypeService>,
    pub prescriptions: Arc<PrescriptionService>,
    pub sessions: Arc<SessionService>,
}

impl AppState {
    /// Initialize the application state from configuration.
    ///
    /// `database.url = "memory"` selects the in-process store; anything else
    /// is a Postgres connection string.
    pub async fn new(config: Config) -> Result<Self> {
        tracing::info!("Initializing application state...");

        let store: Arc<dyn Store> = if config.database.is_memory() {
            tracing::warn!("Using the in-memory store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        } else {
            let db_pool = create_db_pool(&config).await?;
            if config.database.run_migrations {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations")
                    .run(&db_pool)
                    .await
                    .map_err(|e| crate::Error::Internal(format!("Migration failed: {}", e)))?;
            }
            Arc::new(PostgresStore::new(db_pool))
        };

        let renderer: Arc<dyn DocumentRenderer> =
            Arc::new(CommandRenderer::new(config.render.clone()));

        let state = Self::with_parts(config, store, renderer);
        tracing::info!("Application state initialized successfully");
        Ok(state)
    }

    /// Wire services over an existing store and renderer.
    pub fn with_parts(
        config: Config,
        store: Arc<dyn Store>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        let config = Arc::new(config);
        let auth = Arc::new(AuthManager::new(config.clone()));
        let pagination = config.pagination.clone();

        Self {
            establishments: Arc::new(EstablishmentService::new(store.clone(), pagination.clone())),
            units: Arc::new(UnitService::new(store.clone(), pagination.clone())),
            professionals: Arc::new(ProfessionalService::new(
                store.clone(),
                pagination.clone(),
                auth.bcrypt_cost(),
            )),
            customers: Arc::new(CustomerService::new(store.clone(), pagination.clone())),
            pets: Arc::new(PetService::new(store.clone(), pagination.clone())),
            medicines: Arc::new(MedicineService::new(store.clone(), pagination.clone())),
            establishment_types: Arc::new(EstablishmentTypeService::new(
                store.clone(),
                pagination.clone(),
            )),
            regional_document_types: Arc::new(RegionalDocumentTypeService::new(
                store.clone(),
                pagination.clone(),
            )),
            prescriptions: Arc::new(PrescriptionService::new(
                store.clone(),
                renderer,
                pagination,
            )),
            sessions: Arc::new(SessionService::new(store.clone(), auth.clone())),
            config,
            store,
            auth,
        }
    }
}

async fn create_db_pool(config: &Config) -> Result<PgPool> {
    tracing::info!(
        min = config.database.pool_min_size,
        max = config.database.pool_max_size,
        "Creating database connection pool..."
    );

    let pool = sqlx::postgres::PgPoolOptions::new()
        .min_connections(config.database.pool_min_size)
        .max_connections(config.database.pool_max_size)
        .acquire_timeout(std::time::Duration::from_secs(
            config.database.pool_timeout_seconds,
        ))
        .connect(&config.database.url)
        .await
        .map_err(crate::Error::Database)?;

    tracing::info!("Database connection pool created");
    Ok(pool)
}

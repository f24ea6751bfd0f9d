//! LiterAlura application
//!
//! Wires the catalog core into the module registry, database and HTTP server.

pub mod modules;

use std::sync::Arc;

use anyhow::Context;
use literalura_catalog::{CatalogService, IdGenerator, OpenLibraryClient, Store};
use literalura_db::Database;
use literalura_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Catalog service backed by the live OpenLibrary client.
pub type Catalog = CatalogService<OpenLibraryClient>;

/// A fully wired application: settings, database, catalog and modules.
pub struct App {
    pub settings: Settings,
    pub db: Database,
    pub catalog: Arc<Catalog>,
    pub registry: ModuleRegistry,
}

impl App {
    /// Open the database and build the catalog and module registry.
    ///
    /// Nothing is migrated yet; see [`App::migrate`].
    pub async fn build(settings: Settings) -> anyhow::Result<Self> {
        let db = Database::connect(&settings.database)
            .await
            .context("failed to open catalog database")?;
        let client = OpenLibraryClient::new(&settings.openlibrary)
            .context("failed to build OpenLibrary client")?;
        let catalog = Arc::new(CatalogService::new(
            Store::new(db.clone()),
            Arc::new(client),
            IdGenerator::new(settings.identity.algorithm),
        ));

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, catalog.clone());

        tracing::info!(
            env = ?settings.environment,
            db = %settings.database.url,
            modules = registry.module_count(),
            "literalura bootstrap complete"
        );

        Ok(Self {
            settings,
            db,
            catalog,
            registry,
        })
    }

    /// Apply every module's pending migrations; returns how many ran.
    pub async fn migrate(&self) -> anyhow::Result<usize> {
        let applied = self
            .db
            .migrate(&self.registry.collect_migrations())
            .await
            .context("failed to apply migrations")?;
        tracing::info!(applied, "migrations up to date");
        Ok(applied)
    }

    /// Migrate, run the module lifecycle and serve HTTP until shutdown.
    pub async fn serve(self) -> anyhow::Result<()> {
        self.migrate().await?;

        let ctx = InitCtx {
            settings: &self.settings,
        };
        self.registry.init_modules(&ctx).await?;
        self.registry.start_modules(&ctx).await?;

        let served = literalura_http::start_server(&self.registry, &self.settings).await;

        let stopped = self.registry.stop_modules().await;
        self.db.close().await;
        served?;
        stopped
    }
}

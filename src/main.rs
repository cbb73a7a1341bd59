use std::sync::Arc;

use anyhow::Context;

use folio_app::modules;
use folio_auth::StaticTokenResolver;
use folio_db::memory::MemoryDb;
use folio_db::{UserRecord, UserStore};
use folio_kernel::settings::Settings;
use folio_kernel::{AppState, InitCtx, ModuleRegistry, Stores};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load FOLIO settings")?;
    folio_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.endpoint,
        "folio-app bootstrap starting"
    );

    let db = Arc::new(MemoryDb::new());
    let stores = Stores::memory(db.clone());
    let identity = Arc::new(StaticTokenResolver::from_settings(&settings.auth));

    // Seed configured principals so reviews can carry display names.
    for principal in settings.auth.tokens.values() {
        stores
            .users
            .upsert(UserRecord {
                id: principal.id,
                name: principal.name.clone(),
            })
            .await
            .context("failed to seed principal")?;
    }

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);

    let ctx = InitCtx {
        settings: &settings,
        stores: &stores,
    };
    registry.init_modules(&ctx).await?;

    for (module, migration) in registry.collect_migrations() {
        if db.record_migration(&module, migration.id)? {
            tracing::info!(module = %module, id = migration.id, "migration recorded");
        }
    }

    registry.start_modules(&ctx).await?;

    let state = AppState {
        settings: Arc::new(settings),
        stores,
        identity,
    };
    folio_http::start_server(&registry, state).await?;

    registry.stop_modules().await?;

    tracing::info!("folio-app shutdown complete");
    Ok(())
}

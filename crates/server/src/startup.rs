use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::AppConfig;
use dotenvy::dotenv;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::assets::{AssetCleaner, AssetSweeper, SeaOrmAssetQueue};
use service::auth::oauth::GoogleOAuthClient;
use service::auth::repo::SeaOrmAuthRepository;
use service::auth::{AuthService, AuthSettings, SessionIssuer};
use service::category::repo::SeaOrmCategoryRepository;
use service::image_store::{HttpImageStore, ImageStore};
use service::menu::repo::SeaOrmMenuRepository;
use service::menu_item::repo::SeaOrmMenuItemRepository;
use service::{CategoryService, MenuItemService, MenuService};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Wire sea-orm repositories, the HTTP image store and auth into the shared
/// state. The sweeper is returned separately so the caller decides whether
/// to run it.
pub fn build_state(db: DatabaseConnection, cfg: &AppConfig) -> anyhow::Result<(ServerState, Arc<AssetSweeper>)> {
    let images: Arc<dyn ImageStore> = Arc::new(
        HttpImageStore::from_config(&cfg.image_store).map_err(|e| StartupError::InvalidConfig(e.to_string()))?,
    );
    let queue = Arc::new(SeaOrmAssetQueue::new(db.clone()));
    let cleaner = AssetCleaner::new(images.clone(), queue.clone());
    let sweeper = Arc::new(AssetSweeper::new(images.clone(), queue));

    let auth = AuthService::new(
        Arc::new(SeaOrmAuthRepository::new(db.clone())),
        Arc::new(GoogleOAuthClient::from_config(&cfg.auth)),
        SessionIssuer::new(&cfg.auth.session_secret),
        AuthSettings::from(&cfg.auth),
    );
    if auth.bypass_enabled() {
        info!("test bypass sign-in enabled");
    }

    let state = ServerState {
        auth: Arc::new(auth),
        menus: MenuService::new(Arc::new(SeaOrmMenuRepository::new(db.clone())), cleaner.clone()),
        categories: CategoryService::new(Arc::new(SeaOrmCategoryRepository::new(db.clone())), images.clone(), cleaner.clone()),
        items: MenuItemService::new(Arc::new(SeaOrmMenuItemRepository::new(db)), images, cleaner),
        secure_cookies: cfg.auth.secure_cookies,
    };
    Ok((state, sweeper))
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_and_validate()?;

    // DB connection + schema
    let db = models::db::connect_with_config(&cfg.database).await?;
    migration::Migrator::up(&db, None).await?;
    info!("migrations applied");

    let (state, sweeper) = build_state(db, &cfg)?;
    let _sweeper_task = sweeper.spawn(cfg.image_store.sweep_interval_secs, cfg.image_store.sweep_batch);

    let app: Router = routes::build_router(state, build_cors());

    // Bind and serve
    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting menu admin server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

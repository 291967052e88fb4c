use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::auth::JwtKeys;
use crate::config::AppConfig;
use crate::users::repo::{PgUserStore, UserStore};
use crate::users::services::UserService;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub users: UserService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let jwt = JwtKeys::new(&config.jwt);
        let store = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
        let users = UserService::new(store, jwt.clone());

        Ok(Self {
            db,
            config,
            jwt,
            users,
        })
    }
}

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::info;

use backend::auth::{self, middleware::RequireAuth};
use backend::config::Config;
use backend::db::Db;
use backend::job_controller::state::{start_job_updater, ImportJobs};
use backend::services;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env();
    let db = Db::open(&config.database_path)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    seed_admin_user(&db, &config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let (import_jobs, rx) = ImportJobs::new();
    let updater_state = import_jobs.clone();
    tokio::spawn(async move {
        start_job_updater(updater_state, rx).await;
    });

    info!("CRM API listening on {}", config.addr);

    let addr = config.addr.clone();
    let secret = config.jwt_secret.clone().into_bytes();
    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(import_jobs.clone()))
            .wrap(RequireAuth::new(secret.clone()))
            .wrap(Logger::default())
            .configure(services::register)
    })
    .bind(addr)?
    .run()
    .await
}

/// With an empty `users` table nobody could ever log in; seed a bootstrap
/// admin account from the configured password.
fn seed_admin_user(db: &Db, config: &Config) -> Result<(), String> {
    if db.count_users().map_err(|e| e.to_string())? > 0 {
        return Ok(());
    }
    let hash = auth::hash_password(&config.admin_password).map_err(|e| e.to_string())?;
    db.create_user("admin", "Quản trị viên", "admin", &hash)
        .map_err(|e| e.to_string())?;
    log::warn!("users table was empty, seeded the bootstrap 'admin' account");
    Ok(())
}

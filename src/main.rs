use anyhow::Result;
use kgraph::api::HttpServer;
use kgraph::db::{migrate, Db};
use kgraph::generate::GenerationClient;
use kgraph::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger from environment variable or default to info level
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", "info"),
    )
    .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("serve");

    match command {
        "verify" => {
            run_schema_verification().await?;
        }
        "serve" | _ => {
            run_server().await?;
        }
    }

    Ok(())
}

/// Run the HTTP server
async fn run_server() -> Result<()> {
    log::info!("Starting kgraph v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    log::info!("Database path: {}", config.db_path().display());

    let db = open_database(&config).await?;
    log::info!("Database initialized successfully");

    let generator = GenerationClient::new(&config.generation)?;

    let server = HttpServer::new(db, generator, &config);
    server.run().await?;

    Ok(())
}

/// Open the database, creating its parent directory if needed, and run
/// pending migrations.
async fn open_database(config: &Config) -> Result<Db> {
    if let Some(parent) = config.db_path().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Db::new(config.db_path());
    db.with_connection(migrate::run_migrations).await?;
    Ok(db)
}

/// Run database schema verification
async fn run_schema_verification() -> Result<()> {
    log::info!("Starting kgraph v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    log::info!("Database path: {}", config.db_path().display());

    let db = open_database(&config).await?;

    verify_database_schema(&db).await?;

    Ok(())
}

/// Verify that all expected database objects exist
async fn verify_database_schema(db: &Db) -> Result<()> {
    use kgraph::error::KgraphError;

    db.with_connection(|conn| {
        let mut stmt =
            conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        for table in ["concepts", "relationships", "schema_migrations"] {
            if !tables.iter().any(|t| t == table) {
                return Err(KgraphError::Config(format!("Missing table: {}", table)));
            }
            log::debug!("✓ Table exists: {}", table);
        }

        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%'")?;
        let indexes: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        for index in [
            "idx_concepts_name",
            "idx_relationships_src",
            "idx_relationships_dst",
        ] {
            if !indexes.iter().any(|i| i == index) {
                return Err(KgraphError::Config(format!("Missing index: {}", index)));
            }
            log::debug!("✓ Index exists: {}", index);
        }

        let journal_mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
        if journal_mode.to_uppercase() != "WAL" {
            return Err(KgraphError::Config(format!(
                "Journal mode is not WAL: {}",
                journal_mode
            )));
        }
        log::debug!("✓ Journal mode: WAL");

        let foreign_keys: i32 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        if foreign_keys != 1 {
            return Err(KgraphError::Config("Foreign keys not enabled".to_string()));
        }
        log::debug!("✓ Foreign keys enabled");

        let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if integrity != "ok" {
            return Err(KgraphError::Config(format!(
                "Database integrity check failed: {}",
                integrity
            )));
        }
        log::info!("✓ Database integrity: OK");

        Ok(())
    })
    .await?;

    log::info!("✓ Database schema verification complete");
    Ok(())
}

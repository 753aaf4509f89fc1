use std::path::Path;

pub(crate) async fn run_ping(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    clinnect_db::health_check(pool).await?;
    println!("database ok");
    Ok(())
}

pub(crate) async fn run_migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let applied = clinnect_db::run_migrations(pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Load the providers file and upsert it in one transaction.
///
/// # Errors
///
/// Returns an error if the file is invalid or any write fails; nothing is
/// committed in that case.
pub(crate) async fn run_seed(pool: &sqlx::PgPool, path: &Path) -> anyhow::Result<()> {
    let file = clinnect_core::load_providers_file(path)?;
    let summary = clinnect_db::seed_providers(pool, &file).await?;
    tracing::info!(path = %path.display(), ?summary, "providers seeded");
    println!(
        "seeded {} hospitals, {} clinics, {} insurance links from {}",
        summary.hospitals,
        summary.clinics,
        summary.links,
        path.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = kodeto_api::run_worker().await {
        eprintln!("kodeto-worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

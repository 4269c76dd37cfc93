#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = kodeto_api::run().await {
        eprintln!("kodeto-api fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    checkout::run::main().await
}

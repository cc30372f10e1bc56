#[tokio::main]
async fn main() -> anyhow::Result<()> {
    certificate_issuer::run().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ispagent::run_cli().await
}

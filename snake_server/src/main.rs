#[tokio::main]
async fn main() -> std::io::Result<()> {
    snake_server::run_with_config().await
}

use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let (addr, _mock) = snoo_mock_server::serve(tests::populated())
        .await
        .context("serving mock server")?;
    println!("SNOO_BASE_URL=http://{addr}");
    println!("SNOO_TOKEN={}", tests::TOKEN);

    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    tracing::info!("shutting down");
    Ok(())
}

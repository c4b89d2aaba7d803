#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pocketbook_api::cli::run_with_sys_args().await
}

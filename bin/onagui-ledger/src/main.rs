use eyre::Report;

#[tokio::main]
async fn main() -> Result<(), Report> {
    onagui_ledger::run().await
}

#[tokio::main]
async fn main() {
    if let Err(e) = vitalsync_lib::run().await {
        eprintln!("vitalsync: {e}");
        std::process::exit(1);
    }
}

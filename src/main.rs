#[tokio::main]
async fn main() {
    if let Err(err) = askdocs_lib::run_service().await {
        eprintln!("[askdocs] startup failed: {err:?}");
        std::process::exit(1);
    }
}

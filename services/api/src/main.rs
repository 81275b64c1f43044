use taxcheck_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("taxcheck error: {err}");
        std::process::exit(1);
    }
}

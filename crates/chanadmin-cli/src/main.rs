//! `chanadmin` binary entry point.

#[tokio::main]
async fn main() {
    let exit_code = chanadmin_cli::run().await;
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() {
    if let Err(e) = invoicebridge_lib::run().await {
        eprintln!("invoicebridge failed to start: {e}");
        std::process::exit(1);
    }
}

// File dialogs run on tokio tasks, so the UI loop needs a runtime around it
#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    // RUST_LOG=info shows saves, loads and auto-links
    env_logger::init();

    traffic_studio::run_app()
}

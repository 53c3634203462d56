use clap::Parser;
use newton_fractal_server::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    newton_fractal_server::run_server(config).await
}

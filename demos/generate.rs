use pixelprompt::{ApiClient, Config, Controller, LinkRepository, LinkValidator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pixelprompt::logger::init_with_config(pixelprompt::logger::LoggerConfig::development())?;
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded"),
        Err(_) => log::warn!("⚠️  No .env file found"),
    }

    let config = Config::from_env();
    let api = ApiClient::new(&config.api)?;
    let links = LinkRepository::new(&config.storage);
    let validator = LinkValidator::new(&config.validator);

    let mut controller = Controller::new(api, links, validator);
    for model in controller.load_models().await {
        log::info!("  {} (max {} images)", model.id, model.max_images);
    }

    controller.set_prompt("Bears with paint brushes, the Starry Night, painted by Vincent Van Gogh");
    controller.set_quantity(2);

    let urls = controller.submit().await?;
    match controller.error_message() {
        Some(message) => log::error!("❌ Generation failed: {}", message),
        None => {
            for url in urls {
                println!("{}", url);
            }
        }
    }

    println!("Gallery: {:?}", controller.gallery().await?);
    Ok(())
}

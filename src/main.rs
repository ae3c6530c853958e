use clap::{Parser, Subcommand};
use pixelprompt::{
    logger::{self, LogLevel, LoggerConfig},
    ApiClient, Config, Controller, Gallery, ImageSize, LinkRepository, LinkValidator,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pixelprompt", about = "Generate images from text prompts")]
struct Cli {
    /// Verbose (debug) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Link file to use instead of IMAGE_LINKS_PATH.
    #[arg(long, global = true)]
    links_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List image models and how many images each can return.
    Models,
    /// Generate images for a prompt.
    Generate {
        prompt: String,
        #[arg(short, long)]
        model: Option<String>,
        #[arg(short = 'n', long)]
        count: Option<u32>,
        #[arg(short, long, default_value = "1024x1024")]
        size: ImageSize,
    },
    /// Validate and print stored image links.
    Links,
    /// Download stored image links.
    Download {
        #[arg(short, long, default_value = "images")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Warn };
    if let Err(e) = logger::init_with_config(LoggerConfig::new().with_level(level)) {
        eprintln!("{}", e);
    }

    match dotenv::dotenv() {
        Ok(_) => log::debug!("✅ .env file loaded"),
        Err(_) => log::debug!("No .env file found, using system environment variables"),
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> pixelprompt::Result<ExitCode> {
    let mut config = Config::from_env();
    if let Some(path) = cli.links_file {
        config.storage = config.storage.with_file(path);
    }
    logger::log_config_info(&config);

    let links = LinkRepository::new(&config.storage);
    let validator = LinkValidator::new(&config.validator);

    match cli.command {
        Command::Models => {
            let api = ApiClient::new(&config.api)?;
            let models = api.image().list_image_models().await;
            if models.is_empty() {
                println!("No image models available");
            }
            for model in models {
                println!("{}\t(max {} images)", model.id, model.max_images);
            }
        }
        Command::Generate {
            prompt,
            model,
            count,
            size,
        } => {
            let api = ApiClient::new(&config.api)?;
            let mut controller = Controller::new(api, links, validator);
            controller.load_models().await;

            if let Some(model) = model {
                controller.select_model(&model);
            }
            if let Some(count) = count {
                controller.set_quantity(count);
            }
            controller.set_size(size);
            controller.set_prompt(prompt);

            let urls = controller.submit().await?;
            if let Some(message) = controller.error_message() {
                eprintln!("error: {}", message);
                return Ok(ExitCode::FAILURE);
            }
            for url in urls {
                println!("{}", url);
            }
        }
        Command::Links => {
            let gallery = Gallery::new(links, validator);
            for link in gallery.links().await? {
                println!("{}", link);
            }
        }
        Command::Download { dir } => {
            let gallery = Gallery::new(links, validator);
            let written = gallery.download_all(&dir).await?;
            println!("Downloaded {} image(s) to {}", written.len(), dir.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

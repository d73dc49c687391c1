use clap::{Parser, Subcommand};
use omr_engine::{Engine, EngineConfig, OmrPageOutput, StaticScan, Template};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "omrtool", version, about = "Apply OMR templates to scanned forms")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a template to a scanned image and print the page output as JSON
    Apply {
        #[arg(long)]
        template: PathBuf,
        #[arg(long)]
        image: PathBuf,
        /// Parameters identifying the page (repeatable)
        #[arg(long = "param")]
        params: Vec<String>,
        /// Engine configuration JSON; defaults plus OMR_* variables otherwise
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Like `apply`, with every intermediate image written to `out`
    Debug {
        #[arg(long)]
        template: PathBuf,
        #[arg(long)]
        image: PathBuf,
        #[arg(long = "param")]
        params: Vec<String>,
        #[arg(long, default_value = "imgproc")]
        out: PathBuf,
    },
    /// Check a template's geometry and field ids
    Validate {
        #[arg(long)]
        template: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Apply {
            template,
            image,
            params,
            config,
        } => load_config(config.as_deref())
            .and_then(|config| apply_cmd(&template, &image, params, config)),
        Command::Debug {
            template,
            image,
            params,
            out,
        } => apply_cmd(
            &template,
            &image,
            params,
            EngineConfig::from_env().with_debug_dir(out),
        ),
        Command::Validate { template } => validate_cmd(&template),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, String> {
    let Some(path) = path else {
        return Ok(EngineConfig::from_env());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|err| format!("Failed to read config {}: {}", path.display(), err))?;
    serde_json::from_str(&json)
        .map_err(|err| format!("Failed to parse config {}: {}", path.display(), err))
}

fn apply_cmd(
    template_path: &Path,
    image_path: &Path,
    params: Vec<String>,
    config: EngineConfig,
) -> Result<(), String> {
    let template = Template::load(template_path)
        .map_err(|err| format!("Failed to load template {}: {}", template_path.display(), err))?;
    let mut scan = StaticScan::open(image_path, template.name.clone())
        .map_err(|err| err.to_string())?
        .with_parameters(params);

    let output = Engine::new(config)
        .apply_template(&template, &mut scan)
        .map_err(|err| err.to_string())?;
    print_output(&output)?;

    if output.is_success() {
        Ok(())
    } else {
        Err(format!(
            "Page {} failed: {}",
            output.id,
            output.error_message.as_deref().unwrap_or("unknown error")
        ))
    }
}

fn print_output(output: &OmrPageOutput) -> Result<(), String> {
    let json = serde_json::to_string_pretty(output).map_err(|err| err.to_string())?;
    println!("{json}");
    Ok(())
}

fn validate_cmd(template_path: &Path) -> Result<(), String> {
    let template = Template::load(template_path)
        .map_err(|err| format!("Failed to load template {}: {}", template_path.display(), err))?;
    template.validate().map_err(|err| err.to_string())?;
    println!(
        "Template {}: {} barcode fields, {} bubble fields",
        template.name,
        template.barcode_fields().count(),
        template.bubble_fields().count()
    );
    Ok(())
}

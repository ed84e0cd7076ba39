//! Autotag PDFs from layout-model detections.
//!
//! Usage:
//!   autotag config [-o config.json]
//!   autotag [--name NAME --key KEY] tag -i in.pdf -o out.pdf --detections detections.json
//!   autotag tag -i in_dir -o out_dir --detector-cmd layout-detect --model PP-DocLayout-L
//!   autotag inspect template.json

use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use pdf_autotag::config::{Credentials, TaggingConfig, INTEGRATION_CONFIG};
use pdf_autotag::detection::{CommandDetector, LayoutDetector, ReplayDetector};
use pdf_autotag::engine::{LopdfEngine, Rasterizer};
use pdf_autotag::structure::TemplateSerializer;
use pdf_autotag::tagging::TaggingOrchestrator;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "autotag")]
#[command(version, about = "Tag PDF documents using layout detection", long_about = None)]
struct Cli {
    /// License name
    #[arg(long, global = true, default_value = "")]
    name: String,

    /// License key
    #[arg(long, global = true, default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the integration config JSON, or write it to a file
    Config {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Tag a PDF, or every PDF in a folder
    Tag(TagArgs),

    /// Validate a template JSON file and print a summary
    Inspect {
        /// Template JSON file
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("detector").required(true).args(["detections", "detector_cmd"])))]
struct TagArgs {
    /// Input PDF file or folder
    #[arg(short, long)]
    input: PathBuf,

    /// Output PDF file or folder
    #[arg(short, long)]
    output: PathBuf,

    /// Tagging config JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Layout model identifier
    #[arg(long)]
    model: Option<String>,

    /// Render zoom factor (1.0 = 72 dpi)
    #[arg(long)]
    zoom: Option<f32>,

    /// Maximum nested sub-elements kept per page
    #[arg(long)]
    max_sub_elements: Option<usize>,

    /// Folder to save the generated template JSON in
    #[arg(long)]
    template_dir: Option<PathBuf>,

    /// Recorded detections JSON file
    #[arg(long)]
    detections: Option<PathBuf>,

    /// Layout model program run once per page
    #[arg(long)]
    detector_cmd: Option<PathBuf>,

    /// Extra argument for the model program (repeatable)
    #[arg(long = "detector-arg", allow_hyphen_values = true)]
    detector_args: Vec<String>,

    /// pdftoppm executable used to render pages
    #[arg(long)]
    pdftoppm: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let credentials = Credentials::from_parts(Some(&cli.name), Some(&cli.key));
    match cli.command {
        Commands::Config { output } => write_config(output.as_deref()),
        Commands::Tag(args) => tag(args, credentials),
        Commands::Inspect { file } => inspect(&file),
    }
}

fn write_config(output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => fs::write(path, INTEGRATION_CONFIG)
            .with_context(|| format!("failed to write config to {}", path.display())),
        None => {
            print!("{}", INTEGRATION_CONFIG);
            Ok(())
        },
    }
}

fn tag(args: TagArgs, credentials: Credentials) -> Result<()> {
    let mode = mode(&args.input, &args.output)?;
    let config = load_config(&args)?;

    let rasterizer = match (&args.pdftoppm, &args.detector_cmd) {
        (Some(program), _) => Some(Rasterizer::new(program)),
        // A model program needs page images
        (None, Some(_)) => Some(Rasterizer::pdftoppm()),
        (None, None) => None,
    };
    let engine = match rasterizer {
        Some(r) => LopdfEngine::new().with_rasterizer(r),
        None => LopdfEngine::new(),
    };

    let detector: Box<dyn LayoutDetector> = match (&args.detections, &args.detector_cmd) {
        (Some(path), _) => Box::new(
            ReplayDetector::from_file(path)
                .with_context(|| format!("failed to load detections from {}", path.display()))?,
        ),
        (None, Some(program)) => Box::new(
            CommandDetector::new(program, config.model.clone()).with_args(args.detector_args.clone()),
        ),
        (None, None) => anyhow::bail!("either --detections or --detector-cmd is required"),
    };

    let mut orchestrator = TaggingOrchestrator::new(engine, detector, config)
        .context("invalid tagging configuration")?
        .with_credentials(credentials);

    match mode {
        Mode::Document => {
            let report = orchestrator
                .run(&args.input, &args.output)
                .with_context(|| format!("failed to tag {}", args.input.display()))?;
            if !report.truncated_pages.is_empty() {
                log::warn!("Sub-elements were capped on pages {:?}", report.truncated_pages);
            }
        },
        Mode::Folder => {
            let reports = orchestrator
                .run_folder(&args.input, &args.output)
                .with_context(|| format!("failed to tag folder {}", args.input.display()))?;
            log::info!("Tagged {} documents into {}", reports.len(), args.output.display());
        },
    }
    Ok(())
}

/// What `tag` does with its input and output paths.
#[derive(Debug, PartialEq, Eq)]
enum Mode {
    /// One PDF in, one PDF out
    Document,
    /// Every PDF in a directory
    Folder,
}

fn mode(input: &Path, output: &Path) -> Result<Mode> {
    if is_pdf(input) && is_pdf(output) {
        Ok(Mode::Document)
    } else if input.is_dir() {
        Ok(Mode::Folder)
    } else {
        anyhow::bail!("Input and output file must be PDF")
    }
}

fn load_config(args: &TagArgs) -> Result<TaggingConfig> {
    let mut config = match &args.config {
        Some(path) => TaggingConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => TaggingConfig::default(),
    };
    if let Some(model) = &args.model {
        config = config.with_model(model.clone());
    }
    if let Some(zoom) = args.zoom {
        config = config.with_zoom(zoom);
    }
    if let Some(max) = args.max_sub_elements {
        config = config.with_max_sub_elements(max);
    }
    if let Some(dir) = &args.template_dir {
        config = config.with_template_dir(dir.clone());
    }
    Ok(config)
}

fn inspect(file: &Path) -> Result<()> {
    let template = TemplateSerializer::read_from_file(file)
        .with_context(|| format!("failed to read template {}", file.display()))?;
    template
        .validate()
        .with_context(|| format!("{} is not a valid template", file.display()))?;

    println!(
        "model: {}  zoom: {}  pages: {}",
        template.metadata.model,
        template.metadata.zoom,
        template.pages.len()
    );
    for page in &template.pages {
        println!(
            "  page {:>4}: {:>4} elements, {:>5} sub-elements{}",
            page.page_number,
            page.elements.len(),
            page.sub_element_count(),
            if page.truncated { " (truncated)" } else { "" }
        );
    }
    Ok(())
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_pair_is_document_mode() {
        let mode = mode(Path::new("in.pdf"), Path::new("out/tagged.PDF")).unwrap();
        assert_eq!(mode, Mode::Document);
    }

    #[test]
    fn test_directory_input_is_folder_mode() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("tagged");
        assert_eq!(mode(dir.path(), &output).unwrap(), Mode::Folder);
    }

    #[test]
    fn test_other_inputs_are_rejected() {
        for (input, output) in [("in.pdf", "out.txt"), ("in.docx", "out.pdf"), ("missing", "out")] {
            let err = mode(Path::new(input), Path::new(output)).unwrap_err();
            assert_eq!(err.to_string(), "Input and output file must be PDF");
        }
    }

    #[test]
    fn test_write_config_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        write_config(Some(&path)).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, INTEGRATION_CONFIG);
        let json: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert!(json["actions"].is_array());
    }

    #[test]
    fn test_write_config_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("config.json");
        assert!(write_config(Some(&path)).is_err());
    }
}

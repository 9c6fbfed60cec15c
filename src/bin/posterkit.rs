use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use sha2::Digest as _;

use posterkit::{
    ComposeRequest, ComposeStage, FitMode, FontRegistry, OutputFormat, OutputOptions,
    PosterComposer, ResizeOptions, TemplateCatalog,
};

#[derive(Parser, Debug)]
#[command(name = "posterkit", version)]
struct Cli {
    /// Log pipeline stages and font resolution to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a poster from a template and a photo.
    Compose(ComposeArgs),
    /// List available templates.
    Templates(TemplatesArgs),
    /// List bundled fonts and whether they load.
    Fonts(FontsArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Template id.
    #[arg(long)]
    template: String,

    /// Photo file (any format the image decoder understands).
    #[arg(long)]
    photo: PathBuf,

    /// Output file.
    #[arg(long)]
    out: PathBuf,

    /// Text value as `field=value`; repeatable.
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<(String, String)>,

    /// JSON object of text values, merged under `--field`.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Output format; inferred from the `--out` extension when omitted.
    #[arg(long, value_enum)]
    format: Option<FormatChoice>,

    /// JPEG quality (1-100).
    #[arg(long, default_value_t = posterkit::encode::DEFAULT_JPEG_QUALITY)]
    quality: u8,

    /// Resize width.
    #[arg(long)]
    width: Option<u32>,

    /// Resize height.
    #[arg(long)]
    height: Option<u32>,

    /// Fit mode when both width and height are given.
    #[arg(long, value_enum, default_value_t = FitChoice::Contain)]
    fit: FitChoice,

    /// Additional template JSON files; repeatable.
    #[arg(long = "template-file")]
    template_files: Vec<PathBuf>,

    /// Directory holding the bundled fonts.
    #[arg(long)]
    fonts_dir: Option<PathBuf>,

    /// Print stage progress to stderr.
    #[arg(long)]
    progress: bool,
}

#[derive(Parser, Debug)]
struct TemplatesArgs {
    /// Additional template JSON files; repeatable.
    #[arg(long = "template-file")]
    template_files: Vec<PathBuf>,

    /// Print full template JSON instead of ids.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct FontsArgs {
    /// Directory holding the bundled fonts.
    #[arg(long)]
    fonts_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Jpeg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FitChoice {
    Contain,
    Cover,
    Fill,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Templates(args) => cmd_templates(args),
        Command::Fonts(args) => cmd_fonts(args),
    }
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty field name in '{raw}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

fn load_catalog(extra: &[PathBuf]) -> anyhow::Result<TemplateCatalog> {
    let mut catalog = TemplateCatalog::builtin()?;
    for path in extra {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read template '{}'", path.display()))?;
        catalog
            .insert_json(&json)
            .with_context(|| format!("load template '{}'", path.display()))?;
    }
    Ok(catalog)
}

fn load_fonts(dir: Option<&Path>) -> FontRegistry {
    let registry = FontRegistry::new();
    let loaded = match dir {
        Some(dir) => registry.init_bundled_fonts_from(dir),
        None => registry.init_bundled_fonts(),
    };
    tracing::debug!(loaded, "fonts ready");
    registry
}

fn output_format(choice: Option<FormatChoice>, out: &Path) -> OutputFormat {
    match choice {
        Some(FormatChoice::Png) => OutputFormat::Png,
        Some(FormatChoice::Jpeg) => OutputFormat::Jpeg,
        None => {
            let ext = out
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase);
            match ext.as_deref() {
                Some("jpg" | "jpeg") => OutputFormat::Jpeg,
                _ => OutputFormat::Png,
            }
        }
    }
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(&args.template_files)?;
    let fonts = load_fonts(args.fonts_dir.as_deref());
    let composer = PosterComposer::new(catalog, std::sync::Arc::new(fonts));

    let photo = std::fs::read(&args.photo)
        .with_context(|| format!("read photo '{}'", args.photo.display()))?;

    let mut data = BTreeMap::<String, String>::new();
    if let Some(path) = &args.data {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read data '{}'", path.display()))?;
        let parsed: BTreeMap<String, String> =
            serde_json::from_str(&raw).with_context(|| "parse data JSON")?;
        data.extend(parsed);
    }
    data.extend(args.fields);

    let resize = (args.width.is_some() || args.height.is_some()).then_some(ResizeOptions {
        width: args.width,
        height: args.height,
        fit: match args.fit {
            FitChoice::Contain => FitMode::Contain,
            FitChoice::Cover => FitMode::Cover,
            FitChoice::Fill => FitMode::Fill,
        },
    });
    let request = ComposeRequest {
        template_id: args.template,
        photo: photo.into(),
        data,
        output: Some(OutputOptions {
            format: output_format(args.format, &args.out),
            quality: args.quality,
            resize,
        }),
    };

    let mut print_progress = |stage: ComposeStage, pct: u8| eprintln!("[{pct:>3}%] {stage}");
    let progress: Option<&mut dyn posterkit::ProgressObserver> = if args.progress {
        Some(&mut print_progress)
    } else {
        None
    };
    let result = composer.compose(&request, progress)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &result.bytes)
        .with_context(|| format!("write output '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({}x{} {}, {} bytes)",
        args.out.display(),
        result.metadata.width,
        result.metadata.height,
        result.metadata.format,
        result.metadata.size
    );
    Ok(())
}

fn cmd_templates(args: TemplatesArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(&args.template_files)?;
    for id in catalog.ids() {
        let Some(template) = catalog.get(&id) else {
            continue;
        };
        if args.json {
            println!("{}", serde_json::to_string_pretty(template.as_ref())?);
        } else {
            let fields: Vec<&str> = template.text_fields.iter().map(|f| f.id.as_str()).collect();
            println!(
                "{id}\t{}x{}\t{} slot(s)\t{}",
                template.canvas.width,
                template.canvas.height,
                template.photo_slots.len(),
                fields.join(",")
            );
        }
    }
    Ok(())
}

fn cmd_fonts(args: FontsArgs) -> anyhow::Result<()> {
    let dir = args
        .fonts_dir
        .clone()
        .unwrap_or_else(posterkit::fonts::bundled_fonts_dir);
    let registry = load_fonts(Some(&dir));
    println!("fonts dir: {}", dir.display());
    for name in posterkit::fonts::list_bundled_fonts() {
        match registry.get_font(name) {
            Some(bytes) => println!("{name}\tloaded\tsha256:{}", sha256_hex(&bytes)),
            None => println!("{name}\tmissing"),
        }
    }
    println!("fallback: {}", posterkit::fonts::default_font());
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

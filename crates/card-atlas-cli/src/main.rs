use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use card_atlas_core::config::{
    CellSizePolicy, DuplicatePolicy, GeneratorConfig, ItemOrder, ResizeFilter,
};
use card_atlas_core::discovery::list_atlases;
use card_atlas_core::{
    AtlasDescriptor, ModPaths, render_atlases, to_json, to_lua_file, write_descriptor,
};
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "card-atlas",
    about = "Pack per-card images into grid atlases and generate atlases.lua",
    version,
    author
)]
struct Cli {
    /// Defaults to `generate` when omitted
    #[command(subcommand)]
    command: Option<Commands>,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render every atlas at every scale and write the descriptor file
    Generate(GenerateArgs),
    /// Nearest-neighbour upscale of 1x assets into the 2x directory
    Upscale(UpscaleArgs),
}

#[derive(Parser, Debug, Clone)]
struct GenerateArgs {
    // Input/Output
    /// Directory to search for the mod root (itself, then its parent)
    #[arg(long, default_value = ".", help_heading = "Input/Output")]
    root: PathBuf,
    /// YAML config file path (command-line options take precedence)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob) matched against atlas names
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob) matched against atlas names
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,
    /// Descriptor output path (default: <mod root>/atlases.lua, or atlases.json for --metadata json)
    #[arg(short, long, help_heading = "Input/Output")]
    output: Option<PathBuf>,

    // Layout
    /// Scales to render, in order (e.g. 2,1)
    #[arg(long, value_delimiter = ',', help_heading = "Layout")]
    scales: Vec<u32>,
    /// Scale whose layout is written to the descriptor
    #[arg(long, help_heading = "Layout")]
    base_scale: Option<u32>,
    /// Maximum cells per row
    #[arg(long, help_heading = "Layout")]
    max_grid_width: Option<u32>,
    /// Item order: name_asc | filesystem
    #[arg(long, help_heading = "Layout")]
    item_order: Option<String>,

    // Image Processing
    /// Mixed image sizes in one atlas: strict | first_image
    #[arg(long, help_heading = "Image Processing")]
    cell_size_policy: Option<String>,
    /// Items matching several naming patterns: warn | reject | prefer_prescaled
    #[arg(long, help_heading = "Image Processing")]
    duplicate_policy: Option<String>,
    /// Resize filter for images that are not prescaled: nearest | triangle | catmull_rom | lanczos3
    #[arg(long, help_heading = "Image Processing")]
    resize_filter: Option<String>,
    /// Draw red cell outlines (debug)
    #[arg(long, default_value_t = false, help_heading = "Image Processing")]
    outlines: bool,

    // Export
    /// Metadata format: lua | json | template
    #[arg(long, value_parser = ["lua", "json", "template"], default_value = "lua", help_heading = "Export")]
    metadata: String,
    /// Handlebars template file, used when --metadata template
    #[arg(long, help_heading = "Export")]
    template: Option<PathBuf>,
    /// Command named in the do-not-edit banner
    #[arg(long, help_heading = "Export")]
    generator_name: Option<String>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: discover, lay out and render but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct UpscaleArgs {
    /// Glob relative to the source directory (e.g. "*.png" or "jokers/*.png")
    pattern: String,
    /// Directory to search for the mod root (itself, then its parent)
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Upscale factor
    #[arg(long, default_value_t = 2)]
    factor: u32,
    /// Source directory (default: <mod root>/assets/1x)
    #[arg(long)]
    input_dir: Option<PathBuf>,
    /// Output directory (default: <mod root>/assets/<factor>x)
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let Cli {
        command,
        progress,
        verbose,
        quiet,
    } = Cli::parse();
    init_tracing_with_level(quiet, verbose);
    let command =
        command.unwrap_or_else(|| Commands::Generate(GenerateArgs::parse_from(["generate"])));
    match &command {
        Commands::Generate(args) => run_generate(args, progress && !quiet),
        Commands::Upscale(args) => run_upscale(args),
    }
}

fn build_config(args: &GenerateArgs) -> anyhow::Result<GeneratorConfig> {
    let mut cfg = GeneratorConfig::default();
    if let Some(path) = &args.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)?;
        cfg = y.into_generator_config(cfg)?;
    }
    if !args.scales.is_empty() {
        cfg.scales = args.scales.clone();
    }
    if let Some(v) = args.base_scale {
        cfg.base_scale = v;
    }
    if let Some(v) = args.max_grid_width {
        cfg.max_grid_width = v;
    }
    if let Some(v) = &args.item_order {
        cfg.item_order = parse_item_order(v)?;
    }
    if let Some(v) = &args.cell_size_policy {
        cfg.cell_size_policy = parse_cell_size_policy(v)?;
    }
    if let Some(v) = &args.duplicate_policy {
        cfg.duplicate_policy = parse_duplicate_policy(v)?;
    }
    if let Some(v) = &args.resize_filter {
        cfg.resize_filter = parse_resize_filter(v)?;
    }
    if args.outlines {
        cfg.outlines = true;
    }
    if let Some(v) = &args.generator_name {
        cfg.generator_name = v.clone();
    }
    if args.dry_run {
        cfg.dry_run = true;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn run_generate(args: &GenerateArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = build_config(args)?;

    if args.print_config {
        match args.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let (paths, meta) = ModPaths::locate(&args.root)
        .with_context(|| format!("locate mod root from {}", args.root.display()))?;
    info!(id = %meta.id, root = %paths.mod_root.display(), "mod root");

    let filter = AtlasFilter::new(&args.include, &args.exclude)?;
    let atlases: Vec<String> = list_atlases(&paths.uncombined, cfg.item_order)
        .with_context(|| format!("list atlases in {}", paths.uncombined.display()))?
        .into_iter()
        .filter(|name| !filter.should_skip(name))
        .collect();
    info!(count = atlases.len(), "found atlases");

    let descriptors = generate_with_progress(&cfg, &paths, &atlases, show_progress)?;

    let (rendered, default_path) = match args.metadata.as_str() {
        "lua" => (
            to_lua_file(&cfg.generator_name, &descriptors),
            Some(paths.descriptor.clone()),
        ),
        "json" => (
            to_json(&cfg.generator_name, &descriptors)?,
            Some(paths.descriptor.with_extension("json")),
        ),
        "template" => {
            let path = args
                .template
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--metadata template requires --template <file>"))?;
            let tpl = fs::read_to_string(path)
                .with_context(|| format!("read template {}", path.display()))?;
            let ctx = build_template_context(&cfg, &descriptors);
            let mut reg = Handlebars::new();
            reg.set_strict_mode(true);
            reg.register_template_string("tpl", tpl)?;
            (reg.render("tpl", &ctx)?, None)
        }
        other => anyhow::bail!("unknown metadata format: {}", other),
    };

    let out_path = args
        .output
        .clone()
        .or(default_path)
        .ok_or_else(|| anyhow::anyhow!("--metadata template requires --output <file>"))?;

    if cfg.dry_run {
        info!(path = %out_path.display(), bytes = rendered.len(), "dry run, descriptor not written");
        return Ok(());
    }
    write_descriptor(&out_path, &rendered)
        .with_context(|| format!("write {}", out_path.display()))?;
    info!(path = %out_path.display(), atlases = descriptors.len(), "descriptor written");
    Ok(())
}

fn generate_with_progress(
    cfg: &GeneratorConfig,
    paths: &ModPaths,
    atlases: &[String],
    progress: bool,
) -> anyhow::Result<Vec<AtlasDescriptor>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(atlases.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} atlas {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let report = render_atlases(cfg, paths, atlases, |i, atlas| {
        if let Some(b) = &bar {
            b.set_position(i as u64);
            b.set_message(atlas.to_string());
        }
    })
    .context("generate atlases")?;
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(report.descriptors)
}

fn run_upscale(args: &UpscaleArgs) -> anyhow::Result<()> {
    let (input_dir, output_dir) = match (&args.input_dir, &args.output_dir) {
        (Some(i), Some(o)) => (i.clone(), o.clone()),
        (i, o) => {
            let (paths, _) = ModPaths::locate(&args.root)
                .with_context(|| format!("locate mod root from {}", args.root.display()))?;
            (
                i.clone().unwrap_or_else(|| paths.scale_dir(1)),
                o.clone().unwrap_or_else(|| paths.scale_dir(args.factor)),
            )
        }
    };
    let matcher = Glob::new(&args.pattern)?.compile_matcher();
    let mut did_anything = false;
    for entry in WalkDir::new(&input_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(&input_dir)?;
        let rel_str = rel.to_string_lossy().replace('\\', "/");
        if !matcher.is_match(&rel_str) {
            continue;
        }
        let target_dir = match rel.parent() {
            Some(p) => output_dir.join(p),
            None => output_dir.clone(),
        };
        card_atlas_core::upscale::upscale_file(entry.path(), &target_dir, args.factor)
            .with_context(|| format!("upscale {}", entry.path().display()))?;
        did_anything = true;
    }
    if did_anything {
        info!("done");
    } else {
        warn!(pattern = %args.pattern, dir = %input_dir.display(), "nothing matched the pattern");
    }
    Ok(())
}

struct AtlasFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl AtlasFilter {
    fn new(include: &[String], exclude: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            include: build_globset(include)?,
            exclude: build_globset(exclude)?,
        })
    }

    fn should_skip(&self, name: &str) -> bool {
        if let Some(ex) = &self.exclude {
            if ex.is_match(name) {
                return true;
            }
        }
        if let Some(inc) = &self.include {
            if !inc.is_match(name) {
                return true;
            }
        }
        false
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat)?);
    }
    Ok(Some(b.build()?))
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Serialize)]
struct TemplatePosition {
    name: String,
    item: String,
    variant: Option<String>,
    x: u32,
    y: u32,
}

#[derive(Serialize)]
struct TemplateAtlas {
    name: String,
    key: String,
    path: String,
    px: u32,
    py: u32,
    columns: u32,
    rows: u32,
    positions: Vec<TemplatePosition>,
}

#[derive(Serialize)]
struct TemplateContext {
    banner: String,
    generator: String,
    atlases: Vec<TemplateAtlas>,
}

fn build_template_context(
    cfg: &GeneratorConfig,
    descriptors: &[AtlasDescriptor],
) -> TemplateContext {
    let atlases = descriptors
        .iter()
        .map(|d| {
            let mut positions = Vec::new();
            d.positions.for_each_leaf(|path, cell| {
                positions.push(TemplatePosition {
                    name: path.join("/"),
                    item: path[0].to_string(),
                    variant: path.get(1).map(|v| v.to_string()),
                    x: cell.column,
                    y: cell.row,
                });
            });
            TemplateAtlas {
                name: d.metadata.name.clone(),
                key: d.metadata.key.clone(),
                path: d.metadata.output_filename.clone(),
                px: d.metadata.cell_width,
                py: d.metadata.cell_height,
                columns: d.grid.0,
                rows: d.grid.1,
                positions,
            }
        })
        .collect();
    TemplateContext {
        banner: card_atlas_core::banner(&cfg.generator_name),
        generator: cfg.generator_name.clone(),
        atlases,
    }
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    max_grid_width: Option<u32>,
    scales: Option<Vec<u32>>,
    base_scale: Option<u32>,
    item_order: Option<String>,
    cell_size_policy: Option<String>,
    duplicate_policy: Option<String>,
    resize_filter: Option<String>,
    outlines: Option<bool>,
    generator_name: Option<String>,
}

impl YamlConfig {
    fn into_generator_config(self, mut cfg: GeneratorConfig) -> anyhow::Result<GeneratorConfig> {
        if let Some(v) = self.max_grid_width {
            cfg.max_grid_width = v;
        }
        if let Some(v) = self.scales {
            cfg.scales = v;
        }
        if let Some(v) = self.base_scale {
            cfg.base_scale = v;
        }
        if let Some(v) = self.item_order {
            cfg.item_order = parse_item_order(&v)?;
        }
        if let Some(v) = self.cell_size_policy {
            cfg.cell_size_policy = parse_cell_size_policy(&v)?;
        }
        if let Some(v) = self.duplicate_policy {
            cfg.duplicate_policy = parse_duplicate_policy(&v)?;
        }
        if let Some(v) = self.resize_filter {
            cfg.resize_filter = parse_resize_filter(&v)?;
        }
        if let Some(v) = self.outlines {
            cfg.outlines = v;
        }
        if let Some(v) = self.generator_name {
            cfg.generator_name = v;
        }
        Ok(cfg)
    }
}

fn parse_item_order(s: &str) -> anyhow::Result<ItemOrder> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown item order: {}", s))
}

fn parse_cell_size_policy(s: &str) -> anyhow::Result<CellSizePolicy> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown cell size policy: {}", s))
}

fn parse_duplicate_policy(s: &str) -> anyhow::Result<DuplicatePolicy> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown duplicate policy: {}", s))
}

fn parse_resize_filter(s: &str) -> anyhow::Result<ResizeFilter> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown resize filter: {}", s))
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSetBuilder};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use svg_sprite_core::config::{ConsumptionMode, LayoutConfig, SizingMode};
use svg_sprite_core::session::SpriteSession;
use svg_sprite_core::{SpriteSheet, Upload};
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "svg-sprite",
    about = "Compose images into one SVG spritesheet with <view> fragments",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --no-progress or --quiet)
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
    /// Build the sprite: SVG + CSS + HTML examples (and optionally a README)
    Build(BuildArgs),
    /// Layout-only export: compute placements and write the JSON manifest
    Layout(BuildArgs),
}

#[derive(Parser, Debug, Clone)]
struct BuildArgs {
    // Input/Output
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Sprite base name (files will be name.svg/.css/.html, classes name-*)
    #[arg(short, long, default_value = "sprite", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (overrides layout options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Layout
    /// Sizing mode: original | custom
    #[arg(long, value_parser = ["original", "custom"], default_value = "original", help_heading = "Layout")]
    sizing: String,
    /// Cell width in custom mode (clamped to 16..=1600)
    #[arg(long, default_value_t = 24, help_heading = "Layout")]
    width: u32,
    /// Cell height in custom mode (clamped to 16..=1600)
    #[arg(long, default_value_t = 24, help_heading = "Layout")]
    height: u32,
    /// Gap between images (px)
    #[arg(long, default_value_t = 0, help_heading = "Layout")]
    spacing: u32,
    /// Images per row
    #[arg(long, default_value_t = 4, help_heading = "Layout")]
    columns: u32,

    // Export
    /// Consumption mode: background | img
    #[arg(long, default_value = "background", help_heading = "Export")]
    mode: String,
    /// Also write a README.md describing usage and available icons
    #[arg(long, default_value_t = false, help_heading = "Export")]
    readme: bool,
    /// External README template file (handlebars)
    #[arg(long, help_heading = "Export")]
    template: Option<PathBuf>,
    /// Export sheet stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Build(args) => run_build(args, cli.progress && !cli.quiet, false),
        Commands::Layout(args) => run_build(args, false, true),
    }
}

fn run_build(cli: &BuildArgs, show_progress: bool, layout_only: bool) -> anyhow::Result<()> {
    let mut cfg = LayoutConfig {
        sprite_name: cli.name.clone(),
        sizing_mode: parse_sizing(&cli.sizing)?,
        custom_width: cli.width,
        custom_height: cli.height,
        spacing: cli.spacing,
        columns: cli.columns,
        consumption_mode: parse_mode(&cli.mode)?,
    };
    // Config file sets layout options en bloc
    if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)?;
        cfg = y.into_layout_config(cfg);
    }
    cfg.validate()?;

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude)?;
    let mut session = SpriteSession::new();
    load_uploads_with_progress(&mut session, &paths, show_progress);
    info!(count = session.len(), "loaded input images");
    if session.is_empty() {
        anyhow::bail!("no usable images found under {}", cli.input.display());
    }

    let sheet = session.compose(&cfg)?;
    let stats = sheet.stats();
    info!(
        images = stats.num_images,
        rows = stats.num_rows,
        width = sheet.layout.width,
        height = sheet.layout.height,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "stats"
    );

    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
        let base = cfg.effective_sprite_name().to_string();
        if layout_only {
            let json_path = cli.out_dir.join(format!("{base}.json"));
            let json = svg_sprite_core::to_json_manifest_string(&sheet)?;
            write_file(&json_path, json)?;
            info!(?json_path, "manifest written (layout-only)");
        } else {
            let svg_path = cli.out_dir.join(cfg.svg_file_name());
            write_file(&svg_path, &sheet.artifacts.svg)?;
            info!(?svg_path, mime = svg_sprite_core::SVG_MIME, "sprite written");
            let css_path = cli.out_dir.join(cfg.css_file_name());
            write_file(&css_path, &sheet.artifacts.css)?;
            info!(?css_path, mime = svg_sprite_core::CSS_MIME, "stylesheet written");
            let html_path = cli.out_dir.join(format!("{base}.html"));
            write_file(&html_path, format!("{}\n", sheet.artifacts.html))?;
            info!(?html_path, "usage examples written");
            if cli.readme {
                let readme = render_readme(&sheet, &cfg, cli.template.as_deref())?;
                let readme_path = cli.out_dir.join("README.md");
                write_file(&readme_path, readme)?;
                info!(?readme_path, "readme written");
            }
        }
    }

    if let Some(stats_path) = &cli.export_stats {
        let value = serde_json::to_value(stats)?;
        if !cli.dry_run {
            write_file(stats_path, serde_json::to_string_pretty(&value)?)?;
            info!(?stats_path, "stats exported");
        } else {
            println!("{}", stats.summary());
        }
    }
    Ok(())
}

fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> anyhow::Result<()> {
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

fn parse_sizing(s: &str) -> anyhow::Result<SizingMode> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown sizing mode: {}", s))
}

fn parse_mode(s: &str) -> anyhow::Result<ConsumptionMode> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown consumption mode: {}", s))
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    // Build glob matchers
    let mut inc_set = None;
    if !include.is_empty() {
        let mut b = GlobSetBuilder::new();
        for pat in include {
            b.add(Glob::new(pat)?);
        }
        inc_set = Some(b.build()?);
    }
    let mut exc_set = None;
    if !exclude.is_empty() {
        let mut b = GlobSetBuilder::new();
        for pat in exclude {
            b.add(Glob::new(pat)?);
        }
        exc_set = Some(b.build()?);
    }
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) {
            list.push(path.to_path_buf());
        }
    } else {
        // Sorted walk: file order is layout order.
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn should_skip(
    p: &Path,
    include: Option<&globset::GlobSet>,
    exclude: Option<&globset::GlobSet>,
) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn load_uploads_with_progress(session: &mut SpriteSession, paths: &[PathBuf], progress: bool) {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        match ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        ) {
            Ok(style) => b.set_style(style),
            Err(e) => warn!(error = %e, "invalid progress template"),
        }
        Some(b)
    } else {
        None
    };
    let mut uploads = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match Upload::from_path(p) {
            Ok(upload) => uploads.push(upload),
            Err(e) => error!(?p, error = %e, "skip image"),
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    let report = session.ingest(uploads);
    for r in &report.rejected {
        error!(file = %r.file_name, reason = %r.reason, "skip image");
    }
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
struct ReadmeIcon {
    class: String,
    fragment: String,
    w: u32,
    h: u32,
}

#[derive(Serialize)]
struct ReadmeContext {
    sprite: String,
    version: String,
    svg_file: String,
    /// Empty in img-src mode.
    css_file: String,
    background: bool,
    width: u32,
    height: u32,
    count: usize,
    first_example: String,
    icons: Vec<ReadmeIcon>,
}

fn build_readme_context(sheet: &SpriteSheet, cfg: &LayoutConfig) -> ReadmeContext {
    let background = cfg.consumption_mode == ConsumptionMode::Background;
    let icons = sheet
        .layout
        .placements
        .iter()
        .map(|p| ReadmeIcon {
            class: p.class_name.clone(),
            fragment: p.fragment_id.clone(),
            w: p.rect.w,
            h: p.rect.h,
        })
        .collect::<Vec<_>>();
    ReadmeContext {
        sprite: sheet.meta.sprite_name.clone(),
        version: sheet.meta.version.clone(),
        svg_file: sheet.meta.image.clone(),
        css_file: if background {
            cfg.css_file_name()
        } else {
            String::new()
        },
        background,
        width: sheet.layout.width,
        height: sheet.layout.height,
        count: icons.len(),
        first_example: sheet
            .artifacts
            .html
            .lines()
            .next()
            .unwrap_or_default()
            .to_string(),
        icons,
    }
}

fn render_readme(
    sheet: &SpriteSheet,
    cfg: &LayoutConfig,
    template: Option<&Path>,
) -> anyhow::Result<String> {
    let tpl_owned_from_file: Option<String> = match template {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("read template {}", path.display()))?,
        ),
        None => None,
    };
    let tpl_ref: &str = match &tpl_owned_from_file {
        Some(s) => s.as_str(),
        None => include_str!("templates/readme.hbs"),
    };
    let mut reg = Handlebars::new();
    reg.set_strict_mode(true);
    reg.register_template_string("readme", tpl_ref)?;
    Ok(reg.render("readme", &build_readme_context(sheet, cfg))?)
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    sprite_name: Option<String>,
    sizing_mode: Option<String>,
    custom_width: Option<u32>,
    custom_height: Option<u32>,
    spacing: Option<u32>,
    columns: Option<u32>,
    consumption_mode: Option<String>,
}

impl YamlConfig {
    fn into_layout_config(self, mut cfg: LayoutConfig) -> LayoutConfig {
        if let Some(v) = self.sprite_name {
            cfg.sprite_name = v;
        }
        if let Some(v) = self.sizing_mode {
            cfg.sizing_mode = v.parse().unwrap_or(cfg.sizing_mode);
        }
        if let Some(v) = self.custom_width {
            cfg.custom_width = v;
        }
        if let Some(v) = self.custom_height {
            cfg.custom_height = v;
        }
        if let Some(v) = self.spacing {
            cfg.spacing = v;
        }
        if let Some(v) = self.columns {
            cfg.columns = v;
        }
        if let Some(v) = self.consumption_mode {
            cfg.consumption_mode = v.parse().unwrap_or(cfg.consumption_mode);
        }
        cfg
    }
}

//! Pakscope CLI - list, extract and inspect game pak archives.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glob::{MatchOptions, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use pakscope::prelude::*;

/// Pakscope - multi-game pak archive tool
#[derive(Parser)]
#[command(name = "pakscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    game: GameArgs,

    /// Log debug output (PAKSCOPE_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GameArgs {
    /// Game id, e.g. HL, HL2, Q, AF, DK
    #[arg(short, long, global = true, env = "PAKSCOPE_GAME")]
    game: Option<String>,

    /// Engine family; guessed from the archive extension when omitted
    #[arg(short, long, global = true, env = "PAKSCOPE_ENGINE")]
    engine: Option<String>,

    /// Directory key; prefix with `hex:` for raw bytes
    #[arg(short, long, global = true, env = "PAKSCOPE_KEY")]
    key: Option<String>,

    /// JSON game descriptor; overrides the other game options
    #[arg(long, global = true, env = "PAKSCOPE_GAME_FILE")]
    game_file: Option<PathBuf>,
}

#[derive(Args)]
struct Source {
    /// Archive file, or a directory to read as loose files
    archive: PathBuf,

    /// Root that companion files resolve against (defaults to the archive's directory)
    #[arg(short, long)]
    root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List archive contents
    List {
        #[command(flatten)]
        source: Source,

        /// Filter pattern (glob-style, or a plain substring)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show sizes, flags and routing
        #[arg(short, long)]
        detailed: bool,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract entries to a directory
    Extract {
        #[command(flatten)]
        source: Source,

        /// Output directory
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: PathBuf,

        /// Filter pattern (glob-style, or a plain substring)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Decode one entry and describe it
    Info {
        #[command(flatten)]
        source: Source,

        /// Entry path inside the archive
        entry: String,

        /// Platform handed to texture decoders
        #[arg(short, long, value_enum, default_value_t = PlatformArg::OpenGl)]
        platform: PlatformArg,
    },

    /// Check checksums and signatures
    Verify {
        #[command(flatten)]
        source: Source,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PlatformArg {
    #[value(name = "opengl")]
    OpenGl,
    Vulkan,
    Unity,
    Unreal,
}

impl From<PlatformArg> for Platform {
    fn from(value: PlatformArg) -> Self {
        match value {
            PlatformArg::OpenGl => Platform::OpenGL,
            PlatformArg::Vulkan => Platform::Vulkan,
            PlatformArg::Unity => Platform::Unity,
            PlatformArg::Unreal => Platform::Unreal,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::List { source, filter, detailed, json } => {
            cmd_list(&cli.game, &source, filter.as_deref(), detailed, json)?;
        }
        Commands::Extract { source, output, filter } => {
            cmd_extract(&cli.game, &source, &output, filter.as_deref())?;
        }
        Commands::Info { source, entry, platform } => {
            cmd_info(&cli.game, &source, &entry, platform.into())?;
        }
        Commands::Verify { source } => {
            cmd_verify(&cli.game, &source)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("PAKSCOPE_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Engine implied by an archive's extension.
fn guess_engine(archive: &Path) -> Engine {
    let ext = archive
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "vpk" => Engine::Source,
        "wad" | "bsp" => Engine::GoldSrc,
        "pak" => Engine::Quake,
        "index" => Engine::Void,
        "zip" | "pk3" | "pk4" => Engine::Zip,
        other => Engine::Other(other.to_string()),
    }
}

fn parse_key(text: &str) -> Result<GameKey> {
    let Some(hex) = text.strip_prefix("hex:") else {
        return Ok(GameKey::Text(text.to_string()));
    };
    if hex.len() % 2 != 0 {
        bail!("hex key has an odd number of digits");
    }
    let digit = |b: u8| char::from(b).to_digit(16);
    let bytes = hex
        .as_bytes()
        .chunks(2)
        .map(|pair| Some((digit(pair[0])? << 4 | digit(pair[1])?) as u8))
        .collect::<Option<Vec<u8>>>()
        .context("Invalid hex key")?;
    Ok(GameKey::Bytes(bytes))
}

fn game_descriptor(args: &GameArgs, archive: &Path) -> Result<GameDescriptor> {
    if let Some(path) = &args.game_file {
        return GameDescriptor::from_json_file(path)
            .with_context(|| format!("Failed to load game descriptor {}", path.display()));
    }
    let engine = match &args.engine {
        Some(name) => Engine::from(name.as_str()),
        None => guess_engine(archive),
    };
    let id = args.game.clone().unwrap_or_else(|| engine.to_string());
    let mut game = GameDescriptor::new(id, engine);
    if let Some(key) = &args.key {
        game = game.with_key(parse_key(key)?);
    }
    debug!(game = %game.id, engine = %game.engine, "game descriptor");
    Ok(game)
}

/// File system root plus the archive's path relative to it.
fn locate(source: &Source) -> Result<(PathBuf, String)> {
    let root = match &source.root {
        Some(root) => root.clone(),
        None => source
            .archive
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    let relative = source.archive.strip_prefix(&root).unwrap_or(&source.archive);
    let relative = relative.to_string_lossy().replace('\\', "/");
    if relative.is_empty() {
        bail!("{} is not inside {}", source.archive.display(), root.display());
    }
    Ok((root, relative))
}

fn open_binary(args: &GameArgs, source: &Source, config: PakConfig) -> Result<BinaryPakFile> {
    let game = game_descriptor(args, &source.archive)?;
    let (root, path) = locate(source)?;
    let fs: Arc<dyn FileSystem> = Arc::new(DirectoryFileSystem::new(root));
    BinaryPakFile::open(Arc::new(game), fs, &path, config)
        .with_context(|| format!("Failed to open {}", source.archive.display()))
}

fn open_any(args: &GameArgs, source: &Source, config: PakConfig) -> Result<Box<dyn PakFile>> {
    if source.archive.is_dir() {
        let game = game_descriptor(args, &source.archive)?;
        let fs: Arc<dyn FileSystem> = Arc::new(DirectoryFileSystem::new(&source.archive));
        let name = source.archive.display().to_string();
        let many = ManyPakFile::open(&game, fs, &name).context("Failed to list directory")?;
        return Ok(Box::new(many));
    }
    Ok(Box::new(open_binary(args, source, config)?))
}

/// Glob when the pattern has wildcards, otherwise a substring test. Case-insensitive.
struct Filter(Option<FilterKind>);

enum FilterKind {
    Glob(Pattern),
    Substring(String),
}

impl Filter {
    fn new(pattern: Option<&str>) -> Result<Self> {
        let kind = match pattern {
            None => None,
            Some(p) if p.contains(['*', '?', '[']) => {
                Some(FilterKind::Glob(Pattern::new(p).context("Invalid filter pattern")?))
            }
            Some(p) => Some(FilterKind::Substring(p.to_lowercase())),
        };
        Ok(Self(kind))
    }

    fn matches(&self, path: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::default()
        };
        match &self.0 {
            None => true,
            Some(FilterKind::Glob(pattern)) => pattern.matches_with(path, options),
            Some(FilterKind::Substring(needle)) => path.to_lowercase().contains(needle),
        }
    }
}

fn describe_tag(tag: &EntryTag) -> String {
    match tag {
        EntryTag::None => String::new(),
        EntryTag::Resource { path, .. } => format!("-> {path}"),
        EntryTag::SubArchive(_) => "[archive]".to_string(),
        EntryTag::Vpk(location) => format!("{location:?}"),
        EntryTag::Zip { index } => format!("zip #{index}"),
        EntryTag::BspTexture => "miptex".to_string(),
    }
}

fn cmd_list(args: &GameArgs, source: &Source, filter: Option<&str>, detailed: bool, json: bool) -> Result<()> {
    let pak = open_any(args, source, PakConfig::default().unverified())?;
    let filter = Filter::new(filter)?;
    let entries: Vec<&FileEntry> = pak.files().filter(|e| filter.matches(&e.path)).collect();

    if json {
        let rows: Vec<_> = entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "path": e.path,
                    "offset": e.offset,
                    "file_size": e.file_size,
                    "packed_size": e.packed_size,
                    "compressed": e.compressed,
                    "id": e.id,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for entry in &entries {
        if detailed {
            println!(
                "{:>12} {:>12} {} {} {}",
                entry.packed_size,
                entry.file_size,
                if entry.compressed != 0 { "C" } else { " " },
                entry.path,
                describe_tag(&entry.tag)
            );
        } else {
            println!("{}", entry.path);
        }
    }

    println!("\nTotal: {} entries", entries.len());

    Ok(())
}

/// Join `entry` onto `output`, dropping anything that would escape it.
fn output_path(output: &Path, entry: &str) -> PathBuf {
    let mut path = output.to_path_buf();
    for component in Path::new(entry).components() {
        if let Component::Normal(part) = component {
            path.push(part);
        }
    }
    path
}

fn cmd_extract(args: &GameArgs, source: &Source, output: &Path, filter: Option<&str>) -> Result<()> {
    println!("Opening archive: {}", source.archive.display());

    let start = Instant::now();
    let pak = open_any(args, source, PakConfig::default())?;
    let filter = Filter::new(filter)?;
    let entries: Vec<&FileEntry> = pak.files().filter(|e| filter.matches(&e.path)).collect();

    println!("Loaded {} entries in {:?}", entries.len(), start.elapsed());

    let pb = ProgressBar::new(entries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    fs::create_dir_all(output)?;

    let start = Instant::now();
    let errors = AtomicUsize::new(0);
    entries.par_iter().try_for_each(|entry| -> Result<()> {
        match pak.load_bytes(&entry.path) {
            Ok(data) => {
                let path = output_path(output, &entry.path);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, data).with_context(|| format!("Failed to write {}", path.display()))?;
            }
            Err(e) => {
                warn!("{e}");
                pb.println(format!("Error: {e}"));
                errors.fetch_add(1, Ordering::Relaxed);
            }
        }
        pb.inc(1);
        Ok(())
    })?;

    pb.finish_with_message("Done");
    println!(
        "Extraction completed in {:?} ({} errors)",
        start.elapsed(),
        errors.load(Ordering::Relaxed)
    );

    Ok(())
}

fn cmd_info(args: &GameArgs, source: &Source, entry: &str, platform: Platform) -> Result<()> {
    let pak = open_any(args, source, PakConfig::default().with_platform(platform))?;
    let Some(file) = pak.get_entry(entry) else {
        bail!("{entry} not found in {}", pak.name());
    };
    println!("{}", file.path);
    println!("  offset:      {}", file.offset);
    println!("  size:        {} ({} stored)", file.file_size, file.packed_size);
    if let Some(hash) = file.hash {
        println!("  hash:        {hash:#x}");
    }

    let mut object = pak
        .load_object(entry)
        .with_context(|| format!("Failed to decode {entry}"))?;
    println!("  kind:        {}", object.kind());

    if let Some(texture) = object.as_texture_mut() {
        println!("  dimensions:  {}x{}", texture.width(), texture.height());
        println!("  mip maps:    {}", texture.mip_maps());
        let data = texture.begin(platform)?;
        println!("  format:      {:?} for {}", data.format.format, data.format.platform);
        println!("  bytes:       {}", data.bytes.len());
        texture.end();
    }
    match &object {
        PakObject::Model(model) => {
            println!("  model:       {} ({:?} v{})", model.name, model.flavor, model.version);
            println!(
                "  contents:    {} bones, {} sequences, {} textures, {} body parts",
                model.bones, model.sequences, model.textures, model.body_parts
            );
        }
        PakObject::Sprite(sprite) => println!("  frames:      {}", sprite.frame_count()),
        PakObject::Text(text) => println!("  lines:       {}", text.lines().count()),
        _ => {}
    }

    Ok(())
}

fn cmd_verify(args: &GameArgs, source: &Source) -> Result<()> {
    let start = Instant::now();
    // Signatures and tree checksums are checked while the catalog is built.
    let pak = open_binary(args, source, PakConfig::default())?;
    let chunks = pak.verify_chunks().context("Chunk verification failed")?;
    println!(
        "{}: {} entries, {} chunks verified in {:?}",
        pak.name(),
        pak.len(),
        chunks,
        start.elapsed()
    );

    let summary = pak.read_all(|_, _| {});
    println!("Payloads: {} ok, {} failed", summary.succeeded, summary.failed);
    if summary.failed > 0 {
        bail!("{} entries failed to resolve", summary.failed);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key() {
        assert!(matches!(parse_key("secret").unwrap(), GameKey::Text(ref s) if s == "secret"));
        assert!(matches!(parse_key("hex:0a0B").unwrap(), GameKey::Bytes(ref b) if b == &[0x0a, 0x0b]));
        assert!(parse_key("hex:abc").is_err());
        assert!(parse_key("hex:zz").is_err());
        assert!(parse_key("hex:+f").is_err());
        assert!(parse_key("hex:aé1x").is_err());
    }

    #[test]
    fn test_guess_engine() {
        assert_eq!(guess_engine(Path::new("hl2/pak01_dir.VPK")), Engine::Source);
        assert_eq!(guess_engine(Path::new("id1/pak0.pak")), Engine::Quake);
        assert_eq!(guess_engine(Path::new("baseq3/pak0.pk3")), Engine::Zip);
    }

    #[test]
    fn test_filter() {
        let glob = Filter::new(Some("maps/*.BSP")).unwrap();
        assert!(glob.matches("maps/e1m1.bsp"));
        assert!(!glob.matches("sound/a.wav"));

        let substring = Filter::new(Some("Sound")).unwrap();
        assert!(substring.matches("sound/a.wav"));
        assert!(Filter::new(None).unwrap().matches("anything"));
    }

    #[test]
    fn test_output_path_stays_inside() {
        let out = output_path(Path::new("out"), "../../etc/passwd");
        assert_eq!(out, Path::new("out/etc/passwd"));
        assert_eq!(output_path(Path::new("out"), "/maps/a.bsp"), Path::new("out/maps/a.bsp"));
    }

    #[test]
    fn test_locate_relative_to_root() {
        let source = Source {
            archive: PathBuf::from("games/void/data/level.index"),
            root: Some(PathBuf::from("games/void")),
        };
        let (root, path) = locate(&source).unwrap();
        assert_eq!(root, Path::new("games/void"));
        assert_eq!(path, "data/level.index");
    }
}

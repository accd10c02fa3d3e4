use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use attack_tree::attack::{IngestOptions, load_dataset};
use attack_tree::tree::TreeNode;
use attack_tree::{DataState, Frame, LayoutOptions};
use clap::Parser;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// STIX bundle, e.g. enterprise-attack.json
    dataset: PathBuf,

    /// JSON file with `nodeSpacing` / `levelSpacing`
    #[arg(long)]
    layout_config: Option<PathBuf>,

    #[arg(long)]
    node_spacing: Option<f32>,

    #[arg(long)]
    level_spacing: Option<f32>,

    /// Keep revoked and deprecated objects
    #[arg(long)]
    include_deprecated: bool,

    /// Expand every node before applying toggles
    #[arg(long)]
    expand_all: bool,

    /// Identity to toggle; repeatable, applied in order
    #[arg(long = "toggle", value_name = "IDENTITY")]
    toggles: Vec<String>,

    #[arg(long)]
    query: Option<String>,

    /// Print the N best fuzzy matches for --query instead of a frame
    #[arg(long, value_name = "N", requires = "query")]
    suggest: Option<usize>,

    /// Print an indented outline instead of JSON
    #[arg(long)]
    outline: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let options = layout_options(&args)?;
    let dataset = load_dataset(
        &args.dataset,
        IngestOptions {
            include_deprecated: args.include_deprecated,
        },
    )
    .with_context(|| format!("data unavailable: {}", args.dataset.display()))?;

    let mut state = DataState::load(dataset, options);
    let session = match &mut state {
        DataState::Ready(session) => session,
        DataState::Unavailable(message) => return Err(anyhow!("data unavailable: {message}")),
    };

    if let (Some(limit), Some(query)) = (args.suggest, args.query.as_deref()) {
        let suggestions = session.suggest(query, limit);
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        return Ok(());
    }

    let mut frame = session.snapshot();
    if args.expand_all {
        frame = session.expand_all();
    }
    for identity in &args.toggles {
        frame = session.toggle(identity);
    }
    if let Some(query) = &args.query {
        frame = session.set_query(query);
    }

    if args.outline {
        print_outline(session.tree(), &frame);
    } else {
        println!("{}", serde_json::to_string_pretty(&frame)?);
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn layout_options(args: &Args) -> Result<LayoutOptions> {
    let mut options = match &args.layout_config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read layout config {}", path.display()))?;
            serde_json::from_str::<LayoutOptions>(&raw)
                .with_context(|| format!("invalid layout config {}", path.display()))?
        }
        None => LayoutOptions::default(),
    };

    if let Some(node_spacing) = args.node_spacing {
        options.node_spacing = node_spacing;
    }
    if let Some(level_spacing) = args.level_spacing {
        options.level_spacing = level_spacing;
    }
    Ok(options.sanitized())
}

fn print_outline(tree: &TreeNode, frame: &Frame) {
    for node in tree.iter() {
        let Some(point) = frame.layout.get(node.identity()) else {
            continue;
        };
        let marker = if node.is_leaf() {
            ' '
        } else if node.children().iter().any(|child| frame.layout.contains(child.identity())) {
            '-'
        } else {
            '+'
        };
        let highlighted = if frame.highlights.contains_key(node.identity()) {
            " *"
        } else {
            ""
        };
        println!(
            "{indent}{marker} {label}{highlighted}  ({x:.1}, {y:.1})",
            indent = "  ".repeat(node.depth()),
            label = node.label(),
            x = point.x,
            y = point.y,
        );
    }
}

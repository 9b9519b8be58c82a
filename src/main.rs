use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use photorow::app::GalleryContext;
use photorow::config::GalleryConfig;
use photorow::data::FsDataSource;
use photorow::image_loader::FsImageLoader;
use photorow::layout::{ResizeDebouncer, ResizeWatcher, ResponsiveController};
use photorow::metadata::MetadataResolver;
use photorow::models::{GalleryDocument, SYNTHESIZED_GALLERY_KEY};
use photorow::scanner::FileScanner;
use photorow::ui::{
    compose_caption, Direction, GalleryRenderer, KeyOutcome, MediaModal, ModalKey,
    ModalSession, SharedModal, TextSurface, TriggerElement,
};

#[derive(Parser)]
#[command(name = "photorow", version, about = "Responsive photo gallery layout")]
struct Cli {
    /// Config file (defaults to the per-user config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the rows of a gallery at a viewport width
    Layout {
        /// Directory holding the documents and images
        #[arg(long)]
        root: PathBuf,
        /// Gallery document, relative to the root
        #[arg(long)]
        gallery_doc: Option<String>,
        /// Gallery key (defaults to the document's default gallery)
        #[arg(long)]
        gallery: Option<String>,
        #[arg(long, default_value_t = 1280.0)]
        width: f32,
    },
    /// Print the caption resolved for one image path
    Caption {
        #[arg(long)]
        root: PathBuf,
        /// Metadata document, relative to the root
        #[arg(long)]
        metadata_doc: Option<String>,
        image: String,
    },
    /// Drive the viewer with commands read from stdin
    ///
    /// Commands: open <n>, next, prev, key <name>, close, switch <gallery>,
    /// resize <width>
    Browse {
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        gallery: Option<String>,
        #[arg(long, default_value_t = 1280.0)]
        width: f32,
    },
}

fn load_config(path: Option<&Path>) -> Result<GalleryConfig> {
    let mut config = match path {
        Some(path) => GalleryConfig::load(path)
            .with_context(|| format!("Failed to load config: {:?}", path))?,
        None => GalleryConfig::load_default().context("Failed to load user config")?,
    };
    config.apply_env_overrides();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn image_loader(root: &Path, config: &GalleryConfig) -> FsImageLoader {
    FsImageLoader::new(root, config.base_prefix.clone(), config.image_cache_entries)
        .with_preference(config.format_preference())
}

/// Renders the requested gallery, or whatever images sit in `root` when the
/// gallery document is unavailable.
async fn mount_gallery(
    ctx: &GalleryContext<FsDataSource>,
    root: &Path,
    key: Option<&str>,
    renderer: &mut GalleryRenderer,
    surface: &mut TextSurface,
) -> Result<Option<GalleryDocument>> {
    match ctx.load_document().await {
        Ok(document) => {
            let gallery = GalleryContext::<FsDataSource>::select_gallery(&document, key)
                .context("Gallery document has no galleries")?;
            renderer.render_initial(gallery, surface)?;
            Ok(Some(document))
        }
        Err(e) => {
            let items = match FileScanner::new()
                .scan_gallery(root, SYNTHESIZED_GALLERY_KEY)
                .await
            {
                Ok(gallery) => gallery.items,
                Err(scan_err) => {
                    warn!("Fallback scan failed: {:#}", scan_err);
                    Vec::new()
                }
            };
            *surface = std::mem::take(surface).with_existing_items(items);
            renderer.recover_from_load_error(&e, surface);
            Ok(None)
        }
    }
}

async fn run_layout(
    mut config: GalleryConfig,
    root: PathBuf,
    gallery_doc: Option<String>,
    gallery: Option<String>,
    width: f32,
) -> Result<()> {
    if let Some(doc) = gallery_doc {
        config.gallery_document = doc;
    }
    let (class, limits) = ResponsiveController::new(config.breakpoint_table()?).limits_for(width);
    let probe = image_loader(&root, &config);
    let ctx = GalleryContext::new(config, FsDataSource::new(&root));
    let mut renderer = ctx.build_renderer(limits).with_probe(Box::new(probe));
    let mut surface = TextSurface::new();

    mount_gallery(&ctx, &root, gallery.as_deref(), &mut renderer, &mut surface).await?;

    println!(
        "{:?} viewport ({}px): up to {} landscape / {} portrait per row, at least {}",
        class, width, limits.landscape_max, limits.portrait_max, limits.min_images
    );
    print!("{}", surface.render_text());
    Ok(())
}

async fn run_caption(
    mut config: GalleryConfig,
    root: PathBuf,
    metadata_doc: Option<String>,
    image: String,
) -> Result<()> {
    if let Some(doc) = metadata_doc {
        config.metadata_document = doc;
    }
    let resolver = MetadataResolver::new(config.base_prefix.clone());
    let ctx = GalleryContext::new(config, FsDataSource::new(&root));
    let index = ctx.load_metadata().await;

    let caption = compose_caption(None, &resolver.resolve(&image, &index));
    if caption.is_empty() {
        println!("No metadata for {image}");
    } else {
        println!("{caption}");
    }
    Ok(())
}

fn print_modal(modal: &MediaModal) {
    let Some(shown) = modal.displayed() else {
        println!("modal closed");
        return;
    };
    let index = modal
        .current_index()
        .map_or_else(|| "-".to_string(), |i| i.to_string());
    println!(
        "[{index}] {}",
        shown.source.as_deref().unwrap_or("(no source)")
    );
    if let Some((w, h)) = shown.dimensions {
        println!("  {w}x{h}");
    }
    if let Some(warning) = &shown.warning {
        println!("  warning: {warning}");
    }
    if let Some(caption) = shown.caption.as_ref().filter(|c| !c.is_empty()) {
        println!("  {}", caption.to_string().replace('\n', "\n  "));
    }
}

async fn browse_command(
    command: &str,
    session: &mut ModalSession<FsImageLoader>,
    renderer: &mut GalleryRenderer,
    surface: &mut TextSurface,
    document: Option<&GalleryDocument>,
) -> Result<()> {
    let (verb, arg) = command
        .split_once(' ')
        .map_or((command, ""), |(v, a)| (v, a.trim()));
    match verb {
        "open" => {
            let item = arg
                .parse::<usize>()
                .ok()
                .and_then(|n| renderer.gallery().and_then(|g| g.items.get(n).cloned()));
            match item {
                Some(item) => {
                    session.open(&TriggerElement::from_item(&item));
                }
                None => warn!(arg, "No such photo"),
            }
        }
        "next" => {
            session.navigate(Direction::Next);
        }
        "prev" => {
            session.navigate(Direction::Prev);
        }
        "key" => match session.key(ModalKey::from_name(arg, false), None) {
            KeyOutcome::Closed { restore_focus } => {
                println!("focus -> {}", restore_focus.map_or_else(String::new, |id| id.0));
            }
            KeyOutcome::Focus(id) => println!("focus -> {id}"),
            KeyOutcome::Navigated(_) | KeyOutcome::Ignored => {}
        },
        "close" => {
            if let Some(id) = session.close() {
                println!("focus -> {id}");
            }
        }
        "switch" => match document.and_then(|d| d.get(arg)) {
            Some(gallery) => {
                renderer.switch_gallery(gallery, surface).await?;
                print!("{}", surface.render_text());
            }
            None => warn!(gallery = arg, "Unknown gallery"),
        },
        "" => {}
        other => warn!(command = other, "Unknown command"),
    }

    session.settle_all().await;
    print_modal(&session.modal().borrow());
    Ok(())
}

async fn run_browse(
    config: GalleryConfig,
    root: PathBuf,
    gallery: Option<String>,
    width: f32,
) -> Result<()> {
    let mut controller = ResponsiveController::new(config.breakpoint_table()?);
    let limits = controller.evaluate(width).unwrap_or_default();
    let probe = image_loader(&root, &config);
    let loader = Arc::new(image_loader(&root, &config));
    let debounce = config.resize_debounce();
    let ctx = GalleryContext::new(config, FsDataSource::new(&root));

    let mut renderer = ctx.build_renderer(limits).with_probe(Box::new(probe));
    let modal = Rc::new(SharedModal::new(ctx.build_modal()?));
    renderer.add_observer(modal.clone());

    let mut surface = TextSurface::new();
    let document =
        mount_gallery(&ctx, &root, gallery.as_deref(), &mut renderer, &mut surface).await?;
    modal.borrow_mut().set_metadata(ctx.load_metadata().await);
    print!("{}", surface.render_text());

    let mut session = ModalSession::new(Rc::clone(&modal), loader);

    let (resize_tx, debouncer) = ResizeDebouncer::channel(debounce);
    let mut resize_tx = Some(resize_tx);
    let mut watcher = ResizeWatcher::new(debouncer, controller);
    let (limits_tx, limits_rx) = flume::unbounded();
    tokio::spawn(async move {
        while let Some(limits) = watcher.next_change().await {
            if limits_tx.send(limits).is_err() {
                break;
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line.context("Failed to read stdin")? {
                    Some(line) => {
                        let command = line.trim();
                        if let Some(width) = command.strip_prefix("resize ") {
                            match (width.trim().parse::<f32>(), resize_tx.as_ref()) {
                                (Ok(width), Some(tx)) => {
                                    let _ = tx.send(width);
                                }
                                _ => warn!(command, "Bad resize command"),
                            }
                        } else {
                            browse_command(
                                command,
                                &mut session,
                                &mut renderer,
                                &mut surface,
                                document.as_ref(),
                            )
                            .await?;
                        }
                    }
                    None => {
                        stdin_open = false;
                        resize_tx = None;
                    }
                }
            }
            limits = limits_rx.recv_async() => match limits {
                Ok(limits) => {
                    if renderer.relayout(limits, &mut surface).is_some() {
                        print!("{}", surface.render_text());
                    }
                }
                Err(_) => break,
            },
        }
    }

    modal.borrow_mut().teardown();
    ctx.dispose();
    info!("Browse session finished");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("photorow=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Layout {
            root,
            gallery_doc,
            gallery,
            width,
        } => run_layout(config, root, gallery_doc, gallery, width).await,
        Command::Caption {
            root,
            metadata_doc,
            image,
        } => run_caption(config, root, metadata_doc, image).await,
        Command::Browse {
            root,
            gallery,
            width,
        } => run_browse(config, root, gallery, width).await,
    }
}

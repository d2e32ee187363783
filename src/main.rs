//! refselect CLI entry point

use anyhow::{Context, Result};
use refselect::catalog::CatalogIndex;
use refselect::config::cli::{self, Cli, Command, SessionAction};
use refselect::config::Config;
use refselect::coordinate::{Coordinator, ProductStatus};
use refselect::export;
use refselect::session::Session;
use refselect::store::{RecordStore, SelectedImage, SelectionRecord};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::resolve(&cli)?;

    // Unreadable catalog at startup is the one fatal condition: abort with
    // a diagnostic instead of presenting an empty catalog.
    let catalog = CatalogIndex::scan(&config.source_dir)
        .with_context(|| format!("cannot read catalog at {}", config.source_dir.display()))?;
    if catalog.is_empty() {
        anyhow::bail!(
            "no product folders found under {}",
            config.source_dir.display()
        );
    }

    let store = RecordStore::new(&config.output_dir);
    let mut coordinator = Coordinator::new(&catalog, &store);
    if let Some(window) = config.freshness_window {
        coordinator = coordinator.with_freshness_window(window);
    }

    match &cli.command {
        Command::Status => run_status(&catalog, &coordinator),
        Command::Next => run_next(&coordinator),
        Command::Show { product } => run_show(&catalog, &store, product),
        Command::Save {
            product,
            selections,
        } => run_save(&config, &catalog, &store, product, selections, false),
        Command::Finalize {
            product,
            selections,
        } => run_save(&config, &catalog, &store, product, selections, true),
        Command::Session { action } => run_session(&config, &catalog, &coordinator, &store, action),
        Command::Export { dest } => {
            let summary = export::assemble(&catalog, &store, dest)?;
            println!(
                "Exported {} product(s), {} image(s) to {}",
                summary.products,
                summary.images,
                dest.display()
            );
            Ok(())
        }
    }
}

fn run_status(catalog: &CatalogIndex, coordinator: &Coordinator<'_>) -> Result<()> {
    let statuses = coordinator.statuses()?;

    let mut completed = 0;
    let mut in_progress = 0;
    for (index, (status, product)) in statuses.iter().enumerate() {
        match status {
            ProductStatus::Completed => completed += 1,
            ProductStatus::InProgress => in_progress += 1,
            ProductStatus::Untouched => {}
        }
        println!("{:>5}  {:<12} {}", index, status.to_string(), product.id);
    }

    println!();
    println!(
        "{} products: {} completed, {} in progress, {} untouched",
        catalog.len(),
        completed,
        in_progress,
        catalog.len() - completed - in_progress
    );
    Ok(())
}

fn run_next(coordinator: &Coordinator<'_>) -> Result<()> {
    match coordinator.next_workable()? {
        Some((index, product)) => println!("{:>5}  {}", index, product.id),
        None => println!("No workable products: everything is completed or in progress"),
    }
    Ok(())
}

fn run_show(catalog: &CatalogIndex, store: &RecordStore, product_id: &str) -> Result<()> {
    let images = catalog.images(product_id)?;
    let record = store.load(product_id)?;

    println!("{} ({} candidate images)", product_id, images.len());
    for image in &images {
        let tag = record
            .as_ref()
            .and_then(|r| {
                r.selected_images
                    .iter()
                    .find(|s| s.original_file == image.file_name)
            })
            .map(|s| format!("  [selected: {}]", s.color))
            .unwrap_or_default();
        println!("  {}{}", image.file_name, tag);
    }

    match record {
        Some(record) => println!(
            "\nStatus: {} (last saved by {} at {})",
            if record.completed {
                "completed"
            } else {
                "in_progress"
            },
            record.annotator,
            record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => println!("\nStatus: untouched"),
    }
    Ok(())
}

fn run_save(
    config: &Config,
    catalog: &CatalogIndex,
    store: &RecordStore,
    product_id: &str,
    selection_args: &[String],
    finalize: bool,
) -> Result<()> {
    let annotator = config.require_annotator()?;

    // Validate everything before touching the store so a rejected save
    // leaves no trace.
    let images = catalog.images(product_id)?;
    let mut selected = Vec::with_capacity(selection_args.len());
    for arg in selection_args {
        let (file, color) = cli::parse_selection(arg);
        if !images.iter().any(|i| i.file_name == file) {
            return Err(refselect::SelectError::NotFound(format!(
                "{}/{}",
                product_id, file
            ))
            .into());
        }
        if let Some(color) = &color {
            config.validate_color(color)?;
        }
        selected.push(SelectedImage::new(file, color));
    }

    if finalize {
        // Assign the rank-and-tag encoded names the export will use
        for (rank, selection) in selected.iter_mut().enumerate() {
            let ext = selection
                .original_file
                .rsplit_once('.')
                .map(|(_, e)| e)
                .unwrap_or("");
            selection.saved_file = Some(export::export_file_name(rank + 1, &selection.color, ext));
        }
    }

    let mut record = SelectionRecord::new(product_id, annotator);
    record.selected_images = selected;
    record.completed = finalize;

    store
        .save(&mut record)
        .context("save failed; your selections were NOT persisted")?;

    println!(
        "Saved {} image(s) for {}{}",
        record.selected_images.len(),
        product_id,
        if finalize { " (completed)" } else { "" }
    );
    Ok(())
}

fn run_session(
    config: &Config,
    catalog: &CatalogIndex,
    coordinator: &Coordinator<'_>,
    store: &RecordStore,
    action: &SessionAction,
) -> Result<()> {
    let annotator = config.require_annotator()?;
    let mut session = Session::start(annotator, catalog, coordinator, store.output_root())?;

    let cursor = match action {
        SessionAction::Next => session.next(),
        SessionAction::Prev => session.previous(),
        SessionAction::Jump { index } => session.jump_to(*index)?,
        SessionAction::Where => session.cursor(),
    };

    let product = &catalog.products()[cursor];
    println!(
        "{} @ {:>5}  {}  ({} of {})",
        session.annotator(),
        cursor,
        product.id,
        cursor + 1,
        catalog.len()
    );
    Ok(())
}

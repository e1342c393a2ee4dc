// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use poi_taxonomy::config::{Args, Command};
use poi_taxonomy::{
    logging, Classification, EditSession, PoiType, SelectionMode, SelectionScope,
    SharedTaxonomy, Taxonomy,
};

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level);

    let taxonomy = args.load_taxonomy()?;
    tracing::info!(
        categories = taxonomy.categories().len(),
        types = taxonomy.type_count(),
        "taxonomy loaded"
    );

    match args.command() {
        Command::Browse { json } => run_browse(&taxonomy, json)?,
        Command::Select {
            mode,
            category,
            types,
            current,
        } => {
            let session = edit_session(&taxonomy, category, current)?;
            let scope = selection_scope(taxonomy, &types)?;
            run_select(mode, scope, session)?;
        }
    }

    Ok(())
}

fn run_browse(taxonomy: &Taxonomy, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(taxonomy)?);
        return Ok(());
    }

    println!("🗂️  POI taxonomy");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for category in taxonomy.categories() {
        println!(
            "\n{} {} ({}) | {} types",
            category.icon().unwrap_or("•"),
            category.display_name(),
            category.key(),
            category.type_count()
        );

        if category.is_empty() {
            println!("   (no filters)");
            continue;
        }

        for filter in category.filters() {
            println!("   ├─ {} ({})", filter.display_name(), filter.key());
            for poi_type in filter.types() {
                let tag = poi_type.tag().map(|t| t.to_string()).unwrap_or_default();
                let lock = if poi_type.is_editable() { "" } else { " 🔒" };
                println!("   │    • {:<20} {}{}", poi_type.display_name(), tag, lock);
            }
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ {} categories, {} POI types", taxonomy.categories().len(), taxonomy.type_count());

    Ok(())
}

/// Provider standing in for the feature being edited
fn edit_session(taxonomy: &Taxonomy, category: Option<String>, current: Option<String>) -> Result<EditSession> {
    let mut session = EditSession::new();

    if let Some(key) = current {
        let location = taxonomy
            .find_type(&key)
            .with_context(|| format!("Unknown current POI type `{}`", key))?;
        session = session.with_current(Some(location.category.key().to_string()), Arc::clone(location.poi_type));
    }

    if let Some(key) = category {
        session = session.in_category(key);
    }

    Ok(session)
}

fn selection_scope(taxonomy: Taxonomy, type_keys: &[String]) -> Result<SelectionScope> {
    if type_keys.is_empty() {
        return Ok(SelectionScope::Taxonomy(SharedTaxonomy::new(taxonomy)));
    }

    let types = type_keys
        .iter()
        .map(|key| {
            taxonomy
                .find_type(key)
                .map(|location| Arc::clone(location.poi_type))
                .with_context(|| format!("Unknown POI type `{}`", key))
        })
        .collect::<Result<Vec<Arc<PoiType>>>>()?;

    Ok(SelectionScope::Types(types))
}

#[cfg(feature = "tui")]
fn run_select(mode: SelectionMode, scope: SelectionScope, session: EditSession) -> Result<()> {
    use poi_taxonomy::{SelectionController, SelectionOutcome};

    let controller = SelectionController::init_with_type(mode, scope, session)?;
    let mut app = ui::App::new(controller);
    ui::run_ui(&mut app)?;

    let controller = app.into_controller();
    match controller.outcome().cloned() {
        Some(SelectionOutcome::Selected(selection)) => {
            println!("✅ Selected {}", selection.poi_type.display_name());
            if let Some(tag) = selection.poi_type.tag() {
                println!("   Tag:      {}", tag);
            }
            if let Some(category) = &selection.category {
                println!("   Category: {}", category);
            }
            if let Some(filter) = &selection.filter {
                println!("   Filter:   {}", filter);
            }

            let session = controller.into_provider();
            println!("\n🏷️  Feature tags:");
            for (key, value) in session.tags() {
                println!("   {}={}", key, value);
            }
        }
        _ => println!("❌ Selection cancelled"),
    }

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_select(_mode: SelectionMode, _scope: SelectionScope, _session: EditSession) -> Result<()> {
    eprintln!("❌ Interactive selection not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or print the taxonomy: poi-taxonomy browse");
    std::process::exit(1);
}

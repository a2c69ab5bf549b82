//! Sheetwright - Command line entry point.
//!
//! Usage:
//!   sheetwright validate <layout.json>
//!   sheetwright render <layout.json> [props.json] [--template]
//!   sheetwright import <entity-id> <layout.json>
//!   sheetwright types

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use sheetwright_domain::components::render::{ElementBody, RenderedElement};
use sheetwright_domain::{
    ComponentTree, EntityId, EntityKind, PropertyBag, SheetEntity, Viewer,
};
use sheetwright_engine::infrastructure::settings::SheetwrightSettings;
use sheetwright_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the binary is usually run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sheetwright_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = SheetwrightSettings::from_env();
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("validate") => {
            let path = arg_path(&args, 1, "validate <layout.json>")?;
            validate(&settings, &path)
        }
        Some("render") => {
            let path = arg_path(&args, 1, "render <layout.json> [props.json] [--template]")?;
            let as_template = args.iter().any(|a| a == "--template");
            let props = args
                .iter()
                .skip(2)
                .find(|a| !a.starts_with("--"))
                .map(PathBuf::from);
            render(&settings, &path, props.as_deref(), as_template)
        }
        Some("import") => {
            let Some(raw_id) = args.get(1) else {
                bail!("usage: sheetwright import <entity-id> <layout.json>");
            };
            let entity_id = Uuid::parse_str(raw_id)
                .map(EntityId::from)
                .with_context(|| format!("'{}' is not an entity id", raw_id))?;
            let path = arg_path(&args, 2, "import <entity-id> <layout.json>")?;
            import(settings, entity_id, &path).await
        }
        Some("types") => {
            let app = App::from_settings(settings).await?;
            for (technical, pretty) in app.factory.list_with_pretty_names() {
                println!("{:<12} {}", technical, pretty);
            }
            Ok(())
        }
        Some(other) => bail!("unknown command '{}'", other),
        None => bail!("usage: sheetwright <validate|render|import|types> ..."),
    }
}

fn arg_path(args: &[String], index: usize, usage: &str) -> anyhow::Result<PathBuf> {
    match args.get(index) {
        Some(path) => Ok(PathBuf::from(path)),
        None => bail!("usage: sheetwright {}", usage),
    }
}

fn read_tree(settings: &SheetwrightSettings, path: &Path) -> anyhow::Result<ComponentTree> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let factory = sheetwright_domain::ComponentFactory::new()
        .with_unknown_policy(settings.unknown_components);
    let tree = ComponentTree::from_json_str(&json, &factory)
        .with_context(|| format!("Invalid layout in {}", path.display()))?;
    Ok(tree.with_root_address(settings.root_address.clone()))
}

fn validate(settings: &SheetwrightSettings, path: &Path) -> anyhow::Result<()> {
    let tree = read_tree(settings, path)?;
    let keys = tree.all_keys();

    let mut seen = std::collections::HashSet::new();
    let duplicates: Vec<&String> = keys.iter().filter(|k| !seen.insert(*k)).collect();
    if !duplicates.is_empty() {
        bail!("duplicate keys: {:?}", duplicates);
    }

    println!(
        "{}: {} components, {} keys",
        path.display(),
        tree.node_count(),
        keys.len()
    );
    Ok(())
}

fn render(
    settings: &SheetwrightSettings,
    path: &Path,
    props: Option<&Path>,
    as_template: bool,
) -> anyhow::Result<()> {
    let tree = read_tree(settings, path)?;

    let props: PropertyBag = match props {
        Some(props) => {
            let json = std::fs::read_to_string(props)
                .with_context(|| format!("Failed to read {}", props.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("Invalid property bag in {}", props.display()))?
        }
        None => PropertyBag::new(),
    };
    let kind = if as_template {
        EntityKind::Template
    } else {
        EntityKind::Actor
    };
    let entity = SheetEntity::new(kind, "cli").with_props(props);

    let evaluator = sheetwright_domain::PhraseEvaluator::new();
    let ctx = sheetwright_domain::RenderContext::new(&entity, Viewer::default(), &evaluator);
    let output = tree.render(&ctx);

    for warning in &output.warnings {
        tracing::warn!(source = %warning.source, error = %warning.error, "Formula failed");
    }
    match &output.element {
        Some(element) => print_element(element, 0),
        None => println!("(hidden)"),
    }
    Ok(())
}

async fn import(
    settings: SheetwrightSettings,
    entity_id: EntityId,
    path: &Path,
) -> anyhow::Result<()> {
    // Parse before touching the store so a bad file never overwrites a layout.
    let tree = read_tree(&settings, path)?;
    let app = App::from_settings(settings).await?;

    let stored = app
        .layouts
        .save(entity_id, &tree.to_value()?)
        .await
        .context("Failed to store layout")?;

    tracing::info!(
        entity_id = %entity_id,
        components = tree.node_count(),
        saved_at = %stored.saved_at,
        "Imported layout"
    );
    Ok(())
}

fn print_element(element: &RenderedElement, depth: usize) {
    let indent = "  ".repeat(depth);
    let key = element.key.as_deref().unwrap_or("-");
    match &element.body {
        ElementBody::Label { text, .. } => println!("{}label[{}] {}", indent, key, text),
        ElementBody::Field {
            input,
            value,
            editable,
        } => println!(
            "{}{}[{}] = {}{}",
            indent,
            input.technical_name(),
            key,
            value,
            if *editable { "" } else { " (read-only)" }
        ),
        ElementBody::Panel { children } => {
            println!("{}panel[{}]", indent, key);
            for child in children {
                print_element(child, depth + 1);
            }
        }
        ElementBody::Table { rows } => {
            println!("{}table[{}]", indent, key);
            for (r, row) in rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    println!("{}  ({},{}) {:?}", indent, r, c, cell.alignment);
                    if let Some(content) = &cell.content {
                        print_element(content, depth + 2);
                    }
                }
            }
        }
        ElementBody::AddComponent {
            row_num, col_num, ..
        } => match (row_num, col_num) {
            (Some(r), Some(c)) => println!("{}+ add at ({},{})", indent, r, c),
            _ => println!("{}+ add", indent),
        },
    }
}

/// Load `.env.local` then `.env` from the workspace root, if present.
fn load_dotenv_from_repo_root() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    for name in [".env.local", ".env"] {
        let _ = dotenvy::from_path(root.join(name));
    }
}

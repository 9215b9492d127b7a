use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, info_span};

use trellis_cli::expr::{parse_filter, parse_sort};
use trellis_cli::input::{apply_panel_base, read_metas, read_records_file};
use trellis_codec::{
    EncodeOptions, PANELS_DIR, PanelExtensions, display_dir, encode, write_display,
    write_display_list,
};
use trellis_ingest::{LoadedDisplay, ViewStore, app_root, load, load_named};
use trellis_model::DisplaySchema;
use trellis_query::{QueryEngine, QueryOptions};

use crate::cli::{BuildArgs, DisplayArgs, QueryArgs, StateArgs, ViewsAction};
use crate::summary::{print_build, print_inspect, print_page, print_views};

pub fn run_build(args: &BuildArgs) -> Result<()> {
    let span = info_span!("build", display = %args.name);
    let _guard = span.enter();

    let mut metas = read_metas(&args.metas)?;
    if let Some(base) = &args.panel_base {
        apply_panel_base(&mut metas, base);
    }
    let records = read_records_file(&args.data, &metas)?;
    let schema = DisplaySchema::new(&args.name, metas).with_description(&args.description);

    let dir = display_dir(&args.out, &args.name);
    let mut options = EncodeOptions::default();
    if args.strict {
        options = options.strict();
    }
    if let Some(panels) = &args.panels {
        let extensions = PanelExtensions::scan(panels)
            .with_context(|| format!("scan panels in {}", panels.display()))?;
        info!(panels = extensions.len(), "found rendered panels");
        options = options.with_panel_extensions(extensions);
        copy_panels(panels, &dir.join(PANELS_DIR))?;
    }

    let encoded = encode(&schema, &records, &options).context("encode display")?;
    write_display(&dir, &encoded).with_context(|| format!("write {}", dir.display()))?;
    let listing = write_display_list(&args.out).context("update display list")?;
    print_build(&encoded, &dir, listing.len());
    Ok(())
}

fn copy_panels(from: &Path, to: &Path) -> Result<()> {
    if from == to {
        return Ok(());
    }
    fs::create_dir_all(to).with_context(|| format!("create {}", to.display()))?;
    let entries = fs::read_dir(from).with_context(|| format!("read {}", from.display()))?;
    let mut copied = 0usize;
    for entry in entries {
        let path = entry
            .with_context(|| format!("read {}", from.display()))?
            .path();
        let Some(name) = path.file_name() else {
            continue;
        };
        if path.is_file() {
            fs::copy(&path, to.join(name))
                .with_context(|| format!("copy {}", path.display()))?;
            copied += 1;
        }
    }
    debug!(copied, dir = %to.display(), "copied panel files");
    Ok(())
}

pub fn run_inspect(args: &DisplayArgs) -> Result<()> {
    let loaded = open_display(args)?;
    print_inspect(&loaded);
    Ok(())
}

pub fn run_query(args: &QueryArgs) -> Result<()> {
    let loaded = open_display(&args.target)?;
    let view = match &args.view {
        Some(name) => Some(
            ViewStore::from_loaded(&loaded)
                .find(name)
                .ok_or_else(|| anyhow!("display has no view named '{name}'"))?,
        ),
        None => None,
    };

    let LoadedDisplay { display, .. } = loaded;
    let mut engine = QueryEngine::from_schema(&display.schema, display.records, QueryOptions::default());
    if let Some(view) = &view {
        engine.load_view(view);
    }
    apply_state(&mut engine, &args.state)?;
    if let Some(search) = &args.search {
        engine.set_search(search.as_str());
    }
    engine.set_page(args.page);
    print_page(&engine.current_page());
    Ok(())
}

pub fn run_views(action: &ViewsAction) -> Result<()> {
    match action {
        ViewsAction::List(target) => {
            let loaded = open_display(target)?;
            print_views(&ViewStore::from_loaded(&loaded).get_all());
        }
        ViewsAction::Save {
            name,
            target,
            state,
        } => {
            let loaded = open_display(target)?;
            let mut engine = QueryEngine::from_schema(
                loaded.schema(),
                Vec::new(),
                QueryOptions::default(),
            );
            apply_state(&mut engine, state)?;
            let mut store = ViewStore::from_loaded(&loaded);
            store
                .save(engine.save_view(name.as_str()))
                .with_context(|| format!("save view '{name}'"))?;
            println!("Saved view '{name}' to {}", store.path().display());
        }
        ViewsAction::Delete { index, target } => {
            let loaded = open_display(target)?;
            let mut store = ViewStore::from_loaded(&loaded);
            let deleted = store
                .delete(*index)
                .with_context(|| format!("delete view {index}"))?;
            if deleted {
                println!("Deleted view {index}");
            } else {
                println!("No view at position {index} ({} views)", store.len());
            }
        }
    }
    Ok(())
}

fn open_display(target: &DisplayArgs) -> Result<LoadedDisplay> {
    let root: PathBuf = app_root(target.root.clone());
    let loaded = match &target.display {
        Some(name) => load_named(&root, name),
        None => load(&root),
    }
    .with_context(|| format!("load display from {}", root.display()))?;
    Ok(loaded)
}

/// Apply state flags on top of whatever state the engine holds. Sort flags are
/// given in priority order, so they are pushed last-first.
fn apply_state(engine: &mut QueryEngine, state: &StateArgs) -> Result<()> {
    for expr in &state.filters {
        let entry = parse_filter(expr, engine.metas())
            .with_context(|| format!("invalid --filter '{expr}'"))?;
        engine.set_filter(entry.varname, entry.spec);
    }
    for expr in state.sorts.iter().rev() {
        let key =
            parse_sort(expr, engine.metas()).with_context(|| format!("invalid --sort '{expr}'"))?;
        engine.set_sort(key.varname, key.dir);
    }
    if state.ncol.is_some() || state.nrow.is_some() {
        engine.set_layout(state.ncol, state.nrow, None);
    }
    if let Some(labels) = &state.labels {
        engine.set_labels(labels.iter().map(String::as_str));
    }
    Ok(())
}

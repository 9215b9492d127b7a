use std::path::Path;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use trellis_codec::{EncodedDisplay, PartialDecodeWarning};
use trellis_ingest::LoadedDisplay;
use trellis_model::{FilterSpec, MetaDescriptor, PanelLocation, Record, View};
use trellis_query::{GridPresenter, PageView, format_value};

/// Maximum number of decode warnings listed by `inspect`.
const MAX_WARNINGS_SHOWN: usize = 20;

/// Renders a page as one table row per panel.
pub struct TablePresenter;

impl GridPresenter for TablePresenter {
    type Output = Table;

    fn present(&mut self, page: &PageView<'_>) -> Table {
        let columns = label_metas(page);
        let mut table = Table::new();
        let mut header = vec![header_cell("panelKey")];
        header.extend(columns.iter().map(|meta| header_cell(meta.display_label())));
        header.push(header_cell("Panel"));
        table.set_header(header);
        apply_table_style(&mut table);

        for record in &page.records {
            let mut row = vec![Cell::new(&record.panel_key).fg(Color::Blue)];
            row.extend(columns.iter().map(|meta| {
                let text = format_value(meta, record.get(&meta.varname));
                if text.is_empty() {
                    dim_cell("-")
                } else {
                    Cell::new(text)
                }
            }));
            row.push(panel_cell(record));
            table.add_row(row);
        }
        for (idx, meta) in columns.iter().enumerate() {
            if meta.meta_type().is_numeric() {
                align_column(&mut table, idx + 1, CellAlignment::Right);
            }
        }
        table
    }
}

/// Metas shown for a page: the labels in order, or every non-panel meta when
/// no labels are set.
fn label_metas<'a>(page: &PageView<'a>) -> Vec<&'a MetaDescriptor> {
    if page.labels.is_empty() {
        return page.metas.iter().filter(|meta| !meta.is_panel()).collect();
    }
    page.labels
        .iter()
        .filter_map(|label| page.metas.iter().find(|meta| &meta.varname == label))
        .filter(|meta| !meta.is_panel())
        .collect()
}

pub fn print_page(page: &PageView<'_>) {
    if page.records.is_empty() {
        println!("No panels match ({} total after filtering).", page.total);
        return;
    }
    let table = TablePresenter.present(page);
    println!("{table}");
    println!(
        "Page {} of {} ({} panels, {}x{} grid)",
        page.layout.page, page.total_pages, page.total, page.layout.ncol, page.layout.nrow
    );
}

pub fn print_build(encoded: &EncodedDisplay, dir: &Path, display_count: usize) {
    let artifact = &encoded.artifact;
    println!("Display: {}", artifact.name);
    println!("Output: {}", dir.display());
    println!("Panels: {}", artifact.n);
    println!("Keysig: {}", artifact.keysig);
    println!("Displays in app: {display_count}");
}

pub fn print_inspect(loaded: &LoadedDisplay) {
    let schema = loaded.schema();
    println!("Display: {}", schema.name);
    if !schema.description.is_empty() {
        println!("Description: {}", schema.description);
    }
    println!("Path: {}", loaded.path.display());
    println!("Panels: {}", loaded.records().len());
    println!("Keysig: {}", loaded.display.keysig);

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Variable"),
        header_cell("Type"),
        header_cell("Label"),
        header_cell("Group"),
        header_cell("Levels"),
    ]);
    apply_table_style(&mut table);
    for meta in &schema.metas {
        let levels = meta
            .levels()
            .map_or_else(|| dim_cell("-"), |levels| Cell::new(levels.len()));
        table.add_row(vec![
            Cell::new(&meta.varname).fg(Color::Blue),
            Cell::new(meta.meta_type()),
            Cell::new(meta.display_label()),
            meta.group.as_deref().map_or_else(|| dim_cell("-"), Cell::new),
            levels,
        ]);
    }
    align_column(&mut table, 4, CellAlignment::Right);
    println!("{table}");
    print_warnings(&loaded.display.warnings);
}

fn print_warnings(warnings: &[PartialDecodeWarning]) {
    if warnings.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Panel"),
        header_cell("Variable"),
        header_cell("Warning"),
    ]);
    apply_table_style(&mut table);
    for warning in warnings.iter().take(MAX_WARNINGS_SHOWN) {
        table.add_row(vec![
            Cell::new(&warning.panel_key),
            Cell::new(&warning.varname),
            Cell::new(warning.to_string()).fg(Color::Yellow),
        ]);
    }
    println!("Warnings: {}", warnings.len());
    println!("{table}");
    if warnings.len() > MAX_WARNINGS_SHOWN {
        println!("... {} more", warnings.len() - MAX_WARNINGS_SHOWN);
    }
}

pub fn print_views(views: &[View]) {
    if views.is_empty() {
        println!("No saved views.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Name"),
        header_cell("Filters"),
        header_cell("Sort"),
        header_cell("Layout"),
    ]);
    apply_table_style(&mut table);
    for (idx, view) in views.iter().enumerate() {
        let state = &view.state;
        let filters: Vec<String> = state
            .filter
            .iter()
            .map(|entry| format!("{} {}", entry.varname, describe_filter(&entry.spec)))
            .collect();
        let sorts: Vec<String> = state
            .sort
            .iter()
            .map(|key| format!("{}:{}", key.varname, key.dir))
            .collect();
        table.add_row(vec![
            Cell::new(idx),
            Cell::new(&view.name).add_attribute(Attribute::Bold),
            text_or_dash(filters.join("; ")),
            text_or_dash(sorts.join(", ")),
            Cell::new(format!("{}x{}", state.layout.ncol, state.layout.nrow)),
        ]);
    }
    align_column(&mut table, 0, CellAlignment::Right);
    println!("{table}");
}

fn describe_filter(spec: &FilterSpec) -> String {
    fn bound<T: ToString>(value: Option<T>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }
    match spec {
        FilterSpec::Select { values } => {
            format!("in {}", values.iter().map(String::as_str).collect::<Vec<_>>().join(","))
        }
        FilterSpec::Range { min, max } => format!("{}..{}", bound(*min), bound(*max)),
        FilterSpec::DateRange { start, end } => format!("{}..{}", bound(*start), bound(*end)),
        FilterSpec::TimeRange { start, end } => format!("{}..{}", bound(*start), bound(*end)),
        FilterSpec::Substring { value } => format!("~ {value}"),
    }
}

fn panel_cell(record: &Record) -> Cell {
    match record.panel.as_ref().and_then(|panel| panel.location.as_ref()) {
        Some(PanelLocation::File(path)) => Cell::new(path.display()),
        Some(PanelLocation::Url(url)) => Cell::new(url),
        None => dim_cell("missing"),
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn text_or_dash(text: String) -> Cell {
    if text.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(text)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

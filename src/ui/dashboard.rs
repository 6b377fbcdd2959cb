use crate::model::PALETTE;
use crate::ui::app::{App, FocusPanel};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, List, ListItem, Paragraph, Row, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Table,
    },
    Frame,
};

// Brandbook colors
const BRAND_DARK: Color = Color::Rgb(0x1F, 0x2F, 0x3C);
const BRAND_SELECT_BG: Color = Color::Rgb(0xC3, 0xD3, 0xE0);
const BRAND_GREEN: Color = Color::Rgb(0x82, 0x9A, 0x68);
const BRAND_ORANGE: Color = Color::Rgb(0x9E, 0x68, 0x3C);
const BRAND_RED: Color = Color::Rgb(0xA8, 0x3A, 0x3A);
const BRAND_MUTED: Color = Color::Rgb(0x71, 0x65, 0x65);

const HEADER_STYLE: Style = Style::new().fg(BRAND_DARK).add_modifier(Modifier::BOLD);
const SELECTED_STYLE: Style = Style::new()
    .bg(BRAND_SELECT_BG)
    .fg(BRAND_DARK)
    .add_modifier(Modifier::BOLD);
const COUNT_COLOR: Color = BRAND_GREEN;

pub fn draw_dashboard(frame: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(10),   // Panels
        Constraint::Length(4), // Summary + status
        Constraint::Length(3), // Footer
    ])
    .split(frame.area());

    draw_header(frame, chunks[0], app);
    draw_panels(frame, chunks[1], app);
    draw_summary(frame, chunks[2], app);
    draw_footer(
        frame,
        chunks[3],
        " ←→ Panel | ↑↓ Select | m MMI scan | v Preview | Enter/p Color | q Quit ",
    );
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let mode = if app.mmi_mode { "MMI scan" } else { "Property filter" };
    let title = format!(
        " IFC Fargelegger | {} | {} | {} elements | {mode} ",
        app.model.name,
        app.model.schema,
        app.model.total_products()
    );

    let header = Paragraph::new(title)
        .style(HEADER_STYLE)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn draw_panels(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::horizontal([
        Constraint::Percentage(25), // Property sets
        Constraint::Percentage(25), // Properties
        Constraint::Percentage(30), // Values
        Constraint::Percentage(20), // Colors
    ])
    .split(area);

    let dimmed = app.mmi_mode;

    let psets: Vec<Line> = app
        .pset_names()
        .into_iter()
        .map(|name| Line::from(name.to_string()))
        .collect();
    draw_list_panel(
        frame,
        chunks[0],
        &format!(" Property sets ({}) ", psets.len()),
        psets,
        app.selected_pset,
        app.focus_panel == FocusPanel::PropertySets,
        dimmed,
    );

    let properties: Vec<Line> = app
        .property_names()
        .into_iter()
        .map(|name| Line::from(name.to_string()))
        .collect();
    draw_list_panel(
        frame,
        chunks[1],
        " Properties ",
        properties,
        app.selected_property,
        app.focus_panel == FocusPanel::Properties,
        dimmed,
    );

    let values: Vec<Line> = app
        .values()
        .into_iter()
        .map(|v| {
            Line::from(vec![
                Span::raw(v.value),
                Span::raw(" "),
                Span::styled(format!("({})", v.count), Style::default().fg(COUNT_COLOR)),
            ])
        })
        .collect();
    draw_list_panel(
        frame,
        chunks[2],
        " Values ",
        values,
        app.selected_value,
        app.focus_panel == FocusPanel::Values,
        dimmed,
    );

    let colors: Vec<Line> = PALETTE
        .iter()
        .map(|color| {
            Line::from(vec![
                Span::styled("  ", Style::default().bg(swatch(color.rgb8()))),
                Span::raw(format!(" {}", color.name)),
                Span::styled(format!(" {}", color.shade), Style::default().fg(BRAND_MUTED)),
            ])
        })
        .collect();
    draw_list_panel(
        frame,
        chunks[3],
        " Colors ",
        colors,
        app.selected_color,
        app.focus_panel == FocusPanel::Colors,
        false,
    );
}

fn draw_list_panel(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    lines: Vec<Line>,
    selected: usize,
    is_focused: bool,
    dimmed: bool,
) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let scroll_offset = if selected >= visible_rows {
        selected - visible_rows + 1
    } else {
        0
    };
    let total = lines.len();

    let items: Vec<ListItem> = lines
        .into_iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_rows)
        .map(|(i, line)| {
            let is_selected = i == selected && !dimmed;
            let style = if is_selected && is_focused {
                SELECTED_STYLE
            } else if is_selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else if dimmed {
                Style::default().fg(BRAND_MUTED)
            } else {
                Style::default()
            };

            let mut line = line.style(style);
            if is_selected && is_focused {
                line.spans
                    .push(Span::styled(" ◄", Style::default().fg(BRAND_ORANGE)));
            }
            ListItem::new(line)
        })
        .collect();

    let border_style = if is_focused {
        Style::default().fg(BRAND_ORANGE)
    } else {
        Style::default()
    };

    let list = List::new(items).block(
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(border_style),
    );

    frame.render_widget(list, area);

    if total > visible_rows {
        draw_scrollbar(frame, area, total, selected, 1);
    }
}

fn draw_summary(frame: &mut Frame, area: Rect, app: &App) {
    let color = app.selected_color();
    let filter = app
        .current_filter()
        .map_or_else(|| "-".to_string(), |f| f.summary());

    let summary = Line::from(vec![
        Span::styled(
            format!("{} elements", app.matches.len()),
            Style::default().fg(COUNT_COLOR).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled("  ", Style::default().bg(swatch(color.rgb8()))),
        Span::raw(format!(" {}", color.name)),
        Span::raw("  |  "),
        Span::raw(filter),
    ]);

    let status = match &app.status {
        Some(message) if message.is_error => {
            Line::from(Span::styled(&message.text, Style::default().fg(BRAND_RED)))
        }
        Some(message) => Line::from(Span::styled(&message.text, Style::default().fg(BRAND_DARK))),
        None => Line::from(Span::styled(
            format!("Output: {}", app.output_path.display()),
            Style::default().fg(BRAND_MUTED),
        )),
    };

    let widget = Paragraph::new(vec![summary, status]).block(Block::default().borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn draw_footer(frame: &mut Frame, area: Rect, help: &str) {
    let footer = Paragraph::new(help)
        .style(Style::default().fg(BRAND_MUTED))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}

fn draw_scrollbar(frame: &mut Frame, area: Rect, total: usize, position: usize, top: u16) {
    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("↑"))
        .end_symbol(Some("↓"));
    let mut scrollbar_state = ScrollbarState::new(total).position(position);

    let scrollbar_area = Rect {
        x: area.x + area.width.saturating_sub(1),
        y: area.y + top,
        width: 1,
        height: area.height.saturating_sub(top + 1),
    };
    frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
}

fn swatch((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

pub fn draw_preview(frame: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(6),    // Matches
        Constraint::Length(3), // Footer
    ])
    .split(frame.area());

    let filter = app
        .current_filter()
        .map_or_else(|| "-".to_string(), |f| f.summary());
    let header = Paragraph::new(format!(
        " Preview: {filter} ({} elements) ",
        app.matches.len()
    ))
    .style(HEADER_STYLE)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    let visible_rows = (chunks[1].height as usize).saturating_sub(3);
    let rows: Vec<Row> = app
        .matches
        .iter()
        .skip(app.preview_scroll_offset)
        .take(visible_rows)
        .map(|m| {
            Row::new(vec![
                m.element.global_id.clone(),
                m.element.entity_type.clone(),
                m.element.display_name().to_string(),
                format!("{}.{}", m.pset_name, m.property_name),
                m.value.label(),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(22),
        Constraint::Percentage(18),
        Constraint::Percentage(25),
        Constraint::Percentage(23),
        Constraint::Percentage(12),
    ];
    let table_header =
        Row::new(vec!["GlobalId", "Type", "Name", "Property", "Value"]).style(HEADER_STYLE);
    let table = Table::new(rows, widths)
        .header(table_header)
        .block(Block::default().title(" Matched elements ").borders(Borders::ALL));
    frame.render_widget(table, chunks[1]);

    if app.matches.len() > visible_rows {
        draw_scrollbar(
            frame,
            chunks[1],
            app.matches.len(),
            app.preview_scroll_offset,
            2,
        );
    }

    draw_footer(frame, chunks[2], " Esc Back | ↑↓ Scroll | q Quit ");
}

pub fn draw_result(frame: &mut Frame, app: &App) {
    let Some(report) = &app.report else {
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Length(3), // Info
        Constraint::Min(6),    // Elements
        Constraint::Length(3), // Footer
    ])
    .split(frame.area());

    let color_span = PALETTE
        .iter()
        .find(|c| c.name == report.color)
        .map_or_else(
            || Span::raw(""),
            |c| Span::styled("  ", Style::default().bg(swatch(c.rgb8()))),
        );
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" Colored {}/{} elements ", report.colored, report.total),
            HEADER_STYLE,
        ),
        color_span,
        Span::styled(format!(" {} ", report.color), HEADER_STYLE),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    let info = Paragraph::new(format!(
        "Filter: {}  |  Output: {}",
        report.filter,
        app.output_path.display()
    ))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(info, chunks[1]);

    let visible_rows = (chunks[2].height as usize).saturating_sub(3);
    let rows: Vec<Row> = report
        .elements
        .iter()
        .skip(app.result_scroll_offset)
        .take(visible_rows)
        .map(|e| {
            let (status, style) = if e.colored {
                ("OK", Style::default().fg(BRAND_GREEN))
            } else {
                ("Failed", Style::default().fg(BRAND_ORANGE))
            };
            Row::new(vec![
                Span::raw(e.global_id.clone()),
                Span::raw(e.entity_type.clone()),
                Span::raw(e.name.clone()),
                Span::raw(e.property.clone()),
                Span::styled(status, style),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(22),
        Constraint::Percentage(18),
        Constraint::Percentage(25),
        Constraint::Percentage(23),
        Constraint::Percentage(12),
    ];
    let table_header =
        Row::new(vec!["GlobalId", "Type", "Name", "Property", "Colored"]).style(HEADER_STYLE);
    let table = Table::new(rows, widths)
        .header(table_header)
        .block(Block::default().title(" Marked elements ").borders(Borders::ALL));
    frame.render_widget(table, chunks[2]);

    if report.elements.len() > visible_rows {
        draw_scrollbar(
            frame,
            chunks[2],
            report.elements.len(),
            app.result_scroll_offset,
            2,
        );
    }

    draw_footer(frame, chunks[3], " Esc Back | ↑↓ Scroll | q Quit ");
}

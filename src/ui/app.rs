use crate::config::Config;
use crate::export::export_ifc;
use crate::model::{Filter, IfcModel, MarkColor, PsetIndex, ValueCount, PALETTE};
use crate::tagger::{build_pset_index, select_elements, tag_model, ElementMatch, MarkingReport};
use chrono::Local;
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{DefaultTerminal, Frame};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Preview,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPanel {
    PropertySets,
    Properties,
    Values,
    Colors,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

impl StatusMessage {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

pub struct App {
    /// The model as loaded. Every run tags a fresh clone of it.
    pub model: IfcModel,
    pub index: PsetIndex,
    pub config: Config,
    pub output_path: PathBuf,
    pub view: View,
    pub focus_panel: FocusPanel,
    pub mmi_mode: bool,
    pub selected_pset: usize,
    pub selected_property: usize,
    pub selected_value: usize,
    pub selected_color: usize,
    pub preview_scroll_offset: usize,
    pub result_scroll_offset: usize,
    pub matches: Vec<ElementMatch>,
    pub report: Option<MarkingReport>,
    pub status: Option<StatusMessage>,
    pub should_quit: bool,
}

impl App {
    #[must_use]
    pub fn new(model: IfcModel, config: Config, output_path: PathBuf) -> Self {
        let index = build_pset_index(&model);
        let mut app = Self {
            model,
            index,
            config,
            output_path,
            view: View::Dashboard,
            focus_panel: FocusPanel::PropertySets,
            mmi_mode: false,
            selected_pset: 0,
            selected_property: 0,
            selected_value: 0,
            selected_color: 0,
            preview_scroll_offset: 0,
            result_scroll_offset: 0,
            matches: Vec::new(),
            report: None,
            status: None,
            should_quit: false,
        };
        if app.index.is_empty() {
            app.status = Some(StatusMessage::info(
                "No property sets found, press m for the MMI scan",
            ));
        }
        app.refresh_matches();
        app
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;
            self.handle_events()?;
        }
        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        match self.view {
            View::Dashboard => super::dashboard::draw_dashboard(frame, self),
            View::Preview => super::dashboard::draw_preview(frame, self),
            View::Result => super::dashboard::draw_result(frame, self),
        }
    }

    fn handle_events(&mut self) -> Result<()> {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                self.handle_key(key.code);
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match self.view {
            View::Dashboard => self.handle_dashboard_keys(code),
            View::Preview => self.handle_preview_keys(code),
            View::Result => self.handle_result_keys(code),
        }
    }

    fn handle_dashboard_keys(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.navigate_up(),
            KeyCode::Down | KeyCode::Char('j') => self.navigate_down(),
            KeyCode::Left | KeyCode::Char('h') => self.navigate_left(),
            KeyCode::Right | KeyCode::Char('l') => self.navigate_right(),
            KeyCode::Char('m') => self.toggle_mmi(),
            KeyCode::Char('v') => self.enter_preview(),
            KeyCode::Enter | KeyCode::Char('p') if self.focus_panel == FocusPanel::Colors => {
                self.process();
            }
            KeyCode::Enter => self.navigate_right(),
            _ => {}
        }
    }

    fn handle_preview_keys(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('v') => {
                self.view = View::Dashboard;
                self.preview_scroll_offset = 0;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.preview_scroll_offset = self.preview_scroll_offset.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.preview_scroll_offset < self.matches.len().saturating_sub(1) {
                    self.preview_scroll_offset += 1;
                }
            }
            _ => {}
        }
    }

    fn handle_result_keys(&mut self, code: KeyCode) {
        let rows = self.report.as_ref().map_or(0, |r| r.elements.len());
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Enter => {
                self.view = View::Dashboard;
                self.result_scroll_offset = 0;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.result_scroll_offset = self.result_scroll_offset.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.result_scroll_offset < rows.saturating_sub(1) {
                    self.result_scroll_offset += 1;
                }
            }
            _ => {}
        }
    }

    fn navigate_up(&mut self) {
        match self.focus_panel {
            FocusPanel::PropertySets => {
                if self.selected_pset > 0 {
                    self.selected_pset -= 1;
                    self.reset_below_pset();
                }
            }
            FocusPanel::Properties => {
                if self.selected_property > 0 {
                    self.selected_property -= 1;
                    self.selected_value = 0;
                    self.refresh_matches();
                }
            }
            FocusPanel::Values => {
                if self.selected_value > 0 {
                    self.selected_value -= 1;
                    self.refresh_matches();
                }
            }
            FocusPanel::Colors => {
                self.selected_color = self.selected_color.saturating_sub(1);
            }
        }
    }

    fn navigate_down(&mut self) {
        match self.focus_panel {
            FocusPanel::PropertySets => {
                if self.selected_pset < self.pset_names().len().saturating_sub(1) {
                    self.selected_pset += 1;
                    self.reset_below_pset();
                }
            }
            FocusPanel::Properties => {
                if self.selected_property < self.property_names().len().saturating_sub(1) {
                    self.selected_property += 1;
                    self.selected_value = 0;
                    self.refresh_matches();
                }
            }
            FocusPanel::Values => {
                if self.selected_value < self.values().len().saturating_sub(1) {
                    self.selected_value += 1;
                    self.refresh_matches();
                }
            }
            FocusPanel::Colors => {
                if self.selected_color < PALETTE.len() - 1 {
                    self.selected_color += 1;
                }
            }
        }
    }

    fn navigate_left(&mut self) {
        if self.mmi_mode {
            return;
        }
        self.focus_panel = match self.focus_panel {
            FocusPanel::Colors => FocusPanel::Values,
            FocusPanel::Values => FocusPanel::Properties,
            FocusPanel::Properties | FocusPanel::PropertySets => FocusPanel::PropertySets,
        };
    }

    fn navigate_right(&mut self) {
        self.focus_panel = match self.focus_panel {
            FocusPanel::PropertySets => FocusPanel::Properties,
            FocusPanel::Properties => FocusPanel::Values,
            FocusPanel::Values | FocusPanel::Colors => FocusPanel::Colors,
        };
    }

    fn reset_below_pset(&mut self) {
        self.selected_property = 0;
        self.selected_value = 0;
        self.refresh_matches();
    }

    fn toggle_mmi(&mut self) {
        self.mmi_mode = !self.mmi_mode;
        self.focus_panel = if self.mmi_mode {
            FocusPanel::Colors
        } else {
            FocusPanel::PropertySets
        };
        self.refresh_matches();
        self.status = Some(StatusMessage::info(if self.mmi_mode {
            format!("MMI scan: {}", self.config.mmi.summary())
        } else {
            "Property filter".to_string()
        }));
    }

    fn enter_preview(&mut self) {
        if self.matches.is_empty() {
            self.status = Some(StatusMessage::error("No elements match the filter"));
            return;
        }
        self.view = View::Preview;
        self.preview_scroll_offset = 0;
    }

    fn refresh_matches(&mut self) {
        self.matches = match self.current_filter() {
            Some(filter) => select_elements(&self.model, &filter, &self.config.matching),
            None => Vec::new(),
        };
    }

    /// Tags a clone of the loaded model and writes it to the output path.
    fn process(&mut self) {
        let Some(filter) = self.current_filter() else {
            self.status = Some(StatusMessage::error("Choose a property value first"));
            return;
        };
        let color = self.selected_color();

        let mut tagged = self.model.clone();
        let date = Local::now().date_naive();
        let report = match tag_model(&mut tagged, &filter, color, date, &self.config) {
            Ok(report) => report,
            Err(e) => {
                self.status = Some(StatusMessage::error(e.to_string()));
                return;
            }
        };

        if let Err(e) = export_ifc(&tagged, &self.output_path) {
            self.status = Some(StatusMessage::error(e.to_string()));
            return;
        }

        self.status = Some(StatusMessage::info(format!(
            "Colored {}/{} elements {}, saved {}",
            report.colored,
            report.total,
            color.name,
            self.output_path.display()
        )));
        self.report = Some(report);
        self.result_scroll_offset = 0;
        self.view = View::Result;
    }

    #[must_use]
    pub fn pset_names(&self) -> Vec<&str> {
        self.index.pset_names()
    }

    #[must_use]
    pub fn selected_pset_name(&self) -> Option<&str> {
        self.pset_names().get(self.selected_pset).copied()
    }

    #[must_use]
    pub fn property_names(&self) -> Vec<&str> {
        self.selected_pset_name()
            .map(|pset| self.index.property_names(pset))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn selected_property_name(&self) -> Option<&str> {
        self.property_names().get(self.selected_property).copied()
    }

    #[must_use]
    pub fn values(&self) -> Vec<ValueCount> {
        match (self.selected_pset_name(), self.selected_property_name()) {
            (Some(pset), Some(property)) => self.index.values(pset, property),
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub fn selected_color(&self) -> &'static MarkColor {
        &PALETTE[self.selected_color.min(PALETTE.len() - 1)]
    }

    /// The filter the current selection describes, if it is complete.
    #[must_use]
    pub fn current_filter(&self) -> Option<Filter> {
        if self.mmi_mode {
            return Some(Filter::Mmi(self.config.mmi.clone()));
        }

        let pset = self.selected_pset_name()?;
        let property = self.selected_property_name()?;
        let value = self.values().into_iter().nth(self.selected_value)?;
        Some(Filter::property(pset, property, value.value))
    }
}

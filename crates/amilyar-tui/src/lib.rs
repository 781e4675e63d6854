// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use amilyar_app::{
    ActionKind, AssessmentLevelFormInput, BarangayFormInput, BarangayId,
    BuildingCodeFormInput, BuildingComponentFormInput, BuildingComponentId,
    BuildingSubComponentFormInput, ClassificationFormInput, ClassificationId, DeclarantFormInput,
    DeclarantStatus, DeleteConfirm, DeviceFormInput, FormPayload, KindFormInput, KindId,
    LandAdjustmentFormInput, PaneStack, PaneState, ParentScope, Row, ScreenKind, Severity,
    StructureFormInput, StructureId, SubclassFormInput, SubclassId, SubclassRateFormInput,
    TaxRateFormInput, UserId,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row as TableRow, Table, Tabs};
use std::io;
use std::time::{Duration, Instant};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

const POLL_INTERVAL: Duration = Duration::from_millis(120);

/// Everything the console needs from the environment. The terminal layer
/// never opens a database or checks a password itself; it describes what
/// the operator asked for and lets the runtime verify and act.
pub trait AppRuntime {
    fn load_rows(&mut self, screen: ScreenKind, parent_key: Option<i64>) -> Result<Vec<Row>>;
    fn create_row(&mut self, payload: &FormPayload) -> Result<()>;
    fn update_row(&mut self, row_id: i64, payload: &FormPayload) -> Result<()>;
    fn delete_row(
        &mut self,
        screen: ScreenKind,
        row_id: i64,
        parent_key: Option<i64>,
    ) -> Result<()>;
    /// Rows that would block deleting `row_id`, for screens with a usage
    /// guard. Screens without a guard never call this.
    fn count_delete_dependents(&mut self, screen: ScreenKind, row_id: i64) -> Result<usize>;
    /// Re-verifies the operator's password, then toggles suspension.
    fn set_user_suspended(&mut self, target: UserId, password: &str, suspend: bool) -> Result<()>;
    /// Re-verifies the operator's password, then deletes the account.
    fn delete_user(&mut self, target: UserId, password: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct AppOptions {
    /// District whose barangays the barangay screen manages.
    pub district_id: i64,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self { district_id: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FormField {
    label: &'static str,
    value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FormUiState {
    screen: ScreenKind,
    existing_id: Option<i64>,
    fields: Vec<FormField>,
    cursor: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CredentialAction {
    Suspend { target: UserId, suspend: bool },
    Delete { target: UserId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PasswordPromptUiState {
    action: CredentialAction,
    target_label: String,
    input: String,
}

#[derive(Debug, Default)]
struct ViewData {
    form: Option<FormUiState>,
    password: Option<PasswordPromptUiState>,
    searching: bool,
    help_visible: bool,
}

struct App {
    stack: PaneStack,
    options: AppOptions,
    root_index: usize,
    action_cursor: usize,
}

impl App {
    fn new(options: AppOptions) -> Self {
        Self {
            stack: PaneStack::new(ScreenKind::MENU[0], None),
            options,
            root_index: 0,
            action_cursor: 0,
        }
    }

    fn pane(&self) -> &PaneState {
        self.stack.top()
    }

    fn pane_mut(&mut self) -> &mut PaneState {
        self.stack.top_mut()
    }

    fn switch_root(&mut self, index: usize) {
        let screen = ScreenKind::MENU[index % ScreenKind::MENU.len()];
        let scope = root_scope(screen, &self.options);
        self.root_index = index % ScreenKind::MENU.len();
        self.action_cursor = 0;
        self.stack.switch_root(screen, scope);
    }

    fn clamp_action_cursor(&mut self) {
        let count = self.pane().screen.actions().len();
        if self.action_cursor >= count {
            self.action_cursor = count.saturating_sub(1);
        }
    }
}

fn root_scope(screen: ScreenKind, options: &AppOptions) -> Option<ParentScope> {
    screen.is_scoped().then(|| ParentScope {
        key: options.district_id,
        label: format!("district {}", options.district_id),
    })
}

pub fn run_app<R: AppRuntime>(runtime: &mut R, options: AppOptions) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut app = App::new(options);
    let mut view_data = ViewData::default();

    let mut result = Ok(());
    loop {
        refresh_if_needed(&mut app, runtime);
        app.pane_mut().tick(Instant::now());

        if let Err(error) = terminal.draw(|frame| render(frame, &app, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(POLL_INTERVAL).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(&mut app, runtime, &mut view_data, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn refresh_if_needed<R: AppRuntime>(app: &mut App, runtime: &mut R) {
    if !app.pane().needs_refetch() {
        return;
    }
    let screen = app.pane().screen;
    let parent_key = app.pane().parent_key();
    let ticket = app.pane_mut().begin_fetch();
    let result = runtime
        .load_rows(screen, parent_key)
        .map_err(|error| error.to_string());
    app.pane_mut().apply_fetch(ticket, result, Instant::now());
}

/// Returns true when the app should exit.
fn handle_key_event<R: AppRuntime>(
    app: &mut App,
    runtime: &mut R,
    view_data: &mut ViewData,
    key: KeyEvent,
) -> bool {
    if view_data.help_visible {
        view_data.help_visible = false;
        return false;
    }

    if view_data.form.is_some() {
        handle_form_key(app, runtime, view_data, key);
        return false;
    }

    if view_data.password.is_some() {
        handle_password_key(app, runtime, view_data, key);
        return false;
    }

    match app.pane().confirm.clone() {
        DeleteConfirm::Confirming { .. } => {
            handle_confirm_key(app, runtime, key);
            return false;
        }
        DeleteConfirm::Blocked { .. } => {
            app.pane_mut().cancel_delete();
            return false;
        }
        DeleteConfirm::Idle => {}
    }

    if view_data.searching {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => view_data.searching = false,
            KeyCode::Backspace => {
                let mut term = app.pane().search_term.clone();
                term.pop();
                app.pane_mut().set_search_term(term);
            }
            KeyCode::Char(c) => {
                let mut term = app.pane().search_term.clone();
                term.push(c);
                app.pane_mut().set_search_term(term);
            }
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => view_data.help_visible = true,
        KeyCode::Char('/') => view_data.searching = true,
        KeyCode::Char('r') => app.pane_mut().request_refetch(),
        KeyCode::Char(digit @ '1'..='8') => {
            if app.stack.depth() == 1 {
                let index = digit as usize - '1' as usize;
                app.switch_root(index);
            }
        }
        KeyCode::Tab => {
            if app.stack.depth() == 1 {
                let index = (app.root_index + 1) % ScreenKind::MENU.len();
                app.switch_root(index);
            }
        }
        KeyCode::BackTab => {
            if app.stack.depth() == 1 {
                let index =
                    (app.root_index + ScreenKind::MENU.len() - 1) % ScreenKind::MENU.len();
                app.switch_root(index);
            }
        }
        KeyCode::Up => move_selection(app, -1),
        KeyCode::Down => move_selection(app, 1),
        KeyCode::Left => {
            app.action_cursor = app.action_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let count = app.pane().screen.actions().len();
            if app.action_cursor + 1 < count {
                app.action_cursor += 1;
            }
        }
        KeyCode::Enter => dispatch_action(app, runtime, view_data),
        KeyCode::Esc => {
            if !app.pane().search_term.is_empty() {
                app.pane_mut().set_search_term(String::new());
            } else if app.stack.pop() {
                // Child mutations may have changed what the parent shows.
                app.pane_mut().request_refetch();
                app.clamp_action_cursor();
            }
        }
        _ => {}
    }
    false
}

fn move_selection(app: &mut App, delta: isize) {
    let visible: Vec<i64> = app.pane().visible_rows().iter().map(|row| row.id()).collect();
    if visible.is_empty() {
        return;
    }
    let current = app
        .pane()
        .selected_id
        .and_then(|id| visible.iter().position(|candidate| *candidate == id));
    let next = match current {
        Some(index) => {
            let raw = index as isize + delta;
            raw.clamp(0, visible.len() as isize - 1) as usize
        }
        None => {
            if delta >= 0 {
                0
            } else {
                visible.len() - 1
            }
        }
    };
    app.pane_mut().select(visible[next]);
}

fn dispatch_action<R: AppRuntime>(app: &mut App, runtime: &mut R, view_data: &mut ViewData) {
    let actions = app.pane().screen.actions();
    let Some(action) = actions.get(app.action_cursor).copied() else {
        return;
    };
    if !app.pane().action_enabled(&action) {
        return;
    }

    match action.kind {
        ActionKind::Create => {
            let screen = app.pane().screen;
            let parent_key = app.pane().parent_key();
            if FormPayload::blank_for(screen, parent_key).is_some() {
                view_data.form = Some(FormUiState {
                    screen,
                    existing_id: None,
                    fields: blank_fields(screen),
                    cursor: 0,
                });
            }
        }
        ActionKind::Edit => {
            let Some(row) = app.pane().selected_row() else {
                return;
            };
            view_data.form = Some(FormUiState {
                screen: app.pane().screen,
                existing_id: Some(row.id()),
                fields: fields_from_row(row),
                cursor: 0,
            });
        }
        ActionKind::Delete => {
            if app.pane().screen == ScreenKind::User {
                let Some(Row::User(user)) = app.pane().selected_row() else {
                    return;
                };
                view_data.password = Some(PasswordPromptUiState {
                    action: CredentialAction::Delete { target: user.id },
                    target_label: user.username.clone(),
                    input: String::new(),
                });
                return;
            }
            let dependents = if action.usage_guarded {
                let screen = app.pane().screen;
                let Some(row_id) = app.pane().selected_id else {
                    return;
                };
                match runtime.count_delete_dependents(screen, row_id) {
                    Ok(count) => count,
                    Err(error) => {
                        app.pane_mut()
                            .notify(error.to_string(), Severity::Error, Instant::now());
                        return;
                    }
                }
            } else {
                0
            };
            app.pane_mut().request_delete(dependents);
        }
        ActionKind::Suspend => {
            let Some(Row::User(user)) = app.pane().selected_row() else {
                return;
            };
            view_data.password = Some(PasswordPromptUiState {
                action: CredentialAction::Suspend {
                    target: user.id,
                    suspend: !user.suspended,
                },
                target_label: user.username.clone(),
                input: String::new(),
            });
        }
        ActionKind::Drill(_) => {
            if app.stack.drill(&action) {
                app.action_cursor = 0;
            }
        }
    }
}

fn handle_confirm_key<R: AppRuntime>(app: &mut App, runtime: &mut R, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => {
            let screen = app.pane().screen;
            let parent_key = app.pane().parent_key();
            let Some(row_id) = app.pane_mut().confirm_delete() else {
                return;
            };
            let result = runtime
                .delete_row(screen, row_id, parent_key)
                .map(|_| format!("{} deleted", singular_label(screen)))
                .map_err(|error| error.to_string());
            app.pane_mut().complete_mutation(result, Instant::now());
        }
        KeyCode::Char('n') | KeyCode::Esc => app.pane_mut().cancel_delete(),
        _ => {}
    }
}

fn handle_password_key<R: AppRuntime>(
    app: &mut App,
    runtime: &mut R,
    view_data: &mut ViewData,
    key: KeyEvent,
) {
    let Some(prompt) = view_data.password.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => view_data.password = None,
        KeyCode::Backspace => {
            prompt.input.pop();
        }
        KeyCode::Char(c) => prompt.input.push(c),
        KeyCode::Enter => {
            if !app.pane_mut().begin_mutation() {
                return;
            }
            let result = match prompt.action {
                CredentialAction::Suspend { target, suspend } => runtime
                    .set_user_suspended(target, &prompt.input, suspend)
                    .map(|_| {
                        if suspend {
                            format!("{} suspended", prompt.target_label)
                        } else {
                            format!("{} unsuspended", prompt.target_label)
                        }
                    }),
                CredentialAction::Delete { target } => runtime
                    .delete_user(target, &prompt.input)
                    .map(|_| format!("{} deleted", prompt.target_label)),
            }
            .map_err(|error| error.to_string());
            let succeeded = result.is_ok();
            app.pane_mut().complete_mutation(result, Instant::now());
            if succeeded {
                view_data.password = None;
            } else if let Some(prompt) = view_data.password.as_mut() {
                prompt.input.clear();
            }
        }
        _ => {}
    }
}

fn handle_form_key<R: AppRuntime>(
    app: &mut App,
    runtime: &mut R,
    view_data: &mut ViewData,
    key: KeyEvent,
) {
    let Some(form) = view_data.form.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => view_data.form = None,
        KeyCode::Up => form.cursor = form.cursor.saturating_sub(1),
        KeyCode::Down | KeyCode::Tab => {
            if form.cursor + 1 < form.fields.len() {
                form.cursor += 1;
            }
        }
        KeyCode::Backspace => {
            form.fields[form.cursor].value.pop();
        }
        KeyCode::Char(c) => form.fields[form.cursor].value.push(c),
        KeyCode::Enter => {
            let payload = match build_payload(form.screen, app.pane().parent_key(), &form.fields) {
                Ok(payload) => payload,
                Err(error) => {
                    app.pane_mut()
                        .notify(error.to_string(), Severity::Error, Instant::now());
                    return;
                }
            };
            if let Err(error) = payload.validate() {
                app.pane_mut()
                    .notify(error.to_string(), Severity::Error, Instant::now());
                return;
            }
            if !app.pane_mut().begin_mutation() {
                return;
            }
            let label = singular_label(form.screen);
            let result = match form.existing_id {
                Some(row_id) => runtime
                    .update_row(row_id, &payload)
                    .map(|_| format!("{label} updated")),
                None => runtime
                    .create_row(&payload)
                    .map(|_| format!("{label} added")),
            }
            .map_err(|error| error.to_string());
            let succeeded = result.is_ok();
            app.pane_mut().complete_mutation(result, Instant::now());
            if succeeded {
                view_data.form = None;
            }
        }
        _ => {}
    }
}

fn singular_label(screen: ScreenKind) -> &'static str {
    match screen {
        ScreenKind::Classification => "classification",
        ScreenKind::Subclass => "subclass",
        ScreenKind::SubclassRate => "rate",
        ScreenKind::Barangay => "barangay",
        ScreenKind::Kind => "kind",
        ScreenKind::AssessmentLevel => "assessment level",
        ScreenKind::Structure => "structure",
        ScreenKind::BuildingCode => "building code",
        ScreenKind::BuildingComponent => "component",
        ScreenKind::BuildingSubComponent => "sub-component",
        ScreenKind::LandAdjustment => "adjustment",
        ScreenKind::TaxRate => "tax rate",
        ScreenKind::User => "user",
        ScreenKind::Device => "device",
        ScreenKind::Declarant => "declarant",
    }
}

fn form_field_labels(screen: ScreenKind) -> &'static [&'static str] {
    match screen {
        ScreenKind::Classification => &["classification"],
        ScreenKind::Subclass => &["subclass", "barangay id (optional)"],
        ScreenKind::SubclassRate => &["rate", "effective year"],
        ScreenKind::Barangay => &["barangay"],
        ScreenKind::Kind => &["description"],
        ScreenKind::AssessmentLevel => &[
            "effective year",
            "range low",
            "range high",
            "rate percent",
            "classification id (optional)",
        ],
        ScreenKind::Structure => &["code", "description", "effective date (optional)"],
        ScreenKind::BuildingCode => &["code", "description", "rate"],
        ScreenKind::BuildingComponent => &["description"],
        ScreenKind::BuildingSubComponent => &["description", "rate", "mode (percent/fixed)"],
        ScreenKind::LandAdjustment => &["description", "factor", "type (premium/discount)"],
        ScreenKind::TaxRate => &["effective year", "rate percent"],
        ScreenKind::User => &[],
        ScreenKind::Device => &["device name", "registered (yes/no)"],
        ScreenKind::Declarant => &["declarant", "status (active/archived)"],
    }
}

fn blank_fields(screen: ScreenKind) -> Vec<FormField> {
    form_field_labels(screen)
        .iter()
        .map(|label| FormField {
            label,
            value: match screen {
                ScreenKind::BuildingSubComponent if *label == "mode (percent/fixed)" => {
                    "percent".to_owned()
                }
                ScreenKind::Device if *label == "registered (yes/no)" => "no".to_owned(),
                ScreenKind::Declarant if *label == "status (active/archived)" => {
                    "active".to_owned()
                }
                _ => String::new(),
            },
        })
        .collect()
}

fn fields_from_row(row: &Row) -> Vec<FormField> {
    let values: Vec<String> = match row {
        Row::Classification(item) => vec![item.classification.clone()],
        Row::Subclass(item) => vec![
            item.subclass.clone(),
            item.barangay_id
                .map(|id| id.get().to_string())
                .unwrap_or_default(),
        ],
        Row::SubclassRate(item) => vec![item.rate.to_string(), item.effective_year.clone()],
        Row::Barangay(item) => vec![item.barangay.clone()],
        Row::Kind(item) => vec![item.description.clone()],
        Row::AssessmentLevel(item) => vec![
            item.effective_year.clone(),
            item.range_low.to_string(),
            item.range_high.to_string(),
            item.rate_percent.to_string(),
            item.class_id
                .map(|id| id.get().to_string())
                .unwrap_or_default(),
        ],
        Row::Structure(item) => vec![
            item.structure_code.clone(),
            item.description.clone(),
            item.effective_date.map(format_date).unwrap_or_default(),
        ],
        Row::BuildingCode(item) => vec![
            item.building_code.clone(),
            item.description.clone(),
            item.rate.to_string(),
        ],
        Row::BuildingComponent(item) => vec![item.description.clone()],
        Row::BuildingSubComponent(item) => vec![
            item.description.clone(),
            item.rate.to_string(),
            if item.percent { "percent" } else { "fixed" }.to_owned(),
        ],
        Row::LandAdjustment(item) => vec![
            item.description.clone(),
            item.adjustment_factor.to_string(),
            item.adjustment_type.clone(),
        ],
        Row::TaxRate(item) => vec![item.effective_year.clone(), item.rate_percent.to_string()],
        Row::User(_) => Vec::new(),
        Row::Device(item) => vec![
            item.device_name.clone(),
            if item.registered { "yes" } else { "no" }.to_owned(),
        ],
        Row::Declarant(item) => vec![item.declarant.clone(), item.status.as_str().to_owned()],
    };
    form_field_labels(row.screen())
        .iter()
        .zip(values)
        .map(|(label, value)| FormField { label, value })
        .collect()
}

fn build_payload(
    screen: ScreenKind,
    parent_key: Option<i64>,
    fields: &[FormField],
) -> Result<FormPayload> {
    let value = |index: usize| fields.get(index).map(|field| field.value.trim()).unwrap_or("");
    let parent = parent_key.unwrap_or(0);

    let payload = match screen {
        ScreenKind::Classification => FormPayload::Classification(ClassificationFormInput {
            classification: value(0).to_owned(),
        }),
        ScreenKind::Subclass => FormPayload::Subclass(SubclassFormInput {
            class_id: ClassificationId::new(parent),
            barangay_id: parse_opt_i64(value(1), "barangay id")?.map(BarangayId::new),
            subclass: value(0).to_owned(),
        }),
        ScreenKind::SubclassRate => FormPayload::SubclassRate(SubclassRateFormInput {
            subclass_id: SubclassId::new(parent),
            rate: parse_f64(value(0), "rate")?,
            effective_year: value(1).to_owned(),
        }),
        ScreenKind::Barangay => FormPayload::Barangay(BarangayFormInput {
            district_id: parent,
            barangay: value(0).to_owned(),
        }),
        ScreenKind::Kind => FormPayload::Kind(KindFormInput {
            description: value(0).to_owned(),
        }),
        ScreenKind::AssessmentLevel => FormPayload::AssessmentLevel(AssessmentLevelFormInput {
            kind_id: KindId::new(parent),
            class_id: parse_opt_i64(value(4), "classification id")?.map(ClassificationId::new),
            effective_year: value(0).to_owned(),
            range_low: parse_f64(value(1), "range low")?,
            range_high: parse_f64(value(2), "range high")?,
            rate_percent: parse_f64(value(3), "rate percent")?,
        }),
        ScreenKind::Structure => FormPayload::Structure(StructureFormInput {
            structure_code: value(0).to_owned(),
            description: value(1).to_owned(),
            effective_date: parse_opt_date(value(2))?,
        }),
        ScreenKind::BuildingCode => FormPayload::BuildingCode(BuildingCodeFormInput {
            structure_id: StructureId::new(parent),
            building_code: value(0).to_owned(),
            description: value(1).to_owned(),
            rate: parse_f64(value(2), "rate")?,
        }),
        ScreenKind::BuildingComponent => {
            FormPayload::BuildingComponent(BuildingComponentFormInput {
                description: value(0).to_owned(),
            })
        }
        ScreenKind::BuildingSubComponent => {
            FormPayload::BuildingSubComponent(BuildingSubComponentFormInput {
                building_com_id: BuildingComponentId::new(parent),
                description: value(0).to_owned(),
                rate: parse_f64(value(1), "rate")?,
                percent: parse_word_pair(value(2), "percent", "fixed", "mode")?,
            })
        }
        ScreenKind::LandAdjustment => FormPayload::LandAdjustment(LandAdjustmentFormInput {
            description: value(0).to_owned(),
            adjustment_factor: parse_f64(value(1), "factor")?,
            adjustment_type: value(2).to_owned(),
        }),
        ScreenKind::TaxRate => FormPayload::TaxRate(TaxRateFormInput {
            effective_year: value(0).to_owned(),
            rate_percent: parse_f64(value(1), "rate percent")?,
        }),
        ScreenKind::Device => FormPayload::Device(DeviceFormInput {
            user_id: UserId::new(parent),
            device_name: value(0).to_owned(),
            registered: parse_word_pair(value(1), "yes", "no", "registered")?,
        }),
        ScreenKind::Declarant => FormPayload::Declarant(DeclarantFormInput {
            declarant: value(0).to_owned(),
            status: match DeclarantStatus::parse(&value(1).to_lowercase()) {
                Some(status) => status,
                None => bail!("status must be `active` or `archived`"),
            },
        }),
        ScreenKind::User => bail!("users are registered through the mobile client"),
    };
    Ok(payload)
}

fn parse_f64(raw: &str, label: &str) -> Result<f64> {
    if raw.is_empty() {
        bail!("{label} is required -- enter a number and retry");
    }
    raw.parse::<f64>()
        .with_context(|| format!("{label} must be a number, got {raw:?}"))
}

fn parse_opt_i64(raw: &str, label: &str) -> Result<Option<i64>> {
    if raw.is_empty() {
        return Ok(None);
    }
    let value = raw
        .parse::<i64>()
        .with_context(|| format!("{label} must be a whole number, got {raw:?}"))?;
    Ok(Some(value))
}

fn parse_opt_date(raw: &str) -> Result<Option<Date>> {
    if raw.is_empty() {
        return Ok(None);
    }
    Date::parse(raw, &format_description!("[year]-[month]-[day]"))
        .map(Some)
        .with_context(|| format!("date must look like 2025-01-31, got {raw:?}"))
}

fn parse_word_pair(raw: &str, truthy: &str, falsy: &str, label: &str) -> Result<bool> {
    if raw.eq_ignore_ascii_case(truthy) {
        Ok(true)
    } else if raw.eq_ignore_ascii_case(falsy) {
        Ok(false)
    } else {
        bail!("{label} must be `{truthy}` or `{falsy}`, got {raw:?}")
    }
}

fn table_headers(screen: ScreenKind) -> &'static [&'static str] {
    match screen {
        ScreenKind::Classification => &["id", "classification", "created"],
        ScreenKind::Subclass => &["id", "subclass", "barangay", "created"],
        ScreenKind::SubclassRate => &["id", "rate", "effective year", "created"],
        ScreenKind::Barangay => &["id", "barangay", "district", "created"],
        ScreenKind::Kind => &["id", "description", "created"],
        ScreenKind::AssessmentLevel => &[
            "id",
            "effective year",
            "range low",
            "range high",
            "rate %",
            "created",
        ],
        ScreenKind::Structure => &["id", "code", "description", "effective", "created"],
        ScreenKind::BuildingCode => &["id", "code", "description", "rate", "created"],
        ScreenKind::BuildingComponent => &["id", "description", "created"],
        ScreenKind::BuildingSubComponent => &["id", "description", "rate", "mode", "created"],
        ScreenKind::LandAdjustment => &["id", "description", "factor", "type", "created"],
        ScreenKind::TaxRate => &["id", "effective year", "rate %", "created"],
        ScreenKind::User => &["id", "username", "name", "email", "role", "status", "registered"],
        ScreenKind::Device => &["id", "device", "status", "approved", "created"],
        ScreenKind::Declarant => &["id", "declarant", "status", "created"],
    }
}

fn row_cells(row: &Row) -> Vec<String> {
    match row {
        Row::Classification(item) => vec![
            item.id.get().to_string(),
            item.classification.clone(),
            format_datetime(item.created_at),
        ],
        Row::Subclass(item) => vec![
            item.id.get().to_string(),
            item.subclass.clone(),
            item.barangay_id
                .map(|id| id.get().to_string())
                .unwrap_or_default(),
            format_datetime(item.created_at),
        ],
        Row::SubclassRate(item) => vec![
            item.id.get().to_string(),
            format!("{:.2}", item.rate),
            item.effective_year.clone(),
            format_datetime(item.created_at),
        ],
        Row::Barangay(item) => vec![
            item.id.get().to_string(),
            item.barangay.clone(),
            item.district_id.to_string(),
            format_datetime(item.created_at),
        ],
        Row::Kind(item) => vec![
            item.id.get().to_string(),
            item.description.clone(),
            format_datetime(item.created_at),
        ],
        Row::AssessmentLevel(item) => vec![
            item.id.get().to_string(),
            item.effective_year.clone(),
            format!("{:.0}", item.range_low),
            format!("{:.0}", item.range_high),
            format!("{:.2}", item.rate_percent),
            format_datetime(item.created_at),
        ],
        Row::Structure(item) => vec![
            item.id.get().to_string(),
            item.structure_code.clone(),
            item.description.clone(),
            item.effective_date.map(format_date).unwrap_or_default(),
            format_datetime(item.created_at),
        ],
        Row::BuildingCode(item) => vec![
            item.id.get().to_string(),
            item.building_code.clone(),
            item.description.clone(),
            format!("{:.2}", item.rate),
            format_datetime(item.created_at),
        ],
        Row::BuildingComponent(item) => vec![
            item.id.get().to_string(),
            item.description.clone(),
            format_datetime(item.created_at),
        ],
        Row::BuildingSubComponent(item) => vec![
            item.id.get().to_string(),
            item.description.clone(),
            format!("{:.2}", item.rate),
            if item.percent { "percent" } else { "fixed" }.to_owned(),
            format_datetime(item.created_at),
        ],
        Row::LandAdjustment(item) => vec![
            item.id.get().to_string(),
            item.description.clone(),
            format!("{:.2}", item.adjustment_factor),
            item.adjustment_type.clone(),
            format_datetime(item.created_at),
        ],
        Row::TaxRate(item) => vec![
            item.id.get().to_string(),
            item.effective_year.clone(),
            format!("{:.2}", item.rate_percent),
            format_datetime(item.created_at),
        ],
        Row::User(item) => vec![
            item.id.get().to_string(),
            item.username.clone(),
            format!("{} {}", item.first_name, item.last_name),
            item.email.clone(),
            item.role.as_str().to_owned(),
            if item.suspended { "suspended" } else { "active" }.to_owned(),
            format_datetime(item.date_registered),
        ],
        Row::Device(item) => vec![
            item.id.get().to_string(),
            item.device_name.clone(),
            if item.registered { "registered" } else { "pending" }.to_owned(),
            item.registered_at.map(format_datetime).unwrap_or_default(),
            format_datetime(item.created_at),
        ],
        Row::Declarant(item) => vec![
            item.id.get().to_string(),
            item.declarant.clone(),
            item.status.as_str().to_owned(),
            format_datetime(item.created_at),
        ],
    }
}

fn format_datetime(value: OffsetDateTime) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

fn render(frame: &mut ratatui::Frame<'_>, app: &App, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    if app.stack.depth() == 1 {
        let titles = ScreenKind::MENU
            .iter()
            .map(|screen| screen.label().to_owned())
            .collect::<Vec<String>>();
        let tabs = Tabs::new(titles)
            .block(Block::default().title("amilyar").borders(Borders::ALL))
            .style(Style::default().fg(Color::White))
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .select(app.root_index);
        frame.render_widget(tabs, layout[0]);
    } else {
        let breadcrumb = Paragraph::new(breadcrumb_text(app))
            .block(Block::default().title("amilyar").borders(Borders::ALL));
        frame.render_widget(breadcrumb, layout[0]);
    }

    let actions = Paragraph::new(actions_line(app))
        .block(Block::default().title("actions").borders(Borders::ALL));
    frame.render_widget(actions, layout[1]);

    render_table(frame, layout[2], app);

    let status = Paragraph::new(status_line(app, view_data))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);

    if let Some(form) = &view_data.form {
        let area = centered_rect(62, 56, frame.area());
        frame.render_widget(Clear, area);
        let title = if form.existing_id.is_some() {
            format!("edit {}", singular_label(form.screen))
        } else {
            format!("add {}", singular_label(form.screen))
        };
        let body = Paragraph::new(form_overlay_text(form))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(body, area);
    }

    if let Some(prompt) = &view_data.password {
        let area = centered_rect(54, 28, frame.area());
        frame.render_widget(Clear, area);
        let body = Paragraph::new(password_overlay_text(prompt)).block(
            Block::default()
                .title("confirm with password")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Yellow)),
        );
        frame.render_widget(body, area);
    }

    match &app.pane().confirm {
        DeleteConfirm::Confirming { label, .. } => {
            let area = centered_rect(52, 24, frame.area());
            frame.render_widget(Clear, area);
            let text = format!(
                "delete {} {label:?}?\n\ny = delete    n = keep",
                singular_label(app.pane().screen)
            );
            let body = Paragraph::new(text).block(
                Block::default()
                    .title("confirm delete")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Red)),
            );
            frame.render_widget(body, area);
        }
        DeleteConfirm::Blocked { label, dependents } => {
            let area = centered_rect(56, 24, frame.area());
            frame.render_widget(Clear, area);
            let text = format!(
                "{label:?} cannot be deleted:\n{dependents} subclass(es) still reference it.\n\npress any key"
            );
            let body = Paragraph::new(text).block(
                Block::default()
                    .title("delete blocked")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Yellow)),
            );
            frame.render_widget(body, area);
        }
        DeleteConfirm::Idle => {}
    }

    if view_data.help_visible {
        let area = centered_rect(72, 64, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let pane = app.pane();
    let headers = table_headers(pane.screen);
    let widths = vec![Constraint::Min(6); headers.len()];

    let header_cells = headers.iter().map(|label| {
        Cell::from(*label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = TableRow::new(header_cells);

    let rows = pane.visible_rows().into_iter().map(|row| {
        let selected = pane.selected_id == Some(row.id());
        let style = if selected {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let cells = row_cells(row)
            .into_iter()
            .map(|text| Cell::from(text).style(style))
            .collect::<Vec<_>>();
        TableRow::new(cells)
    });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(pane))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

fn table_title(pane: &PaneState) -> String {
    let total = pane.items.len();
    let visible = pane.visible_rows().len();
    let mut title = format!("{} ({visible}/{total})", pane.screen.label());
    if pane.loading {
        title.push_str(" [loading]");
    }
    title
}

fn breadcrumb_text(app: &App) -> String {
    let pane = app.pane();
    let mut parts = vec![ScreenKind::MENU[app.root_index].label().to_owned()];
    if let Some(scope) = &pane.parent {
        parts.push(scope.label.clone());
    }
    parts.push(pane.screen.label().to_owned());
    parts.join(" \u{25b8} ")
}

fn actions_line(app: &App) -> Line<'static> {
    let pane = app.pane();
    let mut spans = Vec::new();
    for (index, action) in pane.screen.actions().iter().enumerate() {
        let enabled = pane.action_enabled(action);
        let mut style = if enabled {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        if index == app.action_cursor {
            style = style.add_modifier(Modifier::BOLD).fg(if enabled {
                Color::Cyan
            } else {
                Color::DarkGray
            });
        }
        let marker = if index == app.action_cursor { "\u{25b6} " } else { "  " };
        spans.push(Span::styled(format!("{marker}{}", action.label), style));
        spans.push(Span::raw("   "));
    }
    Line::from(spans)
}

fn status_line(app: &App, view_data: &ViewData) -> String {
    let pane = app.pane();
    if let Some(notification) = &pane.notification {
        let prefix = match notification.severity {
            Severity::Info => "ok",
            Severity::Error => "error",
        };
        return format!("{prefix}: {}", notification.message);
    }
    if view_data.searching {
        return format!("search: {}\u{2588}", pane.search_term);
    }
    let mut hints = vec![
        "\u{2191}\u{2193} select",
        "\u{2190}\u{2192} action",
        "enter run",
        "/ search",
        "r reload",
        "? help",
        "q quit",
    ];
    if app.stack.depth() > 1 {
        hints.insert(0, "esc back");
    }
    let mut text = hints.join("  ");
    if !pane.search_term.is_empty() {
        text = format!("filter: {:?}  {text}", pane.search_term);
    }
    text
}

fn form_overlay_text(form: &FormUiState) -> String {
    let mut lines = Vec::new();
    for (index, field) in form.fields.iter().enumerate() {
        let marker = if index == form.cursor { "\u{25b6}" } else { " " };
        let cursor = if index == form.cursor { "\u{2588}" } else { "" };
        lines.push(format!("{marker} {}: {}{cursor}", field.label, field.value));
    }
    lines.push(String::new());
    lines.push("enter save    esc cancel    \u{2191}\u{2193} field".to_owned());
    lines.join("\n")
}

fn password_overlay_text(prompt: &PasswordPromptUiState) -> String {
    let verb = match prompt.action {
        CredentialAction::Suspend { suspend: true, .. } => "suspend",
        CredentialAction::Suspend { suspend: false, .. } => "unsuspend",
        CredentialAction::Delete { .. } => "delete",
    };
    let masked = "*".repeat(prompt.input.chars().count());
    format!(
        "{verb} {}?\n\nyour password: {masked}\u{2588}\n\nenter confirm    esc cancel",
        prompt.target_label
    )
}

fn help_overlay_text() -> String {
    [
        "1-8 / tab   switch screen",
        "\u{2191}\u{2193}          select row",
        "\u{2190}\u{2192}          choose action",
        "enter       run the highlighted action",
        "/           search (esc to stop typing, esc again to clear)",
        "r           reload the current screen",
        "esc         back to the parent screen",
        "q           quit",
        "",
        "drill actions open a child screen scoped to the selected row.",
        "user suspend/delete re-checks your password before acting.",
    ]
    .join("\n")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::{
        App, AppOptions, AppRuntime, CredentialAction, FormField, PasswordPromptUiState, ViewData,
        blank_fields, build_payload, dispatch_action, fields_from_row, handle_confirm_key,
        handle_form_key, handle_key_event, handle_password_key, refresh_if_needed, row_cells,
        status_line, table_headers,
    };
    use amilyar_app::{
        Classification, ClassificationId, DeleteConfirm, FormPayload, Kind, KindId, Row,
        ScreenKind, Subclass, SubclassId, User, UserId, UserRole,
    };
    use anyhow::{Result, bail};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use time::macros::datetime;

    #[derive(Debug, Default)]
    struct TestRuntime {
        load_count: usize,
        created: Vec<FormPayload>,
        updated: Vec<(i64, FormPayload)>,
        deleted: Vec<(ScreenKind, i64, Option<i64>)>,
        dependents: usize,
        suspended: Vec<(UserId, String, bool)>,
        deleted_users: Vec<(UserId, String)>,
        fail_user_actions: bool,
    }

    impl TestRuntime {
        fn classification(id: i64, name: &str) -> Row {
            Row::Classification(Classification {
                id: ClassificationId::new(id),
                classification: name.to_owned(),
                created_at: datetime!(2025-06-01 00:00:00 UTC),
            })
        }

        fn user(id: i64, username: &str, suspended: bool) -> Row {
            Row::User(User {
                id: UserId::new(id),
                username: username.to_owned(),
                email: format!("{username}@example.gov.ph"),
                first_name: "Test".to_owned(),
                last_name: "User".to_owned(),
                role: UserRole::Encoder,
                suspended,
                date_registered: datetime!(2025-06-01 00:00:00 UTC),
            })
        }
    }

    impl AppRuntime for TestRuntime {
        fn load_rows(&mut self, screen: ScreenKind, parent_key: Option<i64>) -> Result<Vec<Row>> {
            self.load_count += 1;
            Ok(match screen {
                ScreenKind::Classification => vec![
                    Self::classification(1, "RESIDENTIAL"),
                    Self::classification(2, "COMMERCIAL"),
                ],
                ScreenKind::Subclass => vec![Row::Subclass(Subclass {
                    id: SubclassId::new(10),
                    class_id: ClassificationId::new(parent_key.unwrap_or(0)),
                    barangay_id: None,
                    subclass: "R-1".to_owned(),
                    created_at: datetime!(2025-06-01 00:00:00 UTC),
                })],
                ScreenKind::User => vec![
                    Self::user(5, "encoder1", false),
                    Self::user(6, "encoder2", true),
                ],
                _ => Vec::new(),
            })
        }

        fn create_row(&mut self, payload: &FormPayload) -> Result<()> {
            self.created.push(payload.clone());
            Ok(())
        }

        fn update_row(&mut self, row_id: i64, payload: &FormPayload) -> Result<()> {
            self.updated.push((row_id, payload.clone()));
            Ok(())
        }

        fn delete_row(
            &mut self,
            screen: ScreenKind,
            row_id: i64,
            parent_key: Option<i64>,
        ) -> Result<()> {
            self.deleted.push((screen, row_id, parent_key));
            Ok(())
        }

        fn count_delete_dependents(&mut self, _screen: ScreenKind, _row_id: i64) -> Result<usize> {
            Ok(self.dependents)
        }

        fn set_user_suspended(
            &mut self,
            target: UserId,
            password: &str,
            suspend: bool,
        ) -> Result<()> {
            if self.fail_user_actions {
                bail!("incorrect password -- check the password and retry");
            }
            self.suspended.push((target, password.to_owned(), suspend));
            Ok(())
        }

        fn delete_user(&mut self, target: UserId, password: &str) -> Result<()> {
            if self.fail_user_actions {
                bail!("incorrect password -- check the password and retry");
            }
            self.deleted_users.push((target, password.to_owned()));
            Ok(())
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ready_app(runtime: &mut TestRuntime) -> App {
        let mut app = App::new(AppOptions::default());
        refresh_if_needed(&mut app, runtime);
        app
    }

    #[test]
    fn opening_the_console_fetches_the_first_screen() {
        let mut runtime = TestRuntime::default();
        let app = ready_app(&mut runtime);
        assert_eq!(runtime.load_count, 1);
        assert_eq!(app.pane().items.len(), 2);
        assert!(!app.pane().needs_refetch());
    }

    #[test]
    fn arrow_keys_select_rows_and_actions() {
        let mut runtime = TestRuntime::default();
        let mut app = ready_app(&mut runtime);
        let mut view_data = ViewData::default();

        handle_key_event(&mut app, &mut runtime, &mut view_data, key(KeyCode::Down));
        assert_eq!(app.pane().selected_id, Some(1));
        handle_key_event(&mut app, &mut runtime, &mut view_data, key(KeyCode::Down));
        assert_eq!(app.pane().selected_id, Some(2));
        handle_key_event(&mut app, &mut runtime, &mut view_data, key(KeyCode::Down));
        assert_eq!(app.pane().selected_id, Some(2));

        handle_key_event(&mut app, &mut runtime, &mut view_data, key(KeyCode::Right));
        assert_eq!(app.action_cursor, 1);
        handle_key_event(&mut app, &mut runtime, &mut view_data, key(KeyCode::Left));
        assert_eq!(app.action_cursor, 0);
    }

    #[test]
    fn search_typing_filters_and_esc_clears() {
        let mut runtime = TestRuntime::default();
        let mut app = ready_app(&mut runtime);
        let mut view_data = ViewData::default();

        handle_key_event(&mut app, &mut runtime, &mut view_data, key(KeyCode::Char('/')));
        assert!(view_data.searching);
        for c in "resi".chars() {
            handle_key_event(&mut app, &mut runtime, &mut view_data, key(KeyCode::Char(c)));
        }
        assert_eq!(app.pane().visible_rows().len(), 1);

        handle_key_event(&mut app, &mut runtime, &mut view_data, key(KeyCode::Esc));
        assert!(!view_data.searching);
        assert_eq!(app.pane().search_term, "resi");

        handle_key_event(&mut app, &mut runtime, &mut view_data, key(KeyCode::Esc));
        assert!(app.pane().search_term.is_empty());
        assert_eq!(app.pane().visible_rows().len(), 2);
    }

    #[test]
    fn guarded_delete_with_dependents_shows_blocked_notice() {
        let mut runtime = TestRuntime {
            dependents: 3,
            ..TestRuntime::default()
        };
        let mut app = ready_app(&mut runtime);
        let mut view_data = ViewData::default();

        app.pane_mut().select(1);
        // Cursor 2 is the delete action on the classification screen.
        app.action_cursor = 2;
        dispatch_action(&mut app, &mut runtime, &mut view_data);
        assert!(matches!(
            app.pane().confirm,
            DeleteConfirm::Blocked { dependents: 3, .. }
        ));
        assert!(runtime.deleted.is_empty());

        // Any key dismisses the notice.
        handle_key_event(&mut app, &mut runtime, &mut view_data, key(KeyCode::Enter));
        assert_eq!(app.pane().confirm, DeleteConfirm::Idle);
    }

    #[test]
    fn confirmed_delete_reaches_the_runtime_and_schedules_refetch() {
        let mut runtime = TestRuntime::default();
        let mut app = ready_app(&mut runtime);
        let mut view_data = ViewData::default();

        app.pane_mut().select(2);
        app.action_cursor = 2;
        dispatch_action(&mut app, &mut runtime, &mut view_data);
        assert!(matches!(
            app.pane().confirm,
            DeleteConfirm::Confirming { row_id: 2, .. }
        ));

        handle_confirm_key(&mut app, &mut runtime, key(KeyCode::Char('y')));
        assert_eq!(runtime.deleted, vec![(ScreenKind::Classification, 2, None)]);
        assert!(app.pane().needs_refetch());
    }

    #[test]
    fn cancelled_delete_touches_nothing() {
        let mut runtime = TestRuntime::default();
        let mut app = ready_app(&mut runtime);
        let mut view_data = ViewData::default();

        app.pane_mut().select(1);
        app.action_cursor = 2;
        dispatch_action(&mut app, &mut runtime, &mut view_data);
        handle_confirm_key(&mut app, &mut runtime, key(KeyCode::Char('n')));
        assert!(runtime.deleted.is_empty());
        assert_eq!(app.pane().confirm, DeleteConfirm::Idle);
        assert!(!app.pane().needs_refetch());
    }

    #[test]
    fn drill_opens_child_scope_and_esc_returns() {
        let mut runtime = TestRuntime::default();
        let mut app = ready_app(&mut runtime);
        let mut view_data = ViewData::default();

        app.pane_mut().select(1);
        // Cursor 3 is the subclass drill on the classification screen.
        app.action_cursor = 3;
        dispatch_action(&mut app, &mut runtime, &mut view_data);
        assert_eq!(app.stack.depth(), 2);
        assert_eq!(app.pane().screen, ScreenKind::Subclass);
        assert_eq!(app.pane().parent_key(), Some(1));

        refresh_if_needed(&mut app, &mut runtime);
        assert_eq!(app.pane().items.len(), 1);

        handle_key_event(&mut app, &mut runtime, &mut view_data, key(KeyCode::Esc));
        assert_eq!(app.stack.depth(), 1);
        assert_eq!(app.pane().screen, ScreenKind::Classification);
    }

    #[test]
    fn form_submit_creates_row_and_closes_overlay() {
        let mut runtime = TestRuntime::default();
        let mut app = ready_app(&mut runtime);
        let mut view_data = ViewData::default();

        app.action_cursor = 0;
        dispatch_action(&mut app, &mut runtime, &mut view_data);
        assert!(view_data.form.is_some());

        for c in "INDUSTRIAL".chars() {
            handle_form_key(&mut app, &mut runtime, &mut view_data, key(KeyCode::Char(c)));
        }
        handle_form_key(&mut app, &mut runtime, &mut view_data, key(KeyCode::Enter));

        assert!(view_data.form.is_none());
        assert_eq!(runtime.created.len(), 1);
        assert!(app.pane().needs_refetch());
    }

    #[test]
    fn invalid_form_stays_open_with_an_error() {
        let mut runtime = TestRuntime::default();
        let mut app = ready_app(&mut runtime);
        let mut view_data = ViewData::default();

        app.action_cursor = 0;
        dispatch_action(&mut app, &mut runtime, &mut view_data);
        // Empty classification name fails validation.
        handle_form_key(&mut app, &mut runtime, &mut view_data, key(KeyCode::Enter));

        assert!(view_data.form.is_some());
        assert!(runtime.created.is_empty());
        assert!(app.pane().notification.is_some());
        // The failed submit must not hold the mutation slot.
        assert!(app.pane_mut().begin_mutation());
    }

    #[test]
    fn suspend_prompts_for_password_and_forwards_it() {
        let mut runtime = TestRuntime::default();
        let mut app = ready_app(&mut runtime);
        app.switch_root(6); // users screen
        refresh_if_needed(&mut app, &mut runtime);
        let mut view_data = ViewData::default();

        app.pane_mut().select(5);
        app.action_cursor = 0;
        dispatch_action(&mut app, &mut runtime, &mut view_data);
        let prompt = view_data.password.as_ref().expect("password prompt opens");
        assert_eq!(
            prompt.action,
            CredentialAction::Suspend {
                target: UserId::new(5),
                suspend: true
            }
        );

        for c in "s3cret".chars() {
            handle_password_key(&mut app, &mut runtime, &mut view_data, key(KeyCode::Char(c)));
        }
        handle_password_key(&mut app, &mut runtime, &mut view_data, key(KeyCode::Enter));

        assert!(view_data.password.is_none());
        assert_eq!(
            runtime.suspended,
            vec![(UserId::new(5), "s3cret".to_owned(), true)]
        );
        assert!(app.pane().needs_refetch());
    }

    #[test]
    fn wrong_password_keeps_the_prompt_open() {
        let mut runtime = TestRuntime {
            fail_user_actions: true,
            ..TestRuntime::default()
        };
        let mut app = ready_app(&mut runtime);
        app.switch_root(6);
        refresh_if_needed(&mut app, &mut runtime);
        let mut view_data = ViewData::default();

        app.pane_mut().select(5);
        view_data.password = Some(PasswordPromptUiState {
            action: CredentialAction::Delete {
                target: UserId::new(5),
            },
            target_label: "encoder1".to_owned(),
            input: "wrong".to_owned(),
        });
        handle_password_key(&mut app, &mut runtime, &mut view_data, key(KeyCode::Enter));

        let prompt = view_data.password.as_ref().expect("prompt stays open");
        assert!(prompt.input.is_empty());
        assert!(runtime.deleted_users.is_empty());
        assert!(!app.pane().needs_refetch());
        // The failed attempt released the mutation slot.
        assert!(app.pane_mut().begin_mutation());
    }

    #[test]
    fn unsuspend_is_offered_for_suspended_users() {
        let mut runtime = TestRuntime::default();
        let mut app = ready_app(&mut runtime);
        app.switch_root(6);
        refresh_if_needed(&mut app, &mut runtime);
        let mut view_data = ViewData::default();

        app.pane_mut().select(6);
        app.action_cursor = 0;
        dispatch_action(&mut app, &mut runtime, &mut view_data);
        let prompt = view_data.password.as_ref().expect("password prompt opens");
        assert_eq!(
            prompt.action,
            CredentialAction::Suspend {
                target: UserId::new(6),
                suspend: false
            }
        );
    }

    #[test]
    fn structure_drill_from_kind_requires_building() {
        let mut runtime = TestRuntime::default();
        let mut app = App::new(AppOptions::default());
        app.switch_root(1); // kinds screen
        let ticket = app.pane_mut().begin_fetch();
        app.pane_mut().apply_fetch(
            ticket,
            Ok(vec![
                Row::Kind(Kind {
                    id: KindId::new(7),
                    description: "LAND".to_owned(),
                    created_at: datetime!(2025-06-01 00:00:00 UTC),
                }),
                Row::Kind(Kind {
                    id: KindId::new(8),
                    description: "BUILDING".to_owned(),
                    created_at: datetime!(2025-06-01 00:00:00 UTC),
                }),
            ]),
            std::time::Instant::now(),
        );
        let mut view_data = ViewData::default();

        app.pane_mut().select(7);
        app.action_cursor = 4; // manage structures
        dispatch_action(&mut app, &mut runtime, &mut view_data);
        assert_eq!(app.stack.depth(), 1);

        app.pane_mut().select(8);
        dispatch_action(&mut app, &mut runtime, &mut view_data);
        assert_eq!(app.stack.depth(), 2);
        assert_eq!(app.pane().screen, ScreenKind::Structure);
    }

    #[test]
    fn build_payload_parses_typed_fields() {
        let fields = vec![
            FormField {
                label: "description",
                value: "Galvanized iron".to_owned(),
            },
            FormField {
                label: "rate",
                value: "12.5".to_owned(),
            },
            FormField {
                label: "mode (percent/fixed)",
                value: "Percent".to_owned(),
            },
        ];
        let payload =
            build_payload(ScreenKind::BuildingSubComponent, Some(4), &fields).unwrap();
        let FormPayload::BuildingSubComponent(input) = payload else {
            panic!("expected sub-component payload");
        };
        assert_eq!(input.building_com_id.get(), 4);
        assert_eq!(input.rate, 12.5);
        assert!(input.percent);

        let bad = vec![
            FormField {
                label: "description",
                value: "Galvanized iron".to_owned(),
            },
            FormField {
                label: "rate",
                value: "not-a-number".to_owned(),
            },
            FormField {
                label: "mode (percent/fixed)",
                value: "percent".to_owned(),
            },
        ];
        assert!(build_payload(ScreenKind::BuildingSubComponent, Some(4), &bad).is_err());
    }

    #[test]
    fn edit_form_prefills_from_the_selected_row() {
        let row = TestRuntime::classification(3, "AGRICULTURAL");
        let fields = fields_from_row(&row);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].value, "AGRICULTURAL");

        for screen in ScreenKind::MENU {
            if screen == ScreenKind::User {
                continue;
            }
            assert_eq!(
                blank_fields(screen).len(),
                super::form_field_labels(screen).len()
            );
        }
    }

    #[test]
    fn table_headers_and_cells_stay_in_sync() {
        let samples = [
            TestRuntime::classification(1, "RESIDENTIAL"),
            TestRuntime::user(5, "encoder1", false),
        ];
        for row in samples {
            assert_eq!(row_cells(&row).len(), table_headers(row.screen()).len());
        }
    }

    #[test]
    fn status_line_prefers_the_notification() {
        let mut runtime = TestRuntime::default();
        let mut app = ready_app(&mut runtime);
        let view_data = ViewData::default();

        app.pane_mut().notify(
            "classification added",
            amilyar_app::Severity::Info,
            std::time::Instant::now(),
        );
        assert_eq!(status_line(&app, &view_data), "ok: classification added");
    }
}

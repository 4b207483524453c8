use std::sync::mpsc::Sender;
use std::thread;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::config::{Config, save_config};
use crate::context::AppContext;
use crate::domain::account::AccountStatus;
use crate::event::AppEvent;
use crate::terminal::state::{AppState, ConnectForm, Page, View};

/// Returns `true` when the user asked to quit.
pub fn handle_key(
    key: KeyEvent,
    state: &mut AppState,
    ctx: &AppContext,
    tx: &Sender<AppEvent>,
) -> Result<bool> {
    if state.form.is_some() {
        handle_form_keys(key, state, ctx, tx);
        return Ok(false);
    }
    if state.url_input.is_some() {
        handle_url_keys(key, state, ctx);
        return Ok(false);
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
        KeyCode::Char('1') => state.switch_page(ctx, Page::Dashboard),
        KeyCode::Char('2') => state.switch_page(ctx, Page::Accounts),
        KeyCode::Char('3') => state.switch_page(ctx, Page::Settings),
        KeyCode::Tab => state.switch_page(ctx, state.page.next()),
        KeyCode::Char('x') => state.notice = None,
        _ => match state.page {
            Page::Dashboard => {}
            Page::Accounts => handle_accounts_keys(key, state, ctx),
            Page::Settings => handle_settings_keys(key, state, ctx),
        },
    }
    Ok(false)
}

fn handle_accounts_keys(key: KeyEvent, state: &mut AppState, ctx: &AppContext) {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => state.move_selection(1),
        KeyCode::Up | KeyCode::Char('k') => state.move_selection(-1),
        KeyCode::Char('a') => state.form = Some(ConnectForm::default()),
        KeyCode::Char('d') => remove_selected(state, ctx),
        _ => {}
    }
}

fn remove_selected(state: &mut AppState, ctx: &AppContext) {
    let Some(row) = state.selected_row() else {
        return;
    };
    if row.status == AccountStatus::Connecting {
        state.error(format!("{} is still connecting", row.email));
        return;
    }
    // Rows that only exist locally go away without touching the store.
    if row.account.is_none() {
        state.pending.remove(&row.email);
        state.move_selection(0);
        return;
    }
    let Some(scope) = ctx.scope() else {
        return;
    };
    let Some(model) = state.accounts_model() else {
        return;
    };
    match ctx.accounts.remove(&scope, &model.accounts, &row.email) {
        Ok(()) => {
            state.pending.remove(&row.email);
            state.info(format!("Removed {}", row.email));
        }
        Err(e) => state.error(e.to_string()),
    }
}

fn handle_form_keys(
    key: KeyEvent,
    state: &mut AppState,
    ctx: &AppContext,
    tx: &Sender<AppEvent>,
) {
    let Some(form) = state.form.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => state.form = None,
        KeyCode::Tab | KeyCode::Down | KeyCode::Up => form.toggle_field(),
        KeyCode::Backspace => {
            form.active_mut().pop();
        }
        KeyCode::Char(c) => form.active_mut().push(c),
        KeyCode::Enter => {
            if let Some(form) = state.form.take() {
                submit_connect(form, state, ctx, tx);
            }
        }
        _ => {}
    }
}

fn submit_connect(
    form: ConnectForm,
    state: &mut AppState,
    ctx: &AppContext,
    tx: &Sender<AppEvent>,
) {
    let Some(scope) = ctx.scope() else {
        state.error("Still signing in, try again in a moment.");
        state.form = Some(form);
        return;
    };
    let email = form.email.trim().to_string();
    if state.pending.get(&email) == Some(&AccountStatus::Connecting) {
        state.error(format!("{email} is already connecting"));
        return;
    }
    state.pending.insert(email.clone(), AccountStatus::Connecting);
    state.notice = None;

    let accounts = ctx.accounts.clone();
    let tx = tx.clone();
    thread::spawn(move || {
        let result = accounts.connect(&scope, &email, &form.password);
        let _ = tx.send(AppEvent::ConnectFinished { email, result });
    });
}

fn handle_settings_keys(key: KeyEvent, state: &mut AppState, ctx: &AppContext) {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => state.move_settings_cursor(1),
        KeyCode::Up | KeyCode::Char('k') => state.move_settings_cursor(-1),
        KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Right => adjust_setting(state, ctx, 1),
        KeyCode::Char('-') | KeyCode::Left => adjust_setting(state, ctx, -1),
        KeyCode::Char(' ') => adjust_setting(state, ctx, 0),
        KeyCode::Char('e') => state.url_input = Some(ctx.backend.base_url()),
        _ => {}
    }
}

fn adjust_setting(state: &mut AppState, ctx: &AppContext, delta: i64) {
    let View::Settings(sync) = &state.view else {
        return;
    };
    let Some(scope) = ctx.scope() else {
        return;
    };
    let field = state.settings_field();
    let value = sync.model().settings.adjusted(field, delta);
    if let Err(e) = ctx.accounts.update_setting(&scope, field, value) {
        state.error(e.to_string());
    }
}

fn handle_url_keys(key: KeyEvent, state: &mut AppState, ctx: &AppContext) {
    let Some(input) = state.url_input.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => state.url_input = None,
        KeyCode::Backspace => {
            input.pop();
        }
        KeyCode::Char(c) => input.push(c),
        KeyCode::Enter => {
            let url = state.url_input.take().unwrap_or_default();
            let url = url.trim().to_string();
            if url.is_empty() {
                state.error("Backend URL cannot be empty.");
                return;
            }
            ctx.backend.set_base_url(url.clone());
            let cfg = Config {
                backend_base_url: url.clone(),
                ..ctx.config.clone()
            };
            match save_config(&cfg) {
                Ok(()) => state.info(format!("Backend URL set to {url}")),
                Err(e) => state.error(format!("Backend URL set for this session only: {e}")),
            }
        }
        _ => {}
    }
}

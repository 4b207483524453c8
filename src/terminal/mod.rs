pub mod events;
pub mod state;
pub mod style;
pub mod ui;

use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;

use crate::config::ConfigError;
use crate::context::AppContext;
use crate::event::{AppEvent, sync_sink};
use state::AppState;

const INPUT_POLL: Duration = Duration::from_millis(100);

/// Run the dashboard until the user quits. A context that failed to build
/// gets a static error page instead.
pub fn run_tui(ctx: Result<AppContext, ConfigError>) -> Result<()> {
    let terminal = ratatui::init();
    let result = match &ctx {
        Ok(ctx) => run(terminal, ctx),
        Err(err) => run_error_page(terminal, err),
    };
    ratatui::restore();
    result
}

fn run(mut terminal: DefaultTerminal, ctx: &AppContext) -> Result<()> {
    let (tx, rx) = mpsc::channel::<AppEvent>();
    let mut state = AppState::new(ctx, sync_sink(tx.clone()));
    ctx.start_sign_in(tx.clone());

    let poll_every = Duration::from_millis(ctx.config.poll_interval_ms.max(50));
    let mut last_poll = Instant::now();

    let result = loop {
        while let Ok(ev) = rx.try_recv() {
            state.apply_event(ctx, ev);
        }

        if let Err(e) = terminal.draw(|f| ui::render(f, &state, ctx)) {
            break Err(e.into());
        }

        match event::poll(INPUT_POLL) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    match events::handle_key(key, &mut state, ctx, &tx) {
                        Ok(true) => break Ok(()),
                        Ok(false) => {}
                        Err(e) => break Err(e),
                    }
                }
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            },
            Ok(false) => {}
            Err(e) => break Err(e.into()),
        }

        if last_poll.elapsed() >= poll_every {
            last_poll = Instant::now();
            if let Err(e) = ctx.store.poll_external_changes() {
                log::warn!("checking for outside changes failed: {e}");
            }
        }
    };

    state.unmount();
    result
}

fn run_error_page(mut terminal: DefaultTerminal, err: &ConfigError) -> Result<()> {
    log::error!("startup failed: {err}");
    loop {
        terminal.draw(|f| ui::render_config_error(f, err))?;
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press
                && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
            {
                return Ok(());
            }
        }
    }
}

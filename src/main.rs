use airglass_tui::{
    api::OpenWeatherClient,
    app::App,
    config::Config,
    dispatch::Dispatcher,
    events::EventHandler,
    location::IpGeolocator,
    logging, ui,
};
use color_eyre::Result;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Instrumentation and safety
    let _log_guard = logging::initialize_logging();
    install_panic_hook();
    color_eyre::install()?;

    let config = Config::load();
    let client = Arc::new(OpenWeatherClient::new(config.api.clone())?);
    let locator = Arc::new(IpGeolocator::new(config.location.clone()));

    // Ready terminal and state
    let mut terminal = setup_terminal()?;
    let mut app = App::new(&config);
    let mut events = EventHandler::new(config.ui.tick_rate_ms);
    let dispatcher = Dispatcher::new(client.clone(), client, locator, events.tx.clone());

    dispatcher.dispatch_all(app.startup());

    // Main loop
    while !app.should_quit {
        terminal.draw(|f| ui::render(f, &app))?;

        if let Some(event) = events.next().await {
            dispatcher.dispatch_all(app.handle_event(event));
        }
    }

    restore_terminal(terminal)?;
    info!("Shut down cleanly.");
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), crossterm::terminal::LeaveAlternateScreen, crossterm::cursor::Show)?;
    Ok(())
}

fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Force terminal cleanup!
        crossterm::terminal::disable_raw_mode().ok();
        crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen, crossterm::cursor::Show).ok();
        original_hook(panic_info);
    }));
}

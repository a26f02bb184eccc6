mod api;
mod config;
mod dashboard;
mod logging;
mod models;
mod preferences;
mod tui;

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use api::DashboardClient;
use config::Config;
use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
use tui::App;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--init") {
        let path = Config::generate_default()?;
        println!("Generated config file at: {}", path.display());
        println!("Edit it with your API URL, token, GitHub login and course ids.");
        return Ok(());
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("student-dashboard — A terminal student dashboard");
        println!();
        println!("USAGE:");
        println!("  student-dashboard                     Start the TUI");
        println!("  student-dashboard --course <id>       Open a specific course");
        println!("  student-dashboard --student <login>   Show another student's dashboard");
        println!("  student-dashboard --init              Generate a default config file");
        println!();
        println!("CONFIG:");
        println!("  File: ~/.config/student-dashboard/config.toml");
        println!("  Or set env vars: DASHBOARD_API_URL, DASHBOARD_API_TOKEN,");
        println!("                   DASHBOARD_GITHUB_ID and DASHBOARD_COURSE_IDS");
        println!("  Logs: ~/.cache/student-dashboard/dashboard.log (STUDENT_DASHBOARD_LOG=debug)");
        println!();
        println!("KEYBINDINGS:");
        println!("  Tab / Shift+Tab   Switch course");
        println!("  + / -             Show more / fewer upcoming events");
        println!("  i                 Send repository invite");
        println!("  r                 Refresh");
        println!("  q / Ctrl+C        Quit");
        return Ok(());
    }

    let log_path = logging::init();

    let mut config = Config::load().with_context(|| {
        "Failed to load configuration.\n\
         Run `student-dashboard --init` to generate a config file,\n\
         or set the DASHBOARD_* environment variables."
    })?;
    if let Some(course) = flag_value(&args, "--course") {
        let course_id = course
            .parse::<u64>()
            .with_context(|| format!("Invalid course id: {course}"))?;
        config.select_course(course_id);
    }
    if let Some(student) = flag_value(&args, "--student") {
        config.github_id = student.to_string();
    }

    match &log_path {
        Ok(path) => tracing::info!(log = %path.display(), api = %config.api_url, "starting"),
        Err(e) => eprintln!("Logging disabled: {e:#}"),
    }

    let client = DashboardClient::new(&config.api_url, &config.api_token)?;
    let preferences: Box<dyn PreferenceStore> = match FilePreferenceStore::open_default() {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!("preferences will not be saved: {e:#}");
            Box::new(MemoryPreferenceStore::default())
        }
    };
    let app = App::new(Arc::new(client), preferences, config.github_id, config.course_ids);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        tracing::error!("exited with error: {e:#}");
        eprintln!("Error: {e:#}");
    }

    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
) -> Result<()> {
    app.start_fetch();

    loop {
        app.frame_count = app.frame_count.wrapping_add(1);
        app.expire_notification(Instant::now());
        terminal.draw(|f| tui::ui::render(f, &app))?;

        if let Some(Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        })) = tui::event::poll_event(Duration::from_millis(100))?
        {
            tui::event::handle_key(&mut app, code, modifiers);
        }

        if !app.running {
            break;
        }

        // Apply completed fetch/invite results without blocking.
        app.poll_fetch_result();
        app.poll_invite_result();

        if app.needs_refresh {
            app.needs_refresh = false;
            app.start_fetch();
        }
    }

    Ok(())
}

// Squad assistant entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Load the reference dataset (degrades to empty)
// 4. Open the session store
// 5. Create mpsc channels and the app state
// 6. Spawn app logic and render tasks
// 7. Read console commands from stdin until quit or EOF
// 8. Cleanup on exit

use std::path::Path;
use std::sync::Arc;

use squad_assistant::app;
use squad_assistant::config;
use squad_assistant::console::{self, Input};
use squad_assistant::llm;
use squad_assistant::protocol::UserCommand;
use squad_assistant::reference;
use squad_assistant::session;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Squad assistant starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: model={}, default budget {} coins",
        config.llm.model, config.session.default_coins
    );

    // 3. Reference dataset
    let reference = Arc::new(reference::load_or_empty(Path::new(&config.data.reference)));

    // 4. Session store
    let store = session::SqliteStore::open(&config.session.database_path)
        .context("failed to open session store")?;
    info!("Session store opened at {}", config.session.database_path);

    // 5. Channels and state
    let (llm_tx, llm_rx) = mpsc::channel(256);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, mut ui_rx) = mpsc::channel(256);

    let llm_client = llm::client::LlmClient::from_config(&config);
    match &llm_client {
        llm::client::LlmClient::Active(_) => info!("LLM client initialized (API key configured)"),
        llm::client::LlmClient::Disabled => info!("LLM client disabled (no API key)"),
    }

    let app_state = app::AppState::new(config, reference, llm_client, llm_tx, Arc::new(store));

    // 6. Spawn app logic and rendering
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(llm_rx, cmd_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    let render_handle = tokio::spawn(async move {
        while let Some(update) = ui_rx.recv().await {
            println!("{}", console::render(&update));
        }
    });

    println!("Squad assistant. Type `help` for commands.");

    // Pick up where the last session left off.
    let _ = cmd_tx.send(UserCommand::RestoreSession).await;

    // 7. Console input loop
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };
        match console::parse_command(&line) {
            Ok(Input::Empty) => {}
            Ok(Input::Help) => println!("{}", console::HELP),
            Ok(Input::Command(UserCommand::Quit)) => break,
            Ok(Input::Command(cmd)) => {
                if cmd_tx.send(cmd).await.is_err() {
                    error!("Application loop has stopped");
                    break;
                }
            }
            Err(e) => println!("{e}"),
        }
    }

    // 8. Cleanup: stop the app task, then let the renderer drain.
    let _ = cmd_tx.send(UserCommand::Quit).await;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
        let _ = render_handle.await;
    })
    .await;

    info!("Squad assistant shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (the terminal belongs to the console).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("squad-assistant.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("squad_assistant=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

use anyhow::{Context, Result};
use emondc_ui::{
    App, AppConfig, HttpDeviceClient,
    resources::status::full_mode,
    state::Record,
};
use env_logger::{Builder, Env, Target};
use log::{debug, error, info, warn};
use std::{io::Write, sync::Arc};
use tokio::{
    signal::unix::{SignalKind, signal},
    sync::watch,
    task::JoinHandle,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("application error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    initialize();

    let config = AppConfig::load().context("failed to load configuration")?;
    let base_url = config.device.base_url();
    info!("device: {base_url}");

    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    let client = Arc::new(
        HttpDeviceClient::new(base_url).context("failed to create device client")?,
    );
    let app = App::new(client, &config);
    let renderers = render(&app);

    app.start().await;
    info!("polling started");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            debug!("ctrl-c received");
        },
        _ = sigterm.recv() => {
            debug!("SIGTERM received");
        },
    }

    app.stop();
    for renderer in renderers {
        renderer.abort();
    }

    info!("good bye");
    Ok(())
}

fn initialize() {
    log_panics::init();

    let mut builder = if cfg!(debug_assertions) {
        Builder::from_env(Env::default().default_filter_or("debug"))
    } else {
        Builder::from_env(Env::default().default_filter_or("info"))
    };

    builder.format(|f, record| match record.level() {
        log::Level::Error => {
            eprintln!("{}", record.args());
            Ok(())
        }
        _ => {
            writeln!(f, "{}", record.args())
        }
    });

    builder.target(Target::Stdout).init();

    info!("module version: {}", env!("CARGO_PKG_VERSION"));
}

/// Log output stands in for a rendering layer: every watched container is
/// printed when it changes
fn render(app: &App<HttpDeviceClient>) -> Vec<JoinHandle<()>> {
    let model = app.model();

    vec![
        print_changes(model.status.state().subscribe(), |status: &Record| {
            let mode = status.get("mode").and_then(|mode| mode.as_str()).unwrap_or_default();
            format!("status: {}", full_mode(mode))
        }),
        print_changes(model.last.state().subscribe(), |values| {
            let values: Vec<String> = values
                .iter()
                .map(|value| format!("{}={}", value.key, value.value))
                .collect();
            format!("last values: {}", values.join(" "))
        }),
        print_changes(model.logs.state().subscribe(), |book| {
            match book.entries.last() {
                Some(entry) => format!("log {}: {}", entry.timestamp, entry.log),
                None => "log: empty".to_string(),
            }
        }),
        print_changes(model.storage.state().subscribe(), |listing| {
            format!("storage {}: {} files", listing.dir, listing.visible.len())
        }),
        print_changes(model.notice.subscribe(), |notice| match notice {
            Some(notice) => format!("notice: {notice}"),
            None => "notice cleared".to_string(),
        }),
    ]
}

fn print_changes<T, F>(mut rx: watch::Receiver<T>, describe: F) -> JoinHandle<()>
where
    T: Send + Sync + 'static,
    F: Fn(&T) -> String + Send + 'static,
{
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let line = describe(&rx.borrow_and_update());
            info!("{line}");
        }
        warn!("state container closed");
    })
}

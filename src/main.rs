use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use tabrail_wm::common::config::{self, Config};
use tabrail_wm::common::geometry::Rect;
use tabrail_wm::group::BoundsPolicy;
use tabrail_wm::group::properties::JsonPropertyStore;
use tabrail_wm::model::Desktop;
use tabrail_wm::sys::simulation::SimServer;
use tabrail_wm::sys::window_server::WindowSpec;
use tabrail_wm::window::WindowIdentity;
use tabrail_wm::{actor, sys};

#[derive(Parser)]
#[command(name = "tabrail", about = "Window tab-grouping daemon")]
struct Args {
    /// Config file; defaults to the platform config directory.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Tab property persistence file; defaults next to the config.
    #[arg(long)]
    properties: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
        .init();

    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(config::default_path);
    let config = Config::load(&config_path)?;
    let properties_path = args
        .properties
        .unwrap_or_else(|| config_path.with_file_name("tab-properties.json"));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building runtime")?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, run(config, properties_path))
}

async fn run(config: Config, properties_path: PathBuf) -> anyhow::Result<()> {
    let (server, handle, control) = SimServer::new();
    // windows live in other processes in a real deployment; make the
    // simulated ones a little slow too
    control.set_latency(Some(std::time::Duration::from_millis(2)));
    actor::spawn(server.run());

    let store = Rc::new(JsonPropertyStore::open(properties_path));
    let desktop = Desktop::new(config, handle, store);
    let (_events_tx, events_rx) = actor::channel::<sys::window_server::ServerEvent>();
    actor::spawn(desktop.clone().run(events_rx));

    desktop
        .signals
        .group_created
        .subscribe(|group| info!(group = %group.id(), "group created"));
    desktop
        .signals
        .group_destroyed
        .subscribe(|group| info!(group = %group.id(), "group destroyed"));

    // No real window manager is attached yet; drive a short scripted
    // session against the simulated backend so the engine has something to
    // coordinate.
    demo(&desktop).await
}

async fn demo(desktop: &Rc<Desktop>) -> anyhow::Result<()> {
    let editor = desktop
        .create_window(app_window("editor", Rect::from_extent(0.0, 0.0, 200.0, 200.0)))
        .await?;
    let terminal = desktop
        .create_window(app_window("terminal", Rect::from_extent(300.0, 0.0, 200.0, 200.0)))
        .await?;

    let group = desktop.create_tab_group().await?;
    group.add_tabs(&[editor.clone(), terminal.clone()], Some(terminal.id())).await?;
    info!(bounds = ?group.bounds(), members = group.member_count(), "windows combined");

    group.switch_tab(&editor).await?;
    group.toggle_maximize().await?;
    info!(bounds = ?group.bounds(), "maximized");
    group.restore().await?;

    group.remove_tab(&terminal, BoundsPolicy::Restore).await?;
    info!(groups = desktop.group_count(), "session finished");
    Ok(())
}

fn app_window(name: &str, frame: Rect) -> WindowSpec {
    WindowSpec {
        identity: WindowIdentity::new("demo", name),
        frame,
        frame_decorated: true,
        hidden: false,
        title: name.to_string(),
    }
}

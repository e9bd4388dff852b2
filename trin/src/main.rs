//! Minimal node bootstrap: owns the ContentDB for the node's lifetime.
//! The Discovery v5 / Portal wire layer that actually drives the store
//! through `ContentHandlers` is out of scope for this crate.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use discv5::enr::NodeId;
use structopt::StructOpt;

use trin_core::portalnet::storage::config::PortalStorageConfig;
use trin_core::portalnet::storage::radius::RadiusConfig;
use trin_core::portalnet::storage::PortalStorage;
use trin_core::utils::get_data_dir;

#[derive(Debug, StructOpt)]
#[structopt(name = "trin", about = "Portal History Network content database bootstrap")]
struct Opt {
    /// Defaults to the platform data directory when omitted.
    #[structopt(long, parse(from_os_str))]
    data_dir: Option<PathBuf>,

    #[structopt(long, default_value = "1024")]
    storage_capacity_mb: u64,

    /// Fixes the radius at `2^n - 1` instead of letting it shrink with use.
    #[structopt(long)]
    static_log_radius: Option<u16>,

    /// Disables SQLite's automatic WAL checkpointing in favor of explicit
    /// `force_prune` / `checkpoint` calls on a maintenance schedule.
    #[structopt(long)]
    manual_checkpoint: bool,
}

fn main() {
    env_logger::init();
    let opt = Opt::from_args();

    let data_dir = opt.data_dir.unwrap_or_else(get_data_dir);
    std::fs::create_dir_all(&data_dir).expect("failed to create data directory");

    let radius_config = match opt.static_log_radius {
        Some(log_radius) => RadiusConfig::Static { log_radius },
        None => RadiusConfig::Dynamic,
    };

    let config = PortalStorageConfig {
        path: Some(data_dir.join("trin_content.sqlite3")),
        in_memory: false,
        storage_capacity_bytes: opt.storage_capacity_mb * 1024 * 1024,
        radius_config,
        local_id: NodeId::random(),
        manual_checkpoint: opt.manual_checkpoint,
        protocol_id: "history".to_string(),
    };

    let storage = Arc::new(Mutex::new(
        PortalStorage::new(config).expect("invalid content database configuration"),
    ));

    {
        let guard = storage.lock().unwrap();
        log::info!(
            "content database opened: {} bytes on disk, radius = {:#x}",
            guard.size(),
            guard.radius()
        );
    }

    let shutdown_storage = storage.clone();
    ctrlc::set_handler(move || {
        log::info!("signal received, closing content database");
        if let Ok(guard) = shutdown_storage.lock() {
            log::info!("content database held {} entries at shutdown", guard.content_count());
        }
        std::process::exit(0);
    })
    .expect("failed to install signal handler");

    // The wire layer would drive `storage` through `ContentHandlers` from
    // here for the lifetime of the node; it is out of scope for this crate.
}

//! Command line configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use localvol::DriverConfig;

/// How the daemon is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// HTTP over TCP, advertised with a plain `.spec` file.
    Tcp,
    /// HTTP over TCP, advertised with a `.json` spec file.
    TcpJson,
    /// HTTP over a unix domain socket at the listen address.
    Unix,
}

/// localvold - local filesystem volume plugin
#[derive(Parser, Debug)]
#[command(name = "localvold")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// host:port to serve volume management functions on (socket path for unix)
    #[arg(long, env = "LOCALVOL_LISTEN_ADDR", default_value = "0.0.0.0:9750")]
    pub listen_addr: String,

    /// Transport protocol to carry HTTP over
    #[arg(long, value_enum, default_value_t = Transport::Tcp)]
    pub transport: Transport,

    /// Directory to write the driver spec file into
    #[arg(long, env = "LOCALVOL_DRIVERS_PATH")]
    pub drivers_path: Option<PathBuf>,

    /// Directory where local volumes are created
    #[arg(long, env = "LOCALVOL_MOUNT_DIR", default_value = "/tmp/volumes")]
    pub mount_dir: PathBuf,

    /// Treat volume names as unique volume ids (tcp-json only)
    #[arg(long)]
    pub unique_volume_ids: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl Args {
    /// Whether unique volume ids are in effect.
    ///
    /// Only the JSON spec file can advertise them, so other transports
    /// ignore the flag.
    #[must_use]
    pub fn unique_volume_ids_enabled(&self) -> bool {
        self.unique_volume_ids && self.transport == Transport::TcpJson
    }

    /// Driver configuration derived from the flags.
    #[must_use]
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig::default()
            .with_mount_root(&self.mount_dir)
            .with_unique_volume_ids(self.unique_volume_ids_enabled())
    }
}

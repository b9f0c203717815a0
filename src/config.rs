//! CLI arguments and server configuration defaults.

use clap::Parser;
use shadow_rs::formatcp;

use crate::build;

const VERSION_INFO: &str = formatcp!(
    r#"{}
commit_hash: {}
build_time: {}
build_env: {},{}"#,
    build::PKG_VERSION,
    build::SHORT_COMMIT,
    build::BUILD_TIME,
    build::RUST_VERSION,
    build::RUST_CHANNEL
);

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_STORAGE_DIR: &str = "./uploads";
pub const DEFAULT_STATIC_DIR: &str = "./static";
/// Ceiling for one whole multipart request body.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Upload limits handed to the ingestion handler.
#[derive(Debug)]
pub struct UploadLimits {
    pub max_bytes: usize,
}

/// CLI arguments and environment configuration for the server.
#[derive(Parser, Debug)]
#[command(name = "lan-drop", version = VERSION_INFO, about = "LAN file upload server")]
pub struct Args {
    #[arg(
        short = 's',
        long,
        env = "LAN_DROP_STORAGE_DIR",
        default_value = DEFAULT_STORAGE_DIR,
        help = "Directory where uploaded files are stored"
    )]
    pub storage_dir: String,
    #[arg(
        long,
        env = "LAN_DROP_STATIC_DIR",
        default_value = DEFAULT_STATIC_DIR,
        help = "Directory served under /static"
    )]
    pub static_dir: String,
    #[arg(
        short = 'b',
        long,
        env = "LAN_DROP_BIND",
        default_value = "0.0.0.0",
        help = "Bind address"
    )]
    pub bind: String,
    #[arg(
        short = 'p',
        long,
        env = "LAN_DROP_PORT",
        default_value_t = DEFAULT_PORT,
        help = "HTTP port"
    )]
    pub port: u16,
    #[arg(
        long,
        env = "LAN_DROP_MAX_UPLOAD_BYTES",
        default_value_t = DEFAULT_MAX_UPLOAD_BYTES,
        help = "Max multipart request body size in bytes"
    )]
    pub max_upload_bytes: usize,
}

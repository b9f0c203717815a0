//! lan-drop server binary.
//!
//! A small LAN file-drop server: serves a browser upload form, ingests
//! multipart uploads into a local storage directory under generated
//! unique names, and serves the stored files back. The entry point wires
//! configuration, logging, the axum router and the listener.

mod atomic;
mod config;
mod error;
mod logging;
mod pages;
mod retrieve;
mod storage;
mod upload;

use axum::Router;
use axum::extract::connect_info::ConnectInfo;
use axum::extract::{DefaultBodyLimit, Extension};
use axum::http::Request;
use axum::routing::{get, post};
use clap::Parser;
use shadow_rs::shadow;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, info, info_span};

use crate::config::{Args, UploadLimits};
use crate::storage::Storage;

shadow!(build);

/// Starts the lan-drop server and blocks until shutdown.
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    logging::init_logging();

    let args = Args::parse();
    let storage = Arc::new(Storage::new(PathBuf::from(&args.storage_dir)));
    let limits = Arc::new(UploadLimits {
        max_bytes: args.max_upload_bytes,
    });

    if let Err(err) = storage.ensure_ready().await {
        error!(storage_dir = %args.storage_dir, %err, "storage directory unavailable");
        std::process::exit(1);
    }

    let app = Router::new()
        .route("/", get(pages::home))
        .route(
            "/upload",
            post(upload::upload_file)
                .fallback(upload::upload_redirect)
                .layer(DefaultBodyLimit::max(args.max_upload_bytes)),
        )
        .route("/uploads/{*path}", get(retrieve::serve_upload))
        .route_service("/test", ServeFile::new("test_ios.html"))
        .nest_service("/static", ServeDir::new(&args.static_dir))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let forwarded_ip = request
                        .headers()
                        .get("x-forwarded-for")
                        .and_then(|v| v.to_str().ok())
                        .map(|s| s.split(',').next().unwrap_or("").trim().to_string());
                    let connect_ip = request
                        .extensions()
                        .get::<ConnectInfo<SocketAddr>>()
                        .map(|ConnectInfo(addr)| addr.to_string());
                    let client_ip = forwarded_ip
                        .or(connect_ip)
                        .unwrap_or_else(|| "unknown".to_string());

                    info_span!(
                        env!("CARGO_CRATE_NAME"),
                        client_ip,
                        method = ?request.method(),
                        path = ?request.uri().path(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .layer(Extension(storage))
        .layer(Extension(limits));

    let host = args
        .bind
        .parse::<IpAddr>()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string()))?;
    let addr = SocketAddr::new(host, args.port);
    let listener = TcpListener::bind(addr).await.inspect_err(|err| {
        error!(%addr, %err, "could not bind listener");
    })?;

    let lan_ip = local_ip()
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "localhost".to_string());
    info!("upload page: http://localhost:{}/", args.port);
    info!("LAN address: http://{}:{}/", lan_ip, args.port);
    info!("open the LAN address from a phone or tablet on the same network");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

/// Best-effort LAN address discovery. A connected UDP socket sends no
/// traffic, but the OS picks the outbound interface for it.
fn local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket.local_addr().ok().map(|addr| addr.ip())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("received termination signal, shutting down");
}

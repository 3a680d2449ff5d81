//! Echo conversation over an in-process network.
//!
//! Starts an echo server node, opens a client and performs typed `echo`
//! RPCs against it, logging each reply:
//!
//!   cargo run -p tether-demo-echo -- --count 5
//!   RUST_LOG=tether_client=debug cargo run -p tether-demo-echo -- --config client.toml

mod server;

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tether_client::{Client, ClientOptions, Error, RpcRegistry, Shape, TypedRpc};
use tether_core::{MemNetwork, NodeId};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tether-echo", about = "Typed echo RPCs against an in-process server")]
struct Args {
    /// Number of echo calls to make.
    #[arg(long, default_value_t = 3)]
    count: usize,

    /// Per-call timeout; overrides the config file.
    #[arg(long, env = "TETHER_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Client options in TOML.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Server drops every nth request, to show timeouts.
    #[arg(long)]
    drop_every: Option<usize>,
}

#[derive(Serialize)]
struct Echo {
    msg: String,
}

#[derive(Debug, Deserialize)]
struct EchoOk {
    msg: String,
    in_reply_to: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tether_echo=info".parse()?))
        .init();

    let args = Args::parse();
    let mut options = match &args.config {
        Some(path) => ClientOptions::load(path)?,
        None => ClientOptions::default(),
    };
    if let Some(ms) = args.timeout_ms {
        options = options.with_timeout(Duration::from_millis(ms));
    }

    let net = Arc::new(MemNetwork::new());
    let server = server::spawn(net.clone(), NodeId::server(1), args.drop_every)?;

    let registry = RpcRegistry::new();
    let echo = TypedRpc::builder("echo")
        .doc("Clients send `echo` messages containing a `msg`; servers reply with the same `msg` in an `echo_ok`.")
        .request(
            Shape::object()
                .required("type", Shape::literal("echo"))
                .required("msg", Shape::String),
        )
        .response(
            Shape::object()
                .required("type", Shape::literal("echo_ok"))
                .required("msg", Shape::String),
        )
        .registry(&registry)
        .build()?;

    for definition in registry.definitions() {
        tracing::info!("rpc {} ({}): {}", definition.name, definition.kind, definition.doc);
    }

    let client = Client::open(net.clone(), options)?;
    tracing::info!("Client {} talking to {}", client.node_id(), server.id());

    for i in 0..args.count {
        let request = Echo {
            msg: format!("hello #{i}"),
        };
        match echo.call_as::<_, EchoOk>(&client, server.id(), &request) {
            Ok(reply) => tracing::info!("{} (reply to {})", reply.msg, reply.in_reply_to),
            Err(Error::Rpc(e)) => tracing::warn!("call {} failed: {} (definite: {})", i, e, e.definite),
            Err(e) => return Err(e.into()),
        }
    }

    client.close();
    server.shutdown();
    Ok(())
}

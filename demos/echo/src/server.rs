//! Echo server node.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tether_core::{Body, MemNetwork, Message, NetError, Network, NodeId};

pub struct EchoServer {
    id: NodeId,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl EchoServer {
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn shutdown(self) {
        self.stop.store(true, Ordering::SeqCst);
        if self.handle.join().is_err() {
            tracing::warn!("echo server panicked");
        }
    }
}

pub fn spawn(
    net: Arc<MemNetwork>,
    id: NodeId,
    drop_every: Option<usize>,
) -> Result<EchoServer, NetError> {
    net.add_node(&id)?;
    let stop = Arc::new(AtomicBool::new(false));

    let handle = {
        let (id, stop) = (id.clone(), stop.clone());
        thread::spawn(move || {
            let mut handled = 0usize;
            while !stop.load(Ordering::SeqCst) {
                let request = match net.recv(&id, Duration::from_millis(50)) {
                    Ok(Some(request)) => request,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::warn!("Server {} stopped: {}", id, e);
                        break;
                    }
                };
                handled += 1;
                if drop_every.is_some_and(|n| n > 0 && handled % n == 0) {
                    tracing::info!("Dropping request {:?}", request.body.msg_id());
                    continue;
                }
                if let Err(e) = net.send(request.reply(respond(&request))) {
                    tracing::warn!("Reply to {} failed: {}", request.src, e);
                }
            }
            net.remove_node(&id);
        })
    };

    Ok(EchoServer { id, stop, handle })
}

fn respond(request: &Message) -> Body {
    match request.body.kind() {
        Some("echo") => {
            let mut body = Body::reply_to(&request.body, "echo_ok");
            if let Some(msg) = request.body.get("msg") {
                body.insert("msg", msg.clone());
            }
            body
        }
        other => {
            tracing::debug!("Unsupported request type {:?}", other);
            let mut body = Body::error(10, format!("unsupported: {other:?}"));
            if let Some(id) = request.body.msg_id() {
                body.set_in_reply_to(id);
            }
            body
        }
    }
}

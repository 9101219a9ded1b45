use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Text channel to the relay. Dropping `outbound` or the socket closing
/// ends both pump tasks; `inbound` then yields `None`.
pub struct RelayConnection {
    pub outbound: UnboundedSender<String>,
    pub inbound: UnboundedReceiver<String>,
    send_task: JoinHandle<()>,
    recv_task: JoinHandle<()>,
}

impl RelayConnection {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let (stream, _) = connect_async(url)
            .await
            .with_context(|| format!("failed to connect to relay at {url}"))?;
        let (mut sink, mut source) = stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel::<String>();

        let send_task = tokio::spawn(async move {
            while let Some(payload) = outbound_rx.recv().await {
                if let Err(error) = sink.send(Message::Text(payload)).await {
                    tracing::warn!(%error, "relay send failed");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let recv_task = tokio::spawn(async move {
            while let Some(result) = source.next().await {
                let message = match result {
                    Ok(message) => message,
                    Err(error) => {
                        tracing::warn!(%error, "relay receive failed");
                        break;
                    }
                };
                match message {
                    Message::Text(text) => {
                        if inbound_tx.send(text).is_err() {
                            break;
                        }
                    }
                    Message::Close(frame) => {
                        tracing::info!(?frame, "relay closed the connection");
                        break;
                    }
                    _ => {}
                }
            }
        });

        tracing::info!(url, "connected to relay");
        Ok(Self {
            outbound,
            inbound,
            send_task,
            recv_task,
        })
    }
}

impl Drop for RelayConnection {
    fn drop(&mut self) {
        self.send_task.abort();
        self.recv_task.abort();
    }
}

//! WebSocket client for end-to-end gateway tests.

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// How long `next_event` waits before failing the test.
pub const WS_EVENT_TIMEOUT: Duration = Duration::from_secs(2);

/// A client speaking `{"event", "data"}` frames.
pub struct WsTestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    /// Connection id from the `connected` frame.
    pub id: String,
}

impl WsTestClient {
    /// Connect and consume the `connected` frame.
    ///
    /// # Panics
    ///
    /// Panics if the handshake fails or the first frame is not `connected`.
    pub async fn connect(url: &str) -> Self {
        let (stream, _) = connect_async(url).await.expect("WebSocket handshake failed");
        let mut client = Self {
            stream,
            id: String::new(),
        };

        let connected = client.expect_event("connected").await;
        client.id = connected["id"]
            .as_str()
            .expect("connected frame should carry an id")
            .to_string();
        client
    }

    /// Send one event.
    ///
    /// # Panics
    ///
    /// Panics if the socket write fails.
    pub async fn send(&mut self, event: &str, data: Value) {
        self.send_raw(&json!({ "event": event, "data": data }).to_string())
            .await;
    }

    /// Send an arbitrary text frame.
    ///
    /// # Panics
    ///
    /// Panics if the socket write fails.
    pub async fn send_raw(&mut self, text: &str) {
        self.stream
            .send(Message::text(text.to_string()))
            .await
            .expect("WebSocket send failed");
    }

    /// Next text frame as `(event, data)`. Control frames are skipped.
    ///
    /// # Panics
    ///
    /// Panics on timeout, close, or a frame that is not an event.
    pub async fn next_event(&mut self) -> (String, Value) {
        loop {
            let message = tokio::time::timeout(WS_EVENT_TIMEOUT, self.stream.next())
                .await
                .expect("no frame before timeout")
                .expect("socket closed")
                .expect("socket read failed");

            if let Message::Text(text) = message {
                let mut frame: Value =
                    serde_json::from_str(text.as_str()).expect("frame should be JSON");
                let event = frame["event"]
                    .as_str()
                    .expect("frame should name an event")
                    .to_string();
                return (event, frame["data"].take());
            }
        }
    }

    /// Next event, checked by name. Returns its data.
    ///
    /// # Panics
    ///
    /// Panics if the next event has a different name.
    pub async fn expect_event(&mut self, name: &str) -> Value {
        let (event, data) = self.next_event().await;
        assert_eq!(event, name, "unexpected event with data {data}");
        data
    }

    /// Wait for the server to close the socket and return the close code.
    ///
    /// # Panics
    ///
    /// Panics if no close frame arrives in time.
    pub async fn expect_close(&mut self) -> Option<u16> {
        loop {
            let message = tokio::time::timeout(WS_EVENT_TIMEOUT, self.stream.next())
                .await
                .expect("no close before timeout");
            match message {
                Some(Ok(Message::Close(frame))) => return frame.map(|f| u16::from(f.code)),
                Some(Ok(_)) => {}
                Some(Err(_)) | None => return None,
            }
        }
    }

    /// Close the socket from the client side.
    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}

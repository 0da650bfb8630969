//! IPC client implementation

use std::path::Path;
use thermo_api::{Command, Event, Request, Response, ResponseResult};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};

use crate::{IpcError, IpcResult};

/// IPC client for talking to thermod
pub struct IpcClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    next_request_id: u64,
}

impl IpcClient {
    /// Connect to thermod
    pub async fn connect(socket_path: impl AsRef<Path>) -> IpcResult<Self> {
        let stream = UnixStream::connect(socket_path).await?;
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            next_request_id: 1,
        })
    }

    /// Send a command and wait for its response
    pub async fn send(&mut self, command: Command) -> IpcResult<Response> {
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let request = Request::new(request_id, command);
        let mut json = serde_json::to_string(&request)?;
        json.push('\n');

        self.writer.write_all(json.as_bytes()).await?;

        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(IpcError::ConnectionClosed);
        }

        Ok(serde_json::from_str(line.trim())?)
    }

    /// Subscribe to events and turn this client into an event stream
    pub async fn subscribe(mut self) -> IpcResult<EventStream> {
        let response = self.send(Command::SubscribeEvents).await?;

        if let ResponseResult::Err(e) = response.result {
            return Err(IpcError::ServerError(e.message));
        }

        Ok(EventStream {
            reader: self.reader,
        })
    }
}

/// Stream of events from thermod
pub struct EventStream {
    reader: BufReader<OwnedReadHalf>,
}

impl EventStream {
    /// Wait for the next event
    pub async fn next(&mut self) -> IpcResult<Event> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(IpcError::ConnectionClosed);
        }

        Ok(serde_json::from_str(line.trim())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IpcServer, ServerMessage};
    use std::sync::Arc;
    use std::time::Duration;
    use thermo_api::{EventPayload, ResponsePayload, ThermalStatus};

    /// Start a server that answers every request with `Pong`, or with the
    /// subscription acknowledgement for `SubscribeEvents`
    async fn start_server(socket_path: &Path) -> Arc<IpcServer> {
        let mut server = IpcServer::new(socket_path);
        server.start().await.unwrap();
        let server = Arc::new(server);

        let mut messages = server.take_message_receiver().await.unwrap();
        let accept = server.clone();
        tokio::spawn(async move {
            let _ = accept.run().await;
        });

        let responder = server.clone();
        tokio::spawn(async move {
            while let Some(msg) = messages.recv().await {
                if let ServerMessage::Request { client_id, request } = msg {
                    let payload = match request.command {
                        Command::SubscribeEvents => ResponsePayload::Subscribed {
                            client_id: client_id.clone(),
                        },
                        _ => ResponsePayload::Pong,
                    };
                    let _ = responder
                        .send_response(&client_id, Response::success(request.request_id, payload))
                        .await;
                }
            }
        });

        server
    }

    #[tokio::test]
    async fn request_response_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("thermod.sock");
        let _server = start_server(&socket_path).await;

        let mut client = IpcClient::connect(&socket_path).await.unwrap();

        let first = client.send(Command::Ping).await.unwrap();
        let second = client.send(Command::Ping).await.unwrap();

        assert_eq!(first.request_id, 1);
        assert_eq!(second.request_id, 2);
        assert!(matches!(first.result, ResponseResult::Ok(ResponsePayload::Pong)));
    }

    #[tokio::test]
    async fn subscribed_client_receives_events() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("thermod.sock");
        let server = start_server(&socket_path).await;

        let mut events = IpcClient::connect(&socket_path)
            .await
            .unwrap()
            .subscribe()
            .await
            .unwrap();

        server.broadcast_event(Event::new(EventPayload::StateChangeInd {
            state: ThermalStatus::Alert,
        }));

        let event = tokio::time::timeout(Duration::from_secs(5), events.next())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            event.payload,
            EventPayload::StateChangeInd { state: ThermalStatus::Alert }
        ));
    }

    #[tokio::test]
    async fn unsubscribed_client_gets_no_events() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("thermod.sock");
        let server = start_server(&socket_path).await;

        let mut client = IpcClient::connect(&socket_path).await.unwrap();
        client.send(Command::Ping).await.unwrap();

        server.broadcast_event(Event::new(EventPayload::Shutdown));

        // The next line on the wire is the ping response, not the event
        let response = client.send(Command::Ping).await.unwrap();
        assert_eq!(response.request_id, 2);
    }

    #[tokio::test]
    async fn malformed_line_gets_invalid_request() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("thermod.sock");
        let _server = start_server(&socket_path).await;

        let stream = UnixStream::connect(&socket_path).await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        write_half
            .write_all(b"{\"request_id\":9,\"command\":\"oops\"}\n")
            .await
            .unwrap();

        let mut reader = BufReader::new(read_half);
        let mut line = String::new();
        tokio::time::timeout(Duration::from_secs(5), reader.read_line(&mut line))
            .await
            .unwrap()
            .unwrap();

        let response: Response = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(response.request_id, 9);
        match response.result {
            ResponseResult::Err(e) => assert_eq!(e.code, thermo_api::ErrorCode::InvalidRequest),
            other => panic!("expected an error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn connect_to_missing_socket_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = IpcClient::connect(dir.path().join("missing.sock")).await;
        assert!(matches!(result, Err(IpcError::Io(_))));
    }
}

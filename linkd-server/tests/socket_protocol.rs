//! End-to-end tests over a real Unix socket

use std::path::{Path, PathBuf};
use std::time::Duration;

use linkd_bus::{Dict, Message, MethodCall, ObjectPath, Value, interfaces};
use linkd_server::{LinkServer, ServerConfig, codec};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const TIMEOUT: Duration = Duration::from_secs(5);

struct Client {
    name: String,
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    serial: u32,
}

impl Client {
    async fn connect(path: &Path) -> Self {
        let stream = UnixStream::connect(path).await.unwrap();
        let (read, writer) = stream.into_split();
        let mut client = Self {
            name: String::new(),
            lines: BufReader::new(read).lines(),
            writer,
            serial: 0,
        };
        match client.recv().await {
            Message::Notify {
                member,
                args,
                destination,
                ..
            } => {
                assert_eq!(member, "Hello");
                assert_eq!(args, vec![Value::String(destination.clone())]);
                client.name = destination;
            }
            other => panic!("expected Hello, got {other:?}"),
        }
        client
    }

    async fn call(&mut self, path: &str, interface: &str, member: &str, args: Vec<Value>) -> u32 {
        self.serial += 1;
        let call = MethodCall::new(ObjectPath::new(path).unwrap(), interface, member)
            .with_serial(self.serial)
            // the server must overwrite this
            .with_sender(":1.999")
            .with_args(args);
        let line = codec::encode(&Message::Call(call)).unwrap();
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.serial
    }

    async fn recv(&mut self) -> Message {
        let line = tokio::time::timeout(TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for a frame")
            .unwrap()
            .expect("server closed the connection");
        codec::decode(&line).unwrap()
    }

    async fn create(&mut self, notify: &str) -> Message {
        self.call(
            "/",
            interfaces::MANAGER,
            "CreateSession",
            vec![Value::Dict(Dict::new()), Value::from(notify)],
        )
        .await;
        self.recv().await
    }
}

struct Daemon {
    socket: PathBuf,
    token: CancellationToken,
    handle: JoinHandle<()>,
    _dir: tempfile::TempDir,
}

impl Daemon {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("linkd.sock");
        let server = LinkServer::new(ServerConfig::new(&socket));
        let token = server.shutdown_token();
        let handle = tokio::spawn(async move {
            server.run().await.unwrap();
        });

        let deadline = tokio::time::Instant::now() + TIMEOUT;
        while !socket.exists() {
            assert!(tokio::time::Instant::now() < deadline, "socket never appeared");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Self {
            socket,
            token,
            handle,
            _dir: dir,
        }
    }

    async fn stop(self) {
        self.token.cancel();
        tokio::time::timeout(TIMEOUT, self.handle)
            .await
            .expect("server did not stop")
            .unwrap();
        assert!(!self.socket.exists(), "socket file left behind");
    }
}

fn error_name(message: &Message) -> &str {
    match message {
        Message::Error { name, .. } => name,
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn create_replies_then_updates() {
    let daemon = Daemon::start().await;
    let mut client = Client::connect(&daemon.socket).await;

    match client.create("/app").await {
        Message::Reply {
            destination,
            reply_serial,
            args,
        } => {
            assert_eq!(destination, client.name);
            assert_eq!(reply_serial, 1);
            assert_eq!(
                args,
                vec![Value::ObjectPath(ObjectPath::new("/sessions/app").unwrap())]
            );
        }
        other => panic!("expected reply, got {other:?}"),
    }

    match client.recv().await {
        Message::Notify {
            path,
            interface,
            member,
            args,
            ..
        } => {
            assert_eq!(path.as_str(), "/app");
            assert_eq!(interface, interfaces::NOTIFICATION);
            assert_eq!(member, "Update");
            assert!(args[0].as_dict().unwrap().contains_key("SessionMarker"));
        }
        other => panic!("expected Update, got {other:?}"),
    }

    daemon.stop().await;
}

#[tokio::test]
async fn other_peer_cannot_destroy() {
    let daemon = Daemon::start().await;
    let mut owner = Client::connect(&daemon.socket).await;
    let mut stranger = Client::connect(&daemon.socket).await;
    assert_ne!(owner.name, stranger.name);

    owner.create("/app").await;
    owner.recv().await;

    stranger
        .call("/sessions/app", interfaces::SESSION, "Destroy", Vec::new())
        .await;
    assert_eq!(
        error_name(&stranger.recv().await),
        "net.linkd.Error.PermissionDenied"
    );

    owner
        .call("/sessions/app", interfaces::SESSION, "Destroy", Vec::new())
        .await;
    assert!(matches!(owner.recv().await, Message::Reply { .. }));

    daemon.stop().await;
}

#[tokio::test]
async fn disconnect_cleans_up_sessions() {
    let daemon = Daemon::start().await;
    let mut owner = Client::connect(&daemon.socket).await;
    owner.create("/app").await;
    owner.recv().await;
    drop(owner);

    let mut next = Client::connect(&daemon.socket).await;
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    loop {
        // succeeds only once the first session is gone
        match next.create("/app").await {
            Message::Reply { .. } => break,
            Message::Error { name, .. } => {
                assert_eq!(name, "net.linkd.Error.AlreadyExists");
                assert!(tokio::time::Instant::now() < deadline, "session never cleaned up");
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            other => panic!("unexpected frame {other:?}"),
        }
    }

    daemon.stop().await;
}

#[tokio::test]
async fn malformed_lines_are_skipped() {
    let daemon = Daemon::start().await;
    let mut client = Client::connect(&daemon.socket).await;

    client.writer.write_all(b"{not json\n\n").await.unwrap();
    client
        .call("/", interfaces::MANAGER, "GetMode", Vec::new())
        .await;
    match client.recv().await {
        Message::Reply { args, .. } => assert_eq!(args, vec![Value::Bool(false)]),
        other => panic!("expected reply, got {other:?}"),
    }

    daemon.stop().await;
}

#[tokio::test]
async fn shutdown_releases_and_removes_socket() {
    let daemon = Daemon::start().await;
    let mut client = Client::connect(&daemon.socket).await;
    client.create("/app").await;
    client.recv().await;

    daemon.stop().await;

    match client.recv().await {
        Message::Notify { member, path, .. } => {
            assert_eq!(member, "Release");
            assert_eq!(path.as_str(), "/app");
        }
        other => panic!("expected Release, got {other:?}"),
    }
    let eof = tokio::time::timeout(TIMEOUT, client.lines.next_line())
        .await
        .unwrap()
        .unwrap();
    assert!(eof.is_none());
}

//! Common Test Utilities
//!
//! An in-memory persistence gateway with per-table failure toggles, a test
//! application bootstrapped on an ephemeral port, and a line-oriented test
//! client.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

use chat_relay::config::{DatabaseSettings, ServerSettings, Settings};
use chat_relay::domain::{FriendshipRepository, Message, MessageRepository, User, UserRepository};
use chat_relay::shared::error::AppError;
use chat_relay::startup::{AppState, Application};

const READ_TIMEOUT: Duration = Duration::from_secs(2);
const QUIET_TIMEOUT: Duration = Duration::from_millis(300);

fn user(id: i64, username: &str) -> User {
    User {
        id,
        username: username.to_string(),
    }
}

/// In-memory persistence gateway.
///
/// The failure toggles make the next call on the corresponding table fail,
/// for exercising the degraded protocol paths.
#[derive(Default)]
pub struct InMemoryGateway {
    users: Vec<User>,
    friends: HashMap<i64, Vec<i64>>,
    messages: Mutex<Vec<Message>>,
    next_message_id: AtomicI64,
    pub fail_user_lookups: AtomicBool,
    pub fail_friend_listings: AtomicBool,
    pub fail_messages: AtomicBool,
}

impl InMemoryGateway {
    /// Fixture: alice(1) befriends bob and carol, bob(2) befriends alice,
    /// carol(3) has no friends.
    pub fn with_fixture() -> Arc<Self> {
        let gateway = Self {
            users: vec![user(1, "alice"), user(2, "bob"), user(3, "carol")],
            friends: HashMap::from([(1, vec![2, 3]), (2, vec![1]), (3, vec![])]),
            next_message_id: AtomicI64::new(1),
            ..Self::default()
        };
        Arc::new(gateway)
    }

    fn store_message(&self, sender_id: i64, receiver_id: i64, content: &str) -> Message {
        let message = Message {
            id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
            sender_id,
            receiver_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.messages.lock().unwrap().push(message.clone());
        message
    }

    /// Seed a stored message, bypassing the protocol.
    pub fn seed_message(&self, sender_id: i64, receiver_id: i64, content: &str) -> Message {
        self.store_message(sender_id, receiver_id, content)
    }

    /// Everything stored so far, in append order.
    pub fn appended(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserRepository for InMemoryGateway {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        if self.fail_user_lookups.load(Ordering::SeqCst) {
            return Err(AppError::Internal("user store unavailable".into()));
        }
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        if self.fail_user_lookups.load(Ordering::SeqCst) {
            return Err(AppError::Internal("user store unavailable".into()));
        }
        Ok(self.users.iter().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl FriendshipRepository for InMemoryGateway {
    async fn list_friends(&self, user_id: i64) -> Result<Vec<User>, AppError> {
        if self.fail_friend_listings.load(Ordering::SeqCst) {
            return Err(AppError::Internal("friend store unavailable".into()));
        }
        let ids = self.friends.get(&user_id).cloned().unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| self.users.iter().find(|u| u.id == *id).cloned())
            .collect())
    }
}

#[async_trait]
impl MessageRepository for InMemoryGateway {
    async fn append(
        &self,
        sender_id: i64,
        receiver_id: i64,
        content: &str,
    ) -> Result<Message, AppError> {
        if self.fail_messages.load(Ordering::SeqCst) {
            return Err(AppError::Internal("message store unavailable".into()));
        }
        Ok(self.store_message(sender_id, receiver_id, content))
    }

    async fn history_between(&self, user_a: i64, user_b: i64) -> Result<Vec<Message>, AppError> {
        if self.fail_messages.load(Ordering::SeqCst) {
            return Err(AppError::Internal("message store unavailable".into()));
        }
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| {
                (m.sender_id == user_a && m.receiver_id == user_b)
                    || (m.sender_id == user_b && m.receiver_id == user_a)
            })
            .cloned()
            .collect())
    }
}

/// Test application: a real listener on an ephemeral loopback port over the
/// in-memory gateway.
pub struct TestApp {
    pub addr: SocketAddr,
    pub state: AppState,
    pub gateway: Arc<InMemoryGateway>,
}

impl TestApp {
    pub async fn spawn(gateway: Arc<InMemoryGateway>) -> Self {
        let settings = Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
                max_line_length: 1024,
            },
            database: DatabaseSettings {
                url: "postgres://unused".to_string(),
                max_connections: 1,
                min_connections: 0,
                acquire_timeout: 1,
            },
            environment: "test".to_string(),
        };

        let state = AppState::new(
            gateway.clone(),
            gateway.clone(),
            gateway.clone(),
            settings,
        );

        let app = Application::bind(state.clone())
            .await
            .expect("failed to bind test listener");
        let addr = app.local_addr().expect("no local addr");
        tokio::spawn(app.run_until_stopped());

        Self {
            addr,
            state,
            gateway,
        }
    }
}

/// Line-oriented client for driving the protocol.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect failed");
        let (read, write) = stream.into_split();
        Self {
            reader: BufReader::new(read),
            writer: write,
        }
    }

    /// Connect and authenticate, consuming the login acknowledgment and the
    /// friends block.
    pub async fn login(addr: SocketAddr, username: &str) -> Self {
        let mut client = Self::connect(addr).await;
        client.send_line(username).await;

        let ack = client.read_line().await;
        assert!(
            ack.starts_with("Login successful!"),
            "unexpected login reply: {ack:?}"
        );
        assert_eq!(client.read_line().await, "Friends List:");
        while !client.read_line().await.is_empty() {}

        client
    }

    pub async fn send_line(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .expect("write failed");
    }

    /// Read the next line, failing the test on timeout or EOF.
    pub async fn read_line(&mut self) -> String {
        let mut buf = String::new();
        let n = timeout(READ_TIMEOUT, self.reader.read_line(&mut buf))
            .await
            .expect("timed out waiting for a line")
            .expect("read failed");
        assert!(n > 0, "connection closed while expecting a line");

        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        buf
    }

    /// Assert nothing arrives within the quiet window.
    pub async fn assert_no_line(&mut self) {
        let mut buf = String::new();
        match timeout(QUIET_TIMEOUT, self.reader.read_line(&mut buf)).await {
            Err(_) => {}
            Ok(Ok(0)) => panic!("connection closed unexpectedly"),
            Ok(Ok(_)) => panic!("unexpected line: {buf:?}"),
            Ok(Err(e)) => panic!("read failed: {e}"),
        }
    }

    /// Assert the server closed the connection.
    pub async fn expect_eof(&mut self) {
        let mut buf = String::new();
        let n = timeout(READ_TIMEOUT, self.reader.read_line(&mut buf))
            .await
            .expect("timed out waiting for EOF")
            .expect("read failed");
        assert_eq!(n, 0, "expected EOF, got {buf:?}");
    }
}

//! TCP Session
//!
//! One session per accepted connection, running the per-connection protocol
//! state machine: `UNAUTHENTICATED -> ONLINE -> CLOSED`.
//!
//! The session task is the only reader of its socket; a dedicated writer task
//! drains the session's outbound channel and is the only writer. Other
//! sessions deliver into that channel through the handle registered in the
//! presence registry.

use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec};
use uuid::Uuid;

use super::protocol::{self, ClientCommand, HistoryRecord, ParseError};
use crate::application::presence::SessionHandle;
use crate::domain::User;
use crate::startup::AppState;

/// Handle one client connection from accept to teardown.
///
/// Never returns an error: every failure path ends in this session's own
/// teardown and must not affect the listener or other sessions.
pub async fn handle_connection(socket: TcpStream, addr: SocketAddr, state: AppState) {
    let session_id = Uuid::new_v4();
    tracing::debug!(%addr, session_id = %session_id, "New client connected");

    let codec = LinesCodec::new_with_max_length(state.settings.server.max_line_length);
    let (sink, mut stream) = Framed::new(socket, codec).split();

    // Writer task: sole writer to the socket. It drains the channel and
    // exits once every sender is gone, so queued lines flush before the
    // connection drops.
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(write_outbound(rx, sink));

    // UNAUTHENTICATED: the first line is the candidate username.
    let username = match stream.next().await {
        Some(Ok(line)) => line.trim().to_string(),
        Some(Err(e)) => {
            tracing::debug!(%addr, session_id = %session_id, error = %e, "Read failed before authentication");
            drop(tx);
            let _ = writer.await;
            return;
        }
        None => {
            tracing::debug!(%addr, session_id = %session_id, "Disconnected before authentication");
            drop(tx);
            let _ = writer.await;
            return;
        }
    };

    let user = match state.users.find_by_username(&username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::debug!(%addr, username = %username, "Unknown username");
            let _ = tx.send(protocol::LOGIN_UNKNOWN.to_string());
            drop(tx);
            let _ = writer.await;
            return;
        }
        Err(e) => {
            tracing::error!(%addr, username = %username, error = %e, "User lookup failed");
            let _ = tx.send(protocol::LOGIN_DB_ERROR.to_string());
            drop(tx);
            let _ = writer.await;
            return;
        }
    };

    // ONLINE: register before acknowledging, so a client that has seen the
    // acknowledgment is already routable. Registration replaces any earlier
    // session for the same username; the displaced session is not notified.
    let mut session = Session {
        id: session_id,
        user,
        state,
        tx: tx.clone(),
        closed: false,
    };
    session.state.registry.register(
        &session.user.username,
        SessionHandle::new(session_id, session.user.id, tx.clone()),
    );
    tracing::info!(
        username = %session.user.username,
        user_id = session.user.id,
        session_id = %session_id,
        "User online"
    );

    session.send_line(protocol::login_success(&session.user.username));
    session.send_friends_list().await;

    // Command loop: one line in, dispatch, repeat until EOF, I/O error,
    // or logout.
    while let Some(next) = stream.next().await {
        let line = match next {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!(session_id = %session_id, error = %e, "Connection error");
                break;
            }
        };

        match protocol::parse_command(&line) {
            Ok(ClientCommand::History { friend_id }) => session.send_history(friend_id).await,
            Ok(ClientCommand::Send { recipient_id, text }) => {
                session.route_message(recipient_id, &text).await
            }
            Ok(ClientCommand::Logout) => {
                session.send_line(protocol::LOGOUT_ACK);
                break;
            }
            Err(ParseError::MissingSeparator) => session.send_line(protocol::INVALID_FORMAT),
            Err(ParseError::InvalidId) => session.send_line(protocol::PROCESSING_ERROR),
        }
    }

    // CLOSED: deregister, then release every sender so the writer drains
    // and the socket closes with all queued lines flushed.
    session.teardown();
    drop(session);
    drop(tx);
    let _ = writer.await;
}

/// Forward queued lines to the socket until the channel closes or a write
/// fails.
async fn write_outbound(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sink: futures::stream::SplitSink<Framed<TcpStream, LinesCodec>, String>,
) {
    while let Some(line) = rx.recv().await {
        if let Err(e) = sink.send(line).await {
            tracing::debug!(error = %e, "Write failed, dropping outbound stream");
            break;
        }
    }
}

/// Server-side state for one authenticated connection.
struct Session {
    id: Uuid,
    user: User,
    state: AppState,
    tx: mpsc::UnboundedSender<String>,
    closed: bool,
}

impl Session {
    /// Queue a line on this session's own outbound stream. Failures mean the
    /// writer is gone; the read loop notices on its next iteration.
    fn send_line(&self, line: impl Into<String>) {
        let _ = self.tx.send(line.into());
    }

    /// Push the friends list: header, one line per friend, blank terminator.
    /// A failing gateway call degrades to a single error line.
    async fn send_friends_list(&self) {
        match self.state.friendships.list_friends(self.user.id).await {
            Ok(friends) => {
                self.send_line(protocol::FRIENDS_HEADER);
                for friend in &friends {
                    self.send_line(protocol::friend_entry(friend.id, &friend.username));
                }
                self.send_line("");
            }
            Err(e) => {
                tracing::error!(user_id = self.user.id, error = %e, "Failed to list friends");
                self.send_line(protocol::FRIENDS_ERROR);
            }
        }
    }

    /// Stream the ordered history with `friend_id` between start and end
    /// markers, one JSON record per message. Gateway failures degrade to a
    /// single error line; the session stays online.
    async fn send_history(&self, friend_id: i64) {
        let history = match self
            .state
            .messages
            .history_between(self.user.id, friend_id)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                tracing::error!(
                    user_id = self.user.id,
                    friend_id,
                    error = %e,
                    "Failed to fetch chat history"
                );
                self.send_line(protocol::HISTORY_ERROR);
                return;
            }
        };

        let peer_name = match self.state.users.find_by_id(friend_id).await {
            Ok(Some(peer)) => peer.username,
            Ok(None) => friend_id.to_string(),
            Err(e) => {
                tracing::error!(friend_id, error = %e, "Failed to resolve history peer");
                self.send_line(protocol::HISTORY_ERROR);
                return;
            }
        };

        self.send_line(protocol::HISTORY_START);
        for message in history {
            let sender = if message.sender_id == self.user.id {
                protocol::SELF_SENDER.to_string()
            } else {
                peer_name.clone()
            };
            let record = HistoryRecord {
                sender,
                text: message.content,
                timestamp: message.created_at,
            };
            self.send_line(record.render());
        }
        self.send_line(protocol::HISTORY_END);
    }

    /// Hand an outgoing message to the router and report both outcomes to
    /// the sender: persistence failure first, then delivered or stored.
    async fn route_message(&self, recipient_id: i64, text: &str) {
        let outcome = self
            .state
            .router
            .route(self.user.id, &self.user.username, recipient_id, text)
            .await;

        if !outcome.persisted {
            self.send_line(protocol::SAVE_ERROR);
        }
        if outcome.delivered {
            self.send_line(protocol::delivered_echo(text));
        } else {
            self.send_line(protocol::offline_echo(text));
            self.send_line(protocol::OFFLINE_NOTICE);
        }
    }

    /// Remove this session from the registry. Runs exactly once; the Drop
    /// guard covers exit paths that skip the explicit call. Deregistration
    /// is guarded by session id, so a session displaced by a later login
    /// never evicts its successor.
    fn teardown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.state
            .registry
            .deregister(&self.user.username, self.id);
        tracing::info!(
            username = %self.user.username,
            user_id = self.user.id,
            session_id = %self.id,
            "User offline"
        );
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

//! IRC client for the notification bot

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::io::{BufReader, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use wikirc_core::{BotData, ChatClient};

use crate::error::{Error, Result};
use crate::frame::{read_message, write_message, LineBuffer};
use crate::protocol::{Message, ERR_NICKNAMEINUSE, RPL_WELCOME};
use crate::DEFAULT_PORT;

/// Outbound queue depth; sends beyond it fail instead of blocking
const QUEUE_DEPTH: usize = 64;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Registering,
    Connected,
}

/// Event received from the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrcEvent {
    /// Registration accepted under this nick
    Registered { nick: String },
    Joined { channel: String },
    Parted { channel: String },
    /// A message addressed to the bot or one of its channels
    Message { from: String, target: String, text: String },
    Disconnected,
}

/// Client handle for an IRC connection
pub struct IrcClient {
    state: Arc<RwLock<ClientState>>,
    event_rx: Option<mpsc::Receiver<IrcEvent>>,
    cmd_tx: mpsc::Sender<ClientCommand>,
}

#[derive(Debug)]
struct ClientState {
    connection: ConnectionState,
    nick: String,
    /// Channel to join once registered
    channel: String,
    channels: Vec<String>,
}

enum ClientCommand {
    Send(Message),
    Disconnect,
}

impl IrcClient {
    /// Connect and register as the configured bot
    pub async fn connect(bot: &BotData) -> Result<Self> {
        let addr = server_address(&bot.server)?;
        info!(server = %addr, nick = %bot.name, "Connecting to IRC server");

        let stream = TcpStream::connect(&addr).await?;
        let (reader, mut writer) = tokio::io::split(stream);

        if bot.has_password() {
            write_message(&mut writer, &Message::pass(&bot.password)).await?;
        }
        write_message(&mut writer, &Message::nick(&bot.name)).await?;
        write_message(&mut writer, &Message::user(&bot.name, "wikirc")).await?;

        let state = Arc::new(RwLock::new(ClientState {
            connection: ConnectionState::Registering,
            nick: bot.name.clone(),
            channel: bot.channel.clone(),
            channels: Vec::new(),
        }));

        let (event_tx, event_rx) = mpsc::channel(QUEUE_DEPTH);
        let (cmd_tx, cmd_rx) = mpsc::channel(QUEUE_DEPTH);

        tokio::spawn(connection_task(
            BufReader::new(reader),
            writer,
            state.clone(),
            event_tx,
            cmd_rx,
        ));

        Ok(IrcClient {
            state,
            event_rx: Some(event_rx),
            cmd_tx,
        })
    }

    /// Get the next server event; `None` once events were taken
    pub async fn next_event(&mut self) -> Option<IrcEvent> {
        match self.event_rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Move the event stream out so the client itself can be shared
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<IrcEvent>> {
        self.event_rx.take()
    }

    /// Leave the server
    pub async fn disconnect(&self) {
        let _ = self.cmd_tx.send(ClientCommand::Disconnect).await;
    }

    pub fn connection_state(&self) -> ConnectionState {
        read_state(&self.state).connection
    }

    /// Nick in use; may differ from the configured one after a collision
    pub fn nick(&self) -> String {
        read_state(&self.state).nick.clone()
    }

    /// Queue a raw message without waiting for the write
    pub fn queue(&self, msg: Message) -> Result<()> {
        self.cmd_tx
            .try_send(ClientCommand::Send(msg))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => Error::QueueFull,
                mpsc::error::TrySendError::Closed(_) => Error::NotConnected,
            })
    }
}

impl ChatClient for IrcClient {
    fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    fn channel_names(&self) -> Vec<String> {
        read_state(&self.state).channels.clone()
    }

    fn send_message(&self, channel: &str, text: &str) -> wikirc_core::Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected.into());
        }
        Ok(self.queue(Message::privmsg(channel, text))?)
    }
}

/// `host`, `host:port` or `[v6]:port`; the default port is 6667
fn server_address(server: &str) -> Result<String> {
    let server = server.trim();
    if server.is_empty() {
        return Err(Error::InvalidServer("empty server name".to_string()));
    }

    match server.rsplit_once(':') {
        Some((host, port)) if host.ends_with(']') || !host.contains(':') => {
            if port.parse::<u16>().is_err() {
                return Err(Error::InvalidServer(format!("bad port in {}", server)));
            }
            Ok(server.to_string())
        }
        _ => Ok(format!("{}:{}", server, DEFAULT_PORT)),
    }
}

fn read_state(state: &RwLock<ClientState>) -> RwLockReadGuard<'_, ClientState> {
    match state.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!("IRC state lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

fn write_state(state: &RwLock<ClientState>) -> RwLockWriteGuard<'_, ClientState> {
    match state.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!("IRC state lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Main connection task
async fn connection_task(
    mut reader: BufReader<ReadHalf<TcpStream>>,
    mut writer: WriteHalf<TcpStream>,
    state: Arc<RwLock<ClientState>>,
    event_tx: mpsc::Sender<IrcEvent>,
    mut cmd_rx: mpsc::Receiver<ClientCommand>,
) {
    let mut line_buf = LineBuffer::new();

    loop {
        tokio::select! {
            // Incoming line from the server
            result = read_message(&mut reader, &mut line_buf) => {
                match result {
                    Ok(msg) => {
                        let replies = handle_server_message(msg, &state, &event_tx).await;
                        let mut failed = false;
                        for reply in replies {
                            if let Err(e) = write_message(&mut writer, &reply).await {
                                warn!(error = %e, "Write error");
                                failed = true;
                                break;
                            }
                        }
                        if failed {
                            break;
                        }
                    }
                    Err(Error::ConnectionClosed) => {
                        debug!("Server closed connection");
                        break;
                    }
                    Err(Error::Protocol(reason)) => {
                        warn!(reason = %reason, "Skipping unreadable line");
                    }
                    Err(e) => {
                        warn!(error = %e, "Read error");
                        break;
                    }
                }
            }

            // Outgoing command
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ClientCommand::Send(msg)) => {
                        if let Err(e) = write_message(&mut writer, &msg).await {
                            warn!(error = %e, "Write error");
                            break;
                        }
                    }
                    Some(ClientCommand::Disconnect) | None => {
                        debug!("Disconnect requested");
                        let _ = write_message(&mut writer, &Message::quit("wikirc shutting down")).await;
                        break;
                    }
                }
            }
        }
    }

    // Cleanup
    {
        let mut s = write_state(&state);
        s.connection = ConnectionState::Disconnected;
        s.channels.clear();
    }
    let _ = event_tx.send(IrcEvent::Disconnected).await;
    info!("Disconnected from IRC server");
}

/// Handle a line from the server, returning the lines to send back
async fn handle_server_message(
    msg: Message,
    state: &RwLock<ClientState>,
    event_tx: &mpsc::Sender<IrcEvent>,
) -> Vec<Message> {
    let own_nick = read_state(state).nick.clone();
    let from_self = msg
        .source_nick()
        .is_some_and(|n| n.eq_ignore_ascii_case(&own_nick));

    match msg.command.as_str() {
        "PING" => vec![Message::pong(msg.param(0).unwrap_or_default())],
        RPL_WELCOME => {
            let (nick, channel) = {
                let mut s = write_state(state);
                s.connection = ConnectionState::Connected;
                if let Some(nick) = msg.param(0) {
                    s.nick = nick.to_string();
                }
                (s.nick.clone(), s.channel.clone())
            };
            info!(nick = %nick, "Registered with IRC server");
            let _ = event_tx.send(IrcEvent::Registered { nick }).await;

            if channel.is_empty() {
                warn!("No channel configured, notifications will be dropped");
                Vec::new()
            } else {
                vec![Message::join(&channel)]
            }
        }
        ERR_NICKNAMEINUSE => {
            let nick = {
                let mut s = write_state(state);
                if s.connection == ConnectionState::Connected {
                    return Vec::new();
                }
                s.nick.push('_');
                s.nick.clone()
            };
            warn!(nick = %nick, "Nickname in use, retrying");
            vec![Message::nick(&nick)]
        }
        "JOIN" if from_self => {
            let Some(channel) = msg.param(0).map(str::to_string) else {
                return Vec::new();
            };
            {
                let mut s = write_state(state);
                if !s.channels.iter().any(|c| c.eq_ignore_ascii_case(&channel)) {
                    s.channels.push(channel.clone());
                }
            }
            info!(channel = %channel, "Joined channel");
            let _ = event_tx.send(IrcEvent::Joined { channel }).await;
            Vec::new()
        }
        "PART" if from_self => {
            if let Some(channel) = msg.param(0) {
                leave_channel(state, event_tx, channel).await;
            }
            Vec::new()
        }
        "KICK" if msg.param(1).is_some_and(|n| n.eq_ignore_ascii_case(&own_nick)) => {
            if let Some(channel) = msg.param(0) {
                warn!(channel = %channel, "Kicked from channel");
                leave_channel(state, event_tx, channel).await;
            }
            Vec::new()
        }
        "NICK" if from_self => {
            if let Some(nick) = msg.param(0) {
                write_state(state).nick = nick.to_string();
            }
            Vec::new()
        }
        "PRIVMSG" => {
            if let (Some(from), Some(target), Some(text)) = (msg.source_nick(), msg.param(0), msg.param(1)) {
                let _ = event_tx
                    .send(IrcEvent::Message {
                        from: from.to_string(),
                        target: target.to_string(),
                        text: text.to_string(),
                    })
                    .await;
            }
            Vec::new()
        }
        "ERROR" => {
            warn!(reason = %msg.param(0).unwrap_or_default(), "Server sent ERROR");
            Vec::new()
        }
        _ => {
            debug!(command = %msg.command, "Ignoring server message");
            Vec::new()
        }
    }
}

async fn leave_channel(state: &RwLock<ClientState>, event_tx: &mpsc::Sender<IrcEvent>, channel: &str) {
    write_state(state)
        .channels
        .retain(|c| !c.eq_ignore_ascii_case(channel));
    let _ = event_tx
        .send(IrcEvent::Parted {
            channel: channel.to_string(),
        })
        .await;
}

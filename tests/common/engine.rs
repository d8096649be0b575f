//! Scripted engine.
//!
//! Stands in for a real IRC engine. Tests queue events with
//! [`ScriptedEngine::push`]; each push writes a byte to a socket pair so
//! the engine's descriptor really becomes readable and `Session::step`
//! goes through a real `select(2)`. Commands are recorded as protocol-like
//! lines in [`ScriptedEngine::sent`].

use slirc_client::{Callbacks, Command, ConnectRequest, DescriptorSet, Engine, EngineError, EventKind};
use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;

/// One event for the engine to report.
#[allow(dead_code)]
#[derive(Clone, Debug)]
pub enum Scripted {
    Event {
        kind: EventKind,
        event: String,
        origin: Option<String>,
        params: Vec<String>,
    },
    Numeric {
        code: u32,
        origin: Option<String>,
        params: Vec<String>,
    },
    DccChat {
        nick: String,
        addr: String,
        id: u32,
    },
    DccSend {
        nick: String,
        addr: String,
        filename: String,
        size: u64,
        id: u32,
    },
    /// The server closed the connection.
    Close,
}

#[allow(dead_code)]
impl Scripted {
    pub fn event(kind: EventKind, origin: &str, params: &[&str]) -> Self {
        Self::Event {
            kind,
            event: kind.engine_name().to_string(),
            origin: Some(origin.to_string()),
            params: params.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn unknown(command: &str, origin: &str, params: &[&str]) -> Self {
        Self::Event {
            kind: EventKind::Unknown,
            event: command.to_string(),
            origin: Some(origin.to_string()),
            params: params.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn numeric(code: u32, origin: &str, params: &[&str]) -> Self {
        Self::Numeric {
            code,
            origin: Some(origin.to_string()),
            params: params.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// An owned copy of a [`ConnectRequest`].
#[allow(dead_code)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connected {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub ipv6: bool,
    pub nick: Option<String>,
    pub user: Option<String>,
    pub real: Option<String>,
}

#[allow(dead_code)]
pub struct ScriptedEngine {
    local: UnixStream,
    remote: UnixStream,
    queue: VecDeque<Scripted>,
    connected: bool,
    /// Every command sent, rendered as a protocol line.
    pub sent: Vec<String>,
    /// Every connect request.
    pub connects: Vec<Connected>,
    /// Every `set_option` call.
    pub options: Vec<(u32, bool)>,
    /// Returned by the next `send`.
    pub fail_send: Option<EngineError>,
    /// Returned by the next `connect`.
    pub fail_connect: Option<EngineError>,
    /// Returned by the next processing pass, after its events.
    pub fail_process: Option<EngineError>,
    /// Number of processing passes.
    pub passes: usize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        let (local, remote) = UnixStream::pair().expect("socket pair");
        local.set_nonblocking(true).expect("nonblocking");
        Self {
            local,
            remote,
            queue: VecDeque::new(),
            connected: false,
            sent: Vec::new(),
            connects: Vec::new(),
            options: Vec::new(),
            fail_send: None,
            fail_connect: None,
            fail_process: None,
            passes: 0,
        }
    }

    /// An engine that is already connected.
    #[allow(dead_code)]
    pub fn connected() -> Self {
        let mut engine = Self::new();
        engine.connected = true;
        engine
    }

    /// Queue an event and wake the engine's descriptor.
    #[allow(dead_code)]
    pub fn push(&mut self, event: Scripted) {
        self.queue.push_back(event);
        self.remote.write_all(b"!").expect("wake engine");
    }

    #[allow(dead_code)]
    pub fn fd(&self) -> RawFd {
        self.local.as_raw_fd()
    }

    /// Drain and return the recorded commands.
    #[allow(dead_code)]
    pub fn take_sent(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sent)
    }

    fn drain_wakeups(&mut self) {
        let mut buf = [0u8; 64];
        loop {
            match self.local.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => panic!("wakeup read failed: {e}"),
            }
        }
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for ScriptedEngine {
    fn connect(&mut self, request: &ConnectRequest<'_>) -> Result<(), EngineError> {
        if let Some(err) = self.fail_connect.take() {
            return Err(err);
        }
        self.connects.push(Connected {
            host: request.host.to_string(),
            port: request.port,
            password: request.password.map(str::to_string),
            ipv6: request.ipv6,
            nick: request.nick.map(str::to_string),
            user: request.user.map(str::to_string),
            real: request.real.map(str::to_string),
        });
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn set_option(&mut self, option: u32, enabled: bool) {
        self.options.push((option, enabled));
    }

    fn send(&mut self, command: &Command<'_>) -> Result<(), EngineError> {
        if let Some(err) = self.fail_send.take() {
            return Err(err);
        }
        self.sent.push(render(command));
        Ok(())
    }

    fn want_descriptors(
        &mut self,
        read: &mut DescriptorSet,
        _write: &mut DescriptorSet,
    ) -> Result<(), EngineError> {
        read.insert(self.fd());
        Ok(())
    }

    fn process_ready_descriptors(
        &mut self,
        read: &DescriptorSet,
        _write: &DescriptorSet,
        callbacks: &mut dyn Callbacks,
    ) -> Result<(), EngineError> {
        self.passes += 1;
        if read.contains(self.fd()) {
            self.drain_wakeups();
            let events: Vec<Scripted> = self.queue.drain(..).collect();
            for event in events {
                deliver(self, callbacks, event);
            }
        }
        match self.fail_process.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn deliver(engine: &mut ScriptedEngine, callbacks: &mut dyn Callbacks, event: Scripted) {
    match event {
        Scripted::Event {
            kind,
            event,
            origin,
            params,
        } => {
            let params: Vec<&str> = params.iter().map(String::as_str).collect();
            callbacks.event(engine, kind, &event, origin.as_deref(), &params);
        }
        Scripted::Numeric {
            code,
            origin,
            params,
        } => {
            let params: Vec<&str> = params.iter().map(String::as_str).collect();
            callbacks.numeric(engine, code, origin.as_deref(), &params);
        }
        Scripted::DccChat { nick, addr, id } => {
            callbacks.dcc_chat_request(engine, &nick, &addr, id);
        }
        Scripted::DccSend {
            nick,
            addr,
            filename,
            size,
            id,
        } => {
            callbacks.dcc_send_request(engine, &nick, &addr, &filename, size, id);
        }
        Scripted::Close => engine.connected = false,
    }
}

/// Render a command roughly the way it would go on the wire.
pub fn render(command: &Command<'_>) -> String {
    fn opt(value: Option<&str>) -> String {
        value.map(|v| format!(" {v}")).unwrap_or_default()
    }

    match *command {
        Command::Join { channel, key } => format!("JOIN {channel}{}", opt(key)),
        Command::Part { channel } => format!("PART {channel}"),
        Command::Invite { nick, channel } => format!("INVITE {nick} {channel}"),
        Command::Names { channel } => format!("NAMES {channel}"),
        Command::List { channel } => format!("LIST {channel}"),
        Command::Topic { channel, topic } => format!("TOPIC {channel}{}", opt(topic)),
        Command::ChannelMode { channel, mode } => format!("MODE {channel}{}", opt(mode)),
        Command::Kick {
            nick,
            channel,
            reason,
        } => format!("KICK {channel} {nick}{}", opt(reason)),
        Command::Msg { target, text } => format!("PRIVMSG {target} :{text}"),
        Command::Me { target, text } => format!("PRIVMSG {target} :\u{1}ACTION {text}\u{1}"),
        Command::Notice { target, text } => format!("NOTICE {target} :{text}"),
        Command::Quit { reason } => format!("QUIT{}", opt(reason)),
        Command::UserMode { mode } => format!("MODE *{}", opt(mode)),
        Command::Nick { nick } => format!("NICK {nick}"),
        Command::Whois { nick } => format!("WHOIS {nick}"),
        Command::CtcpReply { nick, reply } => format!("NOTICE {nick} :\u{1}{reply}\u{1}"),
        Command::CtcpRequest { nick, request } => format!("PRIVMSG {nick} :\u{1}{request}\u{1}"),
        Command::Raw { line } => line.to_string(),
    }
}

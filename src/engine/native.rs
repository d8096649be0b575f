//! [`Engine`] over the system `libircclient` library.
//!
//! The C library reports events through a table of function pointers fixed
//! at session creation. Each pointer is a trampoline that looks up the
//! active [`Callbacks`] in a frame installed with `irc_set_ctx` for the
//! duration of one `irc_process_select_descriptors` call, and hands it a
//! borrowed view of the session. Outside processing the context is null and
//! events are dropped.
//!
//! A panic never unwinds through the C library. The frame keeps the first
//! payload, skips the remaining events of the pass and resumes the panic
//! once `irc_process_select_descriptors` has returned.

#![allow(unsafe_code)]

use super::{Callbacks, Command, ConnectRequest, Engine};
use crate::error::EngineError;
use crate::event::{DccId, EventKind};
use crate::mux::{DescriptorSet, empty_fd_set};
use std::any::Any;
use std::borrow::Cow;
use std::ffi::{CStr, CString, c_char, c_int, c_uint, c_ulong, c_ushort, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::ptr::{self, NonNull};
use std::slice;
use tracing::{debug, error};

/// `LIBIRC_ERR_INVAL`.
const ERR_INVAL: c_int = 1;
/// `LIBIRC_ERR_NOMEM`.
const ERR_NOMEM: c_int = 6;

mod ffi {
    use super::*;

    #[repr(C)]
    pub struct IrcSession {
        _private: [u8; 0],
    }

    pub type EventCallback = unsafe extern "C" fn(
        session: *mut IrcSession,
        event: *const c_char,
        origin: *const c_char,
        params: *const *const c_char,
        count: c_uint,
    );

    pub type EventCodeCallback = unsafe extern "C" fn(
        session: *mut IrcSession,
        event: c_uint,
        origin: *const c_char,
        params: *const *const c_char,
        count: c_uint,
    );

    pub type DccChatCallback = unsafe extern "C" fn(
        session: *mut IrcSession,
        nick: *const c_char,
        addr: *const c_char,
        dccid: c_uint,
    );

    pub type DccSendCallback = unsafe extern "C" fn(
        session: *mut IrcSession,
        nick: *const c_char,
        addr: *const c_char,
        filename: *const c_char,
        size: c_ulong,
        dccid: c_uint,
    );

    /// `irc_callbacks_t`; field order is ABI.
    #[repr(C)]
    pub struct IrcCallbacks {
        pub event_connect: Option<EventCallback>,
        pub event_nick: Option<EventCallback>,
        pub event_quit: Option<EventCallback>,
        pub event_join: Option<EventCallback>,
        pub event_part: Option<EventCallback>,
        pub event_mode: Option<EventCallback>,
        pub event_umode: Option<EventCallback>,
        pub event_topic: Option<EventCallback>,
        pub event_kick: Option<EventCallback>,
        pub event_channel: Option<EventCallback>,
        pub event_privmsg: Option<EventCallback>,
        pub event_notice: Option<EventCallback>,
        pub event_channel_notice: Option<EventCallback>,
        pub event_invite: Option<EventCallback>,
        pub event_ctcp_req: Option<EventCallback>,
        pub event_ctcp_rep: Option<EventCallback>,
        pub event_ctcp_action: Option<EventCallback>,
        pub event_unknown: Option<EventCallback>,
        pub event_numeric: Option<EventCodeCallback>,
        pub event_dcc_chat_req: Option<DccChatCallback>,
        pub event_dcc_send_req: Option<DccSendCallback>,
    }

    #[link(name = "ircclient")]
    unsafe extern "C" {
        pub fn irc_create_session(callbacks: *mut IrcCallbacks) -> *mut IrcSession;
        pub fn irc_destroy_session(session: *mut IrcSession);

        pub fn irc_connect(
            session: *mut IrcSession,
            server: *const c_char,
            port: c_ushort,
            server_password: *const c_char,
            nick: *const c_char,
            username: *const c_char,
            realname: *const c_char,
        ) -> c_int;
        pub fn irc_connect6(
            session: *mut IrcSession,
            server: *const c_char,
            port: c_ushort,
            server_password: *const c_char,
            nick: *const c_char,
            username: *const c_char,
            realname: *const c_char,
        ) -> c_int;
        pub fn irc_disconnect(session: *mut IrcSession);
        pub fn irc_is_connected(session: *mut IrcSession) -> c_int;

        pub fn irc_add_select_descriptors(
            session: *mut IrcSession,
            in_set: *mut libc::fd_set,
            out_set: *mut libc::fd_set,
            maxfd: *mut c_int,
        ) -> c_int;
        pub fn irc_process_select_descriptors(
            session: *mut IrcSession,
            in_set: *mut libc::fd_set,
            out_set: *mut libc::fd_set,
        ) -> c_int;

        pub fn irc_send_raw(session: *mut IrcSession, format: *const c_char, ...) -> c_int;
        pub fn irc_cmd_quit(session: *mut IrcSession, reason: *const c_char) -> c_int;
        pub fn irc_cmd_join(session: *mut IrcSession, channel: *const c_char, key: *const c_char) -> c_int;
        pub fn irc_cmd_part(session: *mut IrcSession, channel: *const c_char) -> c_int;
        pub fn irc_cmd_invite(session: *mut IrcSession, nick: *const c_char, channel: *const c_char) -> c_int;
        pub fn irc_cmd_names(session: *mut IrcSession, channel: *const c_char) -> c_int;
        pub fn irc_cmd_list(session: *mut IrcSession, channel: *const c_char) -> c_int;
        pub fn irc_cmd_topic(session: *mut IrcSession, channel: *const c_char, topic: *const c_char) -> c_int;
        pub fn irc_cmd_channel_mode(session: *mut IrcSession, channel: *const c_char, mode: *const c_char) -> c_int;
        pub fn irc_cmd_kick(
            session: *mut IrcSession,
            nick: *const c_char,
            channel: *const c_char,
            reason: *const c_char,
        ) -> c_int;
        pub fn irc_cmd_msg(session: *mut IrcSession, nch: *const c_char, text: *const c_char) -> c_int;
        pub fn irc_cmd_me(session: *mut IrcSession, nch: *const c_char, text: *const c_char) -> c_int;
        pub fn irc_cmd_notice(session: *mut IrcSession, nch: *const c_char, text: *const c_char) -> c_int;
        pub fn irc_cmd_ctcp_request(session: *mut IrcSession, nick: *const c_char, request: *const c_char) -> c_int;
        pub fn irc_cmd_ctcp_reply(session: *mut IrcSession, nick: *const c_char, reply: *const c_char) -> c_int;
        pub fn irc_cmd_user_mode(session: *mut IrcSession, mode: *const c_char) -> c_int;
        pub fn irc_cmd_nick(session: *mut IrcSession, newnick: *const c_char) -> c_int;
        pub fn irc_cmd_whois(session: *mut IrcSession, nick: *const c_char) -> c_int;

        pub fn irc_errno(session: *mut IrcSession) -> c_int;
        pub fn irc_strerror(ircerrno: c_int) -> *const c_char;

        pub fn irc_set_ctx(session: *mut IrcSession, ctx: *mut c_void);
        pub fn irc_get_ctx(session: *mut IrcSession) -> *mut c_void;

        pub fn irc_option_set(session: *mut IrcSession, option: c_uint);
        pub fn irc_option_reset(session: *mut IrcSession, option: c_uint);
    }
}

/// A `libircclient` session.
///
/// Views handed to callbacks borrow the session of the engine that is
/// processing; only the engine returned by [`NativeEngine::new`] destroys
/// it.
pub struct NativeEngine {
    session: NonNull<ffi::IrcSession>,
    owned: bool,
}

/// The context frame installed while the engine processes descriptors.
struct Frame<'a> {
    callbacks: &'a mut dyn Callbacks,
    panic: Option<Box<dyn Any + Send>>,
}

impl<'a> Frame<'a> {
    fn new(callbacks: &'a mut dyn Callbacks) -> Self {
        Self { callbacks, panic: None }
    }

    /// Run one callback. After a panic every later callback is skipped.
    fn run(&mut self, engine: &mut dyn Engine, f: impl FnOnce(&mut dyn Callbacks, &mut dyn Engine)) {
        if self.panic.is_some() {
            debug!("Skipping event after callback panic");
            return;
        }
        let callbacks = &mut *self.callbacks;
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| f(callbacks, engine))) {
            error!("Event callback panicked");
            self.panic = Some(payload);
        }
    }

    /// Re-raise a panic caught during the pass.
    fn finish(self) {
        if let Some(payload) = self.panic {
            panic::resume_unwind(payload);
        }
    }
}

impl NativeEngine {
    pub fn new() -> Result<Self, EngineError> {
        let mut callbacks = callback_table();
        // SAFETY: the library copies the table before returning.
        let raw = unsafe { ffi::irc_create_session(&mut callbacks) };
        match NonNull::new(raw) {
            Some(session) => Ok(Self {
                session,
                owned: true,
            }),
            None => Err(EngineError::new(ERR_NOMEM, strerror(ERR_NOMEM))),
        }
    }

    fn raw(&self) -> *mut ffi::IrcSession {
        self.session.as_ptr()
    }

    fn last_error(&self) -> EngineError {
        // SAFETY: the session is live for as long as self.
        let code = unsafe { ffi::irc_errno(self.raw()) };
        EngineError::new(code, strerror(code))
    }

    fn check(&self, rc: c_int) -> Result<(), EngineError> {
        if rc == 0 { Ok(()) } else { Err(self.last_error()) }
    }
}

impl Drop for NativeEngine {
    fn drop(&mut self) {
        if self.owned {
            // SAFETY: owned engines hold the only destroying handle.
            unsafe { ffi::irc_destroy_session(self.raw()) };
        }
    }
}

impl Engine for NativeEngine {
    fn connect(&mut self, request: &ConnectRequest<'_>) -> Result<(), EngineError> {
        let host = cstring(request.host)?;
        let password = opt_cstring(request.password)?;
        let nick = opt_cstring(request.nick)?;
        let user = opt_cstring(request.user)?;
        let real = opt_cstring(request.real)?;
        let connect = if request.ipv6 {
            ffi::irc_connect6
        } else {
            ffi::irc_connect
        };
        // SAFETY: every pointer is null or a live NUL-terminated string.
        let rc = unsafe {
            connect(
                self.raw(),
                host.as_ptr(),
                request.port,
                opt_ptr(&password),
                opt_ptr(&nick),
                opt_ptr(&user),
                opt_ptr(&real),
            )
        };
        self.check(rc)
    }

    fn disconnect(&mut self) {
        // SAFETY: the session is live.
        unsafe { ffi::irc_disconnect(self.raw()) };
    }

    fn is_connected(&self) -> bool {
        // SAFETY: the session is live.
        unsafe { ffi::irc_is_connected(self.raw()) != 0 }
    }

    fn set_option(&mut self, option: u32, enabled: bool) {
        // SAFETY: the session is live.
        unsafe {
            if enabled {
                ffi::irc_option_set(self.raw(), option);
            } else {
                ffi::irc_option_reset(self.raw(), option);
            }
        }
    }

    fn send(&mut self, command: &Command<'_>) -> Result<(), EngineError> {
        let s = self.raw();
        // SAFETY (all arms): the session is live and every pointer is null
        // or a NUL-terminated string that outlives the call.
        let rc = match *command {
            Command::Join { channel, key } => {
                let (channel, key) = (cstring(channel)?, opt_cstring(key)?);
                unsafe { ffi::irc_cmd_join(s, channel.as_ptr(), opt_ptr(&key)) }
            }
            Command::Part { channel } => {
                let channel = cstring(channel)?;
                unsafe { ffi::irc_cmd_part(s, channel.as_ptr()) }
            }
            Command::Invite { nick, channel } => {
                let (nick, channel) = (cstring(nick)?, cstring(channel)?);
                unsafe { ffi::irc_cmd_invite(s, nick.as_ptr(), channel.as_ptr()) }
            }
            Command::Names { channel } => {
                let channel = cstring(channel)?;
                unsafe { ffi::irc_cmd_names(s, channel.as_ptr()) }
            }
            Command::List { channel } => {
                let channel = cstring(channel)?;
                unsafe { ffi::irc_cmd_list(s, channel.as_ptr()) }
            }
            Command::Topic { channel, topic } => {
                let (channel, topic) = (cstring(channel)?, opt_cstring(topic)?);
                unsafe { ffi::irc_cmd_topic(s, channel.as_ptr(), opt_ptr(&topic)) }
            }
            Command::ChannelMode { channel, mode } => {
                let (channel, mode) = (cstring(channel)?, opt_cstring(mode)?);
                unsafe { ffi::irc_cmd_channel_mode(s, channel.as_ptr(), opt_ptr(&mode)) }
            }
            Command::Kick {
                nick,
                channel,
                reason,
            } => {
                let (nick, channel, reason) = (cstring(nick)?, cstring(channel)?, opt_cstring(reason)?);
                unsafe { ffi::irc_cmd_kick(s, nick.as_ptr(), channel.as_ptr(), opt_ptr(&reason)) }
            }
            Command::Msg { target, text } => {
                let (target, text) = (cstring(target)?, cstring(text)?);
                unsafe { ffi::irc_cmd_msg(s, target.as_ptr(), text.as_ptr()) }
            }
            Command::Me { target, text } => {
                let (target, text) = (cstring(target)?, cstring(text)?);
                unsafe { ffi::irc_cmd_me(s, target.as_ptr(), text.as_ptr()) }
            }
            Command::Notice { target, text } => {
                let (target, text) = (cstring(target)?, cstring(text)?);
                unsafe { ffi::irc_cmd_notice(s, target.as_ptr(), text.as_ptr()) }
            }
            Command::Quit { reason } => {
                let reason = opt_cstring(reason)?;
                unsafe { ffi::irc_cmd_quit(s, opt_ptr(&reason)) }
            }
            Command::UserMode { mode } => {
                let mode = opt_cstring(mode)?;
                unsafe { ffi::irc_cmd_user_mode(s, opt_ptr(&mode)) }
            }
            Command::Nick { nick } => {
                let nick = cstring(nick)?;
                unsafe { ffi::irc_cmd_nick(s, nick.as_ptr()) }
            }
            Command::Whois { nick } => {
                let nick = cstring(nick)?;
                unsafe { ffi::irc_cmd_whois(s, nick.as_ptr()) }
            }
            Command::CtcpReply { nick, reply } => {
                let (nick, reply) = (cstring(nick)?, cstring(reply)?);
                unsafe { ffi::irc_cmd_ctcp_reply(s, nick.as_ptr(), reply.as_ptr()) }
            }
            Command::CtcpRequest { nick, request } => {
                let (nick, request) = (cstring(nick)?, cstring(request)?);
                unsafe { ffi::irc_cmd_ctcp_request(s, nick.as_ptr(), request.as_ptr()) }
            }
            Command::Raw { line } => {
                let line = cstring(line)?;
                unsafe { ffi::irc_send_raw(s, c"%s".as_ptr(), line.as_ptr()) }
            }
        };
        self.check(rc)
    }

    fn want_descriptors(
        &mut self,
        read: &mut DescriptorSet,
        write: &mut DescriptorSet,
    ) -> Result<(), EngineError> {
        let mut in_set = empty_fd_set();
        let mut out_set = empty_fd_set();
        let mut max_fd: c_int = -1;
        // SAFETY: both sets are initialized; the session is live.
        let rc = unsafe { ffi::irc_add_select_descriptors(self.raw(), &mut in_set, &mut out_set, &mut max_fd) };
        self.check(rc)?;
        read.extend(DescriptorSet::from_fd_set(&in_set, max_fd).iter());
        write.extend(DescriptorSet::from_fd_set(&out_set, max_fd).iter());
        Ok(())
    }

    fn process_ready_descriptors(
        &mut self,
        read: &DescriptorSet,
        write: &DescriptorSet,
        callbacks: &mut dyn Callbacks,
    ) -> Result<(), EngineError> {
        let invalid = |err: std::io::Error| EngineError::new(ERR_INVAL, err.to_string());
        let mut in_set = read.to_fd_set().map_err(invalid)?;
        let mut out_set = write.to_fd_set().map_err(invalid)?;

        let mut frame = Frame::new(callbacks);
        let s = self.raw();
        // SAFETY: the frame outlives the processing call and the previous
        // context is restored before it goes out of scope.
        let rc = unsafe {
            let previous = ffi::irc_get_ctx(s);
            ffi::irc_set_ctx(s, (&mut frame as *mut Frame<'_>).cast());
            let rc = ffi::irc_process_select_descriptors(s, &mut in_set, &mut out_set);
            ffi::irc_set_ctx(s, previous);
            rc
        };
        frame.finish();
        self.check(rc)
    }
}

fn cstring(value: &str) -> Result<CString, EngineError> {
    CString::new(value).map_err(|_| EngineError::new(ERR_INVAL, strerror(ERR_INVAL)))
}

fn opt_cstring(value: Option<&str>) -> Result<Option<CString>, EngineError> {
    value.map(cstring).transpose()
}

fn opt_ptr(value: &Option<CString>) -> *const c_char {
    value.as_ref().map_or(ptr::null(), |v| v.as_ptr())
}

fn strerror(code: c_int) -> String {
    // SAFETY: irc_strerror returns a static string or null.
    let msg = unsafe { ffi::irc_strerror(code) };
    if msg.is_null() {
        format!("libircclient error {code}")
    } else {
        // SAFETY: non-null results are NUL-terminated.
        unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
    }
}

// ============================================================================
// Trampolines
// ============================================================================

/// # Safety
///
/// `ptr` must be null or a valid NUL-terminated string.
unsafe fn text<'a>(ptr: *const c_char) -> Option<Cow<'a, str>> {
    if ptr.is_null() {
        None
    } else {
        // SAFETY: non-null per the contract above.
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy())
    }
}

/// # Safety
///
/// `params` must point at `count` string pointers, each null or valid.
unsafe fn param_list<'a>(params: *const *const c_char, count: c_uint) -> Vec<Cow<'a, str>> {
    if params.is_null() || count == 0 {
        return Vec::new();
    }
    // SAFETY: per the contract above.
    let raw = unsafe { slice::from_raw_parts(params, count as usize) };
    raw.iter()
        .map(|&p| unsafe { text(p) }.unwrap_or(Cow::Borrowed("")))
        .collect()
}

/// Run `f` against the active frame with a borrowed view of `session`.
///
/// # Safety
///
/// `session` must be a live session; its context must be null or a frame
/// installed by [`NativeEngine::process_ready_descriptors`].
unsafe fn with_frame(session: *mut ffi::IrcSession, f: impl FnOnce(&mut dyn Callbacks, &mut dyn Engine)) {
    // SAFETY: per the contract above.
    let ctx = unsafe { ffi::irc_get_ctx(session) };
    let (Some(frame), Some(session)) = (NonNull::new(ctx.cast::<Frame<'_>>()), NonNull::new(session)) else {
        return;
    };
    let mut view = NativeEngine {
        session,
        owned: false,
    };
    // SAFETY: the frame is live for the whole processing call.
    let frame = unsafe { &mut *frame.as_ptr() };
    frame.run(&mut view, f);
}

macro_rules! event_trampolines {
    ($($fn_name:ident => $kind:expr),* $(,)?) => {
        $(
            unsafe extern "C" fn $fn_name(
                session: *mut ffi::IrcSession,
                event: *const c_char,
                origin: *const c_char,
                params: *const *const c_char,
                count: c_uint,
            ) {
                // SAFETY: the library passes valid strings for the event.
                unsafe {
                    let event = text(event).unwrap_or(Cow::Borrowed(""));
                    let origin = text(origin);
                    let params = param_list(params, count);
                    let params: Vec<&str> = params.iter().map(|p| p.as_ref()).collect();
                    with_frame(session, |callbacks, engine| {
                        callbacks.event(engine, $kind, &event, origin.as_deref(), &params)
                    });
                }
            }
        )*
    };
}

event_trampolines! {
    on_connect => EventKind::Connect,
    on_nick => EventKind::Nick,
    on_quit => EventKind::Quit,
    on_join => EventKind::Join,
    on_part => EventKind::Part,
    on_mode => EventKind::Mode,
    on_umode => EventKind::Umode,
    on_topic => EventKind::Topic,
    on_kick => EventKind::Kick,
    on_channel => EventKind::Channel,
    on_privmsg => EventKind::Privmsg,
    on_notice => EventKind::Notice,
    on_channel_notice => EventKind::ChannelNotice,
    on_invite => EventKind::Invite,
    on_ctcp_req => EventKind::CtcpReq,
    on_ctcp_rep => EventKind::CtcpRep,
    on_ctcp_action => EventKind::CtcpAction,
    on_unknown => EventKind::Unknown,
}

unsafe extern "C" fn on_numeric(
    session: *mut ffi::IrcSession,
    code: c_uint,
    origin: *const c_char,
    params: *const *const c_char,
    count: c_uint,
) {
    // SAFETY: the library passes valid strings for the event.
    unsafe {
        let origin = text(origin);
        let params = param_list(params, count);
        let params: Vec<&str> = params.iter().map(|p| p.as_ref()).collect();
        with_frame(session, |callbacks, engine| {
            callbacks.numeric(engine, code, origin.as_deref(), &params)
        });
    }
}

unsafe extern "C" fn on_dcc_chat_req(
    session: *mut ffi::IrcSession,
    nick: *const c_char,
    addr: *const c_char,
    dccid: c_uint,
) {
    // SAFETY: the library passes valid strings for the request.
    unsafe {
        let nick = text(nick).unwrap_or_default();
        let addr = text(addr).unwrap_or_default();
        with_frame(session, |callbacks, engine| {
            callbacks.dcc_chat_request(engine, &nick, &addr, dccid as DccId)
        });
    }
}

unsafe extern "C" fn on_dcc_send_req(
    session: *mut ffi::IrcSession,
    nick: *const c_char,
    addr: *const c_char,
    filename: *const c_char,
    size: c_ulong,
    dccid: c_uint,
) {
    // SAFETY: the library passes valid strings for the request.
    unsafe {
        let nick = text(nick).unwrap_or_default();
        let addr = text(addr).unwrap_or_default();
        let filename = text(filename).unwrap_or_default();
        with_frame(session, |callbacks, engine| {
            callbacks.dcc_send_request(engine, &nick, &addr, &filename, size as u64, dccid as DccId)
        });
    }
}

fn callback_table() -> ffi::IrcCallbacks {
    ffi::IrcCallbacks {
        event_connect: Some(on_connect),
        event_nick: Some(on_nick),
        event_quit: Some(on_quit),
        event_join: Some(on_join),
        event_part: Some(on_part),
        event_mode: Some(on_mode),
        event_umode: Some(on_umode),
        event_topic: Some(on_topic),
        event_kick: Some(on_kick),
        event_channel: Some(on_channel),
        event_privmsg: Some(on_privmsg),
        event_notice: Some(on_notice),
        event_channel_notice: Some(on_channel_notice),
        event_invite: Some(on_invite),
        event_ctcp_req: Some(on_ctcp_req),
        event_ctcp_rep: Some(on_ctcp_rep),
        event_ctcp_action: Some(on_ctcp_action),
        event_unknown: Some(on_unknown),
        event_numeric: Some(on_numeric),
        event_dcc_chat_req: Some(on_dcc_chat_req),
        event_dcc_send_req: Some(on_dcc_send_req),
    }
}

//! Connection handshake and serialized command dispatch.
//!
//! One [`PjLink`] maps to one transport stream.  The protocol carries no
//! request identifiers and is strictly half-duplex, so a single worker
//! task owns the transport and drains a request channel: FIFO ordering
//! and the one-command-in-flight invariant both fall out of that shape.
//! Each request resolves through a oneshot completion slot.
//!
//! Fatal outcomes (timeout, transport failure, authentication rejection)
//! stop the worker; queued and later requests fail fast with
//! [`PjLinkError::ConnectionUnusable`] without touching the transport.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{classify_body, Payload, PjLinkError};
use crate::groups::{
    ErrorStatus, Filter, Freeze, Information, Lamps, Mute, Power, Sources, Volume,
};
use crate::protocol::auth::{challenge_digest, parse_greeting, Greeting};
use crate::protocol::codec::{decode_reply, encode_command, Reply};
use crate::protocol::command::Command;
use crate::transport::LineTransport;

/// Default PJLink TCP port.
pub const DEFAULT_PORT: u16 = 4352;

/// Caller-facing configuration.  No hidden defaults change protocol
/// behaviour: the password is used only when the device demands it, and
/// the timeout bounds every wire wait including the greeting.
#[derive(Debug, Clone)]
pub struct PjLinkConfig {
    /// Password for the authentication handshake.  Never logged.
    pub password: Option<String>,
    /// Deadline for each command's reply and for the greeting read.
    pub timeout: Duration,
    /// Log raw wire traffic at DEBUG level.  The authentication digest is
    /// omitted from traced lines.
    pub trace_wire: bool,
}

impl Default for PjLinkConfig {
    fn default() -> Self {
        Self {
            password: None,
            timeout: Duration::from_secs(4),
            trace_wire: false,
        }
    }
}

struct Request {
    command: Command,
    reply: oneshot::Sender<Result<Payload, PjLinkError>>,
}

/// Shared dispatch handle: a sender into the worker's request queue plus
/// the shutdown signal.  Facades borrow this.
pub(crate) struct Session {
    requests: mpsc::Sender<Request>,
    shutdown: Arc<Notify>,
}

impl Session {
    fn start<T>(transport: LineTransport<T>, auth_prefix: Option<String>, config: PjLinkConfig) -> Self
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        let shutdown = Arc::new(Notify::new());
        tokio::spawn(run_worker(
            transport,
            rx,
            Arc::clone(&shutdown),
            auth_prefix,
            config,
        ));
        Self {
            requests: tx,
            shutdown,
        }
    }

    /// Queues one command and waits for its classified outcome.
    pub(crate) async fn send(&self, command: Command) -> Result<Payload, PjLinkError> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(Request { command, reply: tx })
            .await
            .map_err(|_| PjLinkError::ConnectionUnusable)?;
        rx.await.map_err(|_| PjLinkError::ConnectionUnusable)?
    }

    /// Sends a command whose reply must be a value payload.
    pub(crate) async fn request_value(&self, command: Command) -> Result<String, PjLinkError> {
        let code = command.code();
        match self.send(command).await? {
            Payload::Value(value) => Ok(value),
            Payload::Status => Err(PjLinkError::MalformedResponse {
                command: code,
                detail: "expected a value, got the OK status token".to_string(),
            }),
        }
    }

    /// Sends a command whose reply must be the OK status token.
    pub(crate) async fn request_ok(&self, command: Command) -> Result<(), PjLinkError> {
        let code = command.code();
        match self.send(command).await? {
            Payload::Status => Ok(()),
            Payload::Value(value) => Err(PjLinkError::MalformedResponse {
                command: code,
                detail: format!("expected the OK status token, got {value:?}"),
            }),
        }
    }

    fn close(&self) {
        self.shutdown.notify_one();
    }
}

/// Drains the request queue one command at a time until shutdown or a
/// fatal failure.  Dropping the transport on exit closes the stream.
async fn run_worker<T>(
    mut transport: LineTransport<T>,
    mut requests: mpsc::Receiver<Request>,
    shutdown: Arc<Notify>,
    mut auth_prefix: Option<String>,
    config: PjLinkConfig,
) where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    loop {
        let request = tokio::select! {
            _ = shutdown.notified() => break,
            next = requests.recv() => match next {
                Some(request) => request,
                None => break,
            },
        };

        let outcome = tokio::select! {
            _ = shutdown.notified() => {
                let _ = request.reply.send(Err(PjLinkError::ConnectionUnusable));
                break;
            }
            outcome = execute(&mut transport, &mut auth_prefix, &request.command, &config) => outcome,
        };

        let fatal = outcome.as_ref().is_err_and(PjLinkError::is_fatal);
        // A cancelled caller only drops its completion slot; the wire
        // cycle above already ran to completion, keeping the stream in
        // sync for the next command.
        let _ = request.reply.send(outcome);
        if fatal {
            warn!("connection faulted; rejecting queued commands");
            break;
        }
    }

    requests.close();
    while let Ok(request) = requests.try_recv() {
        let _ = request.reply.send(Err(PjLinkError::ConnectionUnusable));
    }
    debug!("session worker stopped");
}

/// Runs one full wire cycle: render, write, and read until the correlated
/// reply arrives or the deadline passes.
async fn execute<T>(
    transport: &mut LineTransport<T>,
    auth_prefix: &mut Option<String>,
    command: &Command,
    config: &PjLinkConfig,
) -> Result<Payload, PjLinkError>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    // Consumed on the first command even if that command fails; the
    // challenge is valid for a single use per connection.
    let prefix = auth_prefix.take();
    let line = encode_command(command, prefix.as_deref());
    if config.trace_wire {
        debug!(authenticated = prefix.is_some(), "send {:?}", encode_command(command, None));
    }

    if let Err(error) = transport.write_line(&line).await {
        warn!(command = %command.code(), %error, "transport write failed");
        return Err(PjLinkError::ConnectionUnusable);
    }

    let deadline = Instant::now() + config.timeout;
    loop {
        let read = tokio::time::timeout_at(deadline, transport.read_line()).await;
        let line = match read {
            Err(_elapsed) => {
                return Err(PjLinkError::Timeout {
                    command: command.code(),
                    timeout: config.timeout,
                })
            }
            Ok(Err(error)) => {
                warn!(command = %command.code(), %error, "transport read failed");
                return Err(PjLinkError::ConnectionUnusable);
            }
            Ok(Ok(None)) => {
                warn!(command = %command.code(), "device closed the connection");
                return Err(PjLinkError::ConnectionUnusable);
            }
            Ok(Ok(Some(line))) => line,
        };
        if config.trace_wire {
            debug!("recv {line:?}");
        }

        let reply = decode_reply(&line).map_err(|error| PjLinkError::MalformedResponse {
            command: command.code(),
            detail: error.to_string(),
        })?;

        match reply {
            Reply::AuthRejected => return Err(PjLinkError::AuthenticationRejected),
            Reply::Response(response) => {
                if response.code != command.code() {
                    // Not addressed to the pending command.  Device-initiated
                    // notification flows will hook in here; until then the
                    // line is logged and skipped so it cannot be
                    // misattributed to this or a later request.
                    debug!(
                        expected = %command.code(),
                        received = %response.code,
                        "skipping uncorrelated reply line"
                    );
                    continue;
                }
                if response.class != command.class() {
                    return Err(PjLinkError::MalformedResponse {
                        command: command.code(),
                        detail: format!(
                            "reply echoed class {} for a class {} command",
                            response.class,
                            command.class()
                        ),
                    });
                }
                return classify_body(command.code(), response.body);
            }
        }
    }
}

/// One logical link to a projector.
///
/// Created by [`PjLink::connect`], which performs the greeting and
/// authentication handshake before returning; the handle then serves any
/// number of command/response cycles through its facades until
/// [`PjLink::close`] or a fatal wire failure.
///
/// ```no_run
/// use pjlink::{PjLink, PjLinkConfig, PowerState};
///
/// # async fn demo() -> Result<(), pjlink::PjLinkError> {
/// let link = PjLink::connect_tcp("192.168.1.120", pjlink::DEFAULT_PORT, PjLinkConfig {
///     password: Some("secret".to_string()),
///     ..PjLinkConfig::default()
/// })
/// .await?;
///
/// link.power().turn_on().await?;
/// assert_eq!(link.power().state().await?, PowerState::Warming);
/// link.close();
/// # Ok(())
/// # }
/// ```
pub struct PjLink {
    session: Session,
}

impl PjLink {
    /// Performs the PJLink handshake over an already-connected duplex
    /// stream and returns a ready connection.
    ///
    /// # Errors
    ///
    /// Returns [`PjLinkError::Handshake`] when the greeting is missing or
    /// malformed, or when the device requires authentication and no
    /// password is configured.  The stream is dropped on every failure
    /// path.
    pub async fn connect<T>(stream: T, config: PjLinkConfig) -> Result<Self, PjLinkError>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let mut transport = LineTransport::new(stream);

        let greeting_line = tokio::time::timeout(config.timeout, transport.read_line())
            .await
            .map_err(|_| PjLinkError::Handshake {
                reason: "device did not send a greeting in time".to_string(),
            })?
            .map_err(|error| PjLinkError::Handshake {
                reason: format!("greeting read failed: {error}"),
            })?
            .ok_or_else(|| PjLinkError::Handshake {
                reason: "device closed the connection before greeting".to_string(),
            })?;

        let auth_prefix = match parse_greeting(&greeting_line) {
            Ok(Greeting::Open) => None,
            Ok(Greeting::AuthRequired { challenge }) => {
                let password =
                    config
                        .password
                        .as_deref()
                        .ok_or_else(|| PjLinkError::Handshake {
                            reason: "device requires authentication but no password is configured"
                                .to_string(),
                        })?;
                Some(challenge_digest(&challenge, password))
            }
            Err(error) => {
                return Err(PjLinkError::Handshake {
                    reason: error.to_string(),
                })
            }
        };

        info!(authenticated = auth_prefix.is_some(), "PJLink handshake complete");
        Ok(Self {
            session: Session::start(transport, auth_prefix, config),
        })
    }

    /// Dials `host:port` over TCP (bounded by the configured timeout) and
    /// performs the handshake.  Projectors listen on [`DEFAULT_PORT`].
    pub async fn connect_tcp(
        host: &str,
        port: u16,
        config: PjLinkConfig,
    ) -> Result<Self, PjLinkError> {
        let stream = tokio::time::timeout(config.timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| PjLinkError::Handshake {
                reason: format!("connection to {host}:{port} timed out"),
            })?
            .map_err(|error| PjLinkError::Handshake {
                reason: format!("connection to {host}:{port} failed: {error}"),
            })?;
        Self::connect(stream, config).await
    }

    /// Power control and query.
    pub fn power(&self) -> Power<'_> {
        Power::new(&self.session)
    }

    /// Input source selection and enumeration.
    pub fn sources(&self) -> Sources<'_> {
        Sources::new(&self.session)
    }

    /// Audio/video mute control.
    pub fn mute(&self) -> Mute<'_> {
        Mute::new(&self.session)
    }

    /// Lamp hours and lit state.
    pub fn lamps(&self) -> Lamps<'_> {
        Lamps::new(&self.session)
    }

    /// Per-subsystem error status.
    pub fn errors(&self) -> ErrorStatus<'_> {
        ErrorStatus::new(&self.session)
    }

    /// Device identification and version queries.
    pub fn info(&self) -> Information<'_> {
        Information::new(&self.session)
    }

    /// Filter usage and replacement models (Class 2).
    pub fn filter(&self) -> Filter<'_> {
        Filter::new(&self.session)
    }

    /// Frame freeze control (Class 2).
    pub fn freeze(&self) -> Freeze<'_> {
        Freeze::new(&self.session)
    }

    /// Speaker volume stepping (Class 2).
    pub fn speaker(&self) -> Volume<'_> {
        Volume::speaker(&self.session)
    }

    /// Microphone volume stepping (Class 2).
    pub fn microphone(&self) -> Volume<'_> {
        Volume::microphone(&self.session)
    }

    /// Closes the connection.  A command waiting on the wire resolves
    /// with [`PjLinkError::ConnectionUnusable`]; later calls fail fast.
    pub fn close(&self) {
        self.session.close();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

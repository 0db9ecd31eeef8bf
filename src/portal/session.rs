//! # Session Lifecycle
//!
//! State machine for the three-step ScreenCast session setup:
//! `Uninitialized -> Created -> SourcesSelected -> Started`, with `Closed`
//! as the terminal cleanup state. Every transition is one correlated portal
//! request; the guard on each transition rejects out-of-order calls before
//! anything touches the bus.
//!
//! `close()` is deliberately different from the setup transitions: it is
//! best-effort, swallows failures, and forces the state to `Closed` no
//! matter what, because it runs during unwind and must never mask the error
//! that got us there.

use std::time::Duration;

use zbus::Connection;
use zbus::zvariant::OwnedObjectPath;

use crate::error::{CheckError, CheckResult};
use crate::portal::proxy::{
    CURSOR_MODE_EMBEDDED, CreateSessionOptions, CreateSessionResults, SOURCE_TYPE_MONITOR,
    ScreenCastProxy, SelectSourcesOptions, SelectSourcesResults, SessionProxy, StartOptions,
    StartResults, Stream,
};
use crate::portal::request::RequestCorrelator;

/// Lifecycle states of the capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Created,
    SourcesSelected,
    Started,
    Closed,
}

impl SessionState {
    /// State name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Uninitialized => "Uninitialized",
            SessionState::Created => "Created",
            SessionState::SourcesSelected => "SourcesSelected",
            SessionState::Started => "Started",
            SessionState::Closed => "Closed",
        }
    }

    /// Reject `attempted` unless the machine is in `required` state. Runs
    /// before any remote call is issued.
    pub(crate) fn guard(self, required: SessionState, attempted: &'static str) -> CheckResult<()> {
        if self == required {
            Ok(())
        } else {
            Err(CheckError::State {
                current: self.name(),
                attempted,
            })
        }
    }

    /// Whether `close()` has anything to do in this state.
    pub(crate) fn closeable(self) -> bool {
        !matches!(self, SessionState::Uninitialized | SessionState::Closed)
    }
}

/// Metadata for the negotiated PipeWire stream, extracted from the first
/// entry of a successful `Start` response. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDescriptor {
    /// PipeWire node the capture pipeline should attach to.
    pub node_id: u32,
    /// Advertised stream geometry. `None` when the compositor does not
    /// advertise a size; the capture step then discovers geometry itself.
    pub size: Option<(i32, i32)>,
}

/// Drives one ScreenCast session through setup and teardown.
///
/// Exactly one session exists per run. The session token is fixed for the
/// whole process so that a retried run would target the same server-side
/// session rather than accrete new ones.
pub struct ScreencastSession {
    connection: Connection,
    proxy: ScreenCastProxy<'static>,
    correlator: RequestCorrelator,
    session_token: String,
    state: SessionState,
    session_handle: Option<OwnedObjectPath>,
    stream: Option<StreamDescriptor>,
}

impl ScreencastSession {
    /// Connect to the session bus and set up the ScreenCast proxy. No portal
    /// request is issued yet.
    pub async fn connect(timeout: Duration) -> CheckResult<Self> {
        let connection = Connection::session().await?;
        let proxy = ScreenCastProxy::new(&connection).await?;
        let correlator = RequestCorrelator::new(connection.clone(), timeout)?;
        Ok(Self {
            connection,
            proxy,
            correlator,
            session_token: format!("rotcheck_session_{}", std::process::id()),
            state: SessionState::Uninitialized,
            session_handle: None,
            stream: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stream(&self) -> Option<&StreamDescriptor> {
        self.stream.as_ref()
    }

    /// `Uninitialized -> Created`: ask the portal for a session and store
    /// its handle.
    pub async fn create_session(&mut self) -> CheckResult<()> {
        self.state.guard(SessionState::Uninitialized, "CreateSession")?;
        println!("Creating screencast session...");

        let Self {
            proxy,
            correlator,
            session_token,
            ..
        } = self;
        let results: CreateSessionResults = correlator
            .call("CreateSession", |handle_token| {
                let options = CreateSessionOptions {
                    handle_token,
                    session_handle_token: session_token.clone(),
                };
                async move { proxy.create_session(&options).await }
            })
            .await?;

        let handle = results.session_handle.ok_or_else(|| {
            CheckError::protocol("CreateSession response is missing session_handle")
        })?;
        let handle = OwnedObjectPath::try_from(handle)
            .map_err(|error| CheckError::protocol(format!("invalid session handle: {error}")))?;
        println!("Session created: {}", handle);

        self.session_handle = Some(handle);
        self.state = SessionState::Created;
        Ok(())
    }

    /// `Created -> SourcesSelected`: pin the capture to monitor-class
    /// sources, single selection, cursor embedded. The response body carries
    /// no state; the effect is server-side.
    pub async fn select_sources(&mut self) -> CheckResult<()> {
        self.state.guard(SessionState::Created, "SelectSources")?;
        println!("Selecting sources...");

        let handle = self.handle()?.clone();
        let Self {
            proxy, correlator, ..
        } = self;
        let _results: SelectSourcesResults = correlator
            .call("SelectSources", |handle_token| {
                let options = SelectSourcesOptions {
                    handle_token,
                    types: SOURCE_TYPE_MONITOR,
                    multiple: false,
                    cursor_mode: CURSOR_MODE_EMBEDDED,
                };
                async move { proxy.select_sources(&handle, &options).await }
            })
            .await?;
        println!("Sources selected");

        self.state = SessionState::SourcesSelected;
        Ok(())
    }

    /// `SourcesSelected -> Started`: start the stream and extract the first
    /// stream entry's node id and advertised size.
    pub async fn start(&mut self) -> CheckResult<StreamDescriptor> {
        self.state.guard(SessionState::SourcesSelected, "Start")?;
        println!("Starting session...");

        let handle = self.handle()?.clone();
        let Self {
            proxy, correlator, ..
        } = self;
        let results: StartResults = correlator
            .call("Start", |handle_token| {
                let options = StartOptions { handle_token };
                // Empty parent window: headless use, nothing to attach the
                // permission dialog to.
                async move { proxy.start(&handle, "", &options).await }
            })
            .await?;

        let Stream(node_id, properties) = results
            .streams
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or(CheckError::NoStream)?;
        let descriptor = StreamDescriptor {
            node_id,
            size: properties.size,
        };
        match descriptor.size {
            Some((width, height)) => println!(
                "Stream started: node_id={}, advertised size {}x{}",
                node_id, width, height
            ),
            None => println!("Stream started: node_id={}, no advertised size", node_id),
        }

        self.stream = Some(descriptor);
        self.state = SessionState::Started;
        Ok(descriptor)
    }

    /// Best-effort session teardown. Valid from any state that holds a live
    /// session; a second call is a no-op. Failures are logged, never raised.
    pub async fn close(&mut self) {
        if !self.state.closeable() {
            return;
        }
        self.state = SessionState::Closed;
        let Some(handle) = self.session_handle.take() else {
            return;
        };
        match close_session(&self.connection, &handle).await {
            Ok(()) => println!("Session closed"),
            Err(error) => eprintln!("Warning: failed to close session {handle}: {error}"),
        }
    }

    fn handle(&self) -> CheckResult<&OwnedObjectPath> {
        // The state guards make a missing handle unreachable, but a protocol
        // error beats a panic if that ever stops holding.
        self.session_handle
            .as_ref()
            .ok_or_else(|| CheckError::protocol("no session handle stored"))
    }
}

async fn close_session(connection: &Connection, handle: &OwnedObjectPath) -> zbus::Result<()> {
    let proxy = SessionProxy::builder(connection)
        .path(handle.as_str())?
        .build()
        .await?;
    proxy.close().await
}

//! # Portal Wire Types
//!
//! Typed D-Bus proxies and vardict bodies for the ScreenCast portal.
//!
//! The portal convention is that every method takes an `a{sv}` options
//! vardict and every asynchronous response carries an `a{sv}` results
//! vardict. Both directions are modeled as plain structs via zvariant's
//! `SerializeDict`/`DeserializeDict` derives; response fields are `Option`
//! because a failed request delivers an empty results dict.

use serde::Deserialize;
use zbus::proxy;
use zbus::zvariant::{DeserializeDict, ObjectPath, OwnedObjectPath, SerializeDict, Type};

/// Source-type bitmask value for monitor-class sources. The portal also
/// defines window (2) and virtual (4) sources; this tool captures monitors
/// only.
pub const SOURCE_TYPE_MONITOR: u32 = 1;

/// Cursor mode that composites the pointer into the captured frames.
pub const CURSOR_MODE_EMBEDDED: u32 = 2;

/// The `org.freedesktop.portal.ScreenCast` interface, as exposed by the
/// desktop portal service. Each method returns the object path of a portal
/// `Request`; the actual result arrives later as a `Response` signal on that
/// path (see [`crate::portal::request`]).
#[proxy(
    interface = "org.freedesktop.portal.ScreenCast",
    default_service = "org.freedesktop.portal.Desktop",
    default_path = "/org/freedesktop/portal/desktop"
)]
pub trait ScreenCast {
    fn create_session(&self, options: &CreateSessionOptions) -> zbus::Result<OwnedObjectPath>;

    fn select_sources(
        &self,
        session_handle: &ObjectPath<'_>,
        options: &SelectSourcesOptions,
    ) -> zbus::Result<OwnedObjectPath>;

    fn start(
        &self,
        session_handle: &ObjectPath<'_>,
        parent_window: &str,
        options: &StartOptions,
    ) -> zbus::Result<OwnedObjectPath>;
}

/// The `org.freedesktop.portal.Session` interface, reached at the session
/// handle path for teardown.
#[proxy(
    interface = "org.freedesktop.portal.Session",
    default_service = "org.freedesktop.portal.Desktop"
)]
pub trait Session {
    fn close(&self) -> zbus::Result<()>;
}

#[derive(SerializeDict, Type, Debug)]
#[zvariant(signature = "dict")]
pub struct CreateSessionOptions {
    /// Per-request handle token, unique for the process lifetime.
    pub handle_token: String,
    /// Per-process session token, stable across the whole run.
    pub session_handle_token: String,
}

#[derive(SerializeDict, Type, Debug)]
#[zvariant(signature = "dict")]
pub struct SelectSourcesOptions {
    pub handle_token: String,
    /// Source-type bitmask; always [`SOURCE_TYPE_MONITOR`] here.
    pub types: u32,
    /// Whether the chooser may select more than one source.
    pub multiple: bool,
    /// Always [`CURSOR_MODE_EMBEDDED`] here.
    pub cursor_mode: u32,
}

#[derive(SerializeDict, Type, Debug)]
#[zvariant(signature = "dict")]
pub struct StartOptions {
    pub handle_token: String,
}

/// Results vardict of a successful `CreateSession` response.
#[derive(DeserializeDict, Type, Debug)]
#[zvariant(signature = "dict")]
pub struct CreateSessionResults {
    pub session_handle: Option<String>,
}

/// `SelectSources` returns no state; its effect is server-side source
/// pinning.
#[derive(DeserializeDict, Type, Debug)]
#[zvariant(signature = "dict")]
pub struct SelectSourcesResults {}

/// Results vardict of a successful `Start` response.
#[derive(DeserializeDict, Type, Debug)]
#[zvariant(signature = "dict")]
pub struct StartResults {
    pub streams: Option<Vec<Stream>>,
}

/// One `(ua{sv})` stream entry from a `Start` response.
#[derive(Deserialize, Type, Debug, Clone)]
pub struct Stream(pub u32, pub StreamProperties);

/// Per-stream properties. Only `size` matters to this tool; compositors are
/// not required to advertise it.
#[derive(DeserializeDict, Type, Debug, Clone)]
#[zvariant(signature = "dict")]
pub struct StreamProperties {
    pub id: Option<String>,
    pub position: Option<(i32, i32)>,
    pub size: Option<(i32, i32)>,
    pub source_type: Option<u32>,
}

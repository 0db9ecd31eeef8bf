// # Portal Module
//
// D-Bus client for the org.freedesktop.portal.ScreenCast interface: typed
// proxies and wire types, asynchronous request/response correlation, and the
// session lifecycle state machine built on top of both.

pub mod proxy;
pub mod request;
pub mod session;

pub use request::RequestCorrelator;
pub use session::{ScreencastSession, SessionState, StreamDescriptor};

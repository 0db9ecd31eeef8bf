//! # Request Correlation
//!
//! Turns the portal's fire-and-forget request objects into bounded,
//! synchronous-looking calls.
//!
//! ## How portal requests resolve
//!
//! A portal method returns immediately with the object path of a `Request`;
//! the real result arrives later as a `Response` signal on that path, or
//! never (the user can dismiss the permission dialog and walk away). The
//! path is predictable: the portal derives it from the caller's unique bus
//! name and the `handle_token` the caller put in the options vardict. That
//! prediction is what lets us subscribe for the response *before* issuing
//! the call, closing the window where a fast portal could reply to a signal
//! match that does not exist yet.
//!
//! ## Lifecycle
//!
//! Each call gets its own one-shot [`MessageStream`] scoped by a match rule
//! to exactly one request path. The stream is dropped (and its bus-side
//! match removed) on whichever exit fires first, response or deadline, so no
//! listener ever leaks into a later request that might reuse a path prefix.
//! Handle tokens come from a counter owned by this instance, so tokens stay
//! unique even if several correlators run in one process.

use std::future::Future;
use std::time::Duration;

use futures_util::TryStreamExt;
use serde::de::DeserializeOwned;
use zbus::message::Type as MessageType;
use zbus::zvariant::{ObjectPath, OwnedObjectPath, Type};
use zbus::{Connection, MatchRule, MessageStream};

use crate::error::{CheckError, CheckResult};

const REQUEST_IFACE: &str = "org.freedesktop.portal.Request";

/// Issues uniquely-tokened portal requests and resolves each one to its
/// eventual `Response` signal, under a timeout.
pub struct RequestCorrelator {
    connection: Connection,
    sender_token: String,
    counter: u64,
    timeout: Duration,
}

impl RequestCorrelator {
    /// Build a correlator over an established session-bus connection.
    pub fn new(connection: Connection, timeout: Duration) -> CheckResult<Self> {
        let unique_name = connection
            .unique_name()
            .ok_or_else(|| CheckError::protocol("connection has no unique name"))?
            .to_string();
        Ok(Self {
            sender_token: sender_token(&unique_name),
            connection,
            counter: 0,
            timeout,
        })
    }

    /// Issue one portal request and block until its response arrives or the
    /// timeout elapses.
    ///
    /// `issue` receives a fresh handle token, performs the remote call with
    /// that token in its options, and returns the request object path the
    /// portal handed back. The response's results vardict is deserialized
    /// into `T` on status code 0; any other status becomes
    /// [`CheckError::RequestFailed`].
    pub async fn call<T, F, Fut>(&mut self, operation: &'static str, issue: F) -> CheckResult<T>
    where
        T: DeserializeOwned + Type,
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = zbus::Result<OwnedObjectPath>>,
    {
        let token = self.next_token();
        let expected_path = self.request_path(&token)?;

        // Subscribe before the method call so an immediate response cannot
        // slip past us.
        let mut responses = self.subscribe(&expected_path).await?;
        let request_path = issue(token).await?;
        if request_path != expected_path {
            // Older portal backends predate the handle-token convention and
            // return a path of their own choosing; listen there instead.
            responses = self.subscribe(&request_path).await?;
        }

        let message = match tokio::time::timeout(self.timeout, responses.try_next()).await {
            Err(_) => {
                return Err(CheckError::Timeout {
                    operation,
                    secs: self.timeout.as_secs(),
                });
            }
            Ok(next) => next?.ok_or_else(|| {
                CheckError::protocol(format!("response stream for {operation} closed"))
            })?,
        };

        let body = message.body();
        let (code, results): (u32, T) = body.deserialize().map_err(|error| {
            CheckError::protocol(format!("malformed Response for {operation}: {error}"))
        })?;
        decode_response(operation, code, results)
    }

    /// Next handle token, unique for the life of this correlator.
    fn next_token(&mut self) -> String {
        self.counter += 1;
        format!("rotcheck_{}_{}", std::process::id(), self.counter)
    }

    /// The request object path the portal will use for `token`, per the
    /// `/org/freedesktop/portal/desktop/request/SENDER/TOKEN` convention.
    fn request_path(&self, token: &str) -> CheckResult<OwnedObjectPath> {
        ObjectPath::try_from(format!(
            "/org/freedesktop/portal/desktop/request/{}/{}",
            self.sender_token, token
        ))
        .map(Into::into)
        .map_err(|error| CheckError::protocol(format!("invalid request path: {error}")))
    }

    /// One-shot signal stream matching `Response` on exactly one path.
    async fn subscribe(&self, path: &OwnedObjectPath) -> CheckResult<MessageStream> {
        let rule = MatchRule::builder()
            .msg_type(MessageType::Signal)
            .interface(REQUEST_IFACE)?
            .member("Response")?
            .path(path.as_str())?
            .build();
        Ok(MessageStream::for_match_rule(rule, &self.connection, Some(1)).await?)
    }
}

/// Resolve a decoded `Response` body to a result: status 0 passes the
/// results vardict through, anything else is a failure — there is no code
/// path from a non-zero status to a success value.
fn decode_response<T>(operation: &'static str, code: u32, results: T) -> CheckResult<T> {
    if code != 0 {
        return Err(CheckError::RequestFailed { operation, code });
    }
    Ok(results)
}

/// Mangle a unique bus name into the token the portal embeds in request
/// paths: strip the leading `:`, turn `.` into `_` (`:1.42` becomes `1_42`).
pub(crate) fn sender_token(unique_name: &str) -> String {
    unique_name.trim_start_matches(':').replace('.', "_")
}

// Authenticated API client
// Bearer injection, auth-failure detection and single-flight session repair.

use anyhow::Context;
use reqwest::{header, Client, Request, Response, StatusCode, Url};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};

use crate::auth;
use crate::auth::types::{LoginRequest, LoginResponse};
use crate::error::{ClientError, Result};
use crate::realm::{self, Realm};
use crate::session::{self, Navigator};
use crate::store::{CredentialStore, TokenPair};

/// Upper bound on requests parked behind one in-flight refresh.
const MAX_PENDING_REQUESTS: usize = 64;

/// A request waiting for an in-flight refresh to settle.
struct PendingRequest {
    request: Request,
    done: oneshot::Sender<Result<Response>>,
}

/// Refresh bookkeeping for one realm. The queue is non-empty only while a
/// refresh is in flight, and is fully drained when it settles.
#[derive(Default)]
struct RealmFlight {
    in_flight: bool,
    queue: VecDeque<PendingRequest>,
}

/// Authenticated API client for the Altura backend.
///
/// Attaches the realm-appropriate bearer token to every outgoing request,
/// detects authentication failure, and repairs the session with a single
/// refresh call shared by every request that failed while it was in flight.
/// Queued requests are replayed in the order their failures were observed.
pub struct ApiClient {
    /// Shared HTTP client with connection pooling
    http: Client,

    /// Root of the REST backend
    base_url: Url,

    /// Per-realm credential storage
    store: Arc<dyn CredentialStore>,

    /// UI seam used by session teardown
    navigator: Arc<dyn Navigator>,

    /// Per-realm refresh state, indexed by `Realm::index`
    flights: [Mutex<RealmFlight>; 2],

    /// Timeout on the refresh call itself
    refresh_timeout: Duration,
}

impl ApiClient {
    /// Create a new client. Timeouts are in seconds.
    pub fn new(
        base_url: Url,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
        max_connections: usize,
        connect_timeout: u64,
        request_timeout: u64,
        refresh_timeout: u64,
    ) -> Result<Self> {
        let http = Client::builder()
            .pool_max_idle_per_host(max_connections)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url,
            store,
            navigator,
            flights: [
                Mutex::new(RealmFlight::default()),
                Mutex::new(RealmFlight::default()),
            ],
            refresh_timeout: Duration::from_secs(refresh_timeout),
        })
    }

    /// Override the refresh-call timeout with sub-second precision.
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    /// Get the underlying HTTP client.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Resolve a request path against the backend root.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Internal(anyhow::anyhow!("Invalid request path {path}: {e}")))
    }

    /// Execute a request through the authenticated pipeline.
    ///
    /// `Ok` always means a success response; backend rejections surface as
    /// `ClientError::Api`, an irreparable session as
    /// `ClientError::SessionExpired`, and an authentication failure that
    /// arrives while the realm's retry queue is already at capacity as
    /// `ClientError::RetryQueueFull` without waiting on the refresh.
    ///
    /// Requests whose body is a one-shot stream cannot be captured for
    /// replay; an authentication failure on one surfaces as
    /// `ClientError::Api` instead of entering the refresh path.
    pub async fn execute(&self, mut request: Request) -> Result<Response> {
        let realm = Realm::of_path(request.url().path());
        self.attach_bearer(&mut request, realm)?;

        let path = request.url().path().to_string();
        tracing::debug!(
            method = %request.method(),
            path = %path,
            realm = ?realm,
            "Sending API request"
        );

        // Capture a replayable copy before the body is consumed
        let retry_copy = request.try_clone();
        let response = self.http.execute(request).await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Failure detector: only a 401 on a retryable endpoint enters the
        // refresh path; everything else passes through to the caller.
        if status != StatusCode::UNAUTHORIZED || realm::refresh_exempt(&path) {
            return Err(Self::api_error(response).await);
        }

        let Some(retry) = retry_copy else {
            // Streaming bodies cannot be replayed
            return Err(Self::api_error(response).await);
        };

        tracing::debug!(path = %path, realm = ?realm, "Access token rejected, repairing session");
        self.recover(realm, retry).await
    }

    /// GET through the authenticated pipeline.
    pub async fn get(&self, path: &str) -> Result<Response> {
        let request = self.http.get(self.endpoint(path)?).build()?;
        self.execute(request).await
    }

    /// POST a JSON body through the authenticated pipeline.
    pub async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        let request = self.http.post(self.endpoint(path)?).json(body).build()?;
        self.execute(request).await
    }

    /// PUT a JSON body through the authenticated pipeline.
    pub async fn put_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        let request = self.http.put(self.endpoint(path)?).json(body).build()?;
        self.execute(request).await
    }

    /// DELETE through the authenticated pipeline.
    pub async fn delete(&self, path: &str) -> Result<Response> {
        let request = self.http.delete(self.endpoint(path)?).build()?;
        self.execute(request).await
    }

    /// Authenticate against the realm's login endpoint and persist the
    /// issued token pair. A fresh login is the only way to repopulate a
    /// realm after teardown.
    pub async fn login(&self, realm: Realm, email: &str, password: &str) -> Result<()> {
        let url = self.endpoint(realm.login_path())?;
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        // Login is refresh-exempt; its failures surface directly
        let response = self.http.post(url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let issued: LoginResponse = response.json().await?;
        self.store
            .save(realm, &TokenPair::new(issued.token, issued.refresh_token))?;

        tracing::info!(realm = ?realm, "Logged in");
        Ok(())
    }

    /// Drop the realm's stored credentials.
    pub fn logout(&self, realm: Realm) -> Result<()> {
        self.store.clear(realm)?;
        tracing::info!(realm = ?realm, "Logged out");
        Ok(())
    }

    /// Request interceptor: attach the realm's current access token, if any.
    /// Absence is not an error; the request goes out unauthenticated.
    fn attach_bearer(&self, request: &mut Request, realm: Realm) -> Result<()> {
        let Some(tokens) = self.store.load(realm)? else {
            return Ok(());
        };

        request
            .headers_mut()
            .insert(header::AUTHORIZATION, Self::bearer_value(&tokens.access_token)?);
        Ok(())
    }

    /// Refresh coordinator entry point: start a refresh for the realm or
    /// queue behind the one already in flight.
    async fn recover(&self, realm: Realm, request: Request) -> Result<Response> {
        // Bookkeeping only under the lock; never a network round trip.
        {
            let mut flight = self.flights[realm.index()].lock().await;
            if flight.in_flight {
                if flight.queue.len() >= MAX_PENDING_REQUESTS {
                    return Err(ClientError::RetryQueueFull(realm));
                }

                let (tx, rx) = oneshot::channel();
                flight.queue.push_back(PendingRequest { request, done: tx });
                drop(flight);

                tracing::debug!(realm = ?realm, "Refresh already in flight, request queued");
                return match rx.await {
                    Ok(result) => result,
                    Err(_) => Err(ClientError::Internal(anyhow::anyhow!(
                        "Refresh coordinator dropped a queued request"
                    ))),
                };
            }
            flight.in_flight = true;
        }

        let outcome = self.run_refresh(realm).await;

        // The refresh has settled: leave the in-flight state and take the
        // queue in one step, so failures arriving from here on start a
        // fresh refresh instead of queueing against a finished one.
        let drained: VecDeque<PendingRequest> = {
            let mut flight = self.flights[realm.index()].lock().await;
            flight.in_flight = false;
            std::mem::take(&mut flight.queue)
        };

        match outcome {
            Ok(tokens) => {
                tracing::debug!(
                    realm = ?realm,
                    queued = drained.len(),
                    "Refresh succeeded, replaying failed requests"
                );

                // The trigger failed before anything could queue behind its
                // refresh, so FIFO-by-failure-order replays it first, then
                // the queue in capture order.
                let result = self.replay(request, &tokens.access_token).await;
                for pending in drained {
                    let replayed = self.replay(pending.request, &tokens.access_token).await;
                    let _ = pending.done.send(replayed);
                }
                result
            }
            Err(err) => {
                let message = format!("{err:#}");
                tracing::error!(
                    realm = ?realm,
                    queued = drained.len(),
                    error = %message,
                    "Refresh failed, tearing down session"
                );

                for pending in drained {
                    let _ = pending
                        .done
                        .send(Err(ClientError::SessionExpired(message.clone())));
                }
                session::teardown(self.store.as_ref(), self.navigator.as_ref(), realm);
                Err(ClientError::SessionExpired(message))
            }
        }
    }

    /// Perform the realm's single refresh call and persist the new pair.
    async fn run_refresh(&self, realm: Realm) -> anyhow::Result<TokenPair> {
        let refresh_token = self
            .store
            .load(realm)?
            .map(|pair| pair.refresh_token)
            .with_context(|| format!("No stored refresh token for {:?} realm", realm))?;

        let tokens = auth::refresh_realm(
            &self.http,
            &self.base_url,
            realm,
            &refresh_token,
            self.refresh_timeout,
        )
        .await?;

        self.store.save(realm, &tokens)?;
        Ok(tokens)
    }

    /// Retry a request once with the renewed token. Replays go through a
    /// raw send, so a second authentication failure surfaces as an ordinary
    /// API error and can never be queued again.
    async fn replay(&self, mut request: Request, access_token: &str) -> Result<Response> {
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, Self::bearer_value(access_token)?);

        let response = self.http.execute(request).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::api_error(response).await)
        }
    }

    fn bearer_value(token: &str) -> Result<header::HeaderValue> {
        format!("Bearer {token}").parse().map_err(|_| {
            ClientError::Internal(anyhow::anyhow!("Access token is not a valid header value"))
        })
    }

    /// Turn a non-success response into a pass-through error, body included.
    async fn api_error(response: Response) -> ClientError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        ClientError::Api { status, message }
    }
}

//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one task per connection, shared `AppState`.

use hyper::body::Incoming;
use hyper::header::{HeaderMap, AUTHORIZATION};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::answers::AnswerService;
use crate::auth::{resolve_identity, Identity, JwtValidator, DEV_USER_HEADER};
use crate::config::Args;
use crate::ledger::IncentiveLedger;
use crate::provider::ProviderRegistry;
use crate::questions::QuestionService;
use crate::references::ReferenceGenerator;
use crate::routes::{self, BoxBody, Route};
use crate::scoring::{QueueConfig, Scorer, ScoringQueue, ScoringService};
use crate::store::Store;
use crate::types::IdeaMeshError;
use crate::unlock::UnlockGate;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub store: Arc<dyn Store>,
    pub jwt: JwtValidator,
    pub providers: ProviderRegistry,
    pub ledger: IncentiveLedger,
    pub questions: QuestionService,
    pub answers: AnswerService,
    pub scoring: ScoringService,
    pub unlocks: UnlockGate,
    pub references: ReferenceGenerator,
    /// Deferred scoring; workers are running once state exists
    pub queue: ScoringQueue,
    pub started_at: Instant,
}

impl AppState {
    /// Wire the services together and start the scoring workers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        args: Args,
        store: Arc<dyn Store>,
        providers: ProviderRegistry,
        jwt: JwtValidator,
    ) -> Self {
        let ledger = IncentiveLedger::new(Arc::clone(&store));
        let scorer = Scorer::new(Arc::clone(&store), providers.clone());
        let queue = ScoringQueue::start(
            QueueConfig {
                worker_count: args.scoring_workers,
                max_queue_size: args.scoring_queue_size,
            },
            scorer.clone(),
            Arc::clone(&store),
        );

        Self {
            questions: QuestionService::new(Arc::clone(&store)),
            answers: AnswerService::new(Arc::clone(&store), ledger.clone(), queue.clone()),
            scoring: ScoringService::new(scorer, Arc::clone(&store), ledger.clone()),
            unlocks: UnlockGate::new(Arc::clone(&store), ledger.clone()),
            references: ReferenceGenerator::new(Arc::clone(&store), providers.clone()),
            ledger,
            queue,
            providers,
            jwt,
            store,
            args,
            started_at: Instant::now(),
        }
    }

    /// Resolve the caller from request headers
    pub fn identity(&self, headers: &HeaderMap) -> Identity {
        let auth = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        let dev_user = headers.get(DEV_USER_HEADER).and_then(|v| v.to_str().ok());
        resolve_identity(&self.jwt, auth, dev_user, self.args.dev_mode)
    }
}

/// Start the HTTP server; returns after Ctrl-C
pub async fn run(state: Arc<AppState>) -> Result<(), IdeaMeshError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "IdeaMesh listening on {} (store: {}, providers: {:?})",
        state.args.listen,
        state.store.kind(),
        state.providers.kinds()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - {} header accepted as identity", DEV_USER_HEADER);
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, addr, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            error!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received, no longer accepting connections");
                return Ok(());
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!(peer = %addr, %method, %path, "Request");

    let route = Route::parse(&method, &path);
    Ok(routes::dispatch(state, route, req).await)
}

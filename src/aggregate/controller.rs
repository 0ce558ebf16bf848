use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::guest::{GuestLists, GuestLoad, GuestLoader};
use super::personalized::{PersonalizedFeed, PersonalizedLoader};
use crate::client::{ClientResult, RecipeSource, SearchPage, Session, SessionContext};
use crate::models::CategoryEntry;

/// Page size of the search side channel
pub const SEARCH_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    LoadingGuest,
    LoadingPersonalized,
    Ready,
}

/// Everything a view needs, published after every state change
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub phase: Phase,
    /// User the state belongs to, `None` for guests
    pub identity: Option<Uuid>,
    pub guest: Arc<GuestLists>,
    pub personalized: Option<Arc<PersonalizedFeed>>,
    pub guest_loading: bool,
    pub ml_loading: bool,
    /// Set when every guest list failed
    pub guest_error: Option<String>,
    /// Dismissible; cleared by a retry
    pub ml_error: Option<String>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            identity: None,
            guest: Arc::new(GuestLists::default()),
            personalized: None,
            guest_loading: false,
            ml_loading: false,
            guest_error: None,
            ml_error: None,
        }
    }
}

impl Snapshot {
    pub fn has_personalized_data(&self) -> bool {
        self.personalized
            .as_ref()
            .is_some_and(|feed| feed.has_personalized_data())
    }

    pub fn is_loading(&self) -> bool {
        self.guest_loading || self.ml_loading
    }

    pub fn is_ready_for(&self, identity: Option<Uuid>) -> bool {
        self.phase == Phase::Ready && self.identity == identity
    }
}

enum Command {
    Reload,
    RetryPersonalized(oneshot::Sender<()>),
    DismissMlError,
}

enum Outcome {
    Guest(GuestLoad),
    Personalized(PersonalizedFeed),
}

type Work = Pin<Box<dyn Future<Output = Outcome> + Send>>;

/// Drives guest and personalized loading for the current session
///
/// All state lives in one driver task; views read [`Snapshot`]s from a
/// watch channel. Dropping the controller aborts the driver and every
/// request in flight.
pub struct AggregationController {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<Snapshot>,
    recipes: Arc<dyn RecipeSource>,
    driver: JoinHandle<()>,
}

impl AggregationController {
    /// Spawns the driver on the current tokio runtime and starts the first load
    pub fn spawn(
        recipes: Arc<dyn RecipeSource>,
        personalized: PersonalizedLoader,
        session: &SessionContext,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());

        let driver = Driver {
            guest: GuestLoader::new(recipes.clone()),
            personalized,
            session: session.subscribe(),
            commands: command_rx,
            snapshots: snapshot_tx,
            pending_retries: Vec::new(),
        };

        Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            recipes,
            driver: tokio::spawn(driver.run()),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Waits for the first snapshot satisfying `predicate`
    pub async fn wait_until(&self, predicate: impl FnMut(&Snapshot) -> bool) -> Snapshot {
        let mut rx = self.snapshots.clone();
        let result = rx.wait_for(predicate).await.map(|snapshot| snapshot.clone());
        result.unwrap_or_else(|_| self.snapshot())
    }

    /// Reloads guest lists and, when signed in, the personalized feed
    pub fn reload(&self) {
        let _ = self.commands.send(Command::Reload);
    }

    /// Re-runs only the personalized path against the guest lists already loaded.
    /// Resolves once that run has been published.
    pub async fn retry_personalized(&self) -> Snapshot {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.commands.send(Command::RetryPersonalized(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
        self.snapshot()
    }

    pub fn dismiss_ml_error(&self) {
        let _ = self.commands.send(Command::DismissMlError);
    }

    /// Searches recipes without touching the published state
    pub async fn search(&self, term: &str, page: u32) -> ClientResult<SearchPage> {
        if term.trim().is_empty() {
            return Ok(SearchPage::default());
        }
        self.recipes
            .search(term.trim(), page.max(1), SEARCH_PAGE_SIZE)
            .await
    }

    pub async fn categories(&self) -> ClientResult<Vec<CategoryEntry>> {
        self.recipes.categories().await
    }

    /// Stops the driver, cancelling whatever is in flight
    pub fn shutdown(self) {
        self.driver.abort();
    }
}

impl Drop for AggregationController {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

struct Driver {
    guest: GuestLoader,
    personalized: PersonalizedLoader,
    session: watch::Receiver<Option<Session>>,
    commands: mpsc::UnboundedReceiver<Command>,
    snapshots: watch::Sender<Snapshot>,
    pending_retries: Vec<oneshot::Sender<()>>,
}

fn identity_of(session: &Option<Session>) -> Option<Uuid> {
    session.as_ref().map(|s| s.user_id)
}

impl Driver {
    async fn run(mut self) {
        let mut identity = identity_of(&self.session.borrow_and_update());
        let mut work = Some(self.start_guest(identity));
        let mut session_open = true;

        loop {
            tokio::select! {
                changed = self.session.changed(), if session_open => {
                    if changed.is_err() {
                        session_open = false;
                        continue;
                    }
                    let next = identity_of(&self.session.borrow_and_update());
                    if next != identity {
                        tracing::info!(from = ?identity, to = ?next, "Session identity changed, reloading");
                        identity = next;
                        // Dropping the old work cancels its requests
                        self.pending_retries.clear();
                        work = Some(self.start_guest(identity));
                    }
                }
                command = self.commands.recv() => match command {
                    None => break,
                    Some(Command::Reload) => {
                        work = Some(self.start_guest(identity));
                    }
                    Some(Command::RetryPersonalized(ack)) => {
                        self.pending_retries.push(ack);
                        let guest_in_flight = self.snapshots.borrow().guest_loading;
                        match identity {
                            // The personalized stage follows the guest stage anyway
                            Some(_) if guest_in_flight => {}
                            Some(user_id) => work = Some(self.start_personalized(user_id)),
                            None => self.ack_retries(),
                        }
                    }
                    Some(Command::DismissMlError) => {
                        self.snapshots.send_if_modified(|s| s.ml_error.take().is_some());
                    }
                },
                outcome = async {
                    match work.as_mut() {
                        Some(running) => running.await,
                        None => std::future::pending().await,
                    }
                } => {
                    work = None;
                    match outcome {
                        Outcome::Guest(load) => {
                            let guest = self.finish_guest(load, identity.is_some());
                            match identity {
                                Some(user_id) => {
                                    work = Some(self.start_personalized_with(user_id, guest));
                                }
                                None => self.ack_retries(),
                            }
                        }
                        Outcome::Personalized(feed) => {
                            self.finish_personalized(feed);
                            self.ack_retries();
                        }
                    }
                }
            }
        }
    }

    fn start_guest(&mut self, identity: Option<Uuid>) -> Work {
        self.snapshots.send_modify(|s| {
            if s.identity != identity {
                s.personalized = None;
                s.ml_error = None;
            }
            s.identity = identity;
            s.phase = Phase::LoadingGuest;
            s.guest_loading = true;
            s.ml_loading = false;
        });

        let loader = self.guest.clone();
        Box::pin(async move { Outcome::Guest(loader.load().await) })
    }

    fn finish_guest(&mut self, load: GuestLoad, continues: bool) -> Arc<GuestLists> {
        let guest_error = load
            .all_failed()
            .then(|| "Could not load recipes, please try again".to_string());
        let guest = Arc::new(load.lists);

        self.snapshots.send_modify(|s| {
            s.guest = guest.clone();
            s.guest_loading = false;
            s.guest_error = guest_error;
            s.phase = if continues {
                Phase::LoadingPersonalized
            } else {
                Phase::Ready
            };
        });
        guest
    }

    fn start_personalized(&mut self, user_id: Uuid) -> Work {
        let guest = self.snapshots.borrow().guest.clone();
        self.start_personalized_with(user_id, guest)
    }

    fn start_personalized_with(
        &mut self,
        user_id: Uuid,
        guest: Arc<GuestLists>,
    ) -> Work {
        self.snapshots.send_modify(|s| {
            s.phase = Phase::LoadingPersonalized;
            s.ml_loading = true;
            s.ml_error = None;
        });

        let loader = self.personalized.clone();
        Box::pin(async move { Outcome::Personalized(loader.load(user_id, None, Some(guest)).await) })
    }

    fn finish_personalized(&mut self, feed: PersonalizedFeed) {
        self.snapshots.send_modify(|s| {
            s.ml_error = feed.error.clone();
            s.personalized = Some(Arc::new(feed));
            s.ml_loading = false;
            s.phase = Phase::Ready;
        });
    }

    fn ack_retries(&mut self) {
        for ack in self.pending_retries.drain(..) {
            let _ = ack.send(());
        }
    }
}

//! Client-side storefront state.
//!
//! [`Storefront`] owns the session and the four state slots a shop UI reads:
//! catalog, filtered products, cart and address book. Fetches for a slot
//! may complete in any order; a result is applied only if its ticket is
//! still the latest for that slot.

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tracing::instrument;

use qkart_core::{
    AddressBook, AddressId, CartEntry, CartTotals, LineItem, Product, ProductId, reconcile,
    validate_order,
};

use crate::api::{ApiClient, OrderConfirmation};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::forms::{LoginForm, RegisterForm};
use crate::search::Debouncer;
use crate::session::Session;
use crate::slot::{Slot, Ticket};

/// Notifications for work that finishes in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorefrontEvent {
    /// A search result replaced the filtered product list.
    SearchApplied { query: String, results: usize },
    /// A search finished after a newer one was issued and was dropped.
    SearchDiscarded { query: String },
    /// The latest search failed; the previous list is kept.
    SearchFailed { query: String, message: String },
    /// The session ended, by logout or because the token was refused.
    SessionEnded,
}

const EVENT_CAPACITY: usize = 32;

#[derive(Default)]
struct StorefrontState {
    session: Option<Session>,
    catalog: Slot<Vec<Product>>,
    filtered: Slot<Vec<Product>>,
    cart: Slot<Vec<CartEntry>>,
    addresses: Slot<AddressBook>,
    query: String,
}

impl StorefrontState {
    /// Apply or drop a finished search.
    fn finish_search(
        &mut self,
        ticket: Ticket,
        query: &str,
        result: Result<Vec<Product>, ClientError>,
    ) -> (Result<bool, ClientError>, StorefrontEvent) {
        match result {
            Ok(products) => {
                let results = products.len();
                if self.filtered.apply(ticket, products) {
                    let event = StorefrontEvent::SearchApplied {
                        query: query.to_owned(),
                        results,
                    };
                    (Ok(true), event)
                } else {
                    let event = StorefrontEvent::SearchDiscarded {
                        query: query.to_owned(),
                    };
                    (Ok(false), event)
                }
            }
            Err(err) if self.filtered.is_current(ticket) => {
                let event = StorefrontEvent::SearchFailed {
                    query: query.to_owned(),
                    message: err.user_message(),
                };
                (Err(err), event)
            }
            Err(_) => {
                let event = StorefrontEvent::SearchDiscarded {
                    query: query.to_owned(),
                };
                (Ok(false), event)
            }
        }
    }

    fn end_session(&mut self) {
        self.session = None;
        self.cart.set(Vec::new());
        self.addresses.set(AddressBook::default());
    }

    /// End the session only if it is the one whose token was refused.
    fn end_refused_session(&mut self, refused: &Session) -> bool {
        let current = self
            .session
            .as_ref()
            .is_some_and(|session| session.same_login(refused));
        if current {
            self.end_session();
        }
        current
    }
}

/// Client-side storefront.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    api: ApiClient,
    state: Mutex<StorefrontState>,
    search: Mutex<Debouncer>,
    events: broadcast::Sender<StorefrontEvent>,
}

impl Storefront {
    /// Create a storefront talking to the configured service.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::with_api(ApiClient::new(config)?))
    }

    /// Create a storefront over an existing API client.
    #[must_use]
    pub fn with_api(api: ApiClient) -> Self {
        let window = api.config().search_debounce;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(StorefrontInner {
                api,
                state: Mutex::new(StorefrontState::default()),
                search: Mutex::new(Debouncer::new(window)),
                events,
            }),
        }
    }

    /// The underlying API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Receive background notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StorefrontEvent> {
        self.inner.events.subscribe()
    }

    fn emit(&self, event: StorefrontEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// The current session, if logged in.
    pub async fn session(&self) -> Option<Session> {
        self.inner.state.lock().await.session.clone()
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Form` for bad input, or the service's rejection.
    pub async fn register(&self, form: &RegisterForm) -> Result<(), ClientError> {
        let username = form.validate()?;
        self.inner
            .api
            .register(username.as_str(), &form.password)
            .await
    }

    /// Log in, replacing any existing session.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Form` for empty fields, or the service's rejection.
    pub async fn login(&self, form: &LoginForm) -> Result<Session, ClientError> {
        form.validate()?;
        let session = self
            .inner
            .api
            .login(&form.username, &form.password)
            .await?;

        let mut state = self.inner.state.lock().await;
        state.end_session();
        state.session = Some(session.clone());
        tracing::info!(username = %session.username(), "logged in");
        Ok(session)
    }

    /// Log out and forget the cart and addresses.
    pub async fn logout(&self) {
        self.inner.state.lock().await.end_session();
        self.emit(StorefrontEvent::SessionEnded);
    }

    async fn require_session(&self) -> Result<Session, ClientError> {
        self.session().await.ok_or(ClientError::NotLoggedIn)
    }

    /// Destroy the session if the service refused its token.
    ///
    /// A refusal for a session that was already replaced by a newer login
    /// leaves the newer one alone.
    async fn check_auth<T>(
        &self,
        session: &Session,
        result: Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        if let Err(err) = &result
            && err.is_unauthorized()
        {
            let ended = self.inner.state.lock().await.end_refused_session(session);
            if ended {
                tracing::warn!(username = %session.username(), "token refused, ending session");
                self.emit(StorefrontEvent::SessionEnded);
            } else {
                tracing::debug!(
                    username = %session.username(),
                    "token refused for a replaced session"
                );
            }
        }
        result
    }

    // =========================================================================
    // Catalog and search
    // =========================================================================

    /// Fetch the catalog. On failure the previous catalog is kept.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the fetch fails.
    #[instrument(skip(self))]
    pub async fn load_catalog(&self) -> Result<Vec<Product>, ClientError> {
        let ticket = self.inner.state.lock().await.catalog.issue();
        let products = self.inner.api.products().await?;

        let mut state = self.inner.state.lock().await;
        if state.catalog.apply(ticket, products.clone()) && state.query.is_empty() {
            state.filtered.set(products.clone());
        }
        Ok(products)
    }

    /// The last loaded catalog.
    pub async fn catalog(&self) -> Vec<Product> {
        self.inner.state.lock().await.catalog.get().clone()
    }

    /// Products to display: the catalog, or the latest search result.
    pub async fn products(&self) -> Vec<Product> {
        self.inner.state.lock().await.filtered.get().clone()
    }

    /// Feed one keystroke's worth of search text.
    ///
    /// Blank text shows the whole catalog at once. Otherwise a search is sent
    /// after the debounce window, unless more input arrives first.
    pub async fn search_input(&self, text: &str) {
        let query = text.trim().to_owned();
        let mut timer = self.inner.search.lock().await;

        {
            let mut state = self.inner.state.lock().await;
            state.query.clone_from(&query);
            if query.is_empty() {
                timer.cancel();
                let catalog = state.catalog.get().clone();
                state.filtered.set(catalog);
                return;
            }
        }

        let storefront = self.clone();
        timer.schedule(async move {
            if let Err(e) = storefront.search_now(&query).await {
                tracing::warn!(query = %query, error = %e, "search failed");
            }
        });
    }

    /// Search immediately.
    ///
    /// Returns whether the result was applied; a result that lost to a newer
    /// search is dropped and reported as `false`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the latest search failed. The previous list
    /// is kept.
    #[instrument(skip(self))]
    pub async fn search_now(&self, query: &str) -> Result<bool, ClientError> {
        let ticket = self.inner.state.lock().await.filtered.issue();
        let result = self.inner.api.search(query).await;

        let (outcome, event) = self
            .inner
            .state
            .lock()
            .await
            .finish_search(ticket, query, result);
        self.emit(event);
        outcome
    }

    /// Whether a debounced search is still waiting to be sent.
    pub async fn search_pending(&self) -> bool {
        self.inner.search.lock().await.is_pending()
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch the cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotLoggedIn` without a session.
    #[instrument(skip(self))]
    pub async fn load_cart(&self) -> Result<Vec<CartEntry>, ClientError> {
        let session = self.require_session().await?;
        let ticket = self.inner.state.lock().await.cart.issue();
        let entries = self
            .check_auth(&session, self.inner.api.cart(&session).await)
            .await?;

        self.inner
            .state
            .lock()
            .await
            .cart
            .apply(ticket, entries.clone());
        Ok(entries)
    }

    /// Cart entries as last seen.
    pub async fn cart(&self) -> Vec<CartEntry> {
        self.inner.state.lock().await.cart.get().clone()
    }

    /// The cart joined with the catalog.
    pub async fn line_items(&self) -> Vec<LineItem> {
        let state = self.inner.state.lock().await;
        reconcile(state.cart.get(), state.catalog.get())
    }

    /// Subtotal, shipping and item count for the cart.
    pub async fn totals(&self) -> CartTotals {
        CartTotals::from_items(&self.line_items().await)
    }

    /// Add a product that is not yet in the cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotLoggedIn` without a session and
    /// `ClientError::AlreadyInCart` if the product already has a line.
    pub async fn add_to_cart(&self, product_id: &ProductId, qty: u32) -> Result<(), ClientError> {
        let in_cart = self
            .inner
            .state
            .lock()
            .await
            .cart
            .get()
            .iter()
            .any(|entry| &entry.product_id == product_id);
        if in_cart {
            return Err(ClientError::AlreadyInCart);
        }
        self.set_quantity(product_id, qty).await
    }

    /// Set a product's quantity; zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotLoggedIn` without a session, or the service's
    /// rejection.
    #[instrument(skip(self))]
    pub async fn set_quantity(&self, product_id: &ProductId, qty: u32) -> Result<(), ClientError> {
        let session = self.require_session().await?;
        let entries = self
            .check_auth(
                &session,
                self.inner
                    .api
                    .set_cart_quantity(&session, product_id, qty)
                    .await,
            )
            .await?;

        self.inner.state.lock().await.cart.set(entries);
        Ok(())
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Fetch saved addresses. A selection survives if still present.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotLoggedIn` without a session.
    pub async fn load_addresses(&self) -> Result<AddressBook, ClientError> {
        let session = self.require_session().await?;
        let ticket = self.inner.state.lock().await.addresses.issue();
        let all = self
            .check_auth(&session, self.inner.api.addresses(&session).await)
            .await?;

        let mut state = self.inner.state.lock().await;
        let mut book = state.addresses.get().clone();
        book.replace_all(all);
        state.addresses.apply(ticket, book);
        Ok(state.addresses.get().clone())
    }

    /// The address book as last seen.
    pub async fn addresses(&self) -> AddressBook {
        self.inner.state.lock().await.addresses.get().clone()
    }

    /// Save an address.
    ///
    /// # Errors
    ///
    /// Returns the service's rejection if the text is out of bounds.
    pub async fn add_address(&self, text: &str) -> Result<AddressBook, ClientError> {
        let session = self.require_session().await?;
        let all = self
            .check_auth(&session, self.inner.api.add_address(&session, text).await)
            .await?;
        Ok(self.replace_addresses(all).await)
    }

    /// Delete an address. Deleting the selected one clears the selection.
    ///
    /// # Errors
    ///
    /// Returns the service's rejection if the address is not saved.
    pub async fn delete_address(&self, id: &AddressId) -> Result<AddressBook, ClientError> {
        let session = self.require_session().await?;
        let all = self
            .check_auth(&session, self.inner.api.delete_address(&session, id).await)
            .await?;
        Ok(self.replace_addresses(all).await)
    }

    async fn replace_addresses(&self, all: Vec<qkart_core::Address>) -> AddressBook {
        let mut state = self.inner.state.lock().await;
        let book = state.addresses.edit();
        book.replace_all(all);
        book.clone()
    }

    /// Select the shipping address. Returns `false` if it is not saved.
    pub async fn select_address(&self, id: &AddressId) -> bool {
        self.inner.state.lock().await.addresses.edit().select(id)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Validate against the service's balance, then place the order.
    ///
    /// The catalog is fetched first if any cart entry has no product in it,
    /// so an unloaded catalog never reads as an empty cart.
    ///
    /// On success the cart is emptied and the cached balance updated. On any
    /// failure both are left as they were.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if a local check fails, or the
    /// service's rejection.
    #[instrument(skip(self))]
    pub async fn checkout(&self) -> Result<OrderConfirmation, ClientError> {
        let session = self.require_session().await?;
        let balance = self
            .check_auth(&session, self.inner.api.balance(&session).await)
            .await?;

        let catalog_missing = {
            let state = self.inner.state.lock().await;
            let catalog = state.catalog.get();
            state
                .cart
                .get()
                .iter()
                .any(|entry| !catalog.iter().any(|p| p.id == entry.product_id))
        };
        if catalog_missing {
            self.load_catalog().await?;
        }

        let (items, book) = {
            let mut state = self.inner.state.lock().await;
            if let Some(s) = state.session.as_mut() {
                s.set_balance(balance);
            }
            (
                reconcile(state.cart.get(), state.catalog.get()),
                state.addresses.get().clone(),
            )
        };

        let draft = validate_order(balance, &items, &book)?;
        let confirmation = self
            .check_auth(
                &session,
                self.inner.api.checkout(&session, &draft.address_id).await,
            )
            .await?;

        let mut state = self.inner.state.lock().await;
        state.cart.set(Vec::new());
        if let Some(s) = state.session.as_mut() {
            s.set_balance(confirmation.balance);
        }
        tracing::info!(
            order_id = %confirmation.order_id,
            total = %confirmation.total,
            "order placed"
        );
        Ok(confirmation)
    }
}

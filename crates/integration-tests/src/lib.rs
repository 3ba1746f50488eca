//! End-to-end test harness for the Shopfront client.
//!
//! [`MockBackend`] is an in-process axum server speaking the storefront REST
//! API. Tests point a real [`Storefront`] at it and assert on both the client
//! state and the requests the backend saw.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! # Fixtures
//!
//! | Username | Password    | Role     |
//! |----------|-------------|----------|
//! | `alice`  | `correctpw` | admin    |
//! | `bob`    | `hunter22`  | customer |
//!
//! Products 1 (Laptop, 999.00, stock 5), 2 (Novel, 12.99, stock 40) and
//! 7 (Mug, 9.99, stock 10).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use rust_decimal::Decimal;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use shopfront_client::api::{
    AdminUser, CartItem, CartLineRequest, CreateOrderRequest, LoginRequest, LoginResponse, Order,
    OrderCustomer, OrderItem, OrderStatusUpdate, Product, RegisterRequest,
};
use shopfront_client::persist::{MemoryTokenStore, TokenStore};
use shopfront_client::{ClientConfig, RecordingNotifier, Storefront};
use shopfront_core::{
    Authority, CartItemId, OrderId, OrderItemId, OrderStatus, ProductCategory, ProductId, Role,
    UserId, line_total,
};

/// One request as seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    /// Whether a bearer token was attached.
    pub authorized: bool,
}

struct Account {
    id: UserId,
    username: String,
    password: String,
    email: String,
    first_name: String,
    last_name: String,
    role: Role,
}

impl Account {
    fn to_admin_user(&self) -> AdminUser {
        AdminUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role.clone(),
        }
    }
}

#[derive(Default)]
struct BackendState {
    accounts: Vec<Account>,
    products: Vec<Product>,
    /// Issued token to username.
    tokens: HashMap<String, String>,
    carts: HashMap<String, Vec<CartItem>>,
    orders: Vec<Order>,
    requests: Vec<RecordedRequest>,
    failing: bool,
    /// Delay applied to `GET /cart` before answering.
    cart_delay: Option<Duration>,
    next_id: i64,
}

impl BackendState {
    fn seeded() -> Self {
        let mut state = Self {
            next_id: 100,
            ..Self::default()
        };
        state.accounts.push(Account {
            id: UserId::new(1),
            username: "alice".to_string(),
            password: "correctpw".to_string(),
            email: "alice@example.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Admin".to_string(),
            role: Role::Admin,
        });
        state.accounts.push(Account {
            id: UserId::new(2),
            username: "bob".to_string(),
            password: "hunter22".to_string(),
            email: "bob@example.com".to_string(),
            first_name: "Bob".to_string(),
            last_name: "Buyer".to_string(),
            role: Role::Customer,
        });
        state.products = vec![
            product(1, "Laptop", Decimal::new(99900, 2), 5, ProductCategory::Electronics),
            product(2, "Novel", Decimal::new(1299, 2), 40, ProductCategory::Books),
            product(7, "Mug", Decimal::new(999, 2), 10, ProductCategory::HomeGarden),
        ];
        state
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn account(&self, username: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.username == username)
    }

    fn issue_token(&mut self, username: &str) -> String {
        let roles: Vec<String> = self
            .account(username)
            .map(|a| vec![a.role.authority()])
            .unwrap_or_default();
        let claims = json!({
            "sub": username,
            "roles": roles,
            "iat": Utc::now().timestamp(),
            "exp": Utc::now().timestamp() + 3600,
            "jti": self.next_id(),
        });
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TOKEN_SECRET),
        )
        .unwrap_or_default();
        self.tokens.insert(token.clone(), username.to_string());
        token
    }
}

fn product(id: i64, name: &str, price: Decimal, stock: u32, category: ProductCategory) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: format!("A fine {}", name.to_lowercase()),
        price,
        stock: Some(stock),
        category: Some(category),
        image_url: None,
    }
}

type Shared = Arc<Mutex<BackendState>>;

/// HMAC key the mock signs its tokens with.
const TOKEN_SECRET: &[u8] = b"mock-backend-secret";

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Error response in the backend's plain-text style.
fn reject(status: StatusCode, message: &str) -> Response {
    (status, message.to_string()).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the caller's username from the bearer token.
fn caller(state: &BackendState, headers: &HeaderMap) -> Result<String, Response> {
    bearer(headers)
        .and_then(|token| state.tokens.get(token))
        .cloned()
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Unauthorized"))
}

fn admin_caller(state: &BackendState, headers: &HeaderMap) -> Result<String, Response> {
    let username = caller(state, headers)?;
    match state.account(&username) {
        Some(account) if account.role == Role::Admin => Ok(username),
        _ => Err(reject(StatusCode::FORBIDDEN, "Forbidden")),
    }
}

/// In-process storefront backend.
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start the backend on an ephemeral local port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[allow(clippy::expect_used)]
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState::seeded()));
        let app = router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock backend stopped");
            }
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL clients should use.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the backend address does not form a URL.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn config(&self) -> ClientConfig {
        let url = url::Url::parse(&self.url()).expect("Mock backend URL is valid");
        ClientConfig::for_api(url, std::env::temp_dir().join("shopfront-unused-token.json"))
    }

    /// A storefront wired to this backend with an in-memory token store.
    #[must_use]
    pub fn storefront(&self) -> TestShop {
        self.storefront_with_tokens(Arc::new(MemoryTokenStore::new()))
    }

    /// A storefront whose token store starts with `tokens`' contents.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn storefront_with_tokens(&self, tokens: Arc<MemoryTokenStore>) -> TestShop {
        let notifier = RecordingNotifier::new();
        let shop = Storefront::with_token_store(
            &self.config(),
            tokens.clone(),
            Arc::new(notifier.clone()),
        )
        .expect("Failed to build storefront");
        TestShop {
            shop,
            notifier,
            tokens,
        }
    }

    /// A storefront signed in as `username`, with the initial cart fetch done.
    ///
    /// # Panics
    ///
    /// Panics if the login is rejected or the cart never loads.
    pub async fn signed_in(&self, username: &str, password: &str) -> TestShop {
        let shop = self.storefront();
        assert!(
            shop.shop.session().login(username, password).await,
            "login as {username} failed"
        );
        self.settle(&shop).await;
        shop
    }

    /// Wait for the cart fetch triggered by the latest identity change.
    ///
    /// # Panics
    ///
    /// Panics if nothing is fetched within a second.
    pub async fn settle(&self, shop: &TestShop) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        loop {
            let fetched = self.count(&Method::GET, "/api/cart") > 0;
            if fetched && !shop.shop.cart().snapshot().loading {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "cart was never fetched"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Issue a valid token for `username`, as an earlier login would have.
    #[must_use]
    pub fn issue_token(&self, username: &str) -> String {
        lock(&self.state).issue_token(username)
    }

    /// Hold every `GET /cart` answer back by `delay`, or answer at once with `None`.
    pub fn set_cart_delay(&self, delay: Option<Duration>) {
        lock(&self.state).cart_delay = delay;
    }

    /// Make every endpoint answer 500 until switched back.
    pub fn set_failing(&self, failing: bool) {
        lock(&self.state).failing = failing;
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        lock(&self.state).requests.clear();
    }

    /// Number of recorded requests matching `method` and `path`.
    #[must_use]
    pub fn count(&self, method: &Method, path: &str) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| r.method == *method && r.path == path)
            .count()
    }

    /// Server-side cart of `username` as `(product id, quantity)` pairs.
    #[must_use]
    pub fn cart_of(&self, username: &str) -> Vec<(i64, u32)> {
        lock(&self.state)
            .carts
            .get(username)
            .map(|items| {
                items
                    .iter()
                    .map(|item| (item.product.id.as_i64(), item.quantity))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Put `quantity` of a product straight into `username`'s server-side cart.
    pub fn seed_cart(&self, username: &str, product_id: i64, quantity: u32) {
        let mut state = lock(&self.state);
        let Some(product) = state
            .products
            .iter()
            .find(|p| p.id.as_i64() == product_id)
            .cloned()
        else {
            return;
        };
        let id = CartItemId::new(state.next_id());
        state
            .carts
            .entry(username.to_string())
            .or_default()
            .push(CartItem {
                id,
                product,
                quantity,
            });
    }

    /// Status of an order held by the backend.
    #[must_use]
    pub fn order_status(&self, id: OrderId) -> Option<OrderStatus> {
        lock(&self.state)
            .orders
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.status)
    }

    #[must_use]
    pub fn has_user(&self, username: &str) -> bool {
        lock(&self.state).account(username).is_some()
    }

    #[must_use]
    pub fn has_product(&self, id: i64) -> bool {
        lock(&self.state)
            .products
            .iter()
            .any(|p| p.id.as_i64() == id)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A storefront plus handles to what it reports and persists.
pub struct TestShop {
    pub shop: Storefront,
    pub notifier: RecordingNotifier,
    pub tokens: Arc<MemoryTokenStore>,
}

impl TestShop {
    /// Messages shown so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.notifier
            .notifications()
            .into_iter()
            .map(|n| n.message)
            .collect()
    }

    /// Whether a token is currently persisted.
    #[must_use]
    pub fn has_persisted_token(&self) -> bool {
        matches!(self.tokens.load(), Ok(Some(_)))
    }

    /// Wait until the cart mirror satisfies `ready`, or give up after a second.
    pub async fn wait_for_cart<F>(&self, ready: F) -> bool
    where
        F: Fn(&shopfront_client::CartSnapshot) -> bool,
    {
        let mut cart = self.shop.cart().subscribe();
        let wait = cart.wait_for(|snapshot| ready(snapshot));
        tokio::time::timeout(Duration::from_secs(1), wait)
            .await
            .is_ok_and(|result| result.is_ok())
    }
}

// =============================================================================
// Routes
// =============================================================================

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product))
        .route("/api/cart", get(get_cart))
        .route("/api/cart/add", post(add_to_cart))
        .route("/api/cart/update", put(update_cart))
        .route("/api/cart/remove/{id}", delete(remove_from_cart))
        .route("/api/cart/clear", delete(clear_cart))
        .route("/api/orders/create", post(create_order))
        .route("/api/orders/my-orders", get(my_orders))
        .route("/api/orders/{id}/cancel", put(cancel_order))
        .route("/api/admin/orders", get(admin_orders))
        .route("/api/admin/orders/{id}/status", put(admin_update_status))
        .route("/api/admin/users", get(admin_users))
        .route("/api/admin/users/{id}", delete(admin_delete_user))
        .route("/api/admin/products/{id}", delete(admin_delete_product))
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .with_state(state)
}

/// Log every request and short-circuit when failure mode is on.
async fn record_request(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let failing = {
        let mut state = lock(&state);
        state.requests.push(RecordedRequest {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            authorized: request.headers().contains_key(header::AUTHORIZATION),
        });
        state.failing
    };
    if failing {
        return reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
    }
    next.run(request).await
}

async fn login(State(state): State<Shared>, Json(body): Json<LoginRequest>) -> Response {
    let mut state = lock(&state);
    let role = match state.account(&body.username) {
        Some(account) if account.password == body.password => account.role.clone(),
        _ => return reject(StatusCode::UNAUTHORIZED, "Bad credentials"),
    };
    let token = state.issue_token(&body.username);
    Json(LoginResponse {
        token,
        username: body.username,
        authorities: vec![Authority {
            authority: role.authority(),
        }],
    })
    .into_response()
}

async fn register(State(state): State<Shared>, Json(body): Json<RegisterRequest>) -> Response {
    let mut state = lock(&state);
    if state.account(&body.username).is_some() {
        return reject(StatusCode::BAD_REQUEST, "Username is already taken");
    }
    let id = UserId::new(state.next_id());
    state.accounts.push(Account {
        id,
        username: body.username,
        password: body.password,
        email: body.email.as_str().to_string(),
        first_name: body.first_name,
        last_name: body.last_name,
        role: Role::Customer,
    });
    (StatusCode::OK, "User registered successfully").into_response()
}

async fn list_products(State(state): State<Shared>) -> Json<Vec<Product>> {
    Json(lock(&state).products.clone())
}

async fn get_product(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    lock(&state)
        .products
        .iter()
        .find(|p| p.id.as_i64() == id)
        .map_or_else(
            || reject(StatusCode::NOT_FOUND, "Product not found"),
            |p| Json(p.clone()).into_response(),
        )
}

async fn get_cart(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let (username, delay) = {
        let state = lock(&shared);
        match caller(&state, &headers) {
            Ok(username) => (username, state.cart_delay),
            Err(response) => return response,
        }
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let state = lock(&shared);
    Json(state.carts.get(&username).cloned().unwrap_or_default()).into_response()
}

async fn add_to_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CartLineRequest>,
) -> Response {
    let mut state = lock(&state);
    let username = match caller(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    let Some(product) = state.products.iter().find(|p| p.id == body.product_id).cloned() else {
        return reject(StatusCode::NOT_FOUND, "Product not found");
    };
    let id = CartItemId::new(state.next_id());
    let cart = state.carts.entry(username).or_default();
    if let Some(line) = cart.iter_mut().find(|item| item.product.id == body.product_id) {
        line.quantity += body.quantity;
    } else {
        cart.push(CartItem {
            id,
            product,
            quantity: body.quantity,
        });
    }
    (StatusCode::OK, "Item added to cart").into_response()
}

async fn update_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CartLineRequest>,
) -> Response {
    let mut state = lock(&state);
    let username = match caller(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    let cart = state.carts.entry(username).or_default();
    match cart.iter_mut().find(|item| item.product.id == body.product_id) {
        Some(line) => {
            line.quantity = body.quantity;
            (StatusCode::OK, "Cart updated").into_response()
        }
        None => reject(StatusCode::NOT_FOUND, "Item not in cart"),
    }
}

async fn remove_from_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut state = lock(&state);
    let username = match caller(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    state
        .carts
        .entry(username)
        .or_default()
        .retain(|item| item.product.id.as_i64() != id);
    (StatusCode::OK, "Item removed").into_response()
}

async fn clear_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&state);
    match caller(&state, &headers) {
        Ok(username) => {
            state.carts.remove(&username);
            (StatusCode::OK, "Cart cleared").into_response()
        }
        Err(response) => response,
    }
}

async fn create_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CreateOrderRequest>,
) -> Response {
    let mut state = lock(&state);
    let username = match caller(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    let lines = state.carts.remove(&username).unwrap_or_default();
    if lines.is_empty() {
        return reject(StatusCode::BAD_REQUEST, "Cart is empty");
    }
    let customer = state.account(&username).map(|a| OrderCustomer {
        id: a.id,
        username: a.username.clone(),
    });

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        items.push(OrderItem {
            id: OrderItemId::new(state.next_id()),
            price: line.product.price,
            quantity: line.quantity,
            product: line.product,
        });
    }
    let order = Order {
        id: OrderId::new(state.next_id()),
        order_date: Utc::now().naive_utc(),
        status: OrderStatus::Pending,
        total_amount: items.iter().map(|i| line_total(i.price, i.quantity)).sum(),
        shipping_address: body.shipping_address,
        billing_address: body.billing_address,
        order_items: items,
        user: customer,
    };
    state.orders.push(order.clone());
    Json(order).into_response()
}

async fn my_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    let username = match caller(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    let orders: Vec<Order> = state
        .orders
        .iter()
        .filter(|o| o.user.as_ref().is_some_and(|u| u.username == username))
        .cloned()
        .collect();
    Json(orders).into_response()
}

async fn cancel_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut state = lock(&state);
    let username = match caller(&state, &headers) {
        Ok(username) => username,
        Err(response) => return response,
    };
    let Some(order) = state.orders.iter_mut().find(|o| {
        o.id.as_i64() == id && o.user.as_ref().is_some_and(|u| u.username == username)
    }) else {
        return reject(StatusCode::NOT_FOUND, "Order not found");
    };
    if order.status != OrderStatus::Pending {
        return reject(StatusCode::BAD_REQUEST, "Only pending orders can be cancelled");
    }
    order.status = OrderStatus::Cancelled;
    (StatusCode::OK, "Order cancelled").into_response()
}

async fn admin_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    match admin_caller(&state, &headers) {
        Ok(_) => Json(state.orders.clone()).into_response(),
        Err(response) => response,
    }
}

async fn admin_update_status(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<OrderStatusUpdate>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = admin_caller(&state, &headers) {
        return response;
    }
    match state.orders.iter_mut().find(|o| o.id.as_i64() == id) {
        Some(order) => {
            order.status = body.status;
            (StatusCode::OK, "Order status updated").into_response()
        }
        None => reject(StatusCode::NOT_FOUND, "Order not found"),
    }
}

async fn admin_users(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    match admin_caller(&state, &headers) {
        Ok(_) => {
            let users: Vec<AdminUser> = state.accounts.iter().map(Account::to_admin_user).collect();
            Json(users).into_response()
        }
        Err(response) => response,
    }
}

async fn admin_delete_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = admin_caller(&state, &headers) {
        return response;
    }
    let before = state.accounts.len();
    state.accounts.retain(|a| a.id.as_i64() != id);
    if state.accounts.len() == before {
        return reject(StatusCode::NOT_FOUND, "User not found");
    }
    (StatusCode::OK, "User deleted").into_response()
}

async fn admin_delete_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = admin_caller(&state, &headers) {
        return response;
    }
    let before = state.products.len();
    state.products.retain(|p| p.id.as_i64() != id);
    if state.products.len() == before {
        return reject(StatusCode::NOT_FOUND, "Product not found");
    }
    (StatusCode::OK, "Product deleted").into_response()
}

//! In-memory stand-in for the upstream Sayariq API
//!
//! Served by axum on an ephemeral port so the real reqwest client is used.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

#[derive(Default)]
pub struct Store {
    pub batches: Vec<Value>,
    pub producers: Vec<Value>,
    pub weights: Vec<Value>,
    pub categories: Vec<Value>,
    pub advances: Vec<Value>,
    pub liquidations: Vec<Value>,
    pub movements: Vec<Value>,
    pub sales: Vec<Value>,
    pub fixed_costs: Vec<Value>,
    /// Requests answered with 500, as `"METHOD /path"` prefixes
    pub failing: Vec<String>,
    pub next_id: i64,
}

impl Store {
    pub fn fail_on(&mut self, request: &str) {
        self.failing.push(request.to_string());
    }
}

pub type SharedStore = Arc<Mutex<Store>>;

fn ok(data: Value) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

fn next_id(store: &mut Store) -> i64 {
    store.next_id += 1;
    1000 + store.next_id
}

fn find(items: &[Value], id: i64) -> Option<Value> {
    items.iter().find(|v| v["id"] == id).cloned()
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (k, v) in patch {
            target.insert(k.clone(), v.clone());
        }
    }
}

async fn list_batches(State(store): State<SharedStore>) -> Json<Value> {
    ok(Value::Array(store.lock().unwrap().batches.clone()))
}

async fn get_batch(State(store): State<SharedStore>, Path(id): Path<i64>) -> impl IntoResponse {
    match find(&store.lock().unwrap().batches, id) {
        Some(batch) => ok(batch).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response(),
    }
}

async fn put_batch(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
    Json(patch): Json<Value>,
) -> Json<Value> {
    let mut store = store.lock().unwrap();
    for batch in store.batches.iter_mut().filter(|b| b["id"] == id) {
        merge(batch, &patch);
    }
    ok(json!({ "id": id }))
}

async fn list_producers(State(store): State<SharedStore>) -> Json<Value> {
    ok(Value::Array(store.lock().unwrap().producers.clone()))
}

async fn get_producer(State(store): State<SharedStore>, Path(id): Path<i64>) -> impl IntoResponse {
    match find(&store.lock().unwrap().producers, id) {
        Some(p) => ok(p).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn list_weights(State(store): State<SharedStore>) -> Json<Value> {
    ok(Value::Array(store.lock().unwrap().weights.clone()))
}

/// Served without envelope
async fn list_categories(State(store): State<SharedStore>) -> Json<Value> {
    Json(Value::Array(store.lock().unwrap().categories.clone()))
}

async fn list_advances(State(store): State<SharedStore>) -> Json<Value> {
    ok(Value::Array(store.lock().unwrap().advances.clone()))
}

async fn put_advance(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
    Json(patch): Json<Value>,
) -> Json<Value> {
    let mut store = store.lock().unwrap();
    for advance in store.advances.iter_mut().filter(|a| a["id"] == id) {
        merge(advance, &patch);
    }
    ok(json!({ "id": id }))
}

async fn list_liquidations(State(store): State<SharedStore>) -> Json<Value> {
    ok(Value::Array(store.lock().unwrap().liquidations.clone()))
}

async fn create_liquidation(
    State(store): State<SharedStore>,
    Json(mut body): Json<Value>,
) -> impl IntoResponse {
    let mut store = store.lock().unwrap();
    let id = next_id(&mut store);
    body["id"] = json!(id);
    store.liquidations.push(body);
    (StatusCode::CREATED, ok(json!({ "id": id })))
}

async fn get_liquidation(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match find(&store.lock().unwrap().liquidations, id) {
        Some(l) => ok(l).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn put_liquidation(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
    Json(patch): Json<Value>,
) -> Json<Value> {
    let mut store = store.lock().unwrap();
    let mut updated = Value::Null;
    for liquidation in store.liquidations.iter_mut().filter(|l| l["id"] == id) {
        merge(liquidation, &patch);
        updated = liquidation.clone();
    }
    ok(updated)
}

async fn delete_liquidation(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> StatusCode {
    store.lock().unwrap().liquidations.retain(|l| l["id"] != id);
    StatusCode::NO_CONTENT
}

/// Sales filtered by `fecha` when `desde`/`hasta` are given
async fn list_sales(
    State(store): State<SharedStore>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let store = store.lock().unwrap();
    let within = |sale: &&Value| {
        let date = sale["fecha"].as_str().unwrap_or_default();
        query.get("desde").map_or(true, |from| date >= from.as_str())
            && query.get("hasta").map_or(true, |to| date <= to.as_str())
    };
    ok(Value::Array(store.sales.iter().filter(within).cloned().collect()))
}

async fn list_fixed_costs(State(store): State<SharedStore>) -> Json<Value> {
    ok(Value::Array(store.lock().unwrap().fixed_costs.clone()))
}

async fn list_movements(State(store): State<SharedStore>) -> Json<Value> {
    ok(Value::Array(store.lock().unwrap().movements.clone()))
}

async fn create_movement(
    State(store): State<SharedStore>,
    Path(_kind): Path<String>,
    Json(mut body): Json<Value>,
) -> Json<Value> {
    let mut store = store.lock().unwrap();
    let id = next_id(&mut store);
    body["id"] = json!(id);
    store.movements.push(body);
    ok(json!({ "id": id }))
}

async fn broken() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "boom" })),
    )
}

async fn malformed() -> &'static str {
    "this is not json"
}

async fn rejected() -> Json<Value> {
    Json(json!({ "success": false, "message": "Lote bloqueado" }))
}

async fn created_raw() -> impl IntoResponse {
    (StatusCode::CREATED, Json(json!({ "id": 77, "echo": true })))
}

async fn fail_marked(State(store): State<SharedStore>, request: Request, next: Next) -> Response {
    let key = format!("{} {}", request.method(), request.uri().path());
    let marked = store
        .lock()
        .unwrap()
        .failing
        .iter()
        .any(|prefix| key.starts_with(prefix.as_str()));
    if marked {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": format!("{} failed", key) })),
        )
            .into_response();
    }
    next.run(request).await
}

pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/lotes", get(list_batches))
        .route("/lotes/:id", get(get_batch).put(put_batch))
        .route("/personas", get(list_producers))
        .route("/personas/:id", get(get_producer))
        .route("/pesos-lote", get(list_weights))
        .route("/categorias", get(list_categories))
        .route("/adelantos", get(list_advances))
        .route("/adelantos/:id", axum::routing::put(put_advance))
        .route(
            "/liquidaciones",
            get(list_liquidations).post(create_liquidation),
        )
        .route(
            "/liquidaciones/:id",
            get(get_liquidation)
                .put(put_liquidation)
                .delete(delete_liquidation),
        )
        .route("/ventas", get(list_sales))
        .route("/costos-fijos", get(list_fixed_costs))
        .route("/kardex-integral/movimientos", get(list_movements))
        .route(
            "/kardex-integral/:kind",
            axum::routing::post(create_movement),
        )
        .route("/broken", get(broken))
        .route("/malformed", get(malformed))
        .route("/rechazado", get(rejected))
        .route("/eco", axum::routing::post(created_raw))
        .layer(middleware::from_fn_with_state(store.clone(), fail_marked))
        .with_state(store)
}

/// Serve a router on an ephemeral port and return its base URL
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub async fn spawn_store(store: Store) -> (String, SharedStore) {
    let shared = Arc::new(Mutex::new(store));
    let url = spawn(router(shared.clone())).await;
    (url, shared)
}

/// Producer 3 with batch 10 weighed, two advances and a price list
pub fn seeded_store() -> Store {
    Store {
        batches: vec![json!({
            "id": 10,
            "tipo_producto": "aguaymanto",
            "peso_bruto": "500",
            "numero_jabas": 20,
            "productor_id": 3,
            "fecha_ingreso": "2024-05-02",
            "estado": "pesado"
        })],
        producers: vec![json!({
            "id": 3,
            "nombre_completo": "Rosa Quispe",
            "documento_identidad": "45678912"
        })],
        weights: vec![json!({
            "id": 1,
            "lote_id": 10,
            "exportable": "100",
            "industrial": "200",
            "descarte": "40"
        })],
        categories: vec![
            json!({ "id": "exportable", "nombre": "Exportable", "precio_unitario": "8", "es_liquidable": true }),
            json!({ "id": "industrial", "nombre": "Industrial", "precio_unitario": "1", "es_liquidable": true }),
            json!({ "id": "descarte", "nombre": "Descarte", "precio_unitario": "0", "es_liquidable": false }),
        ],
        advances: vec![
            json!({ "id": 2, "productor_id": 3, "monto": "100", "fecha": "2024-04-10", "saldo_pendiente": "100" }),
            json!({ "id": 1, "productor_id": 3, "monto": "50", "fecha": "2024-04-01", "saldo_pendiente": "50" }),
        ],
        ..Default::default()
    }
}

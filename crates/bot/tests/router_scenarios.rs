//! End-to-end dialogue scenarios driven through the router with in-memory
//! stores and fake collaborators.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};

use tiendy_agent::{KeywordExtractor, RuleBasedClassifier};
use tiendy_backend::{
    BackendError, CatalogSearcher, CustomerDirectory, CustomerLookup, OrderSubmitter,
};
use tiendy_bot::DialogueRouter;
use tiendy_core::{
    ChatState, CreatedOrder, Customer, CustomerId, NewOrder, Product, ProductId, UserId,
};
use tiendy_store::{ManualClock, Stores, SESSION_TTL_SECS};
use tiendy_whatsapp::RecordingMessenger;

struct FakeCatalog {
    by_term: HashMap<String, Vec<Product>>,
}

impl FakeCatalog {
    fn new(entries: Vec<(&str, Vec<Product>)>) -> Self {
        Self {
            by_term: entries.into_iter().map(|(term, products)| (term.to_string(), products)).collect(),
        }
    }
}

#[async_trait]
impl CatalogSearcher for FakeCatalog {
    async fn search_products(&self, term: &str, limit: u32) -> Result<Vec<Product>, BackendError> {
        let mut products = self.by_term.get(term).cloned().unwrap_or_default();
        products.truncate(limit as usize);
        Ok(products)
    }
}

#[derive(Default)]
struct FakeOrders {
    responses: Mutex<Vec<Result<CreatedOrder, BackendError>>>,
    submitted: Mutex<Vec<NewOrder>>,
}

impl FakeOrders {
    fn with_responses(responses: Vec<Result<CreatedOrder, BackendError>>) -> Self {
        Self { responses: Mutex::new(responses), submitted: Mutex::new(Vec::new()) }
    }

    fn submitted(&self) -> Vec<NewOrder> {
        self.submitted.lock().expect("orders mutex").clone()
    }
}

#[async_trait]
impl OrderSubmitter for FakeOrders {
    async fn create_order(&self, order: &NewOrder) -> Result<CreatedOrder, BackendError> {
        self.submitted.lock().expect("orders mutex").push(order.clone());
        let mut responses = self.responses.lock().expect("orders mutex");
        if responses.is_empty() {
            Ok(CreatedOrder { order_id: "ORD-0001".to_string() })
        } else {
            responses.remove(0)
        }
    }
}

struct FakeCustomers {
    registered: Option<Customer>,
}

#[async_trait]
impl CustomerDirectory for FakeCustomers {
    async fn validate_by_phone(&self, _phone: &str) -> Result<CustomerLookup, BackendError> {
        Ok(CustomerLookup {
            registered: self.registered.is_some(),
            customer: self.registered.clone(),
        })
    }

    async fn register_customer(
        &self,
        phone: &str,
        full_name: &str,
    ) -> Result<Customer, BackendError> {
        Ok(Customer {
            id: CustomerId("c-100".to_string()),
            name: full_name.to_string(),
            phone: phone.to_string(),
        })
    }
}

struct Harness {
    stores: Arc<Stores>,
    messenger: Arc<RecordingMessenger>,
    clock: Arc<ManualClock>,
    orders: Arc<FakeOrders>,
    router: DialogueRouter,
}

fn product(id: &str, unit_price: i64, bulk_price: i64, stock: u32) -> Product {
    Product {
        id: ProductId(id.to_string()),
        name: format!("{} premium", id),
        unit_price,
        bulk_price,
        stock,
    }
}

fn harness(
    catalog: FakeCatalog,
    orders: FakeOrders,
    registered: Option<Customer>,
) -> Harness {
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid instant");
    let clock = Arc::new(ManualClock::starting_at(start));
    let stores = Arc::new(Stores::new(clock.clone()));
    let messenger = Arc::new(RecordingMessenger::default());
    let orders = Arc::new(orders);

    let router = DialogueRouter::new(
        stores.clone(),
        messenger.clone(),
        Arc::new(RuleBasedClassifier),
        Arc::new(KeywordExtractor),
        Arc::new(catalog),
        orders.clone(),
        Arc::new(FakeCustomers { registered }),
    );

    Harness { stores, messenger, clock, orders, router }
}

fn customer() -> Customer {
    Customer {
        id: CustomerId("c-7".to_string()),
        name: "Ana Pérez".to_string(),
        phone: "+56911111111".to_string(),
    }
}

fn user() -> UserId {
    UserId::from("+56911111111")
}

/// Seeds a registered, mid-conversation user so scenarios can start from a
/// specific state.
fn seed_registered(harness: &Harness, state: ChatState) {
    harness.stores.sessions.touch(&user());
    harness.stores.states.set_customer(&user(), customer());
    harness.stores.states.set_state(&user(), state);
}

#[tokio::test]
async fn new_user_is_welcomed_into_registration() {
    let h = harness(FakeCatalog::new(vec![]), FakeOrders::default(), None);

    h.router.handle_inbound(&user(), "hola").await;

    assert!(h.stores.sessions.exists(&user()));
    assert_eq!(h.stores.states.state(&user()), ChatState::AwaitingFirstNameLastname);
    let sent = h.messenger.texts_for(&user());
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("nombre y apellido"));
}

#[tokio::test]
async fn registration_requires_first_and_last_name() {
    let h = harness(FakeCatalog::new(vec![]), FakeOrders::default(), None);

    h.router.handle_inbound(&user(), "hola").await;
    h.router.handle_inbound(&user(), "Ana").await;
    assert_eq!(h.stores.states.state(&user()), ChatState::AwaitingFirstNameLastname);

    h.router.handle_inbound(&user(), "Ana Pérez").await;
    assert_eq!(h.stores.states.state(&user()), ChatState::Menu);
    assert_eq!(h.stores.states.customer(&user()).expect("customer").name, "Ana Pérez");
}

#[tokio::test]
async fn registered_user_lands_on_the_menu() {
    let h = harness(FakeCatalog::new(vec![]), FakeOrders::default(), Some(customer()));

    h.router.handle_inbound(&user(), "hola").await;

    assert_eq!(h.stores.states.state(&user()), ChatState::Menu);
    let sent = h.messenger.texts_for(&user());
    assert!(sent[0].contains("Ana Pérez"));
}

#[tokio::test]
async fn ambiguous_order_resolves_through_numbered_options() {
    let catalog = FakeCatalog::new(vec![
        (
            "almendras",
            vec![product("almendras-tostadas", 4000, 0, 20), product("almendras-crudas", 3500, 0, 20)],
        ),
        ("te", vec![product("te-verde", 2000, 0, 20)]),
    ]);
    let h = harness(catalog, FakeOrders::default(), Some(customer()));
    seed_registered(&h, ChatState::OrderAwaitingProductList);

    h.router.handle_inbound(&user(), "2 almendras, 1 te").await;

    // "te" resolved uniquely and was added directly with quantity 1.
    let lines = h.stores.carts.lines(&user());
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].product_id.0, "te-verde");
    assert_eq!(lines[0].quantity, 1);

    // "almendras" produced two numbered options.
    assert_eq!(h.stores.states.state(&user()), ChatState::OrderResolvingAmbiguousProducts);
    let scratch = h.stores.states.scratch(&user());
    let options = &scratch.as_order().expect("order scratch").ambiguous;
    assert_eq!(options.len(), 2);
    assert_eq!(options[0].number, 1);
    assert_eq!(options[1].number, 2);
    assert_eq!(options[0].requested_quantity, 2);

    // Explicit quantity overrides the requested one.
    h.router.handle_inbound(&user(), "1: 2").await;

    let lines = h.stores.carts.lines(&user());
    assert_eq!(lines.len(), 2);
    let almendras =
        lines.iter().find(|line| line.product_id.0 == "almendras-tostadas").expect("line");
    assert_eq!(almendras.quantity, 2);
    assert_eq!(h.stores.states.state(&user()), ChatState::OrderAwaitingAddMoreDecision);
}

#[tokio::test]
async fn ambiguous_resolution_uses_requested_quantity_by_default() {
    let catalog = FakeCatalog::new(vec![(
        "almendras",
        vec![product("almendras-tostadas", 4000, 0, 20), product("almendras-crudas", 3500, 0, 20)],
    )]);
    let h = harness(catalog, FakeOrders::default(), Some(customer()));
    seed_registered(&h, ChatState::OrderAwaitingProductList);

    h.router.handle_inbound(&user(), "3 almendras").await;
    h.router.handle_inbound(&user(), "2").await;

    let lines = h.stores.carts.lines(&user());
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].product_id.0, "almendras-crudas");
    assert_eq!(lines[0].quantity, 3);
}

#[tokio::test]
async fn unparseable_ambiguity_reply_reprompts_without_transition() {
    let catalog = FakeCatalog::new(vec![(
        "almendras",
        vec![product("almendras-tostadas", 4000, 0, 20), product("almendras-crudas", 3500, 0, 20)],
    )]);
    let h = harness(catalog, FakeOrders::default(), Some(customer()));
    seed_registered(&h, ChatState::OrderAwaitingProductList);

    h.router.handle_inbound(&user(), "almendras").await;
    h.router.handle_inbound(&user(), "la primera por favor").await;

    assert_eq!(h.stores.states.state(&user()), ChatState::OrderResolvingAmbiguousProducts);
    assert!(h.stores.carts.lines(&user()).is_empty());
}

#[tokio::test]
async fn delivery_below_minimum_redirects_to_add_more_with_shortfall() {
    let catalog = FakeCatalog::new(vec![("miel", vec![product("miel", 30_000, 0, 10)])]);
    let h = harness(catalog, FakeOrders::default(), Some(customer()));
    seed_registered(&h, ChatState::OrderAwaitingProductList);

    h.router.handle_inbound(&user(), "1 miel").await;
    h.router.handle_inbound(&user(), "2").await; // finalizar
    assert_eq!(h.stores.states.state(&user()), ChatState::OrderAwaitingDeliveryMethod);

    h.router.handle_inbound(&user(), "2").await; // despacho

    assert_eq!(h.stores.states.state(&user()), ChatState::OrderAwaitingAddMoreDecision);
    let sent = h.messenger.texts_for(&user());
    let shortfall = sent.iter().find(|text| text.contains("faltan")).expect("shortfall message");
    assert!(shortfall.contains("$20.000"));
}

#[tokio::test]
async fn pickup_order_submits_with_the_store_address() {
    let catalog = FakeCatalog::new(vec![("miel", vec![product("miel", 12_000, 10_000, 10)])]);
    let h = harness(catalog, FakeOrders::default(), Some(customer()));
    seed_registered(&h, ChatState::OrderAwaitingProductList);

    h.router.handle_inbound(&user(), "5 miel").await;
    h.router.handle_inbound(&user(), "finalizar").await;
    h.router.handle_inbound(&user(), "1").await; // retiro en tienda
    assert_eq!(h.stores.states.state(&user()), ChatState::OrderAwaitingConfirmation);

    h.router.handle_inbound(&user(), "confirmar").await;

    let submitted = h.orders.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].customer_id.0, "c-7");
    assert!(submitted[0].delivery_address.contains("Retiro en tienda"));
    assert_eq!(submitted[0].lines.len(), 1);
    assert_eq!(submitted[0].lines[0].quantity, 5);
    assert_eq!(submitted[0].manual_discount, 0);

    // Bulk price applied: the success message shows the local total.
    let sent = h.messenger.texts_for(&user());
    let success = sent.iter().find(|text| text.contains("ORD-0001")).expect("success message");
    assert!(success.contains("$50.000"));

    assert!(!h.stores.carts.has_items(&user()));
    assert_eq!(h.stores.states.state(&user()), ChatState::Menu);
}

#[tokio::test]
async fn delivery_order_captures_address_city_district_and_courier() {
    let catalog = FakeCatalog::new(vec![("miel", vec![product("miel", 30_000, 0, 10)])]);
    let h = harness(catalog, FakeOrders::default(), Some(customer()));
    seed_registered(&h, ChatState::OrderAwaitingProductList);

    h.router.handle_inbound(&user(), "2 miel").await; // total 60.000
    h.router.handle_inbound(&user(), "2").await;
    h.router.handle_inbound(&user(), "2").await; // despacho

    assert_eq!(h.stores.states.state(&user()), ChatState::OrderAwaitingAddress);
    h.router.handle_inbound(&user(), "x1").await; // too short
    assert_eq!(h.stores.states.state(&user()), ChatState::OrderAwaitingAddress);

    h.router.handle_inbound(&user(), "Calle Falsa 123").await;
    h.router.handle_inbound(&user(), "Santiago").await;
    h.router.handle_inbound(&user(), "Ñuñoa").await;
    assert_eq!(h.stores.states.state(&user()), ChatState::OrderAwaitingCourier);

    h.router.handle_inbound(&user(), "chilexpress").await;
    assert_eq!(h.stores.states.state(&user()), ChatState::OrderAwaitingConfirmation);

    h.router.handle_inbound(&user(), "confirmar").await;
    let submitted = h.orders.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].delivery_address, "Calle Falsa 123, Ñuñoa, Santiago");
}

#[tokio::test]
async fn failed_submission_preserves_cart_and_draft_for_retry() {
    let catalog = FakeCatalog::new(vec![("miel", vec![product("miel", 12_000, 10_000, 10)])]);
    let orders = FakeOrders::with_responses(vec![
        Err(BackendError::Api { status: 500, detail: "bodega sin stock".to_string() }),
        Ok(CreatedOrder { order_id: "ORD-0002".to_string() }),
    ]);
    let h = harness(catalog, orders, Some(customer()));
    seed_registered(&h, ChatState::OrderAwaitingProductList);

    h.router.handle_inbound(&user(), "5 miel").await;
    h.router.handle_inbound(&user(), "2").await;
    h.router.handle_inbound(&user(), "retiro").await;
    h.router.handle_inbound(&user(), "confirmar").await;

    // Failure: cart and draft survive, state stays at confirmation.
    assert!(h.stores.carts.has_items(&user()));
    assert_eq!(h.stores.states.state(&user()), ChatState::OrderAwaitingConfirmation);
    let sent = h.messenger.texts_for(&user());
    assert!(sent.iter().any(|text| text.contains("bodega sin stock")));

    // Retry with the same command succeeds.
    h.router.handle_inbound(&user(), "confirmar").await;
    assert_eq!(h.orders.submitted().len(), 2);
    assert!(!h.stores.carts.has_items(&user()));
    assert_eq!(h.stores.states.state(&user()), ChatState::Menu);
}

#[tokio::test]
async fn cancelling_at_confirmation_clears_cart_and_returns_to_menu() {
    let catalog = FakeCatalog::new(vec![("miel", vec![product("miel", 12_000, 0, 10)])]);
    let h = harness(catalog, FakeOrders::default(), Some(customer()));
    seed_registered(&h, ChatState::OrderAwaitingProductList);

    h.router.handle_inbound(&user(), "2 miel").await;
    h.router.handle_inbound(&user(), "2").await;
    h.router.handle_inbound(&user(), "1").await;
    h.router.handle_inbound(&user(), "no").await;

    assert!(!h.stores.carts.has_items(&user()));
    assert_eq!(h.stores.states.state(&user()), ChatState::Menu);
    assert!(h.orders.submitted().is_empty());
}

#[tokio::test]
async fn confirmation_without_customer_identity_resets_the_session() {
    let catalog = FakeCatalog::new(vec![("miel", vec![product("miel", 12_000, 0, 10)])]);
    let h = harness(catalog, FakeOrders::default(), Some(customer()));

    // Mid-order state but no cached customer identity.
    h.stores.sessions.touch(&user());
    h.stores.states.set_state(&user(), ChatState::OrderAwaitingProductList);

    h.router.handle_inbound(&user(), "2 miel").await;
    h.router.handle_inbound(&user(), "2").await;
    h.router.handle_inbound(&user(), "1").await;
    h.router.handle_inbound(&user(), "confirmar").await;

    assert!(h.orders.submitted().is_empty());
    assert!(!h.stores.sessions.exists(&user()));
    assert!(!h.stores.carts.has_items(&user()));
    let sent = h.messenger.texts_for(&user());
    assert!(sent.last().expect("reset message").contains("reiniciarla"));
}

#[tokio::test]
async fn farewell_mid_order_performs_a_full_reset() {
    let catalog = FakeCatalog::new(vec![("miel", vec![product("miel", 30_000, 0, 10)])]);
    let h = harness(catalog, FakeOrders::default(), Some(customer()));
    seed_registered(&h, ChatState::OrderAwaitingAddress);
    h.stores.carts.add(&user(), &product("miel", 30_000, 0, 10), 2).expect("add");

    h.router.handle_inbound(&user(), "gracias, nos vemos").await;

    assert!(!h.stores.sessions.exists(&user()));
    assert!(!h.stores.carts.has_items(&user()));
    assert_eq!(h.stores.states.state(&user()), ChatState::Initial);
    let sent = h.messenger.texts_for(&user());
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Gracias por escribirnos"));
}

#[tokio::test]
async fn cancelar_during_product_list_clears_cart_and_draft() {
    let catalog = FakeCatalog::new(vec![("miel", vec![product("miel", 12_000, 0, 10)])]);
    let h = harness(catalog, FakeOrders::default(), Some(customer()));
    seed_registered(&h, ChatState::OrderAwaitingProductList);

    h.router.handle_inbound(&user(), "2 miel").await;
    h.router.handle_inbound(&user(), "1").await; // agregar más
    h.router.handle_inbound(&user(), "cancelar").await;

    assert!(!h.stores.carts.has_items(&user()));
    assert_eq!(h.stores.states.state(&user()), ChatState::Menu);
}

#[tokio::test]
async fn expired_session_gets_notice_then_welcome_for_the_same_message() {
    let h = harness(FakeCatalog::new(vec![]), FakeOrders::default(), Some(customer()));
    seed_registered(&h, ChatState::Menu);

    h.clock.advance(Duration::seconds(SESSION_TTL_SECS + 1));
    h.router.handle_inbound(&user(), "quiero ver productos").await;

    let sent = h.messenger.texts_for(&user());
    assert!(sent.iter().any(|text| text.contains("expiró")));
    assert!(sent.iter().any(|text| text.contains("Ana Pérez")));
    assert!(h.stores.sessions.exists(&user()));
    assert_eq!(h.stores.states.state(&user()), ChatState::Menu);
}

#[tokio::test]
async fn menu_keyword_returns_to_the_main_menu_from_anywhere() {
    let h = harness(FakeCatalog::new(vec![]), FakeOrders::default(), Some(customer()));
    seed_registered(&h, ChatState::OrderAwaitingCity);

    h.router.handle_inbound(&user(), "menú").await;

    assert_eq!(h.stores.states.state(&user()), ChatState::Menu);
}

#[tokio::test]
async fn order_keyword_jumps_into_order_capture() {
    let h = harness(FakeCatalog::new(vec![]), FakeOrders::default(), Some(customer()));
    seed_registered(&h, ChatState::Faq);

    h.router.handle_inbound(&user(), "quiero hacer un pedido").await;

    assert_eq!(h.stores.states.state(&user()), ChatState::OrderAwaitingProductList);
}

#[tokio::test]
async fn product_question_triggers_a_quick_lookup() {
    let catalog = FakeCatalog::new(vec![("miel ulmo", vec![product("miel-ulmo", 12_000, 0, 10)])]);
    let h = harness(catalog, FakeOrders::default(), Some(customer()));
    seed_registered(&h, ChatState::Faq);

    h.router.handle_inbound(&user(), "tienen miel de ulmo?").await;

    assert_eq!(h.stores.states.state(&user()), ChatState::ProductSearchShowingDetails);
    let sent = h.messenger.texts_for(&user());
    assert!(sent.last().expect("details").contains("miel-ulmo premium"));
}

#[tokio::test]
async fn search_flow_handles_selection_and_adds_to_cart() {
    let catalog = FakeCatalog::new(vec![(
        "miel",
        vec![product("miel-ulmo", 12_000, 0, 10), product("miel-quillay", 9_000, 0, 10)],
    )]);
    let h = harness(catalog, FakeOrders::default(), Some(customer()));
    seed_registered(&h, ChatState::Menu);

    h.router.handle_inbound(&user(), "1").await; // buscar productos
    assert_eq!(h.stores.states.state(&user()), ChatState::ProductSearchAwaitingQuery);

    h.router.handle_inbound(&user(), "miel").await;
    assert_eq!(h.stores.states.state(&user()), ChatState::ProductSearchAwaitingSelection);

    h.router.handle_inbound(&user(), "9").await; // out of range
    assert_eq!(h.stores.states.state(&user()), ChatState::ProductSearchAwaitingSelection);

    h.router.handle_inbound(&user(), "2").await;
    assert_eq!(h.stores.states.state(&user()), ChatState::ProductSearchShowingDetails);

    h.router.handle_inbound(&user(), "1").await; // agregar
    assert_eq!(h.stores.states.state(&user()), ChatState::ProductInfo);

    let lines = h.stores.carts.lines(&user());
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].product_id.0, "miel-quillay");
    assert_eq!(lines[0].quantity, 1);
}

#[tokio::test]
async fn canned_reply_short_circuits_routing() {
    let h = harness(FakeCatalog::new(vec![]), FakeOrders::default(), Some(customer()));
    seed_registered(&h, ChatState::Faq);

    h.router.handle_inbound(&user(), "¿dónde están ubicados?").await;

    let sent = h.messenger.texts_for(&user());
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Providencia"));
    assert_eq!(h.stores.states.state(&user()), ChatState::Faq);
}

#[tokio::test]
async fn negative_sentiment_redirects_to_the_menu() {
    let h = harness(FakeCatalog::new(vec![]), FakeOrders::default(), Some(customer()));
    seed_registered(&h, ChatState::OrdersMenu);

    h.router.handle_inbound(&user(), "esto es pésimo, estoy muy molesto").await;

    assert_eq!(h.stores.states.state(&user()), ChatState::Menu);
    let sent = h.messenger.texts_for(&user());
    assert!(sent[0].contains("Lamento"));
}

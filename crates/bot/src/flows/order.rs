//! Order capture: product list → ambiguity resolution → add-more → delivery
//! data → confirmation and submission.

use tracing::{info, warn};

use tiendy_backend::BackendError;
use tiendy_core::domain::cart::CartLine;
use tiendy_core::{
    classify, AmbiguousOption, ChatState, DeliveryMethod, NewOrder, NewOrderLine, UserId,
    MIN_DELIVERY_TOTAL,
};
use tiendy_core::domain::order::{PaymentMethod, SalesChannel};

use crate::copy;
use crate::router::DialogueRouter;

const CATALOG_MATCH_LIMIT: u32 = 3;

impl DialogueRouter {
    pub(crate) async fn start_order(&self, user: &UserId) {
        self.stores.states.update_scratch(user, |scratch| {
            *scratch.order_mut() = Default::default();
        });
        self.send(user, &copy::ask_product_list()).await;
        self.stores.states.set_state(user, ChatState::OrderAwaitingProductList);
    }

    pub(crate) async fn handle_order_product_list(&self, user: &UserId, text: &str) {
        if classify::normalize(text) == "cancelar" {
            self.cancel_order(user).await;
            return;
        }

        let items = match self.extractor.extract_with_quantities(text).await {
            Ok(items) => items,
            Err(error) => {
                warn!(user = %user, error = %error, "product extraction failed");
                Vec::new()
            }
        };
        if items.is_empty() {
            self.send(user, &copy::product_list_not_understood()).await;
            return;
        }

        let mut added: Vec<CartLine> = Vec::new();
        let mut ambiguous: Vec<AmbiguousOption> = Vec::new();
        let mut not_found: Vec<(String, String)> = Vec::new();
        let mut option_number = 0u32;

        for item in items {
            let matches =
                match self.catalog.search_products(&item.name, CATALOG_MATCH_LIMIT).await {
                    Ok(matches) => matches,
                    Err(error) => {
                        warn!(user = %user, error = %error, "catalog search failed");
                        not_found
                            .push((item.name.clone(), "servicio no disponible".to_string()));
                        continue;
                    }
                };

            match matches.len() {
                0 => not_found.push((item.name.clone(), "sin coincidencias".to_string())),
                1 => match self.stores.carts.add(user, &matches[0], item.quantity) {
                    Ok((line, _totals)) => added.push(line),
                    Err(error) => not_found.push((item.name.clone(), error.to_string())),
                },
                _ => {
                    for product in matches {
                        option_number += 1;
                        ambiguous.push(AmbiguousOption {
                            number: option_number,
                            requested_name: item.name.clone(),
                            requested_quantity: item.quantity,
                            product,
                        });
                    }
                }
            }
        }

        let summary = copy::extraction_summary(&copy::ExtractionSummary {
            added: &added,
            ambiguous: &ambiguous,
            not_found: &not_found,
        });
        self.send(user, &summary).await;

        if !ambiguous.is_empty() {
            self.stores.states.update_scratch(user, |scratch| {
                scratch.order_mut().ambiguous = ambiguous;
            });
            self.stores.states.set_state(user, ChatState::OrderResolvingAmbiguousProducts);
        } else if !added.is_empty() {
            self.ask_add_more(user).await;
        } else {
            self.send(user, &copy::ask_product_list()).await;
        }
    }

    pub(crate) async fn handle_order_ambiguous(&self, user: &UserId, text: &str) {
        let options = self
            .stores
            .states
            .scratch(user)
            .as_order()
            .map(|order| order.ambiguous.clone())
            .unwrap_or_default();

        if options.is_empty() {
            // The option map is gone; the resolution is stale and cannot be
            // recovered for this flow.
            warn!(user = %user, "ambiguous resolution without a pending option map");
            self.stores.reset(user);
            self.send(user, &copy::session_error_reset()).await;
            return;
        }

        let selections = parse_ambiguous_selection(text);
        if selections.is_empty() {
            self.send(user, &copy::ambiguous_reprompt()).await;
            return;
        }

        let mut added: Vec<CartLine> = Vec::new();
        let mut not_found: Vec<(String, String)> = Vec::new();

        for (number, explicit_quantity) in selections {
            // Unmatched numbers are skipped silently, like malformed tokens.
            let Some(option) = options.iter().find(|option| option.number == number) else {
                continue;
            };
            let quantity = explicit_quantity.unwrap_or(option.requested_quantity);

            match self.stores.carts.add(user, &option.product, quantity) {
                Ok((line, _totals)) => added.push(line),
                Err(error) => not_found.push((option.product.name.clone(), error.to_string())),
            }
        }

        let summary = copy::extraction_summary(&copy::ExtractionSummary {
            added: &added,
            ambiguous: &[],
            not_found: &not_found,
        });
        if !summary.is_empty() {
            self.send(user, &summary).await;
        }

        self.stores.states.update_scratch(user, |scratch| {
            scratch.order_mut().ambiguous.clear();
        });
        self.ask_add_more(user).await;
    }

    pub(crate) async fn ask_add_more(&self, user: &UserId) {
        let lines = self.stores.cart_lines(user);
        let totals = self.stores.carts.totals(user);
        self.send(user, &copy::ask_add_more(&lines, &totals)).await;
        self.stores.states.set_state(user, ChatState::OrderAwaitingAddMoreDecision);
    }

    pub(crate) async fn handle_order_add_more(&self, user: &UserId, text: &str) {
        let normalized = classify::normalize(text);

        if normalized == "1" || normalized.contains("agregar") || normalized.contains("mas")
            || normalized.contains("más")
        {
            self.send(user, &copy::ask_product_list()).await;
            self.stores.states.set_state(user, ChatState::OrderAwaitingProductList);
            return;
        }

        if normalized == "2" || normalized.contains("finalizar") {
            if !self.stores.carts.has_items(user) {
                self.stores.states.clear_scratch(user);
                self.send(user, &copy::empty_cart_abort()).await;
                self.stores.states.set_state(user, ChatState::Menu);
                return;
            }
            self.send(user, &copy::ask_delivery_method()).await;
            self.stores.states.set_state(user, ChatState::OrderAwaitingDeliveryMethod);
            return;
        }

        self.send(user, &copy::add_more_reprompt()).await;
    }

    pub(crate) async fn handle_order_delivery_method(&self, user: &UserId, text: &str) {
        let normalized = classify::normalize(text);

        if normalized == "1"
            || normalized.contains("retiro")
            || normalized.contains("tienda")
            || normalized.contains("pickup")
        {
            self.stores.states.update_scratch(user, |scratch| {
                scratch.order_mut().draft.delivery_method = Some(DeliveryMethod::Pickup);
            });
            // Pickup needs no address capture; go straight to confirmation.
            self.show_order_confirmation(user).await;
            return;
        }

        if normalized == "2"
            || normalized.contains("despacho")
            || normalized.contains("domicilio")
            || normalized.contains("delivery")
            || normalized.contains("envio")
            || normalized.contains("envío")
        {
            let totals = self.stores.carts.totals(user);
            if totals.total < MIN_DELIVERY_TOTAL {
                let missing = MIN_DELIVERY_TOTAL - totals.total;
                self.send(user, &copy::delivery_minimum_not_met(totals.total, missing)).await;
                self.ask_add_more(user).await;
                return;
            }

            self.stores.states.update_scratch(user, |scratch| {
                scratch.order_mut().draft.delivery_method = Some(DeliveryMethod::Delivery);
            });
            self.send(user, &copy::ask_address()).await;
            self.stores.states.set_state(user, ChatState::OrderAwaitingAddress);
            return;
        }

        self.send(user, &copy::ask_delivery_method()).await;
    }

    pub(crate) async fn handle_order_address(&self, user: &UserId, text: &str) {
        let address = text.trim();
        if address.chars().count() < 5 {
            self.send(user, &copy::address_too_short()).await;
            return;
        }

        self.stores.states.update_scratch(user, |scratch| {
            scratch.order_mut().draft.address = Some(address.to_string());
        });
        self.send(user, &copy::ask_city()).await;
        self.stores.states.set_state(user, ChatState::OrderAwaitingCity);
    }

    pub(crate) async fn handle_order_city(&self, user: &UserId, text: &str) {
        let city = text.trim();
        if city.chars().count() < 3 {
            self.send(user, &copy::city_too_short()).await;
            return;
        }

        self.stores.states.update_scratch(user, |scratch| {
            scratch.order_mut().draft.city = Some(city.to_string());
        });
        self.send(user, &copy::ask_district()).await;
        self.stores.states.set_state(user, ChatState::OrderAwaitingDistrict);
    }

    pub(crate) async fn handle_order_district(&self, user: &UserId, text: &str) {
        let district = text.trim();
        if district.chars().count() < 3 {
            self.send(user, &copy::district_too_short()).await;
            return;
        }

        self.stores.states.update_scratch(user, |scratch| {
            scratch.order_mut().draft.district = Some(district.to_string());
        });
        self.send(user, &copy::ask_courier()).await;
        self.stores.states.set_state(user, ChatState::OrderAwaitingCourier);
    }

    pub(crate) async fn handle_order_courier(&self, user: &UserId, text: &str) {
        let Some(courier) = tiendy_core::Courier::parse(text) else {
            self.send(user, &copy::invalid_courier()).await;
            return;
        };

        self.stores.states.update_scratch(user, |scratch| {
            scratch.order_mut().draft.courier = Some(courier);
        });
        self.show_order_confirmation(user).await;
    }

    async fn show_order_confirmation(&self, user: &UserId) {
        let lines = self.stores.cart_lines(user);
        let totals = self.stores.carts.totals(user);
        let draft = self
            .stores
            .states
            .scratch(user)
            .as_order()
            .map(|order| order.draft.clone())
            .unwrap_or_default();

        self.send(user, &copy::order_confirmation_summary(&lines, &totals, &draft)).await;
        self.stores.states.set_state(user, ChatState::OrderAwaitingConfirmation);
    }

    pub(crate) async fn handle_order_confirmation(&self, user: &UserId, text: &str) {
        let normalized = classify::normalize(text);

        if normalized.contains("confirmar") {
            self.submit_order(user).await;
            return;
        }

        if normalized == "no" || normalized.contains("cancelar") {
            self.cancel_order(user).await;
            return;
        }

        self.send(user, &copy::confirm_reprompt()).await;
    }

    async fn cancel_order(&self, user: &UserId) {
        self.stores.carts.clear(user);
        self.stores.states.clear_scratch(user);
        self.send(user, &copy::order_cancelled()).await;
        self.stores.states.set_state(user, ChatState::Menu);
    }

    async fn submit_order(&self, user: &UserId) {
        let Some(customer) = self.stores.states.customer(user) else {
            // Without a customer id there is no payload to build; the flow
            // cannot continue.
            warn!(user = %user, "order confirmation without a resolved customer");
            self.stores.reset(user);
            self.send(user, &copy::session_error_reset()).await;
            return;
        };

        let draft = self
            .stores
            .states
            .scratch(user)
            .as_order()
            .map(|order| order.draft.clone())
            .unwrap_or_default();

        let Some(delivery_address) = draft.resolved_address(copy::STORE_PICKUP_ADDRESS) else {
            warn!(user = %user, "order confirmation with an incomplete delivery draft");
            self.stores.reset(user);
            self.send(user, &copy::session_error_reset()).await;
            return;
        };

        let lines = self.stores.cart_lines(user);
        if lines.is_empty() {
            self.stores.states.clear_scratch(user);
            self.send(user, &copy::empty_cart_abort()).await;
            self.stores.states.set_state(user, ChatState::Menu);
            return;
        }
        let totals = self.stores.carts.totals(user);

        let order = NewOrder {
            customer_id: customer.id.clone(),
            delivery_address,
            courier: draft.courier,
            channel: SalesChannel::Whatsapp,
            payment_method: PaymentMethod::BankTransfer,
            lines: lines
                .iter()
                .map(|line| NewOrderLine {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                })
                .collect(),
            manual_discount: 0,
        };

        match self.orders.create_order(&order).await {
            Ok(created) => {
                info!(user = %user, order_id = %created.order_id, "order submitted");
                // The backend response does not echo the amount; the total
                // shown comes from the local cart.
                self.send(user, &copy::order_submitted(&created.order_id, totals.total)).await;
                self.stores.carts.clear(user);
                self.stores.states.clear_scratch(user);
                self.stores.states.set_state(user, ChatState::Menu);
            }
            Err(error) => {
                warn!(user = %user, error = %error, "order submission failed");
                // Cart and draft survive so the user can retry or cancel.
                self.send(user, &copy::order_failed(&backend_detail(&error))).await;
            }
        }
    }
}

/// Parses a comma-separated ambiguity selection: bare option numbers
/// (`"1, 3"`) or `number:quantity` pairs (`"1: 5, 2: 3"`). Malformed tokens
/// are dropped.
fn parse_ambiguous_selection(text: &str) -> Vec<(u32, Option<u32>)> {
    text.split(',')
        .filter_map(|token| {
            let token = token.trim();
            if token.is_empty() {
                return None;
            }
            match token.split_once(':') {
                Some((number, quantity)) => {
                    let number = number.trim().parse::<u32>().ok()?;
                    let quantity = quantity.trim().parse::<u32>().ok().filter(|q| *q > 0)?;
                    Some((number, Some(quantity)))
                }
                None => token.parse::<u32>().ok().map(|number| (number, None)),
            }
        })
        .collect()
}

fn backend_detail(error: &BackendError) -> String {
    match error {
        BackendError::Api { detail, .. } if !detail.trim().is_empty() => detail.clone(),
        _ => "servicio temporalmente no disponible".to_string(),
    }
}

//! Product search flow: query → 0/1/N results → selection → details.

use tracing::warn;

use tiendy_core::{classify, CartError, ChatState, Product, UserId};

use crate::copy;
use crate::router::DialogueRouter;

const SEARCH_LIMIT: u32 = 5;

impl DialogueRouter {
    pub(crate) async fn start_search(&self, user: &UserId) {
        self.stores.states.update_scratch(user, |scratch| {
            *scratch.search_mut() = Default::default();
        });
        self.send(user, &copy::ask_search_query()).await;
        self.stores.states.set_state(user, ChatState::ProductSearchAwaitingQuery);
    }

    pub(crate) async fn handle_search_query(&self, user: &UserId, text: &str) {
        let term = match self.extractor.extract_single_term(text).await {
            Ok(Some(term)) => term,
            Ok(None) => {
                // Extraction found no product; clarify instead of erroring.
                self.send(user, &copy::clarify_search_query()).await;
                return;
            }
            Err(error) => {
                warn!(user = %user, error = %error, "term extraction failed");
                self.send(user, &copy::clarify_search_query()).await;
                return;
            }
        };

        self.run_search(user, &term).await;
    }

    /// Quick lookup triggered by the product-question heuristic from any
    /// non-product state. Returns true when the message was handled.
    pub(crate) async fn quick_product_lookup(&self, user: &UserId, text: &str) -> bool {
        let term = match self.extractor.extract_single_term(text).await {
            Ok(Some(term)) => term,
            Ok(None) => return false,
            Err(error) => {
                warn!(user = %user, error = %error, "term extraction failed");
                return false;
            }
        };

        self.run_search(user, &term).await;
        true
    }

    async fn run_search(&self, user: &UserId, term: &str) {
        let mut products = match self.catalog.search_products(term, SEARCH_LIMIT).await {
            Ok(products) => products,
            Err(error) => {
                warn!(user = %user, error = %error, "catalog search failed");
                self.send(user, &copy::temporarily_unavailable()).await;
                return;
            }
        };

        if products.is_empty() {
            self.send(user, &copy::no_results(term)).await;
            self.stores.states.set_state(user, ChatState::ProductSearchAwaitingQuery);
            return;
        }

        if products.len() == 1 {
            self.show_details(user, products.remove(0)).await;
            return;
        }

        self.send(user, &copy::search_results_list(term, &products)).await;
        self.stores.states.update_scratch(user, |scratch| {
            let search = scratch.search_mut();
            search.query = Some(term.to_string());
            search.candidates = products;
            search.selected = None;
        });
        self.stores.states.set_state(user, ChatState::ProductSearchAwaitingSelection);
    }

    async fn show_details(&self, user: &UserId, product: Product) {
        self.send(user, &copy::product_details(&product)).await;
        self.stores.states.update_scratch(user, |scratch| {
            scratch.search_mut().selected = Some(product);
        });
        self.stores.states.set_state(user, ChatState::ProductSearchShowingDetails);
    }

    pub(crate) async fn handle_search_selection(&self, user: &UserId, text: &str) {
        let candidates = self
            .stores
            .states
            .scratch(user)
            .as_search()
            .map(|search| search.candidates.clone())
            .unwrap_or_default();

        if candidates.is_empty() {
            // Stale selection with no pending results: restart the search.
            self.start_search(user).await;
            return;
        }

        let choice = text.trim().parse::<usize>().ok();
        match choice {
            Some(index) if (1..=candidates.len()).contains(&index) => {
                self.show_details(user, candidates[index - 1].clone()).await;
            }
            _ => self.send(user, &copy::invalid_selection(candidates.len())).await,
        }
    }

    pub(crate) async fn handle_search_details(&self, user: &UserId, text: &str) {
        let selected = self
            .stores
            .states
            .scratch(user)
            .as_search()
            .and_then(|search| search.selected.clone());

        let Some(product) = selected else {
            self.start_search(user).await;
            return;
        };

        if classify::is_affirmative(text) {
            match self.stores.carts.add(user, &product, 1) {
                Ok((line, totals)) => {
                    self.send(user, &copy::added_to_cart(&line, &totals)).await;
                }
                Err(CartError::StockInsufficient { in_cart, available }) => {
                    let message = format!(
                        "{}\n\n{}",
                        copy::stock_insufficient(&product.name, in_cart, available),
                        copy::product_info_menu()
                    );
                    self.send(user, &message).await;
                }
                Err(error) => {
                    warn!(user = %user, error = %error, "cart add failed");
                    self.send(user, &copy::product_info_menu()).await;
                }
            }
            self.stores.states.set_state(user, ChatState::ProductInfo);
            return;
        }

        if classify::is_negative(text) {
            self.start_search(user).await;
            return;
        }

        self.send(user, &copy::details_reprompt()).await;
    }
}

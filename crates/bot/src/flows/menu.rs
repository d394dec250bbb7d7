//! Main menu and the small fixed menus (product info, orders, FAQ).

use tiendy_core::{classify, ChatState, UserId};

use crate::copy;
use crate::router::DialogueRouter;

impl DialogueRouter {
    pub(crate) async fn handle_menu_selection(&self, user: &UserId, text: &str) {
        match text.trim() {
            "1" => self.start_search(user).await,
            "2" => self.start_order(user).await,
            "3" => {
                let lines = self.stores.cart_lines(user);
                let totals = self.stores.carts.totals(user);
                self.send(user, &copy::cart_summary(&lines, &totals)).await;
            }
            "4" => {
                self.send(user, &copy::orders_menu()).await;
                self.stores.states.set_state(user, ChatState::OrdersMenu);
            }
            "5" => {
                self.send(user, &copy::faq_menu()).await;
                self.stores.states.set_state(user, ChatState::Faq);
            }
            _ => self.send(user, &copy::invalid_menu_choice()).await,
        }
    }

    pub(crate) async fn handle_product_info(&self, user: &UserId, text: &str) {
        match text.trim() {
            "1" => self.start_search(user).await,
            "2" => self.start_order(user).await,
            "3" => self.show_main_menu(user).await,
            _ => self.send(user, &copy::product_info_menu()).await,
        }
    }

    pub(crate) async fn handle_orders_menu(&self, user: &UserId, text: &str) {
        match text.trim() {
            "1" => self.start_order(user).await,
            "2" => self.show_main_menu(user).await,
            _ => self.send(user, &copy::orders_menu()).await,
        }
    }

    /// FAQ keyword matches are answered before dispatch; anything that
    /// reaches this handler gets the topic list again.
    pub(crate) async fn handle_faq(&self, user: &UserId, text: &str) {
        if let Some(topic) = classify::detect_faq_topic(text) {
            self.send(user, &copy::faq_answer(topic)).await;
            return;
        }
        self.send(user, &copy::faq_menu()).await;
    }
}

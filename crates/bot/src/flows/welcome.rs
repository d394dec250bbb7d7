//! Welcome and registration flow.

use tracing::warn;

use tiendy_core::{ChatState, UserId};

use crate::copy;
use crate::router::DialogueRouter;

impl DialogueRouter {
    /// Entry point for new users, greetings, and unknown states. Registered
    /// phones skip straight to the main menu.
    pub(crate) async fn enter_welcome(&self, user: &UserId) {
        match self.customers.validate_by_phone(&user.0).await {
            Ok(lookup) if lookup.registered => {
                let Some(customer) = lookup.customer else {
                    warn!(user = %user, "backend reported registered customer without identity");
                    self.send(user, &copy::welcome_new_user()).await;
                    self.stores.states.set_state(user, ChatState::AwaitingFirstNameLastname);
                    return;
                };
                self.send(user, &copy::registered_greeting(&customer.name)).await;
                self.stores.states.set_customer(user, customer);
                self.stores.states.set_state(user, ChatState::Menu);
            }
            Ok(_) => {
                self.send(user, &copy::welcome_new_user()).await;
                self.stores.states.set_state(user, ChatState::AwaitingFirstNameLastname);
            }
            Err(error) => {
                warn!(user = %user, error = %error, "customer validation failed");
                self.send(user, &copy::temporarily_unavailable()).await;
            }
        }
    }

    /// Registration step: expects first name and last name in one message.
    pub(crate) async fn handle_name(&self, user: &UserId, text: &str) {
        let full_name = text.trim();
        if full_name.split_whitespace().count() < 2 {
            self.send(user, &copy::ask_full_name_again()).await;
            return;
        }

        match self.customers.register_customer(&user.0, full_name).await {
            Ok(customer) => {
                self.send(user, &copy::registration_complete(&customer.name)).await;
                self.stores.states.set_customer(user, customer);
                self.stores.states.set_state(user, ChatState::Menu);
            }
            Err(error) => {
                warn!(user = %user, error = %error, "customer registration failed");
                self.send(user, &copy::temporarily_unavailable()).await;
            }
        }
    }
}

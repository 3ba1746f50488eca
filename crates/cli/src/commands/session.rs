//! Session commands.

use shopfront_client::{RegistrationForm, Storefront};

use super::{CommandError, reported};
use crate::output;

pub async fn login(shop: &Storefront, username: &str, password: &str) -> Result<(), CommandError> {
    reported(shop.session().login(username, password).await, "login failed")
}

pub fn logout(shop: &Storefront) {
    if shop.session().is_authenticated() {
        shop.logout();
    } else {
        output::line("Not signed in");
    }
}

pub fn whoami(shop: &Storefront) {
    match shop.session().identity() {
        Some(identity) => {
            let roles: Vec<String> = identity.roles.iter().map(ToString::to_string).collect();
            output::line(format!("{} ({})", identity.username, roles.join(", ")));
        }
        None => output::line("Not signed in"),
    }
}

pub async fn register(shop: &Storefront, form: &RegistrationForm) -> Result<(), CommandError> {
    reported(shop.session().register(form).await, "registration failed")
}

//! Page map of the demo storefront.

use crate::selectors::{xpath_literal, Locator};

pub const DEFAULT_BASE_URL: &str = "https://www.bstackdemo.com";

/// Where the scenario starts and where the favorites view lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Storefront {
    pub entry_url: String,
    pub favorites_url: String,
}

impl Storefront {
    pub fn new(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            entry_url: format!("{}/signin", base),
            favorites_url: format!("{}/favourites", base),
        }
    }

    /// True once `url` is somewhere other than the sign-in page.
    pub fn left_sign_in(&self, url: &str) -> bool {
        !url.is_empty()
            && url != "about:blank"
            && url != self.entry_url
            && !url.contains("/signin")
    }
}

impl Default for Storefront {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Root container of the Next.js app; its visibility is the ready signal.
pub fn ready_signal() -> Locator {
    Locator::id("__next")
}

pub fn username_control() -> Locator {
    Locator::id("username")
}

pub fn password_control() -> Locator {
    Locator::id("password")
}

/// An open react-select option whose text is exactly `value`.
pub fn dropdown_option(value: &str) -> Locator {
    Locator::xpath(format!(
        "//div[contains(@id, 'react-select') and text()={}]",
        xpath_literal(value)
    ))
}

pub fn login_button() -> Locator {
    Locator::id("login-btn")
}

/// Sign-in error banner. The Next.js route announcer shares the alert role.
pub fn login_error() -> Locator {
    Locator::css(
        r#".api-error, .error-message, [role="alert"]:not(#__next-route-announcer__)"#,
    )
}

/// Header marker showing the signed-in username.
pub fn signed_in_marker(username: &str) -> Locator {
    Locator::text("span", username)
}

/// Clickable checkmark of the sidebar brand filter.
pub fn brand_filter(label: &str) -> Locator {
    Locator::xpath(format!(
        "//div[@class='filters']//label[./input[@value={}]]/span[@class='checkmark']",
        xpath_literal(label)
    ))
}

/// The checkbox backing [`brand_filter`].
pub fn brand_filter_input(label: &str) -> Locator {
    Locator::xpath(format!(
        "//div[@class='filters']//input[@value={}]",
        xpath_literal(label)
    ))
}

pub fn loading_indicator() -> Locator {
    Locator::css(".spinner")
}

/// Titles of every listed product, on the catalog or the favorites view.
pub fn product_titles() -> Locator {
    Locator::css(".shelf-item .shelf-item__title")
}

pub fn product_title(name: &str) -> Locator {
    Locator::xpath(format!("//p[contains(text(), {})]", xpath_literal(name)))
}

/// Heart button inside the product card holding `name`.
pub fn favorite_toggle(name: &str) -> Locator {
    product_title(name)
        .ancestor(".shelf-item")
        .within(".shelf-stopper button")
}

pub fn favorites_counter() -> Locator {
    Locator::id("favorites-count")
}

pub fn favorites_link() -> Locator {
    Locator::id("favourites")
}

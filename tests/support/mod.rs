//! In-memory stand-in for the demo storefront.
//!
//! Each locator from `scenario::storefront` is recognised by equality and
//! answered from a small state machine, so the runner can be exercised
//! without a browser.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use favorites_scenario::browser::{
    Capability, ClickMethod, ClickOutcome, Connector, ElementState, PageDriver,
};
use favorites_scenario::config::Credentials;
use favorites_scenario::scenario::storefront::{self, Storefront};
use favorites_scenario::selectors::Locator;

pub const PRODUCTS: &[(&str, &str)] = &[
    ("iPhone 12", "Apple"),
    ("iPhone 12 Mini", "Apple"),
    ("Galaxy S20", "Samsung"),
    ("Galaxy S20+", "Samsung"),
    ("Galaxy S20 Ultra", "Samsung"),
    ("Pixel 4", "Google"),
    ("One Plus 8", "OnePlus"),
];

const USERNAMES: &[&str] = &["demouser", "image_not_loading_user", "locked_user"];
const PASSWORDS: &[&str] = &["testingisfun99"];
const BRANDS: &[&str] = &["Apple", "Samsung", "Google", "OnePlus"];

#[derive(Debug, Clone)]
pub struct ShopOptions {
    pub ready: bool,
    /// Probes of the ready signal before it shows up.
    pub ready_after_probes: usize,
    pub native_inputs: bool,
    /// Login button click is swallowed: neither success nor error appears.
    pub silent_login: bool,
    /// Probes the spinner stays visible after a filter click.
    pub spinner_probes: usize,
    pub spinner_stuck: bool,
    /// Page reads after a filter click before the catalog re-renders.
    pub filter_lag: usize,
    /// Text held by a hidden alert region, like a route announcer.
    pub hidden_alert: Option<String>,
    /// Clicks on a heart, of either method, that land on an overlay.
    pub heart_obscured_clicks: usize,
    pub counter_stuck: bool,
    pub favorites_link: bool,
    /// Probes of the favourites link before it renders.
    pub favorites_link_after_probes: usize,
    pub preexisting_favorites: Vec<String>,
}

impl Default for ShopOptions {
    fn default() -> Self {
        Self {
            ready: true,
            ready_after_probes: 0,
            native_inputs: false,
            silent_login: false,
            spinner_probes: 3,
            spinner_stuck: false,
            filter_lag: 0,
            hidden_alert: None,
            heart_obscured_clicks: 0,
            counter_stuck: false,
            favorites_link: true,
            favorites_link_after_probes: 0,
            preexisting_favorites: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Username,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Catalog,
    Favorites,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Ready,
    Field(Control),
    DropdownOption(String),
    LoginButton,
    LoginError,
    SignedInMarker(String),
    BrandFilter(String),
    BrandInput(String),
    Spinner,
    Titles,
    Title(String),
    Heart(String),
    Counter,
    FavoritesLink,
}

struct ShopState {
    url: String,
    ready_probes: usize,
    open_dropdown: Option<Control>,
    username: Option<String>,
    password: Option<String>,
    signed_in: bool,
    login_error: Option<String>,
    brand: Option<String>,
    pending_brand: Option<String>,
    filter_lag_remaining: usize,
    link_probes: usize,
    spinner_remaining: usize,
    heart_obscured_remaining: usize,
    favorites: Vec<String>,
    counted_favorites: usize,
    view: View,
}

struct Inner {
    options: ShopOptions,
    site: Storefront,
    state: Mutex<ShopState>,
    clicks: Mutex<Vec<(Locator, ClickMethod)>>,
    fills: Mutex<Vec<(Locator, String)>>,
    closes: AtomicUsize,
}

/// Cloning shares state, so a test keeps a handle while the runner owns another.
#[derive(Clone)]
pub struct FakeStorefront {
    inner: Arc<Inner>,
}

impl FakeStorefront {
    pub fn new(options: ShopOptions) -> Self {
        let favorites = options.preexisting_favorites.clone();
        let state = ShopState {
            url: "about:blank".into(),
            ready_probes: 0,
            open_dropdown: None,
            username: None,
            password: None,
            signed_in: false,
            login_error: None,
            brand: None,
            pending_brand: None,
            filter_lag_remaining: 0,
            link_probes: 0,
            spinner_remaining: 0,
            heart_obscured_remaining: options.heart_obscured_clicks,
            counted_favorites: favorites.len(),
            favorites,
            view: View::Catalog,
        };
        Self {
            inner: Arc::new(Inner {
                options,
                site: Storefront::default(),
                state: Mutex::new(state),
                clicks: Mutex::new(Vec::new()),
                fills: Mutex::new(Vec::new()),
                closes: AtomicUsize::new(0),
            }),
        }
    }

    pub fn site(&self) -> Storefront {
        self.inner.site.clone()
    }

    pub fn closes(&self) -> usize {
        self.inner.closes.load(Ordering::SeqCst)
    }

    pub fn clicks(&self) -> Vec<(Locator, ClickMethod)> {
        self.inner.clicks.lock().unwrap().clone()
    }

    pub fn fills(&self) -> Vec<(Locator, String)> {
        self.inner.fills.lock().unwrap().clone()
    }

    pub fn brand(&self) -> Option<String> {
        self.inner.state.lock().unwrap().brand.clone()
    }

    pub fn favorites(&self) -> Vec<String> {
        self.inner.state.lock().unwrap().favorites.clone()
    }

    fn classify(&self, locator: &Locator) -> Option<Target> {
        if *locator == storefront::ready_signal() {
            return Some(Target::Ready);
        }
        if *locator == storefront::username_control() {
            return Some(Target::Field(Control::Username));
        }
        if *locator == storefront::password_control() {
            return Some(Target::Field(Control::Password));
        }
        if *locator == storefront::login_button() {
            return Some(Target::LoginButton);
        }
        if *locator == storefront::login_error() {
            return Some(Target::LoginError);
        }
        if *locator == storefront::loading_indicator() {
            return Some(Target::Spinner);
        }
        if *locator == storefront::product_titles() {
            return Some(Target::Titles);
        }
        if *locator == storefront::favorites_counter() {
            return Some(Target::Counter);
        }
        if *locator == storefront::favorites_link() {
            return Some(Target::FavoritesLink);
        }
        for value in USERNAMES.iter().chain(PASSWORDS) {
            if *locator == storefront::dropdown_option(value) {
                return Some(Target::DropdownOption(value.to_string()));
            }
        }
        for user in USERNAMES {
            if *locator == storefront::signed_in_marker(user) {
                return Some(Target::SignedInMarker(user.to_string()));
            }
        }
        for brand in BRANDS {
            if *locator == storefront::brand_filter(brand) {
                return Some(Target::BrandFilter(brand.to_string()));
            }
            if *locator == storefront::brand_filter_input(brand) {
                return Some(Target::BrandInput(brand.to_string()));
            }
        }
        for (name, _) in PRODUCTS {
            if *locator == storefront::product_title(name) {
                return Some(Target::Title(name.to_string()));
            }
            if *locator == storefront::favorite_toggle(name) {
                return Some(Target::Heart(name.to_string()));
            }
        }
        None
    }

    /// Advance a lagging filter by one page read.
    fn tick(&self, state: &mut ShopState) {
        if state.pending_brand.is_none() {
            return;
        }
        if state.filter_lag_remaining > 0 {
            state.filter_lag_remaining -= 1;
            return;
        }
        state.brand = state.pending_brand.take();
        state.spinner_remaining = self.inner.options.spinner_probes;
    }

    fn listed(&self, state: &ShopState) -> Vec<String> {
        if !state.signed_in {
            return Vec::new();
        }
        match state.view {
            View::Favorites => state.favorites.clone(),
            View::Catalog => PRODUCTS
                .iter()
                .filter(|(_, brand)| state.brand.as_deref().map_or(true, |b| b == *brand))
                .map(|(name, _)| name.to_string())
                .collect(),
        }
    }

    fn state_of(&self, state: &mut ShopState, target: &Target) -> ElementState {
        let opts = &self.inner.options;
        let shown = |present: bool, tag: &str| ElementState {
            present,
            visible: present,
            enabled: present,
            checked: false,
            tag: present.then(|| tag.to_string()),
        };
        match target {
            Target::Ready => {
                state.ready_probes += 1;
                shown(
                    opts.ready && state.ready_probes > opts.ready_after_probes,
                    "div",
                )
            }
            Target::Field(_) => shown(
                !state.signed_in,
                if opts.native_inputs { "input" } else { "div" },
            ),
            Target::DropdownOption(value) => {
                let offered = match state.open_dropdown {
                    Some(Control::Username) => USERNAMES.contains(&value.as_str()),
                    Some(Control::Password) => PASSWORDS.contains(&value.as_str()),
                    None => false,
                };
                shown(offered, "div")
            }
            Target::LoginButton => shown(!state.signed_in, "button"),
            Target::LoginError => ElementState {
                present: state.login_error.is_some() || opts.hidden_alert.is_some(),
                ..shown(state.login_error.is_some(), "h3")
            },
            Target::SignedInMarker(user) => shown(
                state.signed_in && state.username.as_deref() == Some(user.as_str()),
                "span",
            ),
            Target::BrandFilter(_) => shown(state.signed_in && state.view == View::Catalog, "span"),
            Target::BrandInput(brand) => ElementState {
                checked: state.brand.as_deref() == Some(brand.as_str())
                    || state.pending_brand.as_deref() == Some(brand.as_str()),
                ..shown(state.signed_in && state.view == View::Catalog, "input")
            },
            Target::Spinner => {
                let spinning = state.spinner_remaining > 0;
                if spinning && !opts.spinner_stuck {
                    state.spinner_remaining -= 1;
                }
                shown(spinning, "div")
            }
            Target::Titles => shown(!self.listed(state).is_empty(), "p"),
            Target::Title(name) => shown(self.listed(state).iter().any(|n| n.contains(name.as_str())), "p"),
            Target::Heart(name) => shown(
                state.view == View::Catalog && self.listed(state).contains(name),
                "button",
            ),
            Target::Counter => shown(state.signed_in, "span"),
            Target::FavoritesLink => {
                state.link_probes += 1;
                shown(
                    state.signed_in
                        && opts.favorites_link
                        && state.link_probes > opts.favorites_link_after_probes,
                    "a",
                )
            }
        }
    }
}

#[async_trait]
impl PageDriver for FakeStorefront {
    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.inner.state.lock().unwrap();
        state.url = url.to_string();
        if url == self.inner.site.favorites_url {
            state.view = View::Favorites;
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.inner.state.lock().unwrap().url.clone())
    }

    async fn probe(&self, locator: &Locator) -> Result<ElementState> {
        let mut state = self.inner.state.lock().unwrap();
        self.tick(&mut state);
        Ok(match self.classify(locator) {
            Some(target) => self.state_of(&mut state, &target),
            None => ElementState::absent(),
        })
    }

    async fn click(&self, locator: &Locator, method: ClickMethod) -> Result<ClickOutcome> {
        self.inner
            .clicks
            .lock()
            .unwrap()
            .push((locator.clone(), method));

        let Some(target) = self.classify(locator) else {
            return Ok(ClickOutcome::Detached);
        };
        let mut state = self.inner.state.lock().unwrap();
        if !self.state_of(&mut state, &target).present {
            return Ok(ClickOutcome::Detached);
        }

        match target {
            Target::Field(control) if !self.inner.options.native_inputs => {
                state.open_dropdown = Some(control);
            }
            Target::DropdownOption(value) => {
                match state.open_dropdown.take() {
                    Some(Control::Username) => state.username = Some(value),
                    Some(Control::Password) => state.password = Some(value),
                    None => {}
                }
            }
            Target::LoginButton if !self.inner.options.silent_login => {
                let password_ok = state.password.as_deref() == Some("testingisfun99");
                let username = state.username.clone();
                match username.as_deref() {
                    Some("locked_user") => {
                        state.login_error = Some("Your account has been locked.".into());
                    }
                    Some(_) if password_ok => state.signed_in = true,
                    _ => state.login_error = Some("Invalid Username".into()),
                }
            }
            Target::BrandFilter(brand) => {
                state.pending_brand = Some(brand);
                state.filter_lag_remaining = self.inner.options.filter_lag;
                self.tick(&mut state);
            }
            Target::Heart(name) => {
                if state.heart_obscured_remaining > 0 {
                    state.heart_obscured_remaining -= 1;
                    return Ok(ClickOutcome::Obscured);
                }
                state.favorites.push(name);
                if !self.inner.options.counter_stuck {
                    state.counted_favorites = state.favorites.len();
                }
            }
            Target::FavoritesLink => {
                state.view = View::Favorites;
                state.url = self.inner.site.favorites_url.clone();
            }
            _ => {}
        }
        Ok(ClickOutcome::Activated)
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<()> {
        self.inner
            .fills
            .lock()
            .unwrap()
            .push((locator.clone(), value.to_string()));
        let mut state = self.inner.state.lock().unwrap();
        match self.classify(locator) {
            Some(Target::Field(Control::Username)) => state.username = Some(value.into()),
            Some(Target::Field(Control::Password)) => state.password = Some(value.into()),
            _ => anyhow::bail!("cannot fill {}", locator),
        }
        Ok(())
    }

    async fn texts(&self, locator: &Locator) -> Result<Vec<String>> {
        let mut state = self.inner.state.lock().unwrap();
        self.tick(&mut state);
        Ok(match self.classify(locator) {
            Some(Target::Titles) => self.listed(&state),
            Some(Target::Title(name)) => self
                .listed(&state)
                .into_iter()
                .filter(|n| n.contains(name.as_str()))
                .collect(),
            Some(Target::Counter) if state.signed_in => vec![state.counted_favorites.to_string()],
            Some(Target::LoginError) => state
                .login_error
                .iter()
                .chain(&self.inner.options.hidden_alert)
                .cloned()
                .collect(),
            _ => Vec::new(),
        })
    }

    async fn page_source(&self) -> Result<String> {
        Ok("<html><body><div id=\"loading\"></div></body></html>".into())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(vec![0x89, 0x50, 0x4E, 0x47])
    }

    async fn close(&self) -> Result<()> {
        self.inner.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out the shared fake and counts connection attempts.
pub struct FakeConnector {
    shop: FakeStorefront,
    connects: AtomicUsize,
}

impl FakeConnector {
    pub fn new(shop: FakeStorefront) -> Arc<Self> {
        Arc::new(Self {
            shop,
            connects: AtomicUsize::new(0),
        })
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        _capability: &Capability,
        _credentials: Option<&Credentials>,
    ) -> Result<Box<dyn PageDriver>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.shop.clone()))
    }
}

pub fn credentials() -> Credentials {
    Credentials::new("ci-user", "ci-access-key")
}

pub fn samsung_products() -> Vec<&'static str> {
    PRODUCTS
        .iter()
        .filter(|(_, brand)| *brand == "Samsung")
        .map(|(name, _)| *name)
        .collect()
}

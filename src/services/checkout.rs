//! Checkout session
//!
//! Drives the three-step checkout over the shared cart: collects contact,
//! address and payment fields through a [`Wizard`], tracks the chosen shipping
//! method and accepted promo code, and finally places an [`Order`].
//!
//! Every slow operation (step advance, promo lookup, order submission) holds the
//! session's busy flag for its whole duration and can be cut short with
//! [`CheckoutSession::cancel`].

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::config::StorefrontConfig;
use crate::domain::aggregates::{validate_details, Contact, NewOrder, Order, ShippingAddress};
use crate::domain::countdown::Countdown;
use crate::domain::events::DomainEvent;
use crate::domain::pricing::{compute, subtotal, PricingSnapshot, ShippingMethod, TaxRate};
use crate::domain::promo::{AppliedPromo, DiscountPolicy, PromoBook, PromoOutcome};
use crate::domain::value_objects::Money;
use crate::domain::wizard::{CheckoutStep, StepChange, Wizard};
use crate::repository::OrderRepository;
use crate::services::cart::CartHandle;
use crate::services::latency::{BusyFlag, Cancellation, SimulatedLatency};
use crate::{Result, StorefrontError};

const DEFAULT_COUNTRY: &str = "United States";

#[derive(Debug, Default)]
struct CheckoutState {
    wizard: Wizard<CheckoutStep>,
    shipping: ShippingMethod,
    promo: Option<AppliedPromo>,
}

pub struct CheckoutSession<O: OrderRepository> {
    cart: CartHandle,
    orders: Arc<O>,
    promos: PromoBook,
    tax_rate: TaxRate,
    discount_policy: DiscountPolicy,
    step_latency: SimulatedLatency,
    promo_latency: SimulatedLatency,
    order_latency: SimulatedLatency,
    state: Mutex<CheckoutState>,
    busy: BusyFlag,
    cancellation: Cancellation,
}

impl<O: OrderRepository> CheckoutSession<O> {
    pub fn new(cart: CartHandle, orders: Arc<O>, config: &StorefrontConfig) -> Self {
        Self {
            cart,
            orders,
            promos: PromoBook::default(),
            tax_rate: config.tax_rate,
            discount_policy: config.discount_policy,
            step_latency: SimulatedLatency::new(config.step_latency),
            promo_latency: SimulatedLatency::new(config.promo_latency),
            order_latency: SimulatedLatency::new(config.order_latency),
            state: Mutex::new(CheckoutState::default()),
            busy: BusyFlag::default(),
            cancellation: Cancellation::new(),
        }
    }

    pub fn with_promos(mut self, promos: PromoBook) -> Self { self.promos = promos; self }

    pub fn cart(&self) -> &CartHandle { &self.cart }

    /// True while a step advance, promo lookup or order submission is pending.
    pub fn is_busy(&self) -> bool { self.busy.is_busy() }

    /// Abandons whatever is in flight. The pending call returns `Cancelled` and
    /// leaves the session as it was before the call.
    pub fn cancel(&self) {
        debug!("checkout request cancelled");
        self.cancellation.cancel();
    }

    pub async fn current_step(&self) -> CheckoutStep { self.state.lock().await.wizard.current() }
    pub async fn progress(&self) -> (usize, usize) { self.state.lock().await.wizard.progress() }
    pub async fn shipping_method(&self) -> ShippingMethod { self.state.lock().await.shipping }

    pub async fn promo_code(&self) -> Option<String> {
        self.state.lock().await.promo.as_ref().map(|p| p.code().to_string())
    }

    /// Sets a field on the current step.
    pub async fn set_field(&self, name: impl Into<String>, value: impl Into<String>) {
        self.state.lock().await.wizard.set_field(name, value);
    }

    pub async fn field(&self, step: CheckoutStep, name: &str) -> Option<String> {
        self.state.lock().await.wizard.field(step, name).map(str::to_string)
    }

    pub async fn select_shipping(&self, method: ShippingMethod) {
        let mut state = self.state.lock().await;
        if state.shipping != method {
            debug!(from = %state.shipping, to = %method, "shipping method changed");
            state.shipping = method;
        }
    }

    /// Current totals over the live cart. Re-derived on every call.
    pub async fn pricing(&self) -> PricingSnapshot {
        let (shipping, promo) = {
            let state = self.state.lock().await;
            (state.shipping, state.promo.clone())
        };
        self.cart.read(|cart| {
            let sub = subtotal(cart.items(), cart.currency());
            let discount = promo.as_ref().map_or_else(|| Money::zero(cart.currency()), |p| p.discount_for(&sub));
            compute(cart.items(), shipping, self.tax_rate, discount)
        }).await
    }

    /// Countdown to the estimated delivery of the chosen shipping method.
    pub async fn delivery_countdown(&self, now: DateTime<Utc>) -> Countdown {
        let method = self.shipping_method().await;
        Countdown::until(method.estimated_delivery(now), now)
    }

    /// Looks up `code` after the promo round trip. An accepted code replaces any
    /// earlier one; a rejected code leaves the session's discount untouched.
    #[instrument(skip(self))]
    pub async fn apply_promo(&self, code: &str) -> Result<PromoOutcome> {
        let _busy = self.busy.try_acquire()?;
        self.cancellation.guard(self.promo_latency.round_trip()).await?;

        let sub = self.cart.read(|cart| subtotal(cart.items(), cart.currency())).await;
        let outcome = self.promos.apply(code, sub);
        match self.promos.find(code) {
            Some(rule) => {
                info!(code = rule.code(), discount = %outcome.discount, "promo code applied");
                self.state.lock().await.promo = Some(AppliedPromo::new(rule.clone(), self.discount_policy, sub));
            }
            None => warn!("promo code rejected"),
        }
        Ok(outcome)
    }

    pub async fn remove_promo(&self) {
        if let Some(promo) = self.state.lock().await.promo.take() {
            debug!(code = promo.code(), "promo code removed");
        }
    }

    /// Validates the current step, waits out the step round trip, then moves on.
    /// Does nothing on the payment step; use [`Self::place_order`] there.
    #[instrument(skip(self))]
    pub async fn advance(&self) -> Result<StepChange<CheckoutStep>> {
        let _busy = self.busy.try_acquire()?;
        let from = {
            let state = self.state.lock().await;
            let from = state.wizard.current();
            if state.wizard.is_last() { return Ok(StepChange::Unchanged(from)); }
            state.wizard.validate(from)?;
            if from == CheckoutStep::Information {
                let information = state.wizard.values(from);
                validate_details(&contact(information), &ship_to(information))?;
            }
            from
        };

        self.cancellation.guard(self.step_latency.round_trip()).await?;

        let mut state = self.state.lock().await;
        if state.wizard.current() != from {
            return Err(StorefrontError::Cancelled);
        }
        let change = state.wizard.advance()?;
        info!(from = %from, to = %change.current(), "checkout step advanced");
        Ok(change)
    }

    /// Moves back one step. Cancels a pending advance so it cannot land afterwards.
    pub async fn retreat(&self) -> StepChange<CheckoutStep> {
        if self.is_busy() { self.cancel(); }
        let change = self.state.lock().await.wizard.retreat();
        debug!(step = %change.current(), "checkout step retreated");
        change
    }

    /// Submits the order from the payment step. On success the ordered lines
    /// leave the cart, the promo is consumed and the confirmed order is stored.
    /// Lines added to the cart while the order is in flight stay in the cart.
    #[instrument(skip(self))]
    pub async fn place_order(&self) -> Result<Order> {
        let _busy = self.busy.try_acquire()?;
        let (items, currency) = self.cart.read(|cart| (cart.items().to_vec(), cart.currency())).await;
        let (contact, ship_to, shipping_method, promo) = {
            let state = self.state.lock().await;
            let step = state.wizard.current();
            if !state.wizard.is_last() { return Err(StorefrontError::PaymentStepNotReached(step)); }
            state.wizard.validate(step)?;
            let information = state.wizard.values(CheckoutStep::Information);
            (contact(information), ship_to(information), state.shipping, state.promo.clone())
        };
        if items.is_empty() { return Err(StorefrontError::EmptyCart); }
        validate_details(&contact, &ship_to)?;

        let sub = subtotal(&items, currency);
        let discount = promo.as_ref().map_or_else(|| Money::zero(currency), |p| p.discount_for(&sub));
        let pricing = compute(&items, shipping_method, self.tax_rate, discount).rounded();

        self.cancellation.guard(self.order_latency.round_trip()).await?;

        let order_number = self.orders.next_order_number().await?;
        let mut order = Order::place(NewOrder {
            order_number,
            contact,
            ship_to,
            items,
            shipping_method,
            pricing,
            promo_code: promo.as_ref().map(|p| p.code().to_string()),
        })?;
        order.confirm()?;
        for event in order.take_events() {
            if let DomainEvent::Order(event) = event {
                debug!(?event, "order event");
            }
        }
        self.orders.save(order.clone()).await?;

        self.cart.deduct(order.items()).await;
        self.state.lock().await.promo = None;
        info!(order_number = order.order_number(), total = %order.pricing().total, "order placed");
        Ok(order)
    }

    /// Orders placed with `email`, newest first.
    pub async fn history(&self, email: &str) -> Result<Vec<Order>> {
        self.orders.history(email).await
    }
}

fn value(fields: &BTreeMap<String, String>, name: &str) -> String {
    fields.get(name).map(|v| v.trim().to_string()).unwrap_or_default()
}

fn contact(fields: &BTreeMap<String, String>) -> Contact {
    Contact { email: value(fields, "email"), phone: value(fields, "phone") }
}

fn ship_to(fields: &BTreeMap<String, String>) -> ShippingAddress {
    let apartment = value(fields, "apartment");
    let country = value(fields, "country");
    ShippingAddress {
        first_name: value(fields, "first_name"),
        last_name: value(fields, "last_name"),
        address: value(fields, "address"),
        apartment: (!apartment.is_empty()).then_some(apartment),
        city: value(fields, "city"),
        state: value(fields, "state"),
        zip_code: value(fields, "zip_code"),
        country: if country.is_empty() { DEFAULT_COUNTRY.to_string() } else { country },
    }
}

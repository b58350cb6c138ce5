//! Payment instruments owned by users.
//!
//! The registry owns the payment method collection for the duration of each
//! operation. Its one invariant is that a user has at most one default
//! method, and [`PaymentMethodRegistry::set_default`] is the only operation
//! that changes which one that is.

use crate::clock::Clock;
use crate::dto::{new_id, NewPaymentMethod, PaymentMethod, PaymentMethodPatch};
use crate::stores::{StoreHandle, PAYMENT_METHODS_NAMESPACE};
use crate::{Error, Result};

#[derive(Clone)]
pub struct PaymentMethodRegistry {
    store: StoreHandle,
    clock: Clock,
}

impl PaymentMethodRegistry {
    pub fn new(store: StoreHandle, clock: Clock) -> Self {
        Self { store, clock }
    }

    /// All methods owned by `user_id`, in stored order.
    pub async fn list(&self, user_id: &str) -> Result<Vec<PaymentMethod>> {
        let methods: Vec<PaymentMethod> = self.store.load(PAYMENT_METHODS_NAMESPACE).await?;
        let owned: Vec<_> = methods
            .into_iter()
            .filter(|m| m.user_id == user_id)
            .collect();
        tracing::debug!(user_id, count = owned.len(), "Listed payment methods");
        Ok(owned)
    }

    pub async fn get(&self, method_id: &str) -> Result<PaymentMethod> {
        let methods: Vec<PaymentMethod> = self.store.load(PAYMENT_METHODS_NAMESPACE).await?;
        methods
            .into_iter()
            .find(|m| m.id == method_id)
            .ok_or_else(|| Error::payment_method_not_found(method_id))
    }

    /// The user's default method, if one is set.
    ///
    /// Fails with [`Error::DuplicateDefault`] if the persisted collection
    /// already has more than one default for the user.
    pub async fn default_for(&self, user_id: &str) -> Result<Option<PaymentMethod>> {
        let mut defaults = self
            .list(user_id)
            .await?
            .into_iter()
            .filter(|m| m.is_default);
        let first = defaults.next();
        if defaults.next().is_some() {
            return Err(Error::DuplicateDefault {
                user_id: user_id.to_owned(),
            });
        }
        Ok(first)
    }

    /// Registers a new method. It is never made default here.
    pub async fn add(&self, user_id: &str, data: NewPaymentMethod) -> Result<PaymentMethod> {
        if user_id.trim().is_empty() {
            return Err(Error::InvalidInput("userId must not be empty".into()));
        }
        data.validate()?;

        let method = PaymentMethod {
            id: new_id("pm"),
            user_id: user_id.to_owned(),
            kind: data.kind,
            label: data.label,
            number: data.number,
            expires: data.expires,
            is_default: false,
            created_at: self.clock.now(),
            updated_at: None,
        };
        let record = method.clone();
        self.store
            .update(PAYMENT_METHODS_NAMESPACE, move |methods: &mut Vec<PaymentMethod>| {
                methods.push(record);
                Ok(())
            })
            .await?;

        tracing::info!(user_id, method_id = %method.id, "Added payment method");
        Ok(method)
    }

    /// Merges `patch` into the method and stamps `updatedAt`.
    pub async fn update(
        &self,
        method_id: &str,
        patch: PaymentMethodPatch,
    ) -> Result<PaymentMethod> {
        patch.validate()?;
        let now = self.clock.now();
        let updated = self
            .store
            .update(PAYMENT_METHODS_NAMESPACE, |methods: &mut Vec<PaymentMethod>| {
                let method = methods
                    .iter_mut()
                    .find(|m| m.id == method_id)
                    .ok_or_else(|| Error::payment_method_not_found(method_id))?;
                patch.apply_to(method);
                method.updated_at = Some(now);
                Ok(method.clone())
            })
            .await?;

        tracing::info!(method_id, "Updated payment method");
        Ok(updated)
    }

    /// Deletes the method. Removing an id that does not exist is a no-op.
    ///
    /// Transactions referencing the method are left untouched.
    pub async fn remove(&self, method_id: &str) -> Result<()> {
        let removed = self
            .store
            .update(PAYMENT_METHODS_NAMESPACE, |methods: &mut Vec<PaymentMethod>| {
                let before = methods.len();
                methods.retain(|m| m.id != method_id);
                Ok(methods.len() != before)
            })
            .await?;

        if removed {
            tracing::info!(method_id, "Removed payment method");
        } else {
            tracing::warn!(method_id, "Remove of unknown payment method ignored");
        }
        Ok(())
    }

    /// Makes `method_id` the only default among `user_id`'s methods.
    ///
    /// The whole collection is rewritten in one locked cycle. If `method_id`
    /// is not one of the user's methods, [`Error::NotFound`] is returned and
    /// nothing is persisted.
    pub async fn set_default(&self, user_id: &str, method_id: &str) -> Result<()> {
        let now = self.clock.now();
        self.store
            .update(PAYMENT_METHODS_NAMESPACE, |methods: &mut Vec<PaymentMethod>| {
                if !methods
                    .iter()
                    .any(|m| m.id == method_id && m.user_id == user_id)
                {
                    return Err(Error::payment_method_not_found(method_id));
                }
                for method in methods.iter_mut().filter(|m| m.user_id == user_id) {
                    let is_default = method.id == method_id;
                    if method.is_default != is_default {
                        method.is_default = is_default;
                        method.updated_at = Some(now);
                    }
                }
                Ok(())
            })
            .await?;

        tracing::info!(user_id, method_id, "Set default payment method");
        Ok(())
    }
}

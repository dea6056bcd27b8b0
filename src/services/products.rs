use crate::{
    entities::{
        authentication_log::{self, AuthenticationStatus},
        brand, category, item_condition, product, supplier,
    },
    errors::ServiceError,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::{Validate, ValidationError};

/// Acquisition details for a newly bought item.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IntakeProductInput {
    pub brand_id: i32,
    pub category_id: i32,
    pub supplier_id: i32,
    pub initial_condition_id: i32,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub material: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub serial_number: Option<String>,
    pub purchase_date: NaiveDate,
    #[validate(custom = "validate_non_negative")]
    pub purchase_price: Decimal,
    pub acquisition_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordAuthenticationInput {
    /// Defaults to today.
    pub authentication_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 100))]
    pub authenticator: String,
    pub status: AuthenticationStatus,
    #[validate(custom = "validate_non_negative")]
    pub cost: Option<Decimal>,
    pub notes: Option<String>,
}

pub(crate) fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative_amount"));
    }
    Ok(())
}

/// Product intake and the authentication audit trail.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Records an acquisition. Products are never updated afterwards.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn intake_product(
        &self,
        input: IntakeProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;

        if brand::Entity::find_by_id(input.brand_id)
            .one(&*self.db)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!(
                "Brand {} not found",
                input.brand_id
            )));
        }
        if category::Entity::find_by_id(input.category_id)
            .one(&*self.db)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!(
                "Category {} not found",
                input.category_id
            )));
        }
        if supplier::Entity::find_by_id(input.supplier_id)
            .one(&*self.db)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!(
                "Supplier {} not found",
                input.supplier_id
            )));
        }
        if item_condition::Entity::find_by_id(input.initial_condition_id)
            .one(&*self.db)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!(
                "Condition {} not found",
                input.initial_condition_id
            )));
        }

        let product = product::ActiveModel {
            brand_id: Set(input.brand_id),
            category_id: Set(input.category_id),
            supplier_id: Set(input.supplier_id),
            initial_condition_id: Set(input.initial_condition_id),
            name: Set(input.name),
            material: Set(input.material),
            color: Set(input.color),
            size: Set(input.size),
            serial_number: Set(input.serial_number),
            purchase_date: Set(input.purchase_date),
            purchase_price: Set(input.purchase_price),
            acquisition_notes: Set(input.acquisition_notes),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(product_id = product.id, "Product intake recorded");
        Ok(product)
    }

    pub async fn get_product(&self, product_id: i32) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    pub async fn products_by_brand(&self, brand_id: i32) -> Result<Vec<product::Model>, ServiceError> {
        Ok(product::Entity::find()
            .filter(product::Column::BrandId.eq(brand_id))
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?)
    }

    pub async fn products_by_category(
        &self,
        category_id: i32,
    ) -> Result<Vec<product::Model>, ServiceError> {
        Ok(product::Entity::find()
            .filter(product::Column::CategoryId.eq(category_id))
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?)
    }

    pub async fn products_by_supplier(
        &self,
        supplier_id: i32,
    ) -> Result<Vec<product::Model>, ServiceError> {
        Ok(product::Entity::find()
            .filter(product::Column::SupplierId.eq(supplier_id))
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Appends an authentication outcome for the product.
    #[instrument(skip(self, input), fields(status = %input.status))]
    pub async fn record_authentication(
        &self,
        product_id: i32,
        input: RecordAuthenticationInput,
    ) -> Result<authentication_log::Model, ServiceError> {
        input.validate()?;
        self.get_product(product_id).await?;

        let log = authentication_log::ActiveModel {
            product_id: Set(product_id),
            authentication_date: Set(input
                .authentication_date
                .unwrap_or_else(|| Utc::now().date_naive())),
            authenticator: Set(input.authenticator),
            status: Set(input.status),
            cost: Set(input.cost),
            notes: Set(input.notes),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        if log.status.is_failure() {
            warn!(product_id, status = %log.status, "Product failed authentication");
        } else {
            info!(product_id, status = %log.status, "Authentication recorded");
        }
        Ok(log)
    }

    /// Oldest first.
    pub async fn authentication_history(
        &self,
        product_id: i32,
    ) -> Result<Vec<authentication_log::Model>, ServiceError> {
        Ok(authentication_log::Entity::find()
            .filter(authentication_log::Column::ProductId.eq(product_id))
            .order_by_asc(authentication_log::Column::AuthenticationDate)
            .order_by_asc(authentication_log::Column::Id)
            .all(&*self.db)
            .await?)
    }

    pub async fn latest_authentication(
        &self,
        product_id: i32,
    ) -> Result<Option<authentication_log::Model>, ServiceError> {
        Ok(authentication_log::Entity::find()
            .filter(authentication_log::Column::ProductId.eq(product_id))
            .order_by_desc(authentication_log::Column::AuthenticationDate)
            .order_by_desc(authentication_log::Column::Id)
            .one(&*self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn negative_amounts_fail_validation() {
        assert!(validate_non_negative(&dec!(-0.01)).is_err());
        assert!(validate_non_negative(&dec!(0)).is_ok());
        assert!(validate_non_negative(&dec!(1250.00)).is_ok());
    }

    #[test]
    fn intake_requires_name() {
        let input = IntakeProductInput {
            brand_id: 1,
            category_id: 1,
            supplier_id: 1,
            initial_condition_id: 1,
            name: String::new(),
            material: None,
            color: None,
            size: None,
            serial_number: None,
            purchase_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            purchase_price: dec!(100),
            acquisition_notes: None,
        };
        assert!(input.validate().is_err());
    }
}

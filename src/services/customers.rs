use crate::{
    entities::customer::{self, Entity as Customer},
    errors::ServiceError,
    services::catalog::restrict_delete,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// Input for registering a customer
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterCustomerInput {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub registration_date: Option<NaiveDate>,
}

/// Customer accounts
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Register a new customer
    #[instrument(skip(self, input))]
    pub async fn register_customer(
        &self,
        input: RegisterCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        if self.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Email {} already registered",
                email
            )));
        }

        let customer = customer::ActiveModel {
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(email),
            phone: Set(input.phone),
            registration_date: Set(input
                .registration_date
                .unwrap_or_else(|| Utc::now().date_naive())),
            last_login: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(customer_id = customer.id, "Customer registered");
        Ok(customer)
    }

    pub async fn get_customer(&self, customer_id: i32) -> Result<customer::Model, ServiceError> {
        Customer::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))
    }

    /// Emails are stored lowercased.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<customer::Model>, ServiceError> {
        Ok(Customer::find()
            .filter(customer::Column::Email.eq(email.trim().to_lowercase()))
            .one(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn record_login(&self, customer_id: i32) -> Result<customer::Model, ServiceError> {
        let customer = self.get_customer(customer_id).await?;

        let mut active: customer::ActiveModel = customer.into();
        active.last_login = Set(Some(Utc::now()));
        Ok(active.update(&*self.db).await?)
    }

    /// Fails with `Conflict` while the customer still has orders.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, customer_id: i32) -> Result<(), ServiceError> {
        restrict_delete(
            Customer::delete_by_id(customer_id).exec(&*self.db).await,
            "Customer",
            customer_id,
        )
    }
}

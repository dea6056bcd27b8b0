use crate::{
    db::{record_transaction, rollback},
    entities::{
        brand, category,
        item_condition::{self, DEFAULT_CONDITIONS},
        supplier::{self, SupplierType},
    },
    errors::ServiceError,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    DeleteResult, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSupplierInput {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    pub supplier_type: SupplierType,
    pub contact_name: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    /// Defaults to today.
    pub registration_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBrandInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub country_of_origin: Option<String>,
}

/// A category joined with its parent's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryWithParent {
    pub id: i32,
    pub name: String,
    pub parent_id: Option<i32>,
    pub parent_name: Option<String>,
}

/// Reference data: suppliers, brands, conditions and the category tree.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_supplier(
        &self,
        input: CreateSupplierInput,
    ) -> Result<supplier::Model, ServiceError> {
        input.validate()?;

        let supplier = supplier::ActiveModel {
            name: Set(input.name),
            supplier_type: Set(input.supplier_type),
            contact_name: Set(input.contact_name),
            contact_email: Set(input.contact_email),
            phone: Set(input.phone),
            country: Set(input.country),
            city: Set(input.city),
            registration_date: Set(input
                .registration_date
                .unwrap_or_else(|| Utc::now().date_naive())),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(supplier_id = supplier.id, "Supplier created");
        Ok(supplier)
    }

    pub async fn get_supplier(&self, supplier_id: i32) -> Result<supplier::Model, ServiceError> {
        supplier::Entity::find_by_id(supplier_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", supplier_id)))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_brand(&self, input: CreateBrandInput) -> Result<brand::Model, ServiceError> {
        input.validate()?;

        let brand = brand::ActiveModel {
            name: Set(input.name),
            country_of_origin: Set(input.country_of_origin),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(brand_id = brand.id, "Brand created");
        Ok(brand)
    }

    pub async fn find_brand_by_name(&self, name: &str) -> Result<Option<brand::Model>, ServiceError> {
        Ok(brand::Entity::find()
            .filter(brand::Column::Name.eq(name))
            .one(&*self.db)
            .await?)
    }

    #[instrument(skip(self, description))]
    pub async fn create_condition(
        &self,
        label: &str,
        description: Option<String>,
    ) -> Result<item_condition::Model, ServiceError> {
        if label.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Condition label must not be empty".to_string(),
            ));
        }

        let condition = item_condition::ActiveModel {
            label: Set(label.to_string()),
            description: Set(description),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        Ok(condition)
    }

    /// Inserts the standard grading labels that are missing. Safe to call repeatedly.
    #[instrument(skip(self))]
    pub async fn ensure_default_conditions(
        &self,
    ) -> Result<Vec<item_condition::Model>, ServiceError> {
        let mut conditions = Vec::with_capacity(DEFAULT_CONDITIONS.len());

        for (label, description) in DEFAULT_CONDITIONS {
            let existing = item_condition::Entity::find()
                .filter(item_condition::Column::Label.eq(label))
                .one(&*self.db)
                .await?;

            let condition = match existing {
                Some(condition) => condition,
                None => {
                    self.create_condition(label, Some(description.to_string()))
                        .await?
                }
            };
            conditions.push(condition);
        }

        Ok(conditions)
    }

    pub async fn find_condition_by_label(
        &self,
        label: &str,
    ) -> Result<Option<item_condition::Model>, ServiceError> {
        Ok(item_condition::Entity::find()
            .filter(item_condition::Column::Label.eq(label))
            .one(&*self.db)
            .await?)
    }

    /// Creates a category, optionally under an existing parent.
    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        name: &str,
        parent_id: Option<i32>,
    ) -> Result<category::Model, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Category name must not be empty".to_string(),
            ));
        }

        if let Some(parent_id) = parent_id {
            self.get_category(parent_id).await?;
        }

        let category = category::ActiveModel {
            name: Set(name.to_string()),
            parent_id: Set(parent_id),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(category_id = category.id, ?parent_id, "Category created");
        Ok(category)
    }

    pub async fn get_category(&self, category_id: i32) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))
    }

    /// Re-parents a category. Rejects moves that would put a category under itself
    /// or under one of its own descendants.
    #[instrument(skip(self))]
    pub async fn move_category(
        &self,
        category_id: i32,
        new_parent_id: Option<i32>,
    ) -> Result<category::Model, ServiceError> {
        let txn = self.db.begin().await?;
        match move_within(&txn, category_id, new_parent_id).await {
            Ok(moved) => {
                txn.commit().await?;
                record_transaction("move_category", true);
                info!(category_id, ?new_parent_id, "Category moved");
                Ok(moved)
            }
            Err(e) => {
                rollback(txn, "move_category").await;
                Err(e)
            }
        }
    }

    /// Ancestors of a category, nearest first, ending at the root.
    pub async fn category_ancestors(
        &self,
        category_id: i32,
    ) -> Result<Vec<category::Model>, ServiceError> {
        let categories = self.category_map().await?;
        if !categories.contains_key(&category_id) {
            return Err(ServiceError::NotFound(format!(
                "Category {} not found",
                category_id
            )));
        }
        ancestors_of(&categories, category_id)
    }

    /// Every category below the given one, breadth first.
    pub async fn category_descendants(
        &self,
        category_id: i32,
    ) -> Result<Vec<category::Model>, ServiceError> {
        let categories = self.category_map().await?;
        if !categories.contains_key(&category_id) {
            return Err(ServiceError::NotFound(format!(
                "Category {} not found",
                category_id
            )));
        }
        Ok(descendants_of(&categories, category_id))
    }

    /// Human readable path such as `Bags > Handbags`.
    pub async fn category_path(&self, category_id: i32) -> Result<String, ServiceError> {
        let categories = self.category_map().await?;
        let leaf = categories
            .get(&category_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))?;

        let mut names: Vec<String> = ancestors_of(&categories, category_id)?
            .into_iter()
            .rev()
            .map(|c| c.name)
            .collect();
        names.push(leaf.name.clone());
        Ok(names.join(" > "))
    }

    /// Every category with its parent's name, via a self-join.
    pub async fn categories_with_parent(&self) -> Result<Vec<CategoryWithParent>, ServiceError> {
        let rows = category::Entity::find()
            .find_also_linked(category::ParentLink)
            .order_by_asc(category::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(child, parent)| CategoryWithParent {
                id: child.id,
                name: child.name,
                parent_id: child.parent_id,
                parent_name: parent.map(|p| p.name),
            })
            .collect())
    }

    pub async fn delete_brand(&self, brand_id: i32) -> Result<(), ServiceError> {
        restrict_delete(
            brand::Entity::delete_by_id(brand_id).exec(&*self.db).await,
            "Brand",
            brand_id,
        )
    }

    pub async fn delete_category(&self, category_id: i32) -> Result<(), ServiceError> {
        restrict_delete(
            category::Entity::delete_by_id(category_id)
                .exec(&*self.db)
                .await,
            "Category",
            category_id,
        )
    }

    pub async fn delete_supplier(&self, supplier_id: i32) -> Result<(), ServiceError> {
        restrict_delete(
            supplier::Entity::delete_by_id(supplier_id)
                .exec(&*self.db)
                .await,
            "Supplier",
            supplier_id,
        )
    }

    pub async fn delete_condition(&self, condition_id: i32) -> Result<(), ServiceError> {
        restrict_delete(
            item_condition::Entity::delete_by_id(condition_id)
                .exec(&*self.db)
                .await,
            "Condition",
            condition_id,
        )
    }

    async fn category_map(&self) -> Result<HashMap<i32, category::Model>, ServiceError> {
        category_map(&*self.db, false).await
    }
}

/// Loads the whole tree. `lock` takes row locks on every category so concurrent
/// moves serialize and cannot jointly close a loop.
async fn category_map<C: ConnectionTrait>(
    conn: &C,
    lock: bool,
) -> Result<HashMap<i32, category::Model>, ServiceError> {
    let mut query = category::Entity::find();
    if lock {
        query = query.lock_exclusive();
    }
    let categories = query.all(conn).await?;
    Ok(categories.into_iter().map(|c| (c.id, c)).collect())
}

async fn move_within(
    txn: &DatabaseTransaction,
    category_id: i32,
    new_parent_id: Option<i32>,
) -> Result<category::Model, ServiceError> {
    let categories = category_map(txn, true).await?;
    let current = categories
        .get(&category_id)
        .cloned()
        .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))?;

    if let Some(parent_id) = new_parent_id {
        if !categories.contains_key(&parent_id) {
            return Err(ServiceError::NotFound(format!(
                "Category {} not found",
                parent_id
            )));
        }
        if would_create_cycle(&categories, category_id, parent_id)? {
            warn!(category_id, parent_id, "Rejected category move that forms a cycle");
            return Err(ServiceError::InvalidOperation(format!(
                "Moving category {} under {} would create a cycle",
                category_id, parent_id
            )));
        }
    }

    let mut active: category::ActiveModel = current.into();
    active.parent_id = Set(new_parent_id);
    Ok(active.update(txn).await?)
}

/// Fails if any category's parent chain loops back on itself.
pub(crate) async fn ensure_acyclic<C: ConnectionTrait>(conn: &C) -> Result<(), ServiceError> {
    let categories = category_map(conn, false).await?;
    for id in categories.keys() {
        ancestors_of(&categories, *id)?;
    }
    Ok(())
}

/// Maps the outcome of a delete under the RESTRICT policy.
pub(crate) fn restrict_delete(
    result: Result<DeleteResult, DbErr>,
    entity: &str,
    id: i32,
) -> Result<(), ServiceError> {
    match result.map_err(ServiceError::from) {
        Ok(res) if res.rows_affected == 0 => {
            Err(ServiceError::NotFound(format!("{} {} not found", entity, id)))
        }
        Ok(_) => {
            info!(id, "{} deleted", entity);
            Ok(())
        }
        Err(ServiceError::ConstraintViolation(_)) => Err(ServiceError::Conflict(format!(
            "{} {} is still referenced",
            entity, id
        ))),
        Err(e) => Err(e),
    }
}

fn ancestors_of(
    categories: &HashMap<i32, category::Model>,
    category_id: i32,
) -> Result<Vec<category::Model>, ServiceError> {
    let mut seen = HashSet::from([category_id]);
    let mut ancestors = Vec::new();
    let mut next = categories.get(&category_id).and_then(|c| c.parent_id);

    while let Some(parent_id) = next {
        if !seen.insert(parent_id) {
            return Err(ServiceError::InvalidOperation(format!(
                "Category hierarchy above {} contains a cycle",
                category_id
            )));
        }
        let Some(parent) = categories.get(&parent_id) else {
            break;
        };
        ancestors.push(parent.clone());
        next = parent.parent_id;
    }

    Ok(ancestors)
}

fn descendants_of(
    categories: &HashMap<i32, category::Model>,
    category_id: i32,
) -> Vec<category::Model> {
    let mut children: HashMap<i32, Vec<&category::Model>> = HashMap::new();
    for category in categories.values() {
        if let Some(parent_id) = category.parent_id {
            children.entry(parent_id).or_default().push(category);
        }
    }
    for siblings in children.values_mut() {
        siblings.sort_by_key(|c| c.id);
    }

    let mut seen = HashSet::from([category_id]);
    let mut queue = VecDeque::from([category_id]);
    let mut descendants = Vec::new();

    while let Some(id) = queue.pop_front() {
        for child in children.get(&id).into_iter().flatten() {
            if seen.insert(child.id) {
                descendants.push((*child).clone());
                queue.push_back(child.id);
            }
        }
    }

    descendants
}

/// True when placing `category_id` under `new_parent_id` closes a loop.
fn would_create_cycle(
    categories: &HashMap<i32, category::Model>,
    category_id: i32,
    new_parent_id: i32,
) -> Result<bool, ServiceError> {
    if category_id == new_parent_id {
        return Ok(true);
    }
    let above_parent = ancestors_of(categories, new_parent_id)?;
    Ok(above_parent.iter().any(|c| c.id == category_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn tree(rows: &[(i32, &str, Option<i32>)]) -> HashMap<i32, category::Model> {
        rows.iter()
            .map(|(id, name, parent_id)| {
                (
                    *id,
                    category::Model {
                        id: *id,
                        name: name.to_string(),
                        parent_id: *parent_id,
                    },
                )
            })
            .collect()
    }

    fn sample() -> HashMap<i32, category::Model> {
        tree(&[
            (1, "Bags", None),
            (2, "Handbags", Some(1)),
            (3, "Clutches", Some(1)),
            (4, "Mini Handbags", Some(2)),
            (5, "Shoes", None),
        ])
    }

    #[test]
    fn ancestors_are_nearest_first() {
        let ids: Vec<i32> = ancestors_of(&sample(), 4)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(ancestors_of(&sample(), 5).unwrap().is_empty());
    }

    #[test]
    fn descendants_are_breadth_first() {
        let ids: Vec<i32> = descendants_of(&sample(), 1).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert!(descendants_of(&sample(), 4).is_empty());
    }

    #[test]
    fn detects_moves_that_close_a_loop() {
        let categories = sample();
        assert!(would_create_cycle(&categories, 1, 4).unwrap());
        assert!(would_create_cycle(&categories, 2, 2).unwrap());
        assert!(!would_create_cycle(&categories, 4, 3).unwrap());
        assert!(!would_create_cycle(&categories, 5, 1).unwrap());
    }

    #[test]
    fn existing_cycle_is_reported_not_looped() {
        let categories = tree(&[(1, "A", Some(2)), (2, "B", Some(1))]);
        assert_matches!(
            ancestors_of(&categories, 1),
            Err(ServiceError::InvalidOperation(_))
        );
        // Descendant traversal terminates as well
        assert_eq!(descendants_of(&categories, 1).len(), 1);
    }
}

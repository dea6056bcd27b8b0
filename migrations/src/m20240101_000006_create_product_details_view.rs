use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Denormalized product read model. Plain view, never materialized.
const CREATE_PRODUCT_DETAILS_VIEW: &str = r#"
CREATE VIEW product_details AS
SELECT
    p.id AS product_id,
    p.name AS product_name,
    b.name AS brand_name,
    b.country_of_origin AS brand_country,
    c.name AS category_name,
    p.material AS material,
    p.color AS color,
    p.size AS size,
    p.serial_number AS serial_number,
    p.purchase_date AS purchase_date,
    p.purchase_price AS purchase_price
FROM products p
JOIN brands b ON b.id = p.brand_id
JOIN categories c ON c.id = p.category_id
"#;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(CREATE_PRODUCT_DETAILS_VIEW)
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP VIEW IF EXISTS product_details")
            .await?;
        Ok(())
    }
}

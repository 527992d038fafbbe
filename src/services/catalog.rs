use crate::{
    currency::CurrencyRateProvider,
    entities::{
        category, order_detail, product, product_category, product_photo, product_size,
        Category, CategoryModel, OrderDetail, Product, ProductCategory, ProductModel,
        ProductPhoto, ProductPhotoModel, ProductSize, ProductSizeModel,
    },
    errors::ServiceError,
    storage::MediaStorage,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::validate_money;

/// Catalog service for categories, products, sizes and photos
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    storage: MediaStorage,
    rates: Arc<dyn CurrencyRateProvider>,
    base_currency: String,
}

impl CatalogService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: MediaStorage,
        rates: Arc<dyn CurrencyRateProvider>,
        base_currency: impl Into<String>,
    ) -> Self {
        Self {
            db,
            storage,
            rates,
            base_currency: base_currency.into(),
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// Create a new category
    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        input.validate()?;

        let category = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
        }
        .insert(&*self.db)
        .await?;

        info!("Created category: {}", category.id);
        Ok(category)
    }

    pub async fn get_category(&self, category_id: Uuid) -> Result<CategoryModel, ServiceError> {
        Category::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", category_id))
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryModel>, ServiceError> {
        Ok(Category::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Delete a category; its products stay, only the links go.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let category = Category::find_by_id(category_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", category_id))?;

        let links = ProductCategory::delete_many()
            .filter(product_category::Column::CategoryId.eq(category_id))
            .exec(&txn)
            .await?;
        category.delete(&txn).await?;

        txn.commit().await?;

        info!(
            "Deleted category {} ({} product links)",
            category_id, links.rows_affected
        );
        Ok(())
    }

    /// Create a new product, optionally linked to existing categories
    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let category_ids = dedup(&input.category_ids);
        ensure_categories_exist(&txn, &category_ids).await?;

        let product_id = Uuid::new_v4();
        let product = product::ActiveModel {
            id: Set(product_id),
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            updated_price: Set(input.updated_price.unwrap_or(input.price)),
            is_3d: Set(input.is_3d),
        }
        .insert(&txn)
        .await?;

        link_categories(&txn, product_id, &category_ids).await?;

        txn.commit().await?;

        info!("Created product: {}", product_id);
        Ok(product)
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))
    }

    pub async fn list_products(&self) -> Result<Vec<ProductModel>, ServiceError> {
        Ok(Product::find()
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Update an existing product
    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        input.validate()?;

        let product = self.get_product(product_id).await?;
        let mut active: product::ActiveModel = product.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(updated_price) = input.updated_price {
            active.updated_price = Set(updated_price);
        }
        if let Some(is_3d) = input.is_3d {
            active.is_3d = Set(is_3d);
        }

        let product = active.update(&*self.db).await?;

        info!("Updated product: {}", product_id);
        Ok(product)
    }

    /// Delete a product with its sizes, photos, category links and every
    /// order line that references it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let product = Product::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        let order_lines = OrderDetail::delete_many()
            .filter(order_detail::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        let sizes = ProductSize::delete_many()
            .filter(product_size::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        let photos = ProductPhoto::delete_many()
            .filter(product_photo::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        ProductCategory::delete_many()
            .filter(product_category::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        product.delete(&txn).await?;

        txn.commit().await?;

        info!(
            "Deleted product {} ({} sizes, {} photos, {} order lines)",
            product_id, sizes.rows_affected, photos.rows_affected, order_lines.rows_affected
        );
        Ok(())
    }

    /// Replace the categories a product belongs to
    #[instrument(skip(self))]
    pub async fn set_product_categories(
        &self,
        product_id: Uuid,
        category_ids: Vec<Uuid>,
    ) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        Product::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        let category_ids = dedup(&category_ids);
        ensure_categories_exist(&txn, &category_ids).await?;

        ProductCategory::delete_many()
            .filter(product_category::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        link_categories(&txn, product_id, &category_ids).await?;

        txn.commit().await?;
        Ok(())
    }

    pub async fn product_categories(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<CategoryModel>, ServiceError> {
        let product = self.get_product(product_id).await?;
        Ok(product
            .find_related(Category)
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    pub async fn category_products(
        &self,
        category_id: Uuid,
    ) -> Result<Vec<ProductModel>, ServiceError> {
        let category = self.get_category(category_id).await?;
        Ok(category
            .find_related(Product)
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Record a size with its quantity on hand
    #[instrument(skip(self))]
    pub async fn add_size(
        &self,
        product_id: Uuid,
        input: AddSizeInput,
    ) -> Result<ProductSizeModel, ServiceError> {
        input.validate()?;
        self.get_product(product_id).await?;

        let size = product_size::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            size: Set(input.size),
            quantity: Set(input.quantity),
        }
        .insert(&*self.db)
        .await?;

        Ok(size)
    }

    pub async fn sizes_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<ProductSizeModel>, ServiceError> {
        Ok(ProductSize::find()
            .filter(product_size::Column::ProductId.eq(product_id))
            .order_by_asc(product_size::Column::Size)
            .all(&*self.db)
            .await?)
    }

    /// Attach a photo to a product. `filename` is the uploaded file's name;
    /// `None` records a photo without a stored image.
    #[instrument(skip(self))]
    pub async fn add_photo(
        &self,
        product_id: Uuid,
        filename: Option<&str>,
    ) -> Result<ProductPhotoModel, ServiceError> {
        self.get_product(product_id).await?;

        let image = match filename {
            Some(name) => self.storage.upload_name(name)?,
            None => String::new(),
        };

        let photo = product_photo::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            image: Set(image),
        }
        .insert(&*self.db)
        .await?;

        info!("Added photo {} to product {}", photo.id, product_id);
        Ok(photo)
    }

    pub async fn photos_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<ProductPhotoModel>, ServiceError> {
        Ok(ProductPhoto::find()
            .filter(product_photo::Column::ProductId.eq(product_id))
            .all(&*self.db)
            .await?)
    }

    /// URLs of the product's photos that have a stored image
    pub async fn photo_urls(&self, product_id: Uuid) -> Result<Vec<String>, ServiceError> {
        Ok(self
            .photos_for_product(product_id)
            .await?
            .iter()
            .filter_map(|photo| photo.image_url(&self.storage))
            .collect())
    }

    /// Price of a product expressed in `currency`
    #[instrument(skip(self))]
    pub async fn convert_price(
        &self,
        product_id: Uuid,
        currency: &str,
    ) -> Result<Decimal, ServiceError> {
        let product = self.get_product(product_id).await?;
        product
            .convert_price(&self.base_currency, currency, self.rates.as_ref())
            .await
    }
}

fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    ids.iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

async fn ensure_categories_exist<C>(db: &C, category_ids: &[Uuid]) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    if category_ids.is_empty() {
        return Ok(());
    }

    let found = Category::find()
        .filter(category::Column::Id.is_in(category_ids.to_vec()))
        .count(db)
        .await?;

    if found as usize != category_ids.len() {
        return Err(ServiceError::NotFound(format!(
            "{} of {} categories not found",
            category_ids.len() - found as usize,
            category_ids.len()
        )));
    }
    Ok(())
}

async fn link_categories<C>(
    db: &C,
    product_id: Uuid,
    category_ids: &[Uuid],
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    if category_ids.is_empty() {
        return Ok(());
    }

    let links = category_ids
        .iter()
        .map(|category_id| product_category::ActiveModel {
            product_id: Set(product_id),
            category_id: Set(*category_id),
        });
    ProductCategory::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: String,
    #[validate(custom = "validate_money")]
    pub price: Decimal,
    /// Defaults to `price`
    #[validate(custom = "validate_money")]
    pub updated_price: Option<Decimal>,
    #[serde(default)]
    pub is_3d: bool,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_money")]
    pub price: Option<Decimal>,
    #[validate(custom = "validate_money")]
    pub updated_price: Option<Decimal>,
    pub is_3d: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddSizeInput {
    #[validate(length(min = 1, max = 50))]
    pub size: String,
    #[validate(range(min = 0))]
    pub quantity: i32,
}

//! sea-orm entities for the shop schema
pub mod category;
pub mod customer;
pub mod order;
pub mod order_detail;
pub mod product;
pub mod product_category;
pub mod product_photo;
pub mod product_size;

pub use category::{Entity as Category, Model as CategoryModel};
pub use customer::{Entity as Customer, Model as CustomerModel};
pub use order::{Entity as Order, Model as OrderModel};
pub use order_detail::{Entity as OrderDetail, Model as OrderDetailModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_category::{Entity as ProductCategory, Model as ProductCategoryModel};
pub use product_photo::{Entity as ProductPhoto, Model as ProductPhotoModel};
pub use product_size::{Entity as ProductSize, Model as ProductSizeModel};
